//! Solidity ABI encoding.
//!
//! Covers the subset of the contract ABI the commitments need: standard
//! head/tail encoding (`abi.encode`), packed encoding (`abi.encodePacked`),
//! function selectors, and a decoder for the same type set.
//!
//! Integers are limited to 128 bits of magnitude. They are still encoded as
//! full `uint256` words; decoding a word with any of the upper 16 bytes set
//! fails with [`AbiError::ValueOverflow`].

use crate::{Address, Hash};

const WORD: usize = 32;

/// A typed ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `address`
    Address(Address),
    /// `uint256`
    Uint(u128),
    /// `uint8`
    Uint8(u8),
    /// `bytes32`
    FixedBytes(Hash),
    /// `bytes`
    Bytes(Vec<u8>),
    /// `T[]`
    Array(Vec<Token>),
    /// `(T1, T2, ...)`
    Tuple(Vec<Token>),
}

/// ABI type descriptor used for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint,
    Uint8,
    FixedBytes,
    Bytes,
    Array(Box<ParamType>),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::Array(_) => true,
            ParamType::Tuple(inner) => inner.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    fn head_len(&self) -> usize {
        match self {
            ParamType::Tuple(inner) if !self.is_dynamic() => {
                inner.iter().map(ParamType::head_len).sum()
            }
            _ => WORD,
        }
    }
}

impl Token {
    fn is_dynamic(&self) -> bool {
        match self {
            Token::Bytes(_) | Token::Array(_) => true,
            Token::Tuple(inner) => inner.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    fn head_len(&self) -> usize {
        match self {
            Token::Tuple(inner) if !self.is_dynamic() => inner.iter().map(Token::head_len).sum(),
            _ => WORD,
        }
    }
}

/// Errors from ABI decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    /// Read past the end of the input.
    #[error("ABI read out of bounds: need {needed} bytes at offset {offset}, have {len}")]
    OutOfBounds {
        /// Offset of the attempted read.
        offset: usize,
        /// Bytes needed.
        needed: usize,
        /// Total input length.
        len: usize,
    },

    /// Integer does not fit the target width.
    #[error("ABI integer overflows target width")]
    ValueOverflow,

    /// Non-zero bytes where padding was expected.
    #[error("Invalid ABI padding")]
    InvalidPadding,

    /// Calldata does not start with the expected selector.
    #[error("Selector mismatch: expected {expected}, got {actual}")]
    SelectorMismatch {
        /// Expected selector (hex).
        expected: String,
        /// Selector found (hex).
        actual: String,
    },
}

fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.next_multiple_of(WORD)
}

/// Standard ABI encoding of `tokens` as if they were the fields of one tuple.
///
/// Equivalent to Solidity's `abi.encode(t1, t2, ...)`.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    encode_sequence(tokens)
}

fn encode_sequence(tokens: &[Token]) -> Vec<u8> {
    let head_len: usize = tokens.iter().map(Token::head_len).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
            tail.extend(encode_token(token));
        } else {
            head.extend(encode_token(token));
        }
    }

    head.extend(tail);
    head
}

fn encode_token(token: &Token) -> Vec<u8> {
    match token {
        Token::Address(address) => address.to_word().to_vec(),
        Token::Uint(value) => uint_word(*value).to_vec(),
        Token::Uint8(value) => uint_word(*value as u128).to_vec(),
        Token::FixedBytes(hash) => hash.as_bytes().to_vec(),
        Token::Bytes(bytes) => {
            let mut out = Vec::with_capacity(WORD + padded_len(bytes.len()));
            out.extend_from_slice(&uint_word(bytes.len() as u128));
            out.extend_from_slice(bytes);
            out.resize(WORD + padded_len(bytes.len()), 0);
            out
        }
        Token::Array(items) => {
            let mut out = uint_word(items.len() as u128).to_vec();
            out.extend(encode_sequence(items));
            out
        }
        Token::Tuple(items) => encode_sequence(items),
    }
}

/// Packed encoding, equivalent to Solidity's `abi.encodePacked(...)`.
///
/// Scalars use their natural width; array elements are padded to 32 bytes.
pub fn encode_packed(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::new();
    for token in tokens {
        match token {
            Token::Address(address) => out.extend_from_slice(address.as_bytes()),
            Token::Uint(value) => out.extend_from_slice(&uint_word(*value)),
            Token::Uint8(value) => out.push(*value),
            Token::FixedBytes(hash) => out.extend_from_slice(hash.as_bytes()),
            Token::Bytes(bytes) => out.extend_from_slice(bytes),
            Token::Array(items) => {
                for item in items {
                    match item {
                        Token::Address(address) => out.extend_from_slice(&address.to_word()),
                        Token::Uint8(value) => out.extend_from_slice(&uint_word(*value as u128)),
                        other => out.extend(encode_packed(std::slice::from_ref(other))),
                    }
                }
            }
            Token::Tuple(items) => out.extend(encode_packed(items)),
        }
    }
    out
}

/// The 4-byte selector of a function signature such as `transfer(address,uint256)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Hash::from_bytes(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.as_bytes()[..4]);
    out
}

/// Calldata for a call to `signature` with `args`.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode(args));
    out
}

/// Decode calldata produced by [`encode_call`] for the same signature.
pub fn decode_call(signature: &str, types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    let expected = selector(signature);
    let actual = read(data, 0, 4)?;
    if actual != expected {
        return Err(AbiError::SelectorMismatch {
            expected: hex::encode(expected),
            actual: hex::encode(actual),
        });
    }
    decode(types, &data[4..])
}

/// Decode standard-encoded data as a tuple of `types`.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    decode_sequence(types, data, 0)
}

fn read(data: &[u8], offset: usize, needed: usize) -> Result<&[u8], AbiError> {
    offset
        .checked_add(needed)
        .and_then(|end| data.get(offset..end))
        .ok_or(AbiError::OutOfBounds {
            offset,
            needed,
            len: data.len(),
        })
}

fn read_uint(data: &[u8], offset: usize) -> Result<u128, AbiError> {
    let word = read(data, offset, WORD)?;
    if word[..16].iter().any(|&b| b != 0) {
        return Err(AbiError::ValueOverflow);
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

fn read_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    usize::try_from(read_uint(data, offset)?).map_err(|_| AbiError::ValueOverflow)
}

fn after_length(at: usize) -> Result<usize, AbiError> {
    at.checked_add(WORD).ok_or(AbiError::ValueOverflow)
}

fn decode_sequence(types: &[ParamType], data: &[u8], base: usize) -> Result<Vec<Token>, AbiError> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut head = base;
    for param in types {
        if param.is_dynamic() {
            let offset = read_usize(data, head)?;
            let at = base.checked_add(offset).ok_or(AbiError::ValueOverflow)?;
            tokens.push(decode_token(param, data, at)?);
        } else {
            tokens.push(decode_token(param, data, head)?);
        }
        head += param.head_len();
    }
    Ok(tokens)
}

fn decode_token(param: &ParamType, data: &[u8], at: usize) -> Result<Token, AbiError> {
    match param {
        ParamType::Address => {
            let word = read(data, at, WORD)?;
            if word[..12].iter().any(|&b| b != 0) {
                return Err(AbiError::InvalidPadding);
            }
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&word[12..]);
            Ok(Token::Address(Address::from_raw(bytes)))
        }
        ParamType::Uint => Ok(Token::Uint(read_uint(data, at)?)),
        ParamType::Uint8 => {
            let value = read_uint(data, at)?;
            u8::try_from(value)
                .map(Token::Uint8)
                .map_err(|_| AbiError::ValueOverflow)
        }
        ParamType::FixedBytes => {
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(read(data, at, WORD)?);
            Ok(Token::FixedBytes(Hash::from_raw(bytes)))
        }
        ParamType::Bytes => {
            let len = read_usize(data, at)?;
            let padded = len
                .checked_next_multiple_of(WORD)
                .ok_or(AbiError::ValueOverflow)?;
            let body = read(data, after_length(at)?, padded)?;
            if body[len..].iter().any(|&b| b != 0) {
                return Err(AbiError::InvalidPadding);
            }
            Ok(Token::Bytes(body[..len].to_vec()))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, at)?;
            let start = after_length(at)?;
            // The element heads alone must fit before any allocation.
            let heads = len
                .checked_mul(inner.head_len().max(1))
                .ok_or(AbiError::ValueOverflow)?;
            read(data, start, heads)?;
            let types = vec![(**inner).clone(); len];
            Ok(Token::Array(decode_sequence(&types, data, start)?))
        }
        ParamType::Tuple(inner) => Ok(Token::Tuple(decode_sequence(inner, data, at)?)),
    }
}
