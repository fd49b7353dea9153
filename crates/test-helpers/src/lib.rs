//! Deterministic fixtures for tests.
//!
//! Keys are derived from fixed seeds so that addresses, digests and
//! signatures are identical on every run.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statechannel_ledger::{Amount, FreeBalanceState};
use statechannel_types::{Address, AppIdentity, Hash, KeyPair, Terms};

/// Key pair derived from a one-byte seed.
pub fn test_keypair(seed: u8) -> KeyPair {
    KeyPair::from_seed(&[seed; 32])
}

/// `count` key pairs drawn from a seeded RNG, sorted by address.
pub fn deterministic_keypairs(seed: u64, count: usize) -> Vec<KeyPair> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut keys: Vec<_> = (0..count)
        .map(|_| {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            KeyPair::from_seed(&bytes)
        })
        .collect();
    keys.sort_by_key(KeyPair::address);
    keys
}

/// A fixed multisig address distinct per seed.
pub fn test_multisig(seed: u8) -> Address {
    let mut bytes = [0xcc; 20];
    bytes[19] = seed;
    Address::from_raw(bytes)
}

/// App identity with a placeholder definition and ETH terms.
pub fn test_app_identity(multisig: Address, signing_keys: &[Address]) -> AppIdentity {
    AppIdentity {
        owner: multisig,
        signing_keys: signing_keys.to_vec(),
        app_definition: Address::from_raw([0xdd; 20]),
        terms_hash: Terms::eth(100).hash(),
        default_timeout: 100,
    }
}

/// Free balance giving every key the same amount.
pub fn equal_free_balance(keys: &[KeyPair], amount: Amount) -> FreeBalanceState {
    FreeBalanceState::new(keys.iter().map(|k| (k.address(), amount)))
        .expect("distinct keys and non-negative amount")
}

/// Hash of an arbitrary label, handy as an app state hash.
pub fn test_state_hash(label: &str) -> Hash {
    Hash::from_bytes(label.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypairs_are_sorted_and_stable() {
        let a = deterministic_keypairs(7, 3);
        let b = deterministic_keypairs(7, 3);
        let addrs: Vec<_> = a.iter().map(KeyPair::address).collect();
        assert_eq!(addrs, b.iter().map(KeyPair::address).collect::<Vec<_>>());
        assert!(addrs.windows(2).all(|w| w[0] < w[1]));
    }
}
