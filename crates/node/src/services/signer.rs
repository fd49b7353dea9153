//! Local signing.

use async_trait::async_trait;
use statechannel_types::{Address, Hash, KeyPair, Signature};

/// Errors from a signer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    /// The signer declined to sign.
    #[error("Signing rejected: {0}")]
    Rejected(String),
}

/// Produces this party's signatures.
///
/// Signing may wait on an external wallet, so it is asynchronous.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Address whose signatures this signer produces.
    fn address(&self) -> Address;

    /// Sign a commitment digest.
    async fn sign_digest(&self, digest: &Hash) -> Result<Signature, SignerError>;
}

/// Signer holding the key in memory.
#[derive(Debug, Clone)]
pub struct LocalSigner {
    keypair: KeyPair,
}

impl LocalSigner {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }
}

#[async_trait]
impl Signer for LocalSigner {
    fn address(&self) -> Address {
        self.keypair.address()
    }

    async fn sign_digest(&self, digest: &Hash) -> Result<Signature, SignerError> {
        Ok(self.keypair.sign_digest(digest))
    }
}
