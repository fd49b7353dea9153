//! External collaborators of the engine.

mod messaging;
mod signer;
mod store;

pub use messaging::{
    MemoryMessagingService, MessageCallback, MessagingError, MessagingService, ProtocolKind,
    ProtocolMessage,
};
pub use signer::{LocalSigner, Signer, SignerError};
pub use store::{MemoryStore, StoreError, StoreService};
