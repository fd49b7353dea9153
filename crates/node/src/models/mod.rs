//! Channel state models.

mod app_instance;
mod channel;
mod proposal;

pub use app_instance::AppInstance;
pub use channel::StateChannel;
pub use proposal::InstallProposal;
