//! Protocol methods and their request/response envelopes.

mod install;
mod proposal;
mod query;
mod setup;
mod uninstall;
mod update_state;

pub use install::InstallParams;
pub use proposal::{ProposeInstall, RejectInstall};
pub use query::{AppState, GetAppInstances, GetFreeBalance, GetProposedInstalls, GetState};
pub use setup::SetupParams;
pub use uninstall::UninstallParams;
pub use update_state::UpdateStateParams;

use crate::models::{AppInstance, InstallProposal};
use crate::protocol::ProtocolOutcome;
use serde::{Deserialize, Serialize};
use statechannel_ledger::FreeBalanceState;
use statechannel_types::{Hash, Signature};

/// A call into the engine.
///
/// State-changing methods carry the counterparties' signatures collected
/// from their proposals, in ascending signer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MethodRequest {
    Setup {
        params: SetupParams,
        signatures: Vec<Signature>,
    },
    Install {
        params: InstallParams,
        signatures: Vec<Signature>,
    },
    UpdateState {
        params: UpdateStateParams,
        signatures: Vec<Signature>,
    },
    Uninstall {
        params: UninstallParams,
        signatures: Vec<Signature>,
    },
    ProposeInstall(ProposeInstall),
    RejectInstall(RejectInstall),
    GetFreeBalance(GetFreeBalance),
    GetAppInstances(GetAppInstances),
    GetState(GetState),
    GetProposedInstalls(GetProposedInstalls),
}

impl MethodRequest {
    pub fn name(&self) -> &'static str {
        match self {
            MethodRequest::Setup { .. } => "setup",
            MethodRequest::Install { .. } => "install",
            MethodRequest::UpdateState { .. } => "update_state",
            MethodRequest::Uninstall { .. } => "uninstall",
            MethodRequest::ProposeInstall(_) => "propose_install",
            MethodRequest::RejectInstall(_) => "reject_install",
            MethodRequest::GetFreeBalance(_) => "get_free_balance",
            MethodRequest::GetAppInstances(_) => "get_app_instances",
            MethodRequest::GetState(_) => "get_state",
            MethodRequest::GetProposedInstalls(_) => "get_proposed_installs",
        }
    }
}

/// Result of a [`MethodRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodResponse {
    /// A protocol step committed.
    Committed(Box<ProtocolOutcome>),
    /// An install was proposed; carries the app id it would get.
    Proposed(Hash),
    /// A proposed install was dropped.
    Rejected(Hash),
    FreeBalance(FreeBalanceState),
    AppInstances(Vec<AppInstance>),
    AppState(AppState),
    ProposedInstalls(Vec<InstallProposal>),
}
