//! E2 Agent Task Model
//!
//! Every piece of agent logic runs as an owned [`AgentTask`] drained one at a
//! time by the agent's run loop. Producers (the transport receive path, the
//! owner's [`AgentHandle`](crate::agent::AgentHandle) and expiring timers)
//! only ever enqueue tasks; they never touch session state.
//!
//! # Task Sources
//!
//! - **Transport**: [`AgentTask::HandleRx`] and [`AgentTask::TransportLost`]
//! - **Owner**: [`AgentTask::SendResetRequest`]
//! - **Agent itself**: setup requests and protocol responses
//! - **Timers**: setup response, setup back-off and reset response expiry

use nextgsim_e2ap::ies::{Cause, TransactionId};
use nextgsim_e2ap::E2apPdu;

use crate::session::AgentState;
use crate::transport::InboundDatagram;

// ============================================================================
// Timer Identifiers
// ============================================================================

/// Waiting for an E2 Setup Response
pub const TIMER_E2_SETUP_RESPONSE: u32 = 1;
/// Back-off requested by the TimeToWait IE of an E2 Setup Failure
pub const TIMER_E2_SETUP_BACKOFF: u32 = 2;
/// Waiting for a Reset Response
pub const TIMER_E2_RESET_RESPONSE: u32 = 3;

// ============================================================================
// Agent Tasks
// ============================================================================

/// A unit of work executed by the agent run loop.
#[derive(Debug)]
pub enum AgentTask {
    /// Decode and dispatch an inbound datagram
    HandleRx(InboundDatagram),
    /// Build and send an E2 Setup Request
    SendSetupRequest,
    /// Build and send a Reset Request (node initiated)
    SendResetRequest(Cause),
    /// Send an already built PDU
    SendPdu(Box<E2apPdu>),
    /// No E2 Setup Response arrived in time
    SetupResponseTimeout,
    /// TimeToWait after an E2 Setup Failure elapsed
    SetupBackoffExpired,
    /// No Reset Response arrived for the given transaction
    ResetResponseTimeout(TransactionId),
    /// The association is gone
    TransportLost(String),
}

impl AgentTask {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AgentTask::HandleRx(_) => "HandleRx",
            AgentTask::SendSetupRequest => "SendSetupRequest",
            AgentTask::SendResetRequest(_) => "SendResetRequest",
            AgentTask::SendPdu(_) => "SendPdu",
            AgentTask::SetupResponseTimeout => "SetupResponseTimeout",
            AgentTask::SetupBackoffExpired => "SetupBackoffExpired",
            AgentTask::ResetResponseTimeout(_) => "ResetResponseTimeout",
            AgentTask::TransportLost(_) => "TransportLost",
        }
    }

    /// Wraps a PDU into a send task.
    pub fn send(pdu: E2apPdu) -> Self {
        AgentTask::SendPdu(Box::new(pdu))
    }
}

// ============================================================================
// Agent Events
// ============================================================================

/// Notifications from the agent to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// The session state changed
    StateChanged { from: AgentState, to: AgentState },
    /// E2 Setup could not be completed; the run loop has ended
    SetupFailed { attempts: u32 },
    /// The association was lost; the run loop has ended
    TransportLost { reason: String },
    /// The run loop exited
    Stopped,
}

impl AgentEvent {
    /// Returns true if the event means the run loop is over.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentEvent::SetupFailed { .. } | AgentEvent::TransportLost { .. } | AgentEvent::Stopped
        )
    }
}
