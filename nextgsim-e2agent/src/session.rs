//! E2 Session State
//!
//! Connection state machine and the per-session bookkeeping that only the
//! agent run loop mutates.
//!
//! ```text
//! Idle -> Connecting -> AwaitingSetupResponse -> Established
//!   ^                                                 |
//!   +------------------ transport lost ---------------+
//! ```

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use nextgsim_e2ap::ies::{RanFunctionId, RicActionId, RicRequestId, TransactionId};
use thiserror::Error;

/// Connection state of the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AgentState {
    /// No association
    #[default]
    Idle,
    /// Association up, E2 Setup not sent yet
    Connecting,
    /// E2 Setup Request sent
    AwaitingSetupResponse,
    /// E2 Setup completed
    Established,
}

impl AgentState {
    /// Returns true if moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: AgentState) -> bool {
        matches!(
            (self, next),
            (AgentState::Idle, AgentState::Connecting)
                | (AgentState::Connecting, AgentState::AwaitingSetupResponse)
                | (AgentState::AwaitingSetupResponse, AgentState::Established)
                | (AgentState::Established, AgentState::Idle)
        )
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentState::Idle => write!(f, "Idle"),
            AgentState::Connecting => write!(f, "Connecting"),
            AgentState::AwaitingSetupResponse => write!(f, "AwaitingSetupResponse"),
            AgentState::Established => write!(f, "Established"),
        }
    }
}

/// Attempted state change is not part of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Illegal state transition {from} -> {to}")]
pub struct StateError {
    pub from: AgentState,
    pub to: AgentState,
}

/// Subscription key: RIC request id and RAN function id
pub type SubscriptionKey = (RicRequestId, RanFunctionId);

/// An admitted RIC subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub ric_request_id: RicRequestId,
    pub ran_function_id: RanFunctionId,
    /// Admitted actions, ascending
    pub actions: Vec<RicActionId>,
}

impl Subscription {
    pub fn key(&self) -> SubscriptionKey {
        (self.ric_request_id, self.ran_function_id)
    }

    pub fn has_action(&self, action: RicActionId) -> bool {
        self.actions.binary_search(&action).is_ok()
    }

    /// Adds an action. Returns false if it was already admitted.
    pub fn add_action(&mut self, action: RicActionId) -> bool {
        match self.actions.binary_search(&action) {
            Ok(_) => false,
            Err(pos) => {
                self.actions.insert(pos, action);
                true
            }
        }
    }

    /// Removes an action. Returns false if it was not admitted.
    pub fn remove_action(&mut self, action: RicActionId) -> bool {
        match self.actions.binary_search(&action) {
            Ok(pos) => {
                self.actions.remove(pos);
                true
            }
            Err(_) => false,
        }
    }
}

/// Session state of one agent instance
#[derive(Debug, Default)]
pub struct Session {
    state: AgentState,
    /// Address of the RIC
    pub peer: Option<SocketAddr>,
    /// E2 Setup Request queued for the current connection
    pub setup_sent: bool,
    /// E2 Setup Requests sent so far
    pub setup_attempts: u32,
    /// Transaction id of the outstanding E2 Setup Request
    pub setup_transaction_id: Option<TransactionId>,
    /// Transaction id of the last node initiated Reset Request
    pub last_reset_transaction_id: Option<TransactionId>,
    /// A node initiated reset is waiting for its response
    pub reset_pending: bool,
    /// Sends that failed in a row
    pub consecutive_send_failures: u32,
    next_transaction_id: TransactionId,
    subscriptions: HashMap<SubscriptionKey, Subscription>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Moves to `to`, returning the previous state.
    pub fn transition(&mut self, to: AgentState) -> Result<AgentState, StateError> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(StateError { from, to });
        }
        self.state = to;
        Ok(from)
    }

    /// Allocates the next transaction id, wrapping at 255.
    pub fn allocate_transaction_id(&mut self) -> TransactionId {
        let id = self.next_transaction_id;
        self.next_transaction_id = id.next();
        id
    }

    /// Records a subscription. Returns false if the key is already in use.
    pub fn add_subscription(&mut self, subscription: Subscription) -> bool {
        let key = subscription.key();
        if self.subscriptions.contains_key(&key) {
            return false;
        }
        self.subscriptions.insert(key, subscription);
        true
    }

    pub fn remove_subscription(&mut self, key: &SubscriptionKey) -> Option<Subscription> {
        self.subscriptions.remove(key)
    }

    pub fn subscription(&self, key: &SubscriptionKey) -> Option<&Subscription> {
        self.subscriptions.get(key)
    }

    pub fn subscription_mut(&mut self, key: &SubscriptionKey) -> Option<&mut Subscription> {
        self.subscriptions.get_mut(key)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Drops every subscription, returning how many there were.
    pub fn clear_subscriptions(&mut self) -> usize {
        let count = self.subscriptions.len();
        self.subscriptions.clear();
        count
    }

    /// Updates the send failure counter and returns its new value.
    pub fn record_send(&mut self, ok: bool) -> u32 {
        if ok {
            self.consecutive_send_failures = 0;
        } else {
            self.consecutive_send_failures += 1;
        }
        self.consecutive_send_failures
    }
}
