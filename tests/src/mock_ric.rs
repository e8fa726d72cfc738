//! Mock Near-RT RIC for integration testing
//!
//! Wraps the RIC side of a loopback association. Everything the agent sends
//! is decoded and reported as a [`MockRicEvent`]; helper methods build and
//! send the RIC initiated procedures.

use std::time::Duration;

use bytes::Bytes;
use nextgsim_e2agent::RicPeer;
use nextgsim_e2ap::ies::{
    Cause, GlobalE2NodeId, GlobalRicId, RanFunctionId, RanFunctionIdItem, RicActionId,
    RicActionToBeSetupItem, RicActionType, RicRequestId, RicSubscriptionDetails, TimeToWait,
    TransactionId,
};
use nextgsim_e2ap::messages::{
    E2SetupFailure, E2SetupResponse, ResetRequest, ResetResponse, RicSubscriptionDeleteRequest,
    RicSubscriptionModificationRequest, RicSubscriptionRequest,
};
use nextgsim_e2ap::{
    decode_e2ap_pdu, encode_e2ap_pdu, E2apPdu, InitiatingMessageValue, SuccessfulOutcomeValue,
    UnsuccessfulOutcomeValue,
};
use thiserror::Error;

use crate::test_fixtures::test_global_ric_id;
use crate::test_utils::{DEFAULT_TEST_TIMEOUT, QUIET_PERIOD};

/// Mock RIC errors
#[derive(Debug, Error)]
pub enum MockRicError {
    #[error("Nothing received within {0:?}")]
    Timeout(Duration),
    #[error("Agent closed the association")]
    Closed,
    #[error("E2AP encoding error: {0}")]
    Encode(String),
    #[error("E2AP decoding error: {0}")]
    Decode(String),
    #[error("Agent did not accept the datagram")]
    NotDelivered,
}

/// Messages received from the agent
#[derive(Debug, Clone, PartialEq)]
pub enum MockRicEvent {
    SetupRequest {
        transaction_id: TransactionId,
        node_id: GlobalE2NodeId,
        ran_functions: Vec<RanFunctionId>,
    },
    ResetRequest {
        transaction_id: TransactionId,
        cause: Cause,
    },
    ResetResponse {
        transaction_id: TransactionId,
    },
    SubscriptionResponse {
        ric_request_id: RicRequestId,
        admitted: Vec<RicActionId>,
    },
    SubscriptionFailure {
        ric_request_id: RicRequestId,
        cause: Cause,
    },
    SubscriptionDeleteResponse {
        ric_request_id: RicRequestId,
    },
    SubscriptionDeleteFailure {
        ric_request_id: RicRequestId,
        cause: Cause,
    },
    ModificationResponse {
        ric_request_id: RicRequestId,
        removed: Vec<RicActionId>,
        added: Vec<RicActionId>,
        refused: usize,
    },
    ModificationFailure {
        ric_request_id: RicRequestId,
        cause: Cause,
    },
    /// Any other message, by name
    Other(&'static str),
}

/// Mock RIC configuration
#[derive(Debug, Clone)]
pub struct MockRicConfig {
    /// Identity reported in E2 Setup Response
    pub global_ric_id: GlobalRicId,
    /// Answer every E2 Setup Request with a response
    pub auto_setup_response: bool,
    /// Wait used by [`MockRic::next_event`]
    pub receive_timeout: Duration,
}

impl Default for MockRicConfig {
    fn default() -> Self {
        Self {
            global_ric_id: test_global_ric_id(),
            auto_setup_response: true,
            receive_timeout: DEFAULT_TEST_TIMEOUT,
        }
    }
}

/// Mock Near-RT RIC
pub struct MockRic {
    peer: RicPeer,
    config: MockRicConfig,
    setup_requests: u32,
}

impl MockRic {
    pub fn new(peer: RicPeer) -> Self {
        Self::with_config(peer, MockRicConfig::default())
    }

    pub fn with_config(peer: RicPeer, config: MockRicConfig) -> Self {
        Self {
            peer,
            config,
            setup_requests: 0,
        }
    }

    /// E2 Setup Requests received so far
    pub fn setup_requests(&self) -> u32 {
        self.setup_requests
    }

    pub fn peer(&self) -> &RicPeer {
        &self.peer
    }

    /// Waits for the next message from the agent.
    pub async fn next_event(&mut self) -> Result<MockRicEvent, MockRicError> {
        self.next_event_within(self.config.receive_timeout).await
    }

    /// Waits at most `wait` for the next message from the agent.
    pub async fn next_event_within(&mut self, wait: Duration) -> Result<MockRicEvent, MockRicError> {
        let bytes = match tokio::time::timeout(wait, self.peer.recv()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Err(MockRicError::Closed),
            Err(_) => return Err(MockRicError::Timeout(wait)),
        };
        let pdu = decode_e2ap_pdu(&bytes).map_err(|e| MockRicError::Decode(e.to_string()))?;
        tracing::debug!("[RIC] <- {}", pdu.message_name());

        let event = classify(pdu);
        if let MockRicEvent::SetupRequest { transaction_id, .. } = &event {
            self.setup_requests += 1;
            if self.config.auto_setup_response {
                self.send_setup_response(*transaction_id)?;
            }
        }
        Ok(event)
    }

    /// Returns true if the agent sends nothing for a short while.
    pub async fn expect_silence(&mut self) -> bool {
        matches!(
            self.next_event_within(QUIET_PERIOD).await,
            Err(MockRicError::Timeout(_))
        )
    }

    pub fn send_pdu(&self, pdu: &E2apPdu) -> Result<(), MockRicError> {
        tracing::debug!("[RIC] -> {}", pdu.message_name());
        let bytes = encode_e2ap_pdu(pdu).map_err(|e| MockRicError::Encode(e.to_string()))?;
        self.send_raw(bytes)
    }

    pub fn send_raw(&self, payload: impl Into<Bytes>) -> Result<(), MockRicError> {
        if self.peer.send(payload) {
            Ok(())
        } else {
            Err(MockRicError::NotDelivered)
        }
    }

    pub fn send_setup_response(&self, transaction_id: TransactionId) -> Result<(), MockRicError> {
        self.send_pdu(&E2apPdu::successful(E2SetupResponse {
            transaction_id,
            global_ric_id: self.config.global_ric_id,
            ran_functions_accepted: Some(
                crate::test_fixtures::test_ran_function_ids()
                    .into_iter()
                    .map(|id| RanFunctionIdItem { id, revision: 1 })
                    .collect(),
            ),
            ran_functions_rejected: None,
            component_config_addition_ack: Vec::new(),
        }))
    }

    pub fn send_setup_failure(
        &self,
        transaction_id: TransactionId,
        cause: Cause,
        time_to_wait: Option<TimeToWait>,
    ) -> Result<(), MockRicError> {
        self.send_pdu(&E2apPdu::unsuccessful(E2SetupFailure {
            transaction_id,
            cause,
            time_to_wait,
            criticality_diagnostics: None,
        }))
    }

    pub fn subscribe(
        &self,
        ric_request_id: RicRequestId,
        ran_function_id: RanFunctionId,
        actions: &[u8],
    ) -> Result<(), MockRicError> {
        self.send_pdu(&E2apPdu::initiating(RicSubscriptionRequest {
            ric_request_id,
            ran_function_id,
            subscription_details: RicSubscriptionDetails {
                event_trigger_definition: Bytes::from_static(&[0x01, 0x00]),
                actions: actions.iter().map(|&id| report_action(id)).collect(),
            },
        }))
    }

    pub fn delete_subscription(
        &self,
        ric_request_id: RicRequestId,
        ran_function_id: RanFunctionId,
    ) -> Result<(), MockRicError> {
        self.send_pdu(&E2apPdu::initiating(RicSubscriptionDeleteRequest {
            ric_request_id,
            ran_function_id,
        }))
    }

    pub fn modify_subscription(
        &self,
        ric_request_id: RicRequestId,
        ran_function_id: RanFunctionId,
        remove: &[u8],
        add: &[u8],
    ) -> Result<(), MockRicError> {
        self.send_pdu(&E2apPdu::initiating(RicSubscriptionModificationRequest {
            ric_request_id,
            ran_function_id,
            actions_to_remove: (!remove.is_empty())
                .then(|| remove.iter().map(|&id| RicActionId(id)).collect()),
            actions_to_add: (!add.is_empty())
                .then(|| add.iter().map(|&id| report_action(id)).collect()),
        }))
    }

    pub fn send_reset_request(
        &self,
        transaction_id: TransactionId,
        cause: Cause,
    ) -> Result<(), MockRicError> {
        self.send_pdu(&E2apPdu::initiating(ResetRequest {
            transaction_id,
            cause,
        }))
    }

    pub fn send_reset_response(&self, transaction_id: TransactionId) -> Result<(), MockRicError> {
        self.send_pdu(&E2apPdu::successful(ResetResponse {
            transaction_id,
            criticality_diagnostics: None,
        }))
    }

    /// Simulates loss of the SCTP association.
    pub fn drop_association(&self, reason: &str) -> Result<(), MockRicError> {
        if self.peer.drop_association(reason) {
            Ok(())
        } else {
            Err(MockRicError::NotDelivered)
        }
    }
}

fn report_action(id: u8) -> RicActionToBeSetupItem {
    RicActionToBeSetupItem {
        action_id: RicActionId(id),
        action_type: RicActionType::Report,
        action_definition: Some(Bytes::from_static(&[0x00])),
    }
}

fn classify(pdu: E2apPdu) -> MockRicEvent {
    match pdu {
        E2apPdu::InitiatingMessage(msg) => match msg.value {
            InitiatingMessageValue::E2SetupRequest(req) => MockRicEvent::SetupRequest {
                transaction_id: req.transaction_id,
                node_id: req.global_e2_node_id,
                ran_functions: req.ran_functions_added.iter().map(|f| f.id).collect(),
            },
            InitiatingMessageValue::ResetRequest(req) => MockRicEvent::ResetRequest {
                transaction_id: req.transaction_id,
                cause: req.cause,
            },
            other => MockRicEvent::Other(other.message_name()),
        },
        E2apPdu::SuccessfulOutcome(msg) => match msg.value {
            SuccessfulOutcomeValue::ResetResponse(rsp) => MockRicEvent::ResetResponse {
                transaction_id: rsp.transaction_id,
            },
            SuccessfulOutcomeValue::RicSubscriptionResponse(rsp) => {
                MockRicEvent::SubscriptionResponse {
                    ric_request_id: rsp.ric_request_id,
                    admitted: rsp.actions_admitted,
                }
            }
            SuccessfulOutcomeValue::RicSubscriptionDeleteResponse(rsp) => {
                MockRicEvent::SubscriptionDeleteResponse {
                    ric_request_id: rsp.ric_request_id,
                }
            }
            SuccessfulOutcomeValue::RicSubscriptionModificationResponse(rsp) => {
                MockRicEvent::ModificationResponse {
                    ric_request_id: rsp.ric_request_id,
                    removed: rsp.actions_removed.unwrap_or_default(),
                    added: rsp.actions_added.unwrap_or_default(),
                    refused: rsp.actions_failed_to_remove.map_or(0, |v| v.len())
                        + rsp.actions_failed_to_add.map_or(0, |v| v.len()),
                }
            }
            other => MockRicEvent::Other(other.message_name()),
        },
        E2apPdu::UnsuccessfulOutcome(msg) => match msg.value {
            UnsuccessfulOutcomeValue::RicSubscriptionFailure(rsp) => {
                MockRicEvent::SubscriptionFailure {
                    ric_request_id: rsp.ric_request_id,
                    cause: rsp.cause,
                }
            }
            UnsuccessfulOutcomeValue::RicSubscriptionDeleteFailure(rsp) => {
                MockRicEvent::SubscriptionDeleteFailure {
                    ric_request_id: rsp.ric_request_id,
                    cause: rsp.cause,
                }
            }
            UnsuccessfulOutcomeValue::RicSubscriptionModificationFailure(rsp) => {
                MockRicEvent::ModificationFailure {
                    ric_request_id: rsp.ric_request_id,
                    cause: rsp.cause,
                }
            }
            other => MockRicEvent::Other(other.message_name()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nextgsim_e2ap::ies::CauseMisc;

    #[test]
    fn test_classify_reset_request() {
        let pdu = E2apPdu::initiating(ResetRequest {
            transaction_id: TransactionId(9),
            cause: Cause::from(CauseMisc::OmIntervention),
        });
        assert_eq!(
            classify(pdu),
            MockRicEvent::ResetRequest {
                transaction_id: TransactionId(9),
                cause: Cause::from(CauseMisc::OmIntervention),
            }
        );
    }

    #[test]
    fn test_classify_other() {
        let pdu = E2apPdu::successful(E2SetupResponse {
            transaction_id: TransactionId(0),
            global_ric_id: test_global_ric_id(),
            ran_functions_accepted: None,
            ran_functions_rejected: None,
            component_config_addition_ack: Vec::new(),
        });
        assert_eq!(classify(pdu), MockRicEvent::Other("E2SetupResponse"));
    }
}
