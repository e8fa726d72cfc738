//! E2AP message bodies
//!
//! One struct per elementary procedure message. Every message is a protocol
//! IE container on the wire; [`E2apMessage`] converts between the typed
//! struct and its [`ProtocolIeContainer`].

use bytes::Bytes;

use crate::codec::Result;
use crate::ies::{
    ie_id, Cause, Criticality, CriticalityDiagnostics, E2ConnectionSetupFailedItem,
    E2ConnectionUpdateItem, E2NodeComponentConfigAckItem, E2NodeComponentConfigAdditionItem,
    GlobalE2NodeId, GlobalRicId, ProtocolIeContainer, RanFunctionId, RanFunctionIdCauseItem,
    RanFunctionIdItem, RanFunctionItem, RicActionId, RicActionNotAdmittedItem,
    RicActionToBeSetupItem, RicControlAckRequest, RicIndicationSn, RicIndicationType,
    RicRequestId, RicSubscriptionDetails, TimeToWait, TnlInformation, TransactionId,
};

/// Conversion between a message body and its protocol IE container.
pub trait E2apMessage: Sized {
    /// Message name, used in logs and decode errors.
    const NAME: &'static str;

    fn to_ies(&self) -> Result<ProtocolIeContainer>;
    fn from_ies(ies: &ProtocolIeContainer) -> Result<Self>;
}

/// Declares a message struct from its IE table.
///
/// Each field is `name: mandatory|optional Type = (ie id, criticality)`;
/// optional fields are stored as `Option<Type>`.
macro_rules! e2ap_message {
    (@ty mandatory $ty:ty) => { $ty };
    (@ty optional $ty:ty) => { Option<$ty> };

    (@push mandatory $ies:ident, $value:expr, $id:expr, $crit:ident) => {
        $ies.push($id, Criticality::$crit, &$value)?;
    };
    (@push optional $ies:ident, $value:expr, $id:expr, $crit:ident) => {
        if let Some(value) = &$value {
            $ies.push($id, Criticality::$crit, value)?;
        }
    };

    (@get mandatory $ies:ident, $ty:ty, $id:expr) => {
        $ies.get::<$ty>(<Self as E2apMessage>::NAME, $id)?
    };
    (@get optional $ies:ident, $ty:ty, $id:expr) => {
        $ies.get_optional::<$ty>($id)?
    };

    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident: $presence:ident $ty:ty = ($id:expr, $crit:ident)
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: e2ap_message!(@ty $presence $ty),
            )*
        }

        impl E2apMessage for $name {
            const NAME: &'static str = stringify!($name);

            #[allow(unused_mut)]
            fn to_ies(&self) -> Result<ProtocolIeContainer> {
                let mut ies = ProtocolIeContainer::new();
                $( e2ap_message!(@push $presence ies, self.$field, $id, $crit); )*
                Ok(ies)
            }

            #[allow(unused_variables)]
            fn from_ies(ies: &ProtocolIeContainer) -> Result<Self> {
                Ok(Self {
                    $( $field: e2ap_message!(@get $presence ies, $ty, $id), )*
                })
            }
        }
    };
}

// ============================================================================
// Global procedures
// ============================================================================

e2ap_message! {
    /// E2 SETUP REQUEST (E2 node -> RIC)
    pub struct E2SetupRequest {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        global_e2_node_id: mandatory GlobalE2NodeId = (ie_id::GLOBAL_E2_NODE_ID, Reject),
        ran_functions_added: mandatory Vec<RanFunctionItem> = (ie_id::RAN_FUNCTIONS_ADDED, Reject),
        component_config_addition: mandatory Vec<E2NodeComponentConfigAdditionItem> =
            (ie_id::E2_NODE_COMPONENT_CONFIG_ADDITION, Reject),
    }
}

e2ap_message! {
    /// E2 SETUP RESPONSE (RIC -> E2 node)
    pub struct E2SetupResponse {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        global_ric_id: mandatory GlobalRicId = (ie_id::GLOBAL_RIC_ID, Reject),
        ran_functions_accepted: optional Vec<RanFunctionIdItem> =
            (ie_id::RAN_FUNCTIONS_ACCEPTED, Reject),
        ran_functions_rejected: optional Vec<RanFunctionIdCauseItem> =
            (ie_id::RAN_FUNCTIONS_REJECTED, Reject),
        component_config_addition_ack: mandatory Vec<E2NodeComponentConfigAckItem> =
            (ie_id::E2_NODE_COMPONENT_CONFIG_ADDITION_ACK, Reject),
    }
}

e2ap_message! {
    /// E2 SETUP FAILURE (RIC -> E2 node)
    pub struct E2SetupFailure {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        cause: mandatory Cause = (ie_id::CAUSE, Ignore),
        time_to_wait: optional TimeToWait = (ie_id::TIME_TO_WAIT, Ignore),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// ERROR INDICATION (both directions)
    pub struct ErrorIndication {
        transaction_id: optional TransactionId = (ie_id::TRANSACTION_ID, Reject),
        ric_request_id: optional RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: optional RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        cause: optional Cause = (ie_id::CAUSE, Ignore),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// RESET REQUEST (both directions)
    pub struct ResetRequest {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        cause: mandatory Cause = (ie_id::CAUSE, Ignore),
    }
}

e2ap_message! {
    /// RESET RESPONSE (both directions)
    pub struct ResetResponse {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// RIC SERVICE QUERY (RIC -> E2 node)
    pub struct RicServiceQuery {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        ran_functions_accepted: optional Vec<RanFunctionIdItem> =
            (ie_id::RAN_FUNCTIONS_ACCEPTED, Reject),
    }
}

e2ap_message! {
    /// RIC SERVICE UPDATE (E2 node -> RIC)
    pub struct RicServiceUpdate {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        ran_functions_added: optional Vec<RanFunctionItem> = (ie_id::RAN_FUNCTIONS_ADDED, Reject),
        ran_functions_modified: optional Vec<RanFunctionItem> =
            (ie_id::RAN_FUNCTIONS_MODIFIED, Reject),
        ran_functions_deleted: optional Vec<RanFunctionIdItem> =
            (ie_id::RAN_FUNCTIONS_DELETED, Reject),
    }
}

e2ap_message! {
    /// RIC SERVICE UPDATE ACKNOWLEDGE
    pub struct RicServiceUpdateAcknowledge {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        ran_functions_accepted: optional Vec<RanFunctionIdItem> =
            (ie_id::RAN_FUNCTIONS_ACCEPTED, Reject),
        ran_functions_rejected: optional Vec<RanFunctionIdCauseItem> =
            (ie_id::RAN_FUNCTIONS_REJECTED, Reject),
    }
}

e2ap_message! {
    /// RIC SERVICE UPDATE FAILURE
    pub struct RicServiceUpdateFailure {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        cause: mandatory Cause = (ie_id::CAUSE, Reject),
        time_to_wait: optional TimeToWait = (ie_id::TIME_TO_WAIT, Ignore),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// E2 NODE CONFIGURATION UPDATE (E2 node -> RIC)
    pub struct E2NodeConfigurationUpdate {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        global_e2_node_id: optional GlobalE2NodeId = (ie_id::GLOBAL_E2_NODE_ID, Reject),
        component_config_addition: optional Vec<E2NodeComponentConfigAdditionItem> =
            (ie_id::E2_NODE_COMPONENT_CONFIG_ADDITION, Reject),
    }
}

e2ap_message! {
    /// E2 NODE CONFIGURATION UPDATE ACKNOWLEDGE
    pub struct E2NodeConfigurationUpdateAcknowledge {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        component_config_addition_ack: optional Vec<E2NodeComponentConfigAckItem> =
            (ie_id::E2_NODE_COMPONENT_CONFIG_ADDITION_ACK, Reject),
    }
}

e2ap_message! {
    /// E2 NODE CONFIGURATION UPDATE FAILURE
    pub struct E2NodeConfigurationUpdateFailure {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        cause: mandatory Cause = (ie_id::CAUSE, Ignore),
        time_to_wait: optional TimeToWait = (ie_id::TIME_TO_WAIT, Ignore),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// E2 CONNECTION UPDATE (RIC -> E2 node)
    pub struct E2ConnectionUpdate {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        add: optional Vec<E2ConnectionUpdateItem> = (ie_id::E2_CONNECTION_UPDATE_ADD, Reject),
        remove: optional Vec<TnlInformation> = (ie_id::E2_CONNECTION_UPDATE_REMOVE, Reject),
        modify: optional Vec<E2ConnectionUpdateItem> =
            (ie_id::E2_CONNECTION_UPDATE_MODIFY, Reject),
    }
}

e2ap_message! {
    /// E2 CONNECTION UPDATE ACKNOWLEDGE
    pub struct E2ConnectionUpdateAcknowledge {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        setup: optional Vec<E2ConnectionUpdateItem> = (ie_id::E2_CONNECTION_SETUP, Reject),
        setup_failed: optional Vec<E2ConnectionSetupFailedItem> =
            (ie_id::E2_CONNECTION_SETUP_FAILED, Reject),
    }
}

e2ap_message! {
    /// E2 CONNECTION UPDATE FAILURE
    pub struct E2ConnectionUpdateFailure {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        cause: optional Cause = (ie_id::CAUSE, Reject),
        time_to_wait: optional TimeToWait = (ie_id::TIME_TO_WAIT, Ignore),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// E2 REMOVAL REQUEST (both directions)
    pub struct E2RemovalRequest {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
    }
}

e2ap_message! {
    /// E2 REMOVAL RESPONSE
    pub struct E2RemovalResponse {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// E2 REMOVAL FAILURE
    pub struct E2RemovalFailure {
        transaction_id: mandatory TransactionId = (ie_id::TRANSACTION_ID, Reject),
        cause: mandatory Cause = (ie_id::CAUSE, Ignore),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

// ============================================================================
// RIC functional procedures
// ============================================================================

e2ap_message! {
    /// RIC SUBSCRIPTION REQUEST (RIC -> E2 node)
    pub struct RicSubscriptionRequest {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        subscription_details: mandatory RicSubscriptionDetails =
            (ie_id::RIC_SUBSCRIPTION_DETAILS, Reject),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION RESPONSE
    pub struct RicSubscriptionResponse {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        actions_admitted: mandatory Vec<RicActionId> = (ie_id::RIC_ACTIONS_ADMITTED, Reject),
        actions_not_admitted: optional Vec<RicActionNotAdmittedItem> =
            (ie_id::RIC_ACTIONS_NOT_ADMITTED, Reject),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION FAILURE
    pub struct RicSubscriptionFailure {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        cause: mandatory Cause = (ie_id::CAUSE, Reject),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION DELETE REQUEST (RIC -> E2 node)
    pub struct RicSubscriptionDeleteRequest {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION DELETE RESPONSE
    pub struct RicSubscriptionDeleteResponse {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION DELETE FAILURE
    pub struct RicSubscriptionDeleteFailure {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        cause: mandatory Cause = (ie_id::CAUSE, Ignore),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION MODIFICATION REQUEST (RIC -> E2 node)
    pub struct RicSubscriptionModificationRequest {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        actions_to_remove: optional Vec<RicActionId> =
            (ie_id::RIC_ACTIONS_TO_BE_REMOVED_FOR_MODIFICATION, Ignore),
        actions_to_add: optional Vec<RicActionToBeSetupItem> =
            (ie_id::RIC_ACTIONS_TO_BE_ADDED_FOR_MODIFICATION, Ignore),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION MODIFICATION RESPONSE
    pub struct RicSubscriptionModificationResponse {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        actions_removed: optional Vec<RicActionId> =
            (ie_id::RIC_ACTIONS_REMOVED_FOR_MODIFICATION, Ignore),
        actions_failed_to_remove: optional Vec<RicActionNotAdmittedItem> =
            (ie_id::RIC_ACTIONS_FAILED_TO_BE_REMOVED_FOR_MODIFICATION, Ignore),
        actions_added: optional Vec<RicActionId> =
            (ie_id::RIC_ACTIONS_ADDED_FOR_MODIFICATION, Ignore),
        actions_failed_to_add: optional Vec<RicActionNotAdmittedItem> =
            (ie_id::RIC_ACTIONS_FAILED_TO_BE_ADDED_FOR_MODIFICATION, Ignore),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION MODIFICATION FAILURE
    pub struct RicSubscriptionModificationFailure {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        cause: mandatory Cause = (ie_id::CAUSE, Reject),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION MODIFICATION REQUIRED (E2 node -> RIC)
    pub struct RicSubscriptionModificationRequired {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        actions_to_modify: optional Vec<RicActionId> =
            (ie_id::RIC_ACTIONS_REQUIRED_TO_BE_MODIFIED, Ignore),
        actions_to_remove: optional Vec<RicActionNotAdmittedItem> =
            (ie_id::RIC_ACTIONS_REQUIRED_TO_BE_REMOVED, Ignore),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION MODIFICATION CONFIRM
    pub struct RicSubscriptionModificationConfirm {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        actions_confirmed_for_modification: optional Vec<RicActionId> =
            (ie_id::RIC_ACTIONS_CONFIRMED_FOR_MODIFICATION, Ignore),
        actions_confirmed_for_removal: optional Vec<RicActionId> =
            (ie_id::RIC_ACTIONS_CONFIRMED_FOR_REMOVAL, Ignore),
    }
}

e2ap_message! {
    /// RIC SUBSCRIPTION MODIFICATION REFUSE
    pub struct RicSubscriptionModificationRefuse {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        cause: mandatory Cause = (ie_id::CAUSE, Reject),
        criticality_diagnostics: optional CriticalityDiagnostics =
            (ie_id::CRITICALITY_DIAGNOSTICS, Ignore),
    }
}

e2ap_message! {
    /// RIC INDICATION (E2 node -> RIC)
    pub struct RicIndication {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        action_id: mandatory RicActionId = (ie_id::RIC_ACTION_ID, Reject),
        indication_sn: optional RicIndicationSn = (ie_id::RIC_INDICATION_SN, Reject),
        indication_type: mandatory RicIndicationType = (ie_id::RIC_INDICATION_TYPE, Reject),
        indication_header: mandatory Bytes = (ie_id::RIC_INDICATION_HEADER, Reject),
        indication_message: mandatory Bytes = (ie_id::RIC_INDICATION_MESSAGE, Reject),
        call_process_id: optional Bytes = (ie_id::RIC_CALL_PROCESS_ID, Reject),
    }
}

e2ap_message! {
    /// RIC CONTROL REQUEST (RIC -> E2 node)
    pub struct RicControlRequest {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        call_process_id: optional Bytes = (ie_id::RIC_CALL_PROCESS_ID, Reject),
        control_header: mandatory Bytes = (ie_id::RIC_CONTROL_HEADER, Reject),
        control_message: mandatory Bytes = (ie_id::RIC_CONTROL_MESSAGE, Reject),
        control_ack_request: optional RicControlAckRequest =
            (ie_id::RIC_CONTROL_ACK_REQUEST, Reject),
    }
}

e2ap_message! {
    /// RIC CONTROL ACKNOWLEDGE
    pub struct RicControlAcknowledge {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        call_process_id: optional Bytes = (ie_id::RIC_CALL_PROCESS_ID, Reject),
        control_outcome: optional Bytes = (ie_id::RIC_CONTROL_OUTCOME, Reject),
    }
}

e2ap_message! {
    /// RIC CONTROL FAILURE
    pub struct RicControlFailure {
        ric_request_id: mandatory RicRequestId = (ie_id::RIC_REQUEST_ID, Reject),
        ran_function_id: mandatory RanFunctionId = (ie_id::RAN_FUNCTION_ID, Reject),
        call_process_id: optional Bytes = (ie_id::RIC_CALL_PROCESS_ID, Reject),
        cause: mandatory Cause = (ie_id::CAUSE, Ignore),
        control_outcome: optional Bytes = (ie_id::RIC_CONTROL_OUTCOME, Reject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::E2apCodecError;
    use crate::ies::{CauseMisc, CauseRicRequest, GnbNodeId};
    use nextgsim_common::Plmn;

    #[test]
    fn test_message_names() {
        assert_eq!(E2SetupRequest::NAME, "E2SetupRequest");
        assert_eq!(RicSubscriptionDeleteFailure::NAME, "RicSubscriptionDeleteFailure");
    }

    #[test]
    fn test_optional_ies_are_omitted() {
        let failure = E2SetupFailure {
            transaction_id: TransactionId(1),
            cause: Cause::from(CauseMisc::Unspecified),
            time_to_wait: None,
            criticality_diagnostics: None,
        };
        let ies = failure.to_ies().unwrap();
        assert_eq!(ies.len(), 2);
        assert!(ies.find(ie_id::TIME_TO_WAIT).is_none());
        assert_eq!(E2SetupFailure::from_ies(&ies).unwrap(), failure);
    }

    #[test]
    fn test_ie_order_and_criticality() {
        let request = ResetRequest {
            transaction_id: TransactionId(9),
            cause: Cause::from(CauseMisc::OmIntervention),
        };
        let ies = request.to_ies().unwrap();
        let ids: Vec<_> = ies.iter().map(|ie| (ie.id, ie.criticality)).collect();
        assert_eq!(
            ids,
            vec![
                (ie_id::TRANSACTION_ID, Criticality::Reject),
                (ie_id::CAUSE, Criticality::Ignore),
            ]
        );
    }

    #[test]
    fn test_missing_mandatory_ie() {
        let mut ies = ProtocolIeContainer::new();
        ies.push(ie_id::RIC_REQUEST_ID, Criticality::Reject, &RicRequestId::new(1, 1))
            .unwrap();
        assert_eq!(
            RicSubscriptionDeleteRequest::from_ies(&ies),
            Err(E2apCodecError::MissingIe {
                message: "RicSubscriptionDeleteRequest",
                id: ie_id::RAN_FUNCTION_ID,
            })
        );
    }

    #[test]
    fn test_setup_request_ies() {
        let request = E2SetupRequest {
            transaction_id: TransactionId(0),
            global_e2_node_id: GlobalE2NodeId::from(GnbNodeId {
                plmn: Plmn::new(1, 1, false),
                gnb_id: 1,
                gnb_id_len: 22,
                gnb_cu_up_id: None,
                gnb_du_id: None,
            }),
            ran_functions_added: vec![RanFunctionItem {
                id: RanFunctionId(2),
                definition: Bytes::from_static(&[0x20, 0x43]),
                revision: 1,
                oid: "1.3.6.1.4.1.53148.1.2.2.2".into(),
            }],
            component_config_addition: Vec::new(),
        };
        let ies = request.to_ies().unwrap();
        assert_eq!(ies.len(), 4);
        assert_eq!(E2SetupRequest::from_ies(&ies).unwrap(), request);
    }

    #[test]
    fn test_encode_failure_propagates() {
        let failure = RicSubscriptionFailure {
            ric_request_id: RicRequestId::new(1, 1),
            ran_function_id: RanFunctionId(5000),
            cause: Cause::from(CauseRicRequest::RanFunctionIdInvalid),
            criticality_diagnostics: None,
        };
        assert!(matches!(
            failure.to_ies(),
            Err(E2apCodecError::ValueOutOfRange { value: 5000, .. })
        ));
    }
}
