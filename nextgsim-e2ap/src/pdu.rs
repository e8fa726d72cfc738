//! E2AP PDU structure
//!
//! `E2apPdu` is a CHOICE of the three message categories. Each category in
//! turn is a CHOICE over the message bodies legal for it, keyed on the wire by
//! the procedure code.

use std::fmt;

use crate::codec::Result;
use crate::ies::{Criticality, ProtocolIeContainer};
use crate::messages::*;

/// E2AP elementary procedure code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcedureCode(pub u8);

impl ProcedureCode {
    pub const E2_SETUP: Self = Self(1);
    pub const ERROR_INDICATION: Self = Self(2);
    pub const RESET: Self = Self(3);
    pub const RIC_CONTROL: Self = Self(4);
    pub const RIC_INDICATION: Self = Self(5);
    pub const RIC_SERVICE_QUERY: Self = Self(6);
    pub const RIC_SERVICE_UPDATE: Self = Self(7);
    pub const RIC_SUBSCRIPTION: Self = Self(8);
    pub const RIC_SUBSCRIPTION_DELETE: Self = Self(9);
    pub const E2_NODE_CONFIGURATION_UPDATE: Self = Self(10);
    pub const E2_CONNECTION_UPDATE: Self = Self(11);
    pub const RIC_SUBSCRIPTION_DELETE_REQUIRED: Self = Self(12);
    pub const E2_REMOVAL: Self = Self(13);
    pub const RIC_SUBSCRIPTION_MODIFICATION: Self = Self(14);
    pub const RIC_SUBSCRIPTION_MODIFICATION_REQUIRED: Self = Self(15);

    /// Procedure criticality used when this node originates the procedure.
    ///
    /// Class 2 procedures (no response expected) are sent with `Ignore`.
    pub fn default_criticality(self) -> Criticality {
        match self {
            Self::ERROR_INDICATION | Self::RIC_INDICATION | Self::RIC_SERVICE_QUERY => {
                Criticality::Ignore
            }
            _ => Criticality::Reject,
        }
    }
}

impl fmt::Display for ProcedureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares a message category CHOICE together with its procedure code
/// mapping.
macro_rules! message_category {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident($ty:ty) = $code:ident ),+ $(,)?
        }
    ) => {
        crate::choice! {
            $(#[$meta])*
            pub enum $name {
                $( $variant($ty) ),+
            }
        }

        impl $name {
            /// Procedure code of the active message.
            pub fn procedure_code(&self) -> ProcedureCode {
                match self {
                    $( $name::$variant(_) => ProcedureCode::$code, )+
                }
            }

            /// Name of the active message.
            pub fn message_name(&self) -> &'static str {
                match self {
                    $( $name::$variant(_) => <$ty as E2apMessage>::NAME, )+
                }
            }

            pub fn to_ies(&self) -> Result<ProtocolIeContainer> {
                match self {
                    $( $name::$variant(msg) => msg.to_ies(), )+
                }
            }

            /// Decodes the message body for `code`, or `None` if the
            /// procedure has no message in this category.
            pub fn from_ies(code: ProcedureCode, ies: &ProtocolIeContainer) -> Result<Option<Self>> {
                $(
                    if code == ProcedureCode::$code {
                        return <$ty as E2apMessage>::from_ies(ies).map(|msg| Some($name::$variant(msg)));
                    }
                )+
                Ok(None)
            }
        }
    };
}

message_category! {
    /// InitiatingMessage value
    #[derive(Debug, Clone, PartialEq)]
    pub enum InitiatingMessageValue {
        E2SetupRequest(E2SetupRequest) = E2_SETUP,
        ErrorIndication(ErrorIndication) = ERROR_INDICATION,
        ResetRequest(ResetRequest) = RESET,
        RicControlRequest(RicControlRequest) = RIC_CONTROL,
        RicIndication(RicIndication) = RIC_INDICATION,
        RicServiceQuery(RicServiceQuery) = RIC_SERVICE_QUERY,
        RicServiceUpdate(RicServiceUpdate) = RIC_SERVICE_UPDATE,
        RicSubscriptionRequest(RicSubscriptionRequest) = RIC_SUBSCRIPTION,
        RicSubscriptionDeleteRequest(RicSubscriptionDeleteRequest) = RIC_SUBSCRIPTION_DELETE,
        E2NodeConfigurationUpdate(E2NodeConfigurationUpdate) = E2_NODE_CONFIGURATION_UPDATE,
        E2ConnectionUpdate(E2ConnectionUpdate) = E2_CONNECTION_UPDATE,
        E2RemovalRequest(E2RemovalRequest) = E2_REMOVAL,
        RicSubscriptionModificationRequest(RicSubscriptionModificationRequest) =
            RIC_SUBSCRIPTION_MODIFICATION,
        RicSubscriptionModificationRequired(RicSubscriptionModificationRequired) =
            RIC_SUBSCRIPTION_MODIFICATION_REQUIRED,
    }
}

message_category! {
    /// SuccessfulOutcome value
    #[derive(Debug, Clone, PartialEq)]
    pub enum SuccessfulOutcomeValue {
        E2SetupResponse(E2SetupResponse) = E2_SETUP,
        ResetResponse(ResetResponse) = RESET,
        RicControlAcknowledge(RicControlAcknowledge) = RIC_CONTROL,
        RicServiceUpdateAcknowledge(RicServiceUpdateAcknowledge) = RIC_SERVICE_UPDATE,
        RicSubscriptionResponse(RicSubscriptionResponse) = RIC_SUBSCRIPTION,
        RicSubscriptionDeleteResponse(RicSubscriptionDeleteResponse) = RIC_SUBSCRIPTION_DELETE,
        E2NodeConfigurationUpdateAcknowledge(E2NodeConfigurationUpdateAcknowledge) =
            E2_NODE_CONFIGURATION_UPDATE,
        E2ConnectionUpdateAcknowledge(E2ConnectionUpdateAcknowledge) = E2_CONNECTION_UPDATE,
        E2RemovalResponse(E2RemovalResponse) = E2_REMOVAL,
        RicSubscriptionModificationResponse(RicSubscriptionModificationResponse) =
            RIC_SUBSCRIPTION_MODIFICATION,
        RicSubscriptionModificationConfirm(RicSubscriptionModificationConfirm) =
            RIC_SUBSCRIPTION_MODIFICATION_REQUIRED,
    }
}

message_category! {
    /// UnsuccessfulOutcome value
    #[derive(Debug, Clone, PartialEq)]
    pub enum UnsuccessfulOutcomeValue {
        E2SetupFailure(E2SetupFailure) = E2_SETUP,
        RicControlFailure(RicControlFailure) = RIC_CONTROL,
        RicServiceUpdateFailure(RicServiceUpdateFailure) = RIC_SERVICE_UPDATE,
        RicSubscriptionFailure(RicSubscriptionFailure) = RIC_SUBSCRIPTION,
        RicSubscriptionDeleteFailure(RicSubscriptionDeleteFailure) = RIC_SUBSCRIPTION_DELETE,
        E2NodeConfigurationUpdateFailure(E2NodeConfigurationUpdateFailure) =
            E2_NODE_CONFIGURATION_UPDATE,
        E2ConnectionUpdateFailure(E2ConnectionUpdateFailure) = E2_CONNECTION_UPDATE,
        E2RemovalFailure(E2RemovalFailure) = E2_REMOVAL,
        RicSubscriptionModificationFailure(RicSubscriptionModificationFailure) =
            RIC_SUBSCRIPTION_MODIFICATION,
        RicSubscriptionModificationRefuse(RicSubscriptionModificationRefuse) =
            RIC_SUBSCRIPTION_MODIFICATION_REQUIRED,
    }
}

/// Declares a category wrapper struct carrying criticality and value.
macro_rules! category_struct {
    ($(#[$meta:meta])* $name:ident, $value:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            pub criticality: Criticality,
            pub value: $value,
        }

        impl $name {
            /// Wraps `value` with the default criticality of its procedure.
            pub fn new(value: impl Into<$value>) -> Self {
                let value = value.into();
                Self {
                    criticality: value.procedure_code().default_criticality(),
                    value,
                }
            }

            pub fn procedure_code(&self) -> ProcedureCode {
                self.value.procedure_code()
            }
        }
    };
}

category_struct!(
    /// InitiatingMessage
    InitiatingMessage,
    InitiatingMessageValue
);
category_struct!(
    /// SuccessfulOutcome
    SuccessfulOutcome,
    SuccessfulOutcomeValue
);
category_struct!(
    /// UnsuccessfulOutcome
    UnsuccessfulOutcome,
    UnsuccessfulOutcomeValue
);

crate::choice! {
    /// E2AP-PDU
    #[derive(Debug, Clone, PartialEq)]
    pub enum E2apPdu {
        InitiatingMessage(InitiatingMessage),
        SuccessfulOutcome(SuccessfulOutcome),
        UnsuccessfulOutcome(UnsuccessfulOutcome),
    }
}

impl E2apPdu {
    /// Procedure code of the carried message.
    pub fn procedure_code(&self) -> ProcedureCode {
        match self {
            E2apPdu::InitiatingMessage(msg) => msg.procedure_code(),
            E2apPdu::SuccessfulOutcome(msg) => msg.procedure_code(),
            E2apPdu::UnsuccessfulOutcome(msg) => msg.procedure_code(),
        }
    }

    /// Name of the carried message, for logging.
    pub fn message_name(&self) -> &'static str {
        match self {
            E2apPdu::InitiatingMessage(msg) => msg.value.message_name(),
            E2apPdu::SuccessfulOutcome(msg) => msg.value.message_name(),
            E2apPdu::UnsuccessfulOutcome(msg) => msg.value.message_name(),
        }
    }

    /// Wraps a message into an initiating message PDU.
    pub fn initiating(value: impl Into<InitiatingMessageValue>) -> Self {
        E2apPdu::InitiatingMessage(InitiatingMessage::new(value))
    }

    /// Wraps a message into a successful outcome PDU.
    pub fn successful(value: impl Into<SuccessfulOutcomeValue>) -> Self {
        E2apPdu::SuccessfulOutcome(SuccessfulOutcome::new(value))
    }

    /// Wraps a message into an unsuccessful outcome PDU.
    pub fn unsuccessful(value: impl Into<UnsuccessfulOutcomeValue>) -> Self {
        E2apPdu::UnsuccessfulOutcome(UnsuccessfulOutcome::new(value))
    }
}
