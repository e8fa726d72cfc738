//! E2AP information elements
//!
//! Protocol IE containers and the IE value types carried by the E2AP
//! messages in [`crate::messages`]. Each value type implements [`IeValue`],
//! which gives its byte-aligned PER encoding.

use bytes::Bytes;
use nextgsim_common::Plmn;

use crate::choice::{Alternative, Choice};
use crate::codec::{E2apCodecError, Result};
use crate::per::{PerDecoder, PerEncoder};

/// Value that can be carried inside a protocol IE or an IE list item.
pub trait IeValue: Sized {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()>;
    fn decode(dec: &mut PerDecoder) -> Result<Self>;
}

/// Protocol IE identifiers (E2AP v03, `E2AP-Constants`).
pub mod ie_id {
    pub const CAUSE: u16 = 1;
    pub const CRITICALITY_DIAGNOSTICS: u16 = 2;
    pub const GLOBAL_E2_NODE_ID: u16 = 3;
    pub const GLOBAL_RIC_ID: u16 = 4;
    pub const RAN_FUNCTION_ID: u16 = 5;
    pub const RAN_FUNCTIONS_ACCEPTED: u16 = 9;
    pub const RAN_FUNCTIONS_ADDED: u16 = 10;
    pub const RAN_FUNCTIONS_DELETED: u16 = 11;
    pub const RAN_FUNCTIONS_MODIFIED: u16 = 12;
    pub const RAN_FUNCTIONS_REJECTED: u16 = 13;
    pub const RIC_ACTION_ID: u16 = 15;
    pub const RIC_ACTIONS_ADMITTED: u16 = 17;
    pub const RIC_ACTIONS_NOT_ADMITTED: u16 = 18;
    pub const RIC_CALL_PROCESS_ID: u16 = 20;
    pub const RIC_CONTROL_ACK_REQUEST: u16 = 21;
    pub const RIC_CONTROL_HEADER: u16 = 22;
    pub const RIC_CONTROL_MESSAGE: u16 = 23;
    pub const RIC_INDICATION_HEADER: u16 = 25;
    pub const RIC_INDICATION_MESSAGE: u16 = 26;
    pub const RIC_INDICATION_SN: u16 = 27;
    pub const RIC_INDICATION_TYPE: u16 = 28;
    pub const RIC_REQUEST_ID: u16 = 29;
    pub const RIC_SUBSCRIPTION_DETAILS: u16 = 30;
    pub const TIME_TO_WAIT: u16 = 31;
    pub const RIC_CONTROL_OUTCOME: u16 = 32;
    pub const E2_CONNECTION_SETUP: u16 = 39;
    pub const E2_CONNECTION_SETUP_FAILED: u16 = 40;
    pub const E2_CONNECTION_UPDATE_ADD: u16 = 44;
    pub const E2_CONNECTION_UPDATE_MODIFY: u16 = 45;
    pub const E2_CONNECTION_UPDATE_REMOVE: u16 = 46;
    pub const TRANSACTION_ID: u16 = 49;
    pub const E2_NODE_COMPONENT_CONFIG_ADDITION: u16 = 50;
    pub const E2_NODE_COMPONENT_CONFIG_ADDITION_ACK: u16 = 52;
    pub const RIC_ACTIONS_TO_BE_REMOVED_FOR_MODIFICATION: u16 = 64;
    pub const RIC_ACTIONS_TO_BE_ADDED_FOR_MODIFICATION: u16 = 69;
    pub const RIC_ACTIONS_REMOVED_FOR_MODIFICATION: u16 = 71;
    pub const RIC_ACTIONS_FAILED_TO_BE_REMOVED_FOR_MODIFICATION: u16 = 73;
    pub const RIC_ACTIONS_ADDED_FOR_MODIFICATION: u16 = 78;
    pub const RIC_ACTIONS_FAILED_TO_BE_ADDED_FOR_MODIFICATION: u16 = 80;
    pub const RIC_ACTIONS_REQUIRED_TO_BE_MODIFIED: u16 = 83;
    pub const RIC_ACTIONS_REQUIRED_TO_BE_REMOVED: u16 = 85;
    pub const RIC_ACTIONS_CONFIRMED_FOR_MODIFICATION: u16 = 87;
    pub const RIC_ACTIONS_CONFIRMED_FOR_REMOVAL: u16 = 91;
}

/// Upper bound of RANfunctionID (`maxofRANfunctionID - 1`).
pub const MAX_RAN_FUNCTION_ID: u16 = 4095;

// ============================================================================
// Protocol IE container
// ============================================================================

/// IE criticality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Criticality {
    #[default]
    Reject,
    Ignore,
    Notify,
}

impl Criticality {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Criticality::Reject),
            1 => Some(Criticality::Ignore),
            2 => Some(Criticality::Notify),
            _ => None,
        }
    }

    /// Encodes the criticality as an aligned 2-bit field.
    pub fn to_octet(self) -> u8 {
        self.value() << 6
    }

    pub fn from_octet(octet: u8) -> Result<Self> {
        if octet & 0x3F != 0 {
            return Err(E2apCodecError::InvalidValue(format!(
                "criticality octet 0x{octet:02x}"
            )));
        }
        Self::from_value(octet >> 6).ok_or_else(|| {
            E2apCodecError::InvalidValue(format!("criticality value {}", octet >> 6))
        })
    }
}

impl IeValue for Criticality {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_enumerated(self.value(), 3)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        let value = dec.get_enumerated(3)?;
        Self::from_value(value)
            .ok_or_else(|| E2apCodecError::InvalidValue(format!("criticality value {value}")))
    }
}

/// A single encoded protocol IE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolIe {
    pub id: u16,
    pub criticality: Criticality,
    /// Encoded IE value (open type contents)
    pub value: Bytes,
}

/// Ordered list of protocol IEs forming the body of an E2AP message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolIeContainer {
    ies: Vec<ProtocolIe>,
}

impl ProtocolIeContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtocolIe> {
        self.ies.iter()
    }

    /// Encodes `value` and appends it as IE `id`.
    pub fn push<T: IeValue>(&mut self, id: u16, criticality: Criticality, value: &T) -> Result<()> {
        let mut enc = PerEncoder::with_capacity(32);
        value.encode(&mut enc)?;
        self.ies.push(ProtocolIe {
            id,
            criticality,
            value: enc.into_bytes(),
        });
        Ok(())
    }

    /// Returns the first IE with the given id.
    pub fn find(&self, id: u16) -> Option<&ProtocolIe> {
        self.ies.iter().find(|ie| ie.id == id)
    }

    /// Decodes the mandatory IE `id` of `message`.
    pub fn get<T: IeValue>(&self, message: &'static str, id: u16) -> Result<T> {
        match self.get_optional(id)? {
            Some(value) => Ok(value),
            None => Err(E2apCodecError::MissingIe { message, id }),
        }
    }

    /// Decodes the optional IE `id`, if present.
    pub fn get_optional<T: IeValue>(&self, id: u16) -> Result<Option<T>> {
        let Some(ie) = self.find(id) else {
            return Ok(None);
        };
        let mut dec = PerDecoder::new(ie.value.clone());
        let value = T::decode(&mut dec)?;
        dec.finish()?;
        Ok(Some(value))
    }

    pub fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_constrained(self.ies.len() as u64, 0, u64::from(u16::MAX))?;
        for ie in &self.ies {
            enc.put_u16(ie.id);
            enc.put_u8(ie.criticality.to_octet());
            enc.put_open_type(&ie.value)?;
        }
        Ok(())
    }

    pub fn decode(dec: &mut PerDecoder) -> Result<Self> {
        let count = dec.get_constrained(0, u64::from(u16::MAX))? as usize;
        let mut ies = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let id = dec.get_u16()?;
            let criticality = Criticality::from_octet(dec.get_u8()?)?;
            let value = dec.get_octet_string()?;
            ies.push(ProtocolIe {
                id,
                criticality,
                value,
            });
        }
        Ok(Self { ies })
    }
}

// ============================================================================
// Generic value encodings
// ============================================================================

impl<T: IeValue> IeValue for Vec<T> {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_length(self.len())?;
        for item in self {
            item.encode(enc)?;
        }
        Ok(())
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        let count = dec.get_length()?;
        // Each item takes at least one octet.
        if count > dec.remaining() {
            return Err(E2apCodecError::BufferTooShort {
                needed: count,
                available: dec.remaining(),
            });
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::decode(dec)?);
        }
        Ok(items)
    }
}

/// OCTET STRING
impl IeValue for Bytes {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_octet_string(self)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        dec.get_octet_string()
    }
}

fn put_optional<T: IeValue>(enc: &mut PerEncoder, value: &Option<T>) -> Result<()> {
    enc.put_bool(value.is_some());
    match value {
        Some(value) => value.encode(enc),
        None => Ok(()),
    }
}

fn get_optional<T: IeValue>(dec: &mut PerDecoder) -> Result<Option<T>> {
    if dec.get_bool()? {
        T::decode(dec).map(Some)
    } else {
        Ok(None)
    }
}

/// Declares an ENUMERATED type with its [`IeValue`] encoding.
macro_rules! enumerated {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Number of root values
            pub const COUNT: u8 = [$( stringify!($variant) ),+].len() as u8;

            pub fn value(self) -> u8 {
                self as u8
            }

            pub fn from_value(value: u8) -> Option<Self> {
                $( if value == $value { return Some($name::$variant); } )+
                None
            }
        }

        impl IeValue for $name {
            fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
                enc.put_enumerated(self.value(), Self::COUNT)
            }

            fn decode(dec: &mut PerDecoder) -> Result<Self> {
                let value = dec.get_enumerated(Self::COUNT)?;
                Self::from_value(value).ok_or_else(|| {
                    E2apCodecError::InvalidValue(format!("{} value {value}", stringify!($name)))
                })
            }
        }
    };
}

/// Declares a CHOICE whose alternatives are all [`IeValue`]s, and encodes it
/// as an alternative index followed by the alternative's own encoding.
macro_rules! ie_choice {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident($ty:ty) ),+ $(,)?
        }
    ) => {
        crate::choice! {
            $(#[$meta])*
            pub enum $name {
                $( $(#[$vmeta])* $variant($ty) ),+
            }
        }

        impl IeValue for $name {
            fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
                enc.put_choice_index(self.index(), <Self as Choice>::ALTERNATIVES.len())?;
                match self {
                    $( $name::$variant(value) => value.encode(enc), )+
                }
            }

            fn decode(dec: &mut PerDecoder) -> Result<Self> {
                let index = dec.get_choice_index(
                    <Self as Choice>::NAME,
                    <Self as Choice>::ALTERNATIVES.len(),
                )?;
                $(
                    if index == <$ty as Alternative<$name>>::INDEX {
                        return <$ty as IeValue>::decode(dec).map($name::$variant);
                    }
                )+
                Err(E2apCodecError::UnknownChoiceIndex {
                    choice: <Self as Choice>::NAME,
                    index: index as u8,
                })
            }
        }
    };
}

// ============================================================================
// Identifiers
// ============================================================================

/// TransactionID (0..255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransactionId(pub u8);

impl TransactionId {
    /// Returns the following transaction id, wrapping at 255.
    pub fn next(self) -> Self {
        TransactionId(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl IeValue for TransactionId {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_constrained(u64::from(self.0), 0, 255)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(TransactionId(dec.get_constrained(0, 255)? as u8))
    }
}

/// RANfunctionID (0..4095)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RanFunctionId(pub u16);

impl std::fmt::Display for RanFunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl IeValue for RanFunctionId {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_constrained(u64::from(self.0), 0, u64::from(MAX_RAN_FUNCTION_ID))
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(RanFunctionId(
            dec.get_constrained(0, u64::from(MAX_RAN_FUNCTION_ID))? as u16,
        ))
    }
}

/// RICrequestID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RicRequestId {
    pub requestor_id: u16,
    pub instance_id: u16,
}

impl RicRequestId {
    pub const fn new(requestor_id: u16, instance_id: u16) -> Self {
        Self {
            requestor_id,
            instance_id,
        }
    }
}

impl std::fmt::Display for RicRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.requestor_id, self.instance_id)
    }
}

impl IeValue for RicRequestId {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_constrained(u64::from(self.requestor_id), 0, 65535)?;
        enc.put_constrained(u64::from(self.instance_id), 0, 65535)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            requestor_id: dec.get_constrained(0, 65535)? as u16,
            instance_id: dec.get_constrained(0, 65535)? as u16,
        })
    }
}

/// RICactionID (0..255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RicActionId(pub u8);

impl IeValue for RicActionId {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_constrained(u64::from(self.0), 0, 255)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(RicActionId(dec.get_constrained(0, 255)? as u8))
    }
}

/// RICindicationSN (0..65535)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RicIndicationSn(pub u16);

impl IeValue for RicIndicationSn {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_constrained(u64::from(self.0), 0, 65535)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(RicIndicationSn(dec.get_constrained(0, 65535)? as u16))
    }
}

// ============================================================================
// Global identities
// ============================================================================

/// GlobalRIC-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalRicId {
    pub plmn: Plmn,
    /// 20-bit Near-RT RIC identifier
    pub ric_id: u32,
}

impl IeValue for GlobalRicId {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_plmn(&self.plmn);
        enc.put_bit_string(u64::from(self.ric_id), 20)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        let plmn = dec.get_plmn()?;
        let ric_id = expect_bit_string(dec, 20, 20)? as u32;
        Ok(Self { plmn, ric_id })
    }
}

/// GlobalE2node-gNB-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GnbNodeId {
    pub plmn: Plmn,
    pub gnb_id: u32,
    /// gNB-ID length in bits (22..=32)
    pub gnb_id_len: u8,
    pub gnb_cu_up_id: Option<u64>,
    pub gnb_du_id: Option<u64>,
}

/// gNB-CU-UP-ID and gNB-DU-ID range (0..2^36-1)
const MAX_GNB_SUB_ID: u64 = (1 << 36) - 1;

impl IeValue for GnbNodeId {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        put_gnb_id(enc, &self.plmn, self.gnb_id, self.gnb_id_len)?;
        enc.put_bool(self.gnb_cu_up_id.is_some());
        if let Some(id) = self.gnb_cu_up_id {
            enc.put_constrained(id, 0, MAX_GNB_SUB_ID)?;
        }
        enc.put_bool(self.gnb_du_id.is_some());
        if let Some(id) = self.gnb_du_id {
            enc.put_constrained(id, 0, MAX_GNB_SUB_ID)?;
        }
        Ok(())
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        let (plmn, gnb_id, gnb_id_len) = get_gnb_id(dec)?;
        let gnb_cu_up_id = if dec.get_bool()? {
            Some(dec.get_constrained(0, MAX_GNB_SUB_ID)?)
        } else {
            None
        };
        let gnb_du_id = if dec.get_bool()? {
            Some(dec.get_constrained(0, MAX_GNB_SUB_ID)?)
        } else {
            None
        };
        Ok(Self {
            plmn,
            gnb_id,
            gnb_id_len,
            gnb_cu_up_id,
            gnb_du_id,
        })
    }
}

/// GlobalE2node-en-gNB-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnGnbNodeId {
    pub plmn: Plmn,
    pub gnb_id: u32,
    pub gnb_id_len: u8,
}

impl IeValue for EnGnbNodeId {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        put_gnb_id(enc, &self.plmn, self.gnb_id, self.gnb_id_len)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        let (plmn, gnb_id, gnb_id_len) = get_gnb_id(dec)?;
        Ok(Self {
            plmn,
            gnb_id,
            gnb_id_len,
        })
    }
}

/// GlobalE2node-ng-eNB-ID (macro eNB id)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NgEnbNodeId {
    pub plmn: Plmn,
    /// 20-bit macro ng-eNB id
    pub ng_enb_id: u32,
}

impl IeValue for NgEnbNodeId {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_plmn(&self.plmn);
        enc.put_bit_string(u64::from(self.ng_enb_id), 20)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        let plmn = dec.get_plmn()?;
        let ng_enb_id = expect_bit_string(dec, 20, 20)? as u32;
        Ok(Self { plmn, ng_enb_id })
    }
}

/// GlobalE2node-eNB-ID (macro eNB id)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnbNodeId {
    pub plmn: Plmn,
    /// 20-bit macro eNB id
    pub enb_id: u32,
}

impl IeValue for EnbNodeId {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_plmn(&self.plmn);
        enc.put_bit_string(u64::from(self.enb_id), 20)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        let plmn = dec.get_plmn()?;
        let enb_id = expect_bit_string(dec, 20, 20)? as u32;
        Ok(Self { plmn, enb_id })
    }
}

fn put_gnb_id(enc: &mut PerEncoder, plmn: &Plmn, gnb_id: u32, gnb_id_len: u8) -> Result<()> {
    if !(22..=32).contains(&gnb_id_len) {
        return Err(E2apCodecError::Encode(format!(
            "gNB-ID length {gnb_id_len} outside 22..=32"
        )));
    }
    enc.put_plmn(plmn);
    enc.put_bit_string(u64::from(gnb_id), gnb_id_len)
}

fn get_gnb_id(dec: &mut PerDecoder) -> Result<(Plmn, u32, u8)> {
    let plmn = dec.get_plmn()?;
    let (value, bits) = dec.get_bit_string()?;
    if !(22..=32).contains(&bits) {
        return Err(E2apCodecError::InvalidValue(format!("gNB-ID length {bits}")));
    }
    Ok((plmn, value as u32, bits))
}

fn expect_bit_string(dec: &mut PerDecoder, min: u8, max: u8) -> Result<u64> {
    let (value, bits) = dec.get_bit_string()?;
    if bits < min || bits > max {
        return Err(E2apCodecError::InvalidValue(format!(
            "bit string of {bits} bits, expected {min}..={max}"
        )));
    }
    Ok(value)
}

ie_choice! {
    /// GlobalE2node-ID
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum GlobalE2NodeId {
        Gnb(GnbNodeId),
        EnGnb(EnGnbNodeId),
        NgEnb(NgEnbNodeId),
        Enb(EnbNodeId),
    }
}

impl GlobalE2NodeId {
    pub fn plmn(&self) -> Plmn {
        match self {
            GlobalE2NodeId::Gnb(id) => id.plmn,
            GlobalE2NodeId::EnGnb(id) => id.plmn,
            GlobalE2NodeId::NgEnb(id) => id.plmn,
            GlobalE2NodeId::Enb(id) => id.plmn,
        }
    }
}

// ============================================================================
// Cause
// ============================================================================

enumerated! {
    /// CauseRICrequest
    pub enum CauseRicRequest {
        RanFunctionIdInvalid = 0,
        ActionNotSupported = 1,
        ExcessiveActions = 2,
        DuplicateAction = 3,
        DuplicateEventTrigger = 4,
        FunctionResourceLimit = 5,
        RequestIdUnknown = 6,
        InconsistentActionSubsequentActionSequence = 7,
        ControlMessageInvalid = 8,
        RicCallProcessIdInvalid = 9,
        ControlTimerExpired = 10,
        ControlFailedToExecute = 11,
        SystemNotReady = 12,
        Unspecified = 13,
    }
}

enumerated! {
    /// CauseRICservice
    pub enum CauseRicService {
        RanFunctionNotSupported = 0,
        ExcessiveFunctions = 1,
        RicResourceLimit = 2,
    }
}

enumerated! {
    /// CauseE2node
    pub enum CauseE2Node {
        E2NodeComponentUnknown = 0,
    }
}

enumerated! {
    /// CauseTransport
    pub enum CauseTransport {
        Unspecified = 0,
        TransportResourceUnavailable = 1,
    }
}

enumerated! {
    /// CauseProtocol
    pub enum CauseProtocol {
        TransferSyntaxError = 0,
        AbstractSyntaxErrorReject = 1,
        AbstractSyntaxErrorIgnoreAndNotify = 2,
        MessageNotCompatibleWithReceiverState = 3,
        SemanticError = 4,
        AbstractSyntaxErrorFalselyConstructedMessage = 5,
        Unspecified = 6,
    }
}

enumerated! {
    /// CauseMisc
    pub enum CauseMisc {
        ControlProcessingOverload = 0,
        HardwareFailure = 1,
        OmIntervention = 2,
        Unspecified = 3,
    }
}

ie_choice! {
    /// Cause
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Cause {
        RicRequest(CauseRicRequest),
        RicService(CauseRicService),
        E2Node(CauseE2Node),
        Transport(CauseTransport),
        Protocol(CauseProtocol),
        Misc(CauseMisc),
    }
}

impl std::fmt::Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cause::RicRequest(c) => write!(f, "ricRequest/{c:?}"),
            Cause::RicService(c) => write!(f, "ricService/{c:?}"),
            Cause::E2Node(c) => write!(f, "e2Node/{c:?}"),
            Cause::Transport(c) => write!(f, "transport/{c:?}"),
            Cause::Protocol(c) => write!(f, "protocol/{c:?}"),
            Cause::Misc(c) => write!(f, "misc/{c:?}"),
        }
    }
}

// ============================================================================
// Timers and diagnostics
// ============================================================================

enumerated! {
    /// TimeToWait
    pub enum TimeToWait {
        V1s = 0,
        V2s = 1,
        V5s = 2,
        V10s = 3,
        V20s = 4,
        V60s = 5,
    }
}

impl TimeToWait {
    pub fn as_millis(self) -> u64 {
        match self {
            TimeToWait::V1s => 1_000,
            TimeToWait::V2s => 2_000,
            TimeToWait::V5s => 5_000,
            TimeToWait::V10s => 10_000,
            TimeToWait::V20s => 20_000,
            TimeToWait::V60s => 60_000,
        }
    }
}

enumerated! {
    /// TriggeringMessage
    pub enum TriggeringMessage {
        InitiatingMessage = 0,
        SuccessfulOutcome = 1,
        UnsuccessfulOutcome = 2,
    }
}

/// CriticalityDiagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriticalityDiagnostics {
    pub procedure_code: Option<u8>,
    pub triggering_message: Option<TriggeringMessage>,
    pub procedure_criticality: Option<Criticality>,
    pub ric_requestor_id: Option<RicRequestId>,
}

impl IeValue for CriticalityDiagnostics {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_bool(self.procedure_code.is_some());
        if let Some(code) = self.procedure_code {
            enc.put_u8(code);
        }
        put_optional(enc, &self.triggering_message)?;
        put_optional(enc, &self.procedure_criticality)?;
        put_optional(enc, &self.ric_requestor_id)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        let procedure_code = if dec.get_bool()? {
            Some(dec.get_u8()?)
        } else {
            None
        };
        Ok(Self {
            procedure_code,
            triggering_message: get_optional(dec)?,
            procedure_criticality: get_optional(dec)?,
            ric_requestor_id: get_optional(dec)?,
        })
    }
}

// ============================================================================
// RAN functions
// ============================================================================

/// RANfunction-Item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RanFunctionItem {
    pub id: RanFunctionId,
    /// Encoded E2SM RAN function definition, opaque to E2AP
    pub definition: Bytes,
    pub revision: u16,
    /// Service model OID
    pub oid: String,
}

impl IeValue for RanFunctionItem {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        self.id.encode(enc)?;
        enc.put_octet_string(&self.definition)?;
        enc.put_constrained(u64::from(self.revision), 0, 4095)?;
        enc.put_printable_string(&self.oid)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            id: RanFunctionId::decode(dec)?,
            definition: dec.get_octet_string()?,
            revision: dec.get_constrained(0, 4095)? as u16,
            oid: dec.get_printable_string()?,
        })
    }
}

/// RANfunctionID-Item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RanFunctionIdItem {
    pub id: RanFunctionId,
    pub revision: u16,
}

impl IeValue for RanFunctionIdItem {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        self.id.encode(enc)?;
        enc.put_constrained(u64::from(self.revision), 0, 4095)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            id: RanFunctionId::decode(dec)?,
            revision: dec.get_constrained(0, 4095)? as u16,
        })
    }
}

/// RANfunctionIDcause-Item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RanFunctionIdCauseItem {
    pub id: RanFunctionId,
    pub cause: Cause,
}

impl IeValue for RanFunctionIdCauseItem {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        self.id.encode(enc)?;
        self.cause.encode(enc)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            id: RanFunctionId::decode(dec)?,
            cause: Cause::decode(dec)?,
        })
    }
}

// ============================================================================
// RIC subscriptions
// ============================================================================

enumerated! {
    /// RICactionType
    pub enum RicActionType {
        Report = 0,
        Insert = 1,
        Policy = 2,
    }
}

/// RICaction-ToBeSetup-Item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RicActionToBeSetupItem {
    pub action_id: RicActionId,
    pub action_type: RicActionType,
    pub action_definition: Option<Bytes>,
}

impl IeValue for RicActionToBeSetupItem {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        self.action_id.encode(enc)?;
        self.action_type.encode(enc)?;
        put_optional(enc, &self.action_definition)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            action_id: RicActionId::decode(dec)?,
            action_type: RicActionType::decode(dec)?,
            action_definition: get_optional(dec)?,
        })
    }
}

/// RICsubscriptionDetails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RicSubscriptionDetails {
    /// Encoded E2SM event trigger definition
    pub event_trigger_definition: Bytes,
    pub actions: Vec<RicActionToBeSetupItem>,
}

impl IeValue for RicSubscriptionDetails {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_octet_string(&self.event_trigger_definition)?;
        self.actions.encode(enc)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            event_trigger_definition: dec.get_octet_string()?,
            actions: <Vec<RicActionToBeSetupItem>>::decode(dec)?,
        })
    }
}

/// RICaction-NotAdmitted-Item (also used for actions refused in
/// subscription modification)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RicActionNotAdmittedItem {
    pub action_id: RicActionId,
    pub cause: Cause,
}

impl IeValue for RicActionNotAdmittedItem {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        self.action_id.encode(enc)?;
        self.cause.encode(enc)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            action_id: RicActionId::decode(dec)?,
            cause: Cause::decode(dec)?,
        })
    }
}

// ============================================================================
// RIC control and indication
// ============================================================================

enumerated! {
    /// RICcontrolAckRequest
    pub enum RicControlAckRequest {
        NoAck = 0,
        Ack = 1,
    }
}

enumerated! {
    /// RICindicationType
    pub enum RicIndicationType {
        Report = 0,
        Insert = 1,
    }
}

// ============================================================================
// E2 node configuration
// ============================================================================

enumerated! {
    /// E2nodeComponentInterfaceType
    pub enum E2NodeComponentInterfaceType {
        Ng = 0,
        Xn = 1,
        E1 = 2,
        F1 = 3,
        W1 = 4,
        S1 = 5,
        X2 = 6,
    }
}

/// E2nodeComponentConfigAddition-Item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct E2NodeComponentConfigAdditionItem {
    pub interface_type: E2NodeComponentInterfaceType,
    /// Encoded E2nodeComponentID
    pub component_id: Bytes,
    /// Copy of the interface setup request sent by the node
    pub request_part: Bytes,
    /// Copy of the interface setup response received by the node
    pub response_part: Bytes,
}

impl IeValue for E2NodeComponentConfigAdditionItem {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        self.interface_type.encode(enc)?;
        enc.put_octet_string(&self.component_id)?;
        enc.put_octet_string(&self.request_part)?;
        enc.put_octet_string(&self.response_part)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            interface_type: E2NodeComponentInterfaceType::decode(dec)?,
            component_id: dec.get_octet_string()?,
            request_part: dec.get_octet_string()?,
            response_part: dec.get_octet_string()?,
        })
    }
}

/// E2nodeComponentConfigAdditionAck-Item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct E2NodeComponentConfigAckItem {
    pub interface_type: E2NodeComponentInterfaceType,
    pub component_id: Bytes,
    /// `None` means the configuration was accepted
    pub failure_cause: Option<Cause>,
}

impl IeValue for E2NodeComponentConfigAckItem {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        self.interface_type.encode(enc)?;
        enc.put_octet_string(&self.component_id)?;
        put_optional(enc, &self.failure_cause)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            interface_type: E2NodeComponentInterfaceType::decode(dec)?,
            component_id: dec.get_octet_string()?,
            failure_cause: get_optional(dec)?,
        })
    }
}

// ============================================================================
// E2 connection update
// ============================================================================

enumerated! {
    /// TNLusage
    pub enum TnlUsage {
        RicService = 0,
        SupportFunction = 1,
        Both = 2,
    }
}

/// TNLinformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TnlInformation {
    /// Transport layer address (IPv4 or IPv6 octets)
    pub address: Bytes,
    pub port: Option<u16>,
}

impl IeValue for TnlInformation {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        enc.put_octet_string(&self.address)?;
        enc.put_bool(self.port.is_some());
        if let Some(port) = self.port {
            enc.put_u16(port);
        }
        Ok(())
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        let address = dec.get_octet_string()?;
        let port = if dec.get_bool()? {
            Some(dec.get_u16()?)
        } else {
            None
        };
        Ok(Self { address, port })
    }
}

/// E2connectionUpdate-Item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct E2ConnectionUpdateItem {
    pub tnl: TnlInformation,
    pub usage: TnlUsage,
}

impl IeValue for E2ConnectionUpdateItem {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        self.tnl.encode(enc)?;
        self.usage.encode(enc)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            tnl: TnlInformation::decode(dec)?,
            usage: TnlUsage::decode(dec)?,
        })
    }
}

/// E2connectionSetupFailed-Item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct E2ConnectionSetupFailedItem {
    pub tnl: TnlInformation,
    pub cause: Cause,
}

impl IeValue for E2ConnectionSetupFailedItem {
    fn encode(&self, enc: &mut PerEncoder) -> Result<()> {
        self.tnl.encode(enc)?;
        self.cause.encode(enc)
    }

    fn decode(dec: &mut PerDecoder) -> Result<Self> {
        Ok(Self {
            tnl: TnlInformation::decode(dec)?,
            cause: Cause::decode(dec)?,
        })
    }
}
