//! E2AP PDU codec
//!
//! Encodes an [`E2apPdu`] into its wire octets and back. The PDU layout is:
//!
//! ```text
//! +--------+----------------+-------------+---------------------------+
//! | choice | procedure code | criticality | open type: ext + IEs      |
//! | 1 byte | 1 byte         | 1 byte      | length + 0x00 + container |
//! +--------+----------------+-------------+---------------------------+
//! ```
//!
//! The choice octet carries the PDU alternative in its top three bits, the
//! criticality octet carries the criticality in its top two bits. Message
//! bodies are protocol IE containers (see [`crate::ies`]).

use bytes::Bytes;
use thiserror::Error;

use crate::choice::Choice;
use crate::ies::{Criticality, ProtocolIeContainer};
use crate::pdu::{
    E2apPdu, InitiatingMessage, InitiatingMessageValue, ProcedureCode, SuccessfulOutcome,
    SuccessfulOutcomeValue, UnsuccessfulOutcome, UnsuccessfulOutcomeValue,
};
use crate::per::{PerDecoder, PerEncoder};

/// Errors that can occur while encoding or decoding E2AP
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum E2apCodecError {
    #[error("Buffer too short: need {needed} bytes, have {available}")]
    BufferTooShort { needed: usize, available: usize },

    #[error("Unknown PDU type: {0}")]
    UnknownPduType(u8),

    #[error("Unknown {choice} alternative index {index}")]
    UnknownChoiceIndex { choice: &'static str, index: u8 },

    #[error("Unknown {category} procedure code {code}")]
    UnknownProcedure { category: &'static str, code: u8 },

    #[error("{message} is missing mandatory IE {id}")]
    MissingIe { message: &'static str, id: u16 },

    #[error("Value {value} outside {lower}..={upper}")]
    ValueOutOfRange { value: u64, lower: u64, upper: u64 },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    #[error("Length {0} exceeds the supported maximum")]
    LengthTooLarge(usize),

    #[error("Encode error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, E2apCodecError>;

/// Size of the fixed PDU header (choice, procedure code, criticality)
pub const PDU_HEADER_SIZE: usize = 3;

/// Number of E2AP-PDU alternatives
const PDU_ALTERNATIVES: usize = 3;

/// Encodes an E2AP PDU.
pub fn encode_e2ap_pdu(pdu: &E2apPdu) -> Result<Bytes> {
    let (code, criticality, ies) = match pdu {
        E2apPdu::InitiatingMessage(msg) => (msg.procedure_code(), msg.criticality, msg.value.to_ies()?),
        E2apPdu::SuccessfulOutcome(msg) => (msg.procedure_code(), msg.criticality, msg.value.to_ies()?),
        E2apPdu::UnsuccessfulOutcome(msg) => {
            (msg.procedure_code(), msg.criticality, msg.value.to_ies()?)
        }
    };

    let mut body = PerEncoder::new();
    body.put_u8(0x00);
    ies.encode(&mut body)?;
    let body = body.into_bytes();

    let mut enc = PerEncoder::with_capacity(PDU_HEADER_SIZE + 2 + body.len());
    enc.put_u8((pdu.index() as u8) << 5);
    enc.put_u8(code.0);
    enc.put_u8(criticality.to_octet());
    enc.put_open_type(&body)?;
    Ok(enc.into_bytes())
}

/// Decodes an E2AP PDU.
///
/// The whole input must be consumed; trailing octets are an error.
pub fn decode_e2ap_pdu(data: &[u8]) -> Result<E2apPdu> {
    if data.len() < PDU_HEADER_SIZE {
        return Err(E2apCodecError::BufferTooShort {
            needed: PDU_HEADER_SIZE,
            available: data.len(),
        });
    }

    let mut dec = PerDecoder::from_slice(data);
    let choice = dec.get_u8()?;
    if choice & 0x1F != 0 || (choice >> 5) as usize >= PDU_ALTERNATIVES {
        return Err(E2apCodecError::UnknownPduType(choice));
    }
    let code = ProcedureCode(dec.get_u8()?);
    let criticality = Criticality::from_octet(dec.get_u8()?)?;

    let mut body = dec.get_open_type()?;
    dec.finish()?;

    let ext = body.get_u8()?;
    if ext != 0 {
        return Err(E2apCodecError::InvalidValue(format!(
            "extension marker 0x{ext:02x}"
        )));
    }
    let ies = ProtocolIeContainer::decode(&mut body)?;
    body.finish()?;

    let pdu = match choice >> 5 {
        0 => {
            let value = InitiatingMessageValue::from_ies(code, &ies)?.ok_or(
                E2apCodecError::UnknownProcedure {
                    category: "initiatingMessage",
                    code: code.0,
                },
            )?;
            E2apPdu::from(InitiatingMessage { criticality, value })
        }
        1 => {
            let value = SuccessfulOutcomeValue::from_ies(code, &ies)?.ok_or(
                E2apCodecError::UnknownProcedure {
                    category: "successfulOutcome",
                    code: code.0,
                },
            )?;
            E2apPdu::from(SuccessfulOutcome { criticality, value })
        }
        _ => {
            let value = UnsuccessfulOutcomeValue::from_ies(code, &ies)?.ok_or(
                E2apCodecError::UnknownProcedure {
                    category: "unsuccessfulOutcome",
                    code: code.0,
                },
            )?;
            E2apPdu::from(UnsuccessfulOutcome { criticality, value })
        }
    };
    Ok(pdu)
}
