//! E2 Application Protocol (E2AP)
//!
//! This crate provides the E2AP message model used between an E2 node and
//! the Near-RT RIC, together with a byte-aligned PER codec.
//!
//! # Modules
//!
//! - [`choice`]: type-safe CHOICE container (`choice!` macro)
//! - [`per`]: byte-aligned PER primitives
//! - [`ies`]: protocol IEs and IE containers
//! - [`messages`]: message bodies for each elementary procedure
//! - [`pdu`]: `E2apPdu` and the three message categories
//! - [`codec`]: PDU encoding and decoding
//!
//! # Example
//!
//! ```rust
//! use nextgsim_e2ap::codec::{decode_e2ap_pdu, encode_e2ap_pdu};
//! use nextgsim_e2ap::ies::{Cause, CauseMisc, TransactionId};
//! use nextgsim_e2ap::messages::ResetRequest;
//! use nextgsim_e2ap::pdu::E2apPdu;
//!
//! let pdu = E2apPdu::initiating(ResetRequest {
//!     transaction_id: TransactionId(1),
//!     cause: Cause::from(CauseMisc::OmIntervention),
//! });
//!
//! let bytes = encode_e2ap_pdu(&pdu).unwrap();
//! let decoded = decode_e2ap_pdu(&bytes).unwrap();
//! assert_eq!(decoded, pdu);
//! ```

pub mod choice;
pub mod codec;
pub mod ies;
pub mod messages;
pub mod pdu;
pub mod per;

pub use choice::{Alternative, BadChoiceAccess, Choice, Visit, VisitMut};
pub use codec::{decode_e2ap_pdu, encode_e2ap_pdu, E2apCodecError};
pub use messages::E2apMessage;
pub use pdu::{
    E2apPdu, InitiatingMessage, InitiatingMessageValue, ProcedureCode, SuccessfulOutcome,
    SuccessfulOutcomeValue, UnsuccessfulOutcome, UnsuccessfulOutcomeValue,
};
