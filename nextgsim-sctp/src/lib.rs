//! SCTP-over-UDP for the E2 interface
//!
//! `sctp-proto` supplies the sans-IO association state machine; this crate
//! moves its packets over a tokio [`UdpSocket`](tokio::net::UdpSocket) and
//! exposes the association as a handful of async calls. E2AP rides on stream
//! 0 with PPID [`E2AP_PPID`].
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use nextgsim_sctp::{SctpConfig, SctpEndpoint, E2AP_PPID};
//!
//! # async fn run() -> Result<(), nextgsim_sctp::SctpError> {
//! let mut endpoint = SctpEndpoint::open(SctpConfig::default())?;
//! endpoint.bind("0.0.0.0:36422".parse().unwrap()).await?;
//! let mut ric = endpoint.connect("10.0.0.1:36421".parse().unwrap()).await?;
//!
//! ric.send_with_ppid(0, &[0x00, 0x01, 0x00], E2AP_PPID).await?;
//! while let Some(msg) = ric.poll_recv(Duration::from_millis(100)).await? {
//!     println!("{} bytes from the RIC", msg.data.len());
//! }
//! ric.shutdown().await
//! # }
//! ```

pub mod association;

pub use association::{
    wire_ppid, ReceivedMessage, SctpAssociation, SctpConfig, SctpEndpoint, SctpError, SctpEvent,
    DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_NUM_STREAMS, DEFAULT_RECEIVE_BUFFER_SIZE, E2AP_PPID,
    UNKNOWN_WIRE_PPID,
};
