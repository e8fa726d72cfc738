//! E2 Transport Boundary
//!
//! The agent reaches the network only through two traits:
//!
//! - [`E2Connector`] performs the initialization steps (open, subscribe,
//!   bind, connect) and installs a receive path that turns every inbound
//!   datagram into an [`AgentTask::HandleRx`](crate::tasks::AgentTask::HandleRx).
//! - [`E2Transport`] is the connected association owned by the agent.
//!
//! Two implementations are provided:
//!
//! - [`SctpConnector`]: SCTP-over-UDP through `nextgsim-sctp`
//! - [`LoopbackConnector`]: an in-memory pair with a scripted [`RicPeer`]

mod loopback;
mod sctp;

pub use loopback::{LoopbackConnector, LoopbackTransport, RicPeer};
pub use sctp::{SctpConnector, SctpTransport};

use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;
use thiserror::Error;

use crate::scheduler::TaskQueue;
use crate::tasks::AgentTask;

/// A datagram received from the RIC, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundDatagram {
    pub payload: Bytes,
    pub peer: SocketAddr,
    pub stream_id: u16,
    /// `None` when the transport cannot report the PPID
    pub ppid: Option<u32>,
    pub flags: u32,
}

/// Local and remote endpoints of the association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub local: SocketAddr,
    pub remote: SocketAddr,
}

/// Transport initialization steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitStep {
    Open,
    Subscribe,
    Bind,
    Connect,
}

impl InitStep {
    pub const ALL: [InitStep; 4] = [
        InitStep::Open,
        InitStep::Subscribe,
        InitStep::Bind,
        InitStep::Connect,
    ];
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStep::Open => write!(f, "open"),
            InitStep::Subscribe => write!(f, "subscribe"),
            InitStep::Bind => write!(f, "bind"),
            InitStep::Connect => write!(f, "connect"),
        }
    }
}

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Failed to open transport: {0}")]
    Open(String),
    #[error("Failed to subscribe to transport events: {0}")]
    Subscribe(String),
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },
    #[error("Failed to connect to {addr}: {reason}")]
    Connect { addr: SocketAddr, reason: String },
    #[error("Send failed: {0}")]
    Send(String),
    #[error("Transport closed")]
    Closed,
}

impl TransportError {
    /// The initialization step this error belongs to, if any.
    pub fn init_step(&self) -> Option<InitStep> {
        match self {
            TransportError::Open(_) => Some(InitStep::Open),
            TransportError::Subscribe(_) => Some(InitStep::Subscribe),
            TransportError::Bind { .. } => Some(InitStep::Bind),
            TransportError::Connect { .. } => Some(InitStep::Connect),
            TransportError::Send(_) | TransportError::Closed => None,
        }
    }
}

/// A connected, message-boundary-preserving association to the RIC.
#[async_trait::async_trait]
pub trait E2Transport: Send + 'static {
    /// Sends one E2AP PDU tagged with the E2AP PPID. Returns the number of
    /// bytes handed to the association.
    async fn send(&mut self, payload: &[u8]) -> Result<usize, TransportError>;

    /// Address of the RIC.
    fn peer_addr(&self) -> SocketAddr;

    /// Releases the association. Further sends fail with
    /// [`TransportError::Closed`].
    async fn close(&mut self);
}

/// Creates transports for the agent.
#[async_trait::async_trait]
pub trait E2Connector: Send + Sync {
    type Transport: E2Transport;

    /// Runs the initialization steps in order. On the first failing step
    /// everything opened so far is released and the error is returned.
    async fn connect(
        &self,
        endpoints: Endpoints,
        queue: TaskQueue<AgentTask>,
    ) -> Result<Self::Transport, TransportError>;
}
