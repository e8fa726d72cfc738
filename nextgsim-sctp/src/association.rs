//! SCTP endpoint and association for the E2 interface.
//!
//! Bringing up an association takes four explicit steps so the caller can
//! report which one failed:
//!
//! 1. [`SctpEndpoint::open`] validates the configuration and creates the endpoint
//! 2. [`SctpEndpoint::set_event_sender`] subscribes to association events
//! 3. [`SctpEndpoint::bind`] binds the local UDP socket
//! 4. [`SctpEndpoint::connect`] runs the INIT/COOKIE handshake
//!
//! Once connected, every call on [`SctpAssociation`] runs the sans-IO state
//! machine one cycle: feed inbound packets, poll events and timers, then
//! flush whatever the association wants to transmit.

use bytes::Bytes;
use sctp_proto::{
    Association, AssociationHandle, ClientConfig, DatagramEvent, Endpoint, EndpointConfig, Event,
    Payload, PayloadProtocolIdentifier, TransportConfig, Transmit,
};
use std::{
    collections::{BTreeSet, VecDeque},
    io,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use thiserror::Error;
use tokio::{net::UdpSocket, sync::mpsc, time::timeout};
use tracing::{debug, info, trace, warn};

/// Payload protocol identifier registered for E2AP.
///
/// sctp-proto 0.3 only models the WebRTC PPIDs. Any other value, 70
/// included, maps to `PayloadProtocolIdentifier::Unknown` and is written to
/// the wire as [`UNKNOWN_WIRE_PPID`]; see [`wire_ppid`].
pub const E2AP_PPID: u32 = 70;
/// What sctp-proto puts on the wire for a PPID it does not model
pub const UNKNOWN_WIRE_PPID: u32 = 58;
/// Inbound and outbound stream count; E2AP only needs stream 0
pub const DEFAULT_NUM_STREAMS: u16 = 2;
pub const DEFAULT_MAX_MESSAGE_SIZE: u32 = 65536;
pub const DEFAULT_RECEIVE_BUFFER_SIZE: u32 = 262144;

/// Granularity of the handshake and shutdown loops
const PUMP_INTERVAL: Duration = Duration::from_millis(100);
/// Upper bound on waiting for the peer's SHUTDOWN-ACK
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SctpError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
    #[error("Handshake with {addr} failed: {reason}")]
    Handshake { addr: SocketAddr, reason: String },
    #[error("Handshake with {0} timed out")]
    HandshakeTimeout(SocketAddr),
    #[error("Stream {stream} error: {reason}")]
    Stream { stream: u16, reason: String },
    #[error("Association closed")]
    AssociationClosed,
}

pub type Result<T> = std::result::Result<T, SctpError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssociationState {
    Connecting,
    Established,
    ShuttingDown,
    Closed,
}

/// Association parameters
#[derive(Debug, Clone)]
pub struct SctpConfig {
    pub max_outbound_streams: u16,
    pub max_inbound_streams: u16,
    pub max_message_size: u32,
    pub max_receive_buffer_size: u32,
    pub connect_timeout: Duration,
    pub rto_initial_ms: u64,
    pub rto_min_ms: u64,
    pub rto_max_ms: u64,
    /// PPID requested by [`SctpAssociation::send`]. The value actually sent
    /// is [`wire_ppid`] of it.
    pub ppid: u32,
}

impl Default for SctpConfig {
    fn default() -> Self {
        Self {
            max_outbound_streams: DEFAULT_NUM_STREAMS,
            max_inbound_streams: DEFAULT_NUM_STREAMS,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            connect_timeout: Duration::from_secs(30),
            rto_initial_ms: 3000,
            rto_min_ms: 1000,
            rto_max_ms: 60000,
            ppid: E2AP_PPID,
        }
    }
}

impl SctpConfig {
    fn validate(&self) -> Result<()> {
        if self.max_outbound_streams == 0 || self.max_inbound_streams == 0 {
            return Err(SctpError::InvalidConfig("stream counts must be non-zero"));
        }
        if self.max_message_size == 0 || self.max_receive_buffer_size == 0 {
            return Err(SctpError::InvalidConfig(
                "message and buffer sizes must be non-zero",
            ));
        }
        if self.rto_min_ms > self.rto_max_ms {
            return Err(SctpError::InvalidConfig("rto_min_ms exceeds rto_max_ms"));
        }
        Ok(())
    }

    fn transport(&self) -> TransportConfig {
        TransportConfig::default()
            .with_max_num_outbound_streams(self.max_outbound_streams)
            .with_max_num_inbound_streams(self.max_inbound_streams)
            .with_max_message_size(self.max_message_size)
            .with_max_receive_buffer_size(self.max_receive_buffer_size)
            .with_rto_initial_ms(self.rto_initial_ms)
            .with_rto_min_ms(self.rto_min_ms)
            .with_rto_max_ms(self.rto_max_ms)
    }
}

/// One user message read off a stream
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub stream_id: u16,
    pub data: Bytes,
    /// `None` when sctp-proto could not tell which PPID the chunk carried
    pub ppid: Option<u32>,
}

/// Association lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SctpEvent {
    Connected,
    Disconnected,
    StreamOpened(u16),
}

/// An endpoint that has not been connected yet.
pub struct SctpEndpoint {
    endpoint: Endpoint,
    config: SctpConfig,
    socket: Option<UdpSocket>,
    events: Option<mpsc::UnboundedSender<SctpEvent>>,
}

impl SctpEndpoint {
    pub fn open(config: SctpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            endpoint: Endpoint::new(Arc::new(EndpointConfig::new()), None),
            config,
            socket: None,
            events: None,
        })
    }

    pub fn set_event_sender(&mut self, tx: mpsc::UnboundedSender<SctpEvent>) {
        self.events = Some(tx);
    }

    /// Binds the local socket. Port 0 picks an ephemeral port; the bound
    /// address is returned.
    pub async fn bind(&mut self, local_addr: SocketAddr) -> Result<SocketAddr> {
        if self.socket.is_some() {
            return Err(SctpError::InvalidState("endpoint already bound"));
        }
        let socket = UdpSocket::bind(local_addr).await?;
        let bound = socket.local_addr()?;
        debug!("SCTP endpoint bound to {}", bound);
        self.socket = Some(socket);
        Ok(bound)
    }

    /// Runs the handshake with `remote_addr`, bounded by
    /// [`SctpConfig::connect_timeout`].
    pub async fn connect(self, remote_addr: SocketAddr) -> Result<SctpAssociation> {
        let SctpEndpoint {
            mut endpoint,
            config,
            socket,
            events,
        } = self;
        let socket = socket.ok_or(SctpError::InvalidState("endpoint is not bound"))?;

        info!("Starting SCTP handshake with {}", remote_addr);
        let mut client = ClientConfig::new();
        client.transport = Arc::new(config.transport());
        let (handle, association) =
            endpoint
                .connect(client, remote_addr)
                .map_err(|e| SctpError::Handshake {
                    addr: remote_addr,
                    reason: e.to_string(),
                })?;

        let mut assoc = SctpAssociation {
            socket,
            remote_addr,
            endpoint,
            handle,
            association,
            state: AssociationState::Connecting,
            outbox: VecDeque::new(),
            streams: BTreeSet::new(),
            local_streams: BTreeSet::new(),
            events,
            config,
        };
        assoc.handshake().await?;
        Ok(assoc)
    }
}

/// A connected association to one peer
pub struct SctpAssociation {
    socket: UdpSocket,
    remote_addr: SocketAddr,
    endpoint: Endpoint,
    handle: AssociationHandle,
    association: Association,
    state: AssociationState,
    outbox: VecDeque<Transmit>,
    /// Every stream known to carry data, in either direction
    streams: BTreeSet<u16>,
    /// Streams this side has opened for writing
    local_streams: BTreeSet<u16>,
    events: Option<mpsc::UnboundedSender<SctpEvent>>,
    config: SctpConfig,
}

impl SctpAssociation {
    async fn handshake(&mut self) -> Result<()> {
        let deadline = Instant::now() + self.config.connect_timeout;
        loop {
            self.drive().await?;
            match self.state {
                AssociationState::Closed => {
                    return Err(SctpError::Handshake {
                        addr: self.remote_addr,
                        reason: "association lost during handshake".into(),
                    })
                }
                _ if !self.association.is_handshaking() => {
                    self.state = AssociationState::Established;
                    info!("SCTP association with {} established", self.remote_addr);
                    self.notify(SctpEvent::Connected);
                    return Ok(());
                }
                _ => {}
            }
            if Instant::now() >= deadline {
                return Err(SctpError::HandshakeTimeout(self.remote_addr));
            }
            self.pump(PUMP_INTERVAL).await;
        }
    }

    fn notify(&self, event: SctpEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Waits up to `wait` for one UDP packet and feeds it to the endpoint.
    /// Returns false when nothing arrived.
    async fn pump(&mut self, wait: Duration) -> bool {
        let mut buf = vec![0u8; self.config.max_receive_buffer_size as usize];
        let (len, from) = match timeout(wait, self.socket.recv_from(&mut buf)).await {
            Ok(Ok(received)) => received,
            Ok(Err(e)) => {
                warn!("SCTP socket receive failed: {}", e);
                return false;
            }
            Err(_) => return false,
        };
        buf.truncate(len);
        trace!("SCTP packet of {} bytes from {}", len, from);

        let event = self
            .endpoint
            .handle(Instant::now(), from, None, None, Bytes::from(buf));
        match event {
            Some((handle, DatagramEvent::AssociationEvent(event))) if handle == self.handle => {
                self.association.handle_event(event);
            }
            Some((_, DatagramEvent::NewAssociation(_))) => {
                debug!("Ignoring inbound association from {}", from);
            }
            _ => {}
        }
        true
    }

    /// One sans-IO cycle: drain events, fire due timers, send queued packets.
    async fn drive(&mut self) -> Result<()> {
        while let Some(event) = self.association.poll() {
            match event {
                Event::Connected => {
                    if self.state == AssociationState::Connecting {
                        self.state = AssociationState::Established;
                    }
                }
                Event::AssociationLost { reason } => {
                    warn!("SCTP association with {} lost: {}", self.remote_addr, reason);
                    self.state = AssociationState::Closed;
                    self.notify(SctpEvent::Disconnected);
                }
                Event::Stream(event) => trace!("SCTP stream event {:?}", event),
                Event::DatagramReceived => {}
            }
        }

        let now = Instant::now();
        if self.association.poll_timeout().is_some_and(|due| now >= due) {
            self.association.handle_timeout(now);
        }
        while let Some(transmit) = self.association.poll_transmit(now) {
            self.outbox.push_back(transmit);
        }
        while let Some(transmit) = self.endpoint.poll_transmit() {
            self.outbox.push_back(transmit);
        }

        while let Some(transmit) = self.outbox.pop_front() {
            if let Payload::RawEncode(packets) = &transmit.payload {
                for packet in packets {
                    self.socket.send_to(packet, transmit.remote).await?;
                }
            }
        }
        Ok(())
    }

    pub async fn send(&mut self, stream_id: u16, data: &[u8]) -> Result<()> {
        self.send_with_ppid(stream_id, data, self.config.ppid).await
    }

    /// Queues one user message on `stream_id` and flushes it.
    pub async fn send_with_ppid(&mut self, stream_id: u16, data: &[u8], ppid: u32) -> Result<()> {
        match self.state {
            AssociationState::Established => {}
            AssociationState::Closed => return Err(SctpError::AssociationClosed),
            _ => return Err(SctpError::InvalidState("association not established")),
        }

        let ppi = PayloadProtocolIdentifier::from(ppid);
        if !self.local_streams.contains(&stream_id) {
            self.association
                .open_stream(stream_id, ppi)
                .map_err(|e| stream_error(stream_id, e))?;
            self.local_streams.insert(stream_id);
            self.streams.insert(stream_id);
        }
        self.association
            .stream(stream_id)
            .and_then(|mut stream| stream.write_with_ppi(data, ppi))
            .map_err(|e| stream_error(stream_id, e))?;
        trace!(
            "SCTP queued {} bytes on stream {} (ppid {}, {} on the wire)",
            data.len(),
            stream_id,
            ppid,
            wire_ppid(ppid)
        );

        self.drive().await
    }

    /// Waits up to `wait` for the next user message.
    ///
    /// `Ok(None)` means nothing arrived in time; once the association is gone
    /// every call fails with [`SctpError::AssociationClosed`].
    pub async fn poll_recv(&mut self, wait: Duration) -> Result<Option<ReceivedMessage>> {
        if self.state == AssociationState::Closed {
            return Err(SctpError::AssociationClosed);
        }
        if let Some(msg) = self.try_recv() {
            return Ok(Some(msg));
        }

        self.pump(wait).await;
        self.drive().await?;

        match self.try_recv() {
            Some(msg) => Ok(Some(msg)),
            None if self.state == AssociationState::Closed => Err(SctpError::AssociationClosed),
            None => Ok(None),
        }
    }

    /// Returns a message that is already reassembled, without touching the socket.
    pub fn try_recv(&mut self) -> Option<ReceivedMessage> {
        while let Some(stream) = self.association.accept_stream() {
            let id = stream.stream_identifier();
            if self.streams.insert(id) {
                debug!("SCTP peer opened stream {}", id);
                self.notify(SctpEvent::StreamOpened(id));
            }
        }

        let ids: Vec<u16> = self.streams.iter().copied().collect();
        for stream_id in ids {
            let Ok(Some(chunks)) = self
                .association
                .stream(stream_id)
                .and_then(|mut stream| stream.read())
            else {
                continue;
            };
            if chunks.len() == 0 {
                continue;
            }

            let mut data = vec![0u8; chunks.len()];
            if let Err(e) = chunks.read(&mut data) {
                warn!("SCTP stream {} read failed: {}", stream_id, e);
                continue;
            }
            return Some(ReceivedMessage {
                stream_id,
                data: Bytes::from(data),
                ppid: ppid_value(chunks.ppi),
            });
        }
        None
    }

    /// Sends SHUTDOWN and waits a bounded time for the peer to acknowledge.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.state == AssociationState::Closed {
            return Ok(());
        }
        debug!("SCTP shutdown towards {}", self.remote_addr);
        self.state = AssociationState::ShuttingDown;
        let _ = self.association.shutdown();
        self.drive().await?;

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while self.state == AssociationState::ShuttingDown
            && !self.association.is_closed()
            && Instant::now() < deadline
        {
            self.pump(PUMP_INTERVAL).await;
            self.drive().await?;
        }

        if self.state != AssociationState::Closed {
            self.state = AssociationState::Closed;
            self.notify(SctpEvent::Disconnected);
        }
        info!("SCTP association with {} shut down", self.remote_addr);
        Ok(())
    }

    /// Aborts the association without waiting for the peer.
    pub fn close(&mut self) {
        if self.state != AssociationState::Closed {
            let _ = self.association.close();
            self.state = AssociationState::Closed;
            self.notify(SctpEvent::Disconnected);
        }
    }

    pub fn is_established(&self) -> bool {
        self.state == AssociationState::Established
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

impl Drop for SctpAssociation {
    fn drop(&mut self) {
        self.close();
    }
}

fn stream_error(stream: u16, e: impl std::fmt::Display) -> SctpError {
    SctpError::Stream {
        stream,
        reason: e.to_string(),
    }
}

/// Numeric PPID of a chunk, or `None` for one sctp-proto lumps into `Unknown`.
fn ppid_value(ppi: PayloadProtocolIdentifier) -> Option<u32> {
    match ppi {
        PayloadProtocolIdentifier::Dcep => Some(50),
        PayloadProtocolIdentifier::String => Some(51),
        PayloadProtocolIdentifier::Binary => Some(53),
        PayloadProtocolIdentifier::StringEmpty => Some(56),
        PayloadProtocolIdentifier::BinaryEmpty => Some(57),
        PayloadProtocolIdentifier::Unknown => None,
    }
}

/// PPID that goes on the wire when `ppid` is requested.
pub fn wire_ppid(ppid: u32) -> u32 {
    ppid_value(PayloadProtocolIdentifier::from(ppid)).unwrap_or(UNKNOWN_WIRE_PPID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_e2ap() {
        let config = SctpConfig::default();
        assert_eq!(config.ppid, E2AP_PPID);
        assert_eq!(config.max_outbound_streams, DEFAULT_NUM_STREAMS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_open_rejects_bad_config() {
        for config in [
            SctpConfig {
                max_inbound_streams: 0,
                ..SctpConfig::default()
            },
            SctpConfig {
                max_receive_buffer_size: 0,
                ..SctpConfig::default()
            },
            SctpConfig {
                rto_min_ms: 70000,
                ..SctpConfig::default()
            },
        ] {
            assert!(matches!(
                SctpEndpoint::open(config),
                Err(SctpError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_unmodelled_ppid_is_not_invented() {
        // NGAP and E2AP both fall into Unknown
        assert_eq!(ppid_value(PayloadProtocolIdentifier::from(60)), None);
        assert_eq!(ppid_value(PayloadProtocolIdentifier::from(E2AP_PPID)), None);
        assert_eq!(ppid_value(PayloadProtocolIdentifier::Binary), Some(53));
    }

    #[test]
    fn test_wire_ppid() {
        assert_eq!(wire_ppid(E2AP_PPID), UNKNOWN_WIRE_PPID);
        assert_eq!(wire_ppid(60), UNKNOWN_WIRE_PPID);
        assert_eq!(wire_ppid(53), 53);
        assert_eq!(wire_ppid(50), 50);
    }

    #[tokio::test]
    async fn test_bind_twice_fails() {
        let mut endpoint = SctpEndpoint::open(SctpConfig::default()).unwrap();
        let addr = endpoint.bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        assert_ne!(addr.port(), 0);
        assert!(matches!(
            endpoint.bind("127.0.0.1:0".parse().unwrap()).await,
            Err(SctpError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_requires_bind() {
        let endpoint = SctpEndpoint::open(SctpConfig::default()).unwrap();
        let result = endpoint.connect("127.0.0.1:36421".parse().unwrap()).await;
        assert!(matches!(result, Err(SctpError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_handshake_times_out_against_silent_peer() {
        let config = SctpConfig {
            connect_timeout: Duration::from_millis(200),
            ..SctpConfig::default()
        };
        let mut endpoint = SctpEndpoint::open(config).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        endpoint.set_event_sender(tx);
        endpoint.bind("127.0.0.1:0".parse().unwrap()).await.unwrap();

        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let result = endpoint.connect(silent.local_addr().unwrap()).await;
        assert!(matches!(
            result,
            Err(SctpError::HandshakeTimeout(_)) | Err(SctpError::Handshake { .. })
        ));
        assert_ne!(rx.try_recv().ok(), Some(SctpEvent::Connected));
    }
}
