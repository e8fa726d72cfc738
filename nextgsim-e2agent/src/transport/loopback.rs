//! In-memory Transport
//!
//! A [`LoopbackConnector`] and a [`RicPeer`] are created as a pair. The agent
//! connects through the connector; the peer plays the RIC side: it reads what
//! the agent sent and injects datagrams or an association loss.
//!
//! Any initialization step can be made to fail with
//! [`LoopbackConnector::fail_at`], and sends can be made to fail with
//! [`RicPeer::set_send_failure`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use nextgsim_sctp::E2AP_PPID;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{E2Connector, E2Transport, Endpoints, InboundDatagram, InitStep, TransportError};
use crate::scheduler::TaskQueue;
use crate::tasks::AgentTask;

/// Traffic from the RIC side towards the agent
#[derive(Debug)]
enum PeerFrame {
    Data { payload: Bytes, ppid: u32 },
    Lost(String),
}

/// Agent side channel ends, handed over on connect
#[derive(Debug)]
struct AgentEnds {
    to_peer: mpsc::UnboundedSender<Bytes>,
    from_peer: mpsc::UnboundedReceiver<PeerFrame>,
}

/// State shared by both sides of the pair
#[derive(Debug, Default)]
struct Shared {
    fail_sends: AtomicBool,
    closed: AtomicBool,
}

/// Connector for the in-memory transport.
#[derive(Debug)]
pub struct LoopbackConnector {
    ends: Mutex<Option<AgentEnds>>,
    shared: Arc<Shared>,
    fail_at: Option<InitStep>,
}

impl LoopbackConnector {
    /// Creates a connector and the RIC peer it connects to.
    pub fn pair() -> (LoopbackConnector, RicPeer) {
        let (to_peer, from_agent) = mpsc::unbounded_channel();
        let (to_agent, from_peer) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());

        let connector = LoopbackConnector {
            ends: Mutex::new(Some(AgentEnds { to_peer, from_peer })),
            shared: shared.clone(),
            fail_at: None,
        };
        let peer = RicPeer {
            to_agent,
            from_agent,
            shared,
        };
        (connector, peer)
    }

    /// Makes `step` fail on connect.
    pub fn fail_at(mut self, step: InitStep) -> Self {
        self.fail_at = Some(step);
        self
    }

    fn run_step(&self, step: InitStep, endpoints: &Endpoints) -> Result<(), TransportError> {
        trace!("Loopback transport: {}", step);
        if self.fail_at != Some(step) {
            return Ok(());
        }

        let reason = "injected failure".to_string();
        Err(match step {
            InitStep::Open => TransportError::Open(reason),
            InitStep::Subscribe => TransportError::Subscribe(reason),
            InitStep::Bind => TransportError::Bind {
                addr: endpoints.local,
                reason,
            },
            InitStep::Connect => TransportError::Connect {
                addr: endpoints.remote,
                reason,
            },
        })
    }

    fn close_ends(&self) {
        if let Ok(mut ends) = self.ends.lock() {
            ends.take();
        }
        self.shared.closed.store(true, Ordering::Release);
    }
}

#[async_trait::async_trait]
impl E2Connector for LoopbackConnector {
    type Transport = LoopbackTransport;

    async fn connect(
        &self,
        endpoints: Endpoints,
        queue: TaskQueue<AgentTask>,
    ) -> Result<LoopbackTransport, TransportError> {
        for step in InitStep::ALL {
            if let Err(e) = self.run_step(step, &endpoints) {
                self.close_ends();
                return Err(e);
            }
        }

        let ends = self
            .ends
            .lock()
            .map_err(|_| TransportError::Open("loopback state poisoned".to_string()))?
            .take()
            .ok_or_else(|| TransportError::Open("loopback pair already connected".to_string()))?;

        let peer = endpoints.remote;
        let receiver = tokio::spawn(forward_to_queue(ends.from_peer, queue, peer));
        debug!("Loopback transport connected to {}", peer);

        Ok(LoopbackTransport {
            to_peer: Some(ends.to_peer),
            peer,
            shared: self.shared.clone(),
            receiver: Some(receiver),
        })
    }
}

/// Receive path: wraps every frame from the peer into a task.
async fn forward_to_queue(
    mut from_peer: mpsc::UnboundedReceiver<PeerFrame>,
    queue: TaskQueue<AgentTask>,
    peer: SocketAddr,
) {
    while let Some(frame) = from_peer.recv().await {
        let task = match frame {
            PeerFrame::Data { payload, ppid } => AgentTask::HandleRx(InboundDatagram {
                payload,
                peer,
                stream_id: 0,
                ppid: Some(ppid),
                flags: 0,
            }),
            PeerFrame::Lost(reason) => AgentTask::TransportLost(reason),
        };
        if queue.push(task).is_err() {
            break;
        }
    }
}

/// Agent side of the in-memory association.
#[derive(Debug)]
pub struct LoopbackTransport {
    to_peer: Option<mpsc::UnboundedSender<Bytes>>,
    peer: SocketAddr,
    shared: Arc<Shared>,
    receiver: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl E2Transport for LoopbackTransport {
    async fn send(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        let to_peer = self.to_peer.as_ref().ok_or(TransportError::Closed)?;
        if self.shared.fail_sends.load(Ordering::Acquire) {
            return Err(TransportError::Send("injected failure".to_string()));
        }
        to_peer
            .send(Bytes::copy_from_slice(payload))
            .map_err(|_| TransportError::Send("peer gone".to_string()))?;
        Ok(payload.len())
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn close(&mut self) {
        self.to_peer = None;
        if let Some(receiver) = self.receiver.take() {
            receiver.abort();
        }
        self.shared.closed.store(true, Ordering::Release);
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            receiver.abort();
        }
    }
}

/// RIC side of the in-memory association.
#[derive(Debug)]
pub struct RicPeer {
    to_agent: mpsc::UnboundedSender<PeerFrame>,
    from_agent: mpsc::UnboundedReceiver<Bytes>,
    shared: Arc<Shared>,
}

impl RicPeer {
    /// Default address reported for the peer
    pub fn default_addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 36421)
    }

    /// Delivers a datagram to the agent, tagged with the E2AP PPID.
    pub fn send(&self, payload: impl Into<Bytes>) -> bool {
        self.send_with_ppid(payload, E2AP_PPID)
    }

    /// Delivers a datagram with an arbitrary PPID.
    pub fn send_with_ppid(&self, payload: impl Into<Bytes>, ppid: u32) -> bool {
        self.to_agent
            .send(PeerFrame::Data {
                payload: payload.into(),
                ppid,
            })
            .is_ok()
    }

    /// Simulates an association loss notification.
    pub fn drop_association(&self, reason: &str) -> bool {
        self.to_agent
            .send(PeerFrame::Lost(reason.to_string()))
            .is_ok()
    }

    /// Makes every following agent send fail (or succeed again).
    pub fn set_send_failure(&self, fail: bool) {
        self.shared.fail_sends.store(fail, Ordering::Release);
    }

    /// Waits for the next datagram sent by the agent. Returns `None` once the
    /// agent side is closed.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.from_agent.recv().await
    }

    /// Like [`recv`](Self::recv) with an upper bound on the wait.
    pub async fn recv_timeout(&mut self, wait: Duration) -> Option<Bytes> {
        tokio::time::timeout(wait, self.from_agent.recv())
            .await
            .ok()
            .flatten()
    }

    /// Returns a datagram sent by the agent, if one is waiting.
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.from_agent.try_recv().ok()
    }

    /// True once the agent side closed the transport or failed to connect.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}
