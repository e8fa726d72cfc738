//! SCTP Transport
//!
//! The association is owned by a dedicated tokio task. The agent talks to it
//! through a command channel; inbound data and association loss are pushed
//! straight onto the agent task queue.
//!
//! ```text
//! RIC <--SCTP/UDP--> association task --HandleRx--> agent task queue
//!                          ^
//!                          +---- Send / Close ---- SctpTransport (agent)
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use nextgsim_sctp::{SctpAssociation, SctpConfig, SctpEndpoint, SctpEvent};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::{E2Connector, E2Transport, Endpoints, InboundDatagram, TransportError};
use crate::scheduler::TaskQueue;
use crate::tasks::AgentTask;

/// Stream used for all E2AP traffic
const E2AP_STREAM_ID: u16 = 0;
/// Capacity of the command channel towards the association task
const COMMAND_CHANNEL_CAPACITY: usize = 64;
/// Default receive poll granularity of the association task
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Commands handled by the association task
#[derive(Debug)]
enum SctpCommand {
    Send {
        payload: Bytes,
        reply: oneshot::Sender<Result<usize, TransportError>>,
    },
    Close {
        done: oneshot::Sender<()>,
    },
}

/// Connects to the RIC over SCTP.
#[derive(Debug, Clone)]
pub struct SctpConnector {
    config: SctpConfig,
    poll_interval: Duration,
}

impl Default for SctpConnector {
    fn default() -> Self {
        Self::new(SctpConfig::default())
    }
}

impl SctpConnector {
    pub fn new(config: SctpConfig) -> Self {
        Self {
            config,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets how long the association task waits for inbound packets before
    /// checking for commands again.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[async_trait::async_trait]
impl E2Connector for SctpConnector {
    type Transport = SctpTransport;

    async fn connect(
        &self,
        endpoints: Endpoints,
        queue: TaskQueue<AgentTask>,
    ) -> Result<SctpTransport, TransportError> {
        info!(
            "Connecting E2 SCTP association {} -> {}",
            endpoints.local, endpoints.remote
        );

        let mut endpoint = SctpEndpoint::open(self.config.clone())
            .map_err(|e| TransportError::Open(e.to_string()))?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        endpoint.set_event_sender(event_tx);

        let local = endpoint
            .bind(endpoints.local)
            .await
            .map_err(|e| TransportError::Bind {
                addr: endpoints.local,
                reason: e.to_string(),
            })?;
        debug!("E2 SCTP endpoint bound to {}", local);

        let association =
            endpoint
                .connect(endpoints.remote)
                .await
                .map_err(|e| TransportError::Connect {
                    addr: endpoints.remote,
                    reason: e.to_string(),
                })?;
        let peer = association.remote_addr();
        info!("E2 SCTP association established with {}", peer);

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let task = tokio::spawn(run_association(
            association,
            cmd_rx,
            event_rx,
            queue,
            self.poll_interval,
        ));

        Ok(SctpTransport {
            cmd_tx,
            peer,
            task: Some(task),
        })
    }
}

/// Agent side of an SCTP association.
#[derive(Debug)]
pub struct SctpTransport {
    cmd_tx: mpsc::Sender<SctpCommand>,
    peer: SocketAddr,
    task: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl E2Transport for SctpTransport {
    async fn send(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        let (reply, rx) = oneshot::channel();
        let cmd = SctpCommand::Send {
            payload: Bytes::copy_from_slice(payload),
            reply,
        };
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| TransportError::Closed)?;
        rx.await.map_err(|_| TransportError::Closed)?
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn close(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        let (done, rx) = oneshot::channel();
        if self.cmd_tx.send(SctpCommand::Close { done }).await.is_ok() {
            let _ = rx.await;
        }
        if let Err(e) = task.await {
            error!("E2 SCTP association task failed: {}", e);
        }
        debug!("E2 SCTP transport to {} closed", self.peer);
    }
}

impl Drop for SctpTransport {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Association task: executes commands and forwards inbound traffic.
async fn run_association(
    mut association: SctpAssociation,
    mut cmd_rx: mpsc::Receiver<SctpCommand>,
    mut event_rx: mpsc::UnboundedReceiver<SctpEvent>,
    queue: TaskQueue<AgentTask>,
    poll_interval: Duration,
) {
    let peer = association.remote_addr();
    debug!("E2 SCTP association task started for {}", peer);

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => match cmd {
                Some(SctpCommand::Send { payload, reply }) => {
                    let result = association
                        .send(E2AP_STREAM_ID, &payload)
                        .await
                        .map(|()| payload.len())
                        .map_err(|e| TransportError::Send(e.to_string()));
                    let _ = reply.send(result);
                }
                Some(SctpCommand::Close { done }) => {
                    if let Err(e) = association.shutdown().await {
                        warn!("E2 SCTP shutdown failed: {}", e);
                    }
                    let _ = done.send(());
                    break;
                }
                None => {
                    association.close();
                    break;
                }
            },

            result = association.poll_recv(poll_interval) => match result {
                Ok(Some(msg)) => {
                    trace!(
                        "E2 SCTP received {} bytes on stream {} (ppid {:?})",
                        msg.data.len(),
                        msg.stream_id,
                        msg.ppid
                    );
                    let datagram = InboundDatagram {
                        payload: msg.data,
                        peer,
                        stream_id: msg.stream_id,
                        ppid: msg.ppid,
                        flags: 0,
                    };
                    if queue.push(AgentTask::HandleRx(datagram)).is_err() {
                        debug!("Agent task queue closed, stopping E2 SCTP association task");
                        association.close();
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("E2 SCTP association with {} lost: {}", peer, e);
                    let _ = queue.push(AgentTask::TransportLost(e.to_string()));
                    break;
                }
            },
        }

        // Data is delivered through poll_recv, only loss is of interest here
        let mut lost = false;
        while let Ok(event) = event_rx.try_recv() {
            match event {
                SctpEvent::Disconnected => lost = true,
                SctpEvent::StreamOpened(stream) => trace!("E2 SCTP stream {} opened", stream),
                SctpEvent::Connected => {}
            }
        }
        if lost && !association.is_established() {
            warn!("E2 SCTP association with {} went down", peer);
            let _ = queue.push(AgentTask::TransportLost("association down".to_string()));
            break;
        }
    }

    debug!("E2 SCTP association task for {} stopped", peer);
}
