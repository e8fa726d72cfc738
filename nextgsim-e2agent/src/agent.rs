//! E2 Agent
//!
//! The agent owns the E2 session towards one Near-RT RIC. It is driven by a
//! single cooperative run loop: each iteration may queue the E2 Setup
//! Request, then executes exactly one [`AgentTask`]. Inbound datagrams are
//! decoded and dispatched inside that loop, and every response is queued as
//! a separate send task.
//!
//! # Procedures
//!
//! | Direction  | Procedure                          | Handling                        |
//! |------------|------------------------------------|---------------------------------|
//! | node → RIC | E2 Setup                           | retried on timeout / TimeToWait |
//! | node → RIC | Reset                              | via [`AgentHandle::request_reset`] |
//! | RIC → node | Reset                              | subscriptions released          |
//! | RIC → node | RIC Subscription / Delete / Modify | subscription table              |
//! | RIC → node | RIC Control, E2 Connection Update, E2 Removal | stubs                |
//! | RIC → node | Error Indication                   | logged                          |

use bytes::Bytes;
use nextgsim_common::logging::{log_e2ap_message, Direction, HexDump};
use nextgsim_common::E2AgentConfig;
use nextgsim_e2ap::ies::{
    Cause, CauseRicRequest, GlobalE2NodeId, GnbNodeId, RanFunctionId, RanFunctionItem,
    RicActionId, RicActionNotAdmittedItem, RicRequestId, TransactionId,
};
use nextgsim_e2ap::messages::{
    E2SetupFailure, E2SetupRequest, E2SetupResponse, ErrorIndication, ResetRequest,
    ResetResponse, RicSubscriptionDeleteFailure, RicSubscriptionDeleteRequest,
    RicSubscriptionDeleteResponse, RicSubscriptionFailure, RicSubscriptionModificationConfirm,
    RicSubscriptionModificationFailure, RicSubscriptionModificationRefuse,
    RicSubscriptionModificationRequest, RicSubscriptionModificationResponse,
    RicSubscriptionRequest, RicSubscriptionResponse,
};
use nextgsim_e2ap::{
    decode_e2ap_pdu, encode_e2ap_pdu, Choice, E2apMessage, E2apPdu, InitiatingMessageValue,
    SuccessfulOutcomeValue, UnsuccessfulOutcomeValue,
};
use nextgsim_sctp::E2AP_PPID;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::app::{validate_e2_agent_config, ConfigValidationError};
use crate::scheduler::{QueueClosed, TaskQueue, TaskScheduler, TickHandle};
use crate::session::{AgentState, Session, StateError, Subscription};
use crate::tasks::{
    AgentEvent, AgentTask, TIMER_E2_RESET_RESPONSE, TIMER_E2_SETUP_BACKOFF,
    TIMER_E2_SETUP_RESPONSE,
};
use crate::transport::{E2Connector, E2Transport, Endpoints, InboundDatagram, TransportError};

// ============================================================================
// Errors and Outcomes
// ============================================================================

/// Errors that end or prevent the agent's lifecycle
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("E2 agent is disabled in the configuration")]
    Disabled,
    #[error("Invalid E2 agent configuration: {0}")]
    Config(#[from] ConfigValidationError),
    #[error("E2 transport initialization failed: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    State(#[from] StateError),
}

/// Failure of a single procedure processor. Logged, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcedureError {
    #[error("{message} is not expected in state {state}")]
    UnexpectedState {
        message: &'static str,
        state: AgentState,
    },
    #[error("{message} transaction id {received} does not match outstanding {expected}")]
    TransactionMismatch {
        message: &'static str,
        expected: TransactionId,
        received: TransactionId,
    },
    #[error("{message} transaction id {received} answers no outstanding request")]
    NoOutstandingTransaction {
        message: &'static str,
        received: TransactionId,
    },
    #[error("{message} refers to unknown subscription {ric_request_id}/{ran_function_id}")]
    UnknownSubscription {
        message: &'static str,
        ric_request_id: RicRequestId,
        ran_function_id: RanFunctionId,
    },
    #[error(transparent)]
    State(#[from] StateError),
}

/// What happened to one inbound datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Processed by its procedure handler
    Handled(&'static str),
    /// The handler rejected it
    Failed {
        message: &'static str,
        error: ProcedureError,
    },
    /// Accepted by a placeholder handler
    Stub(&'static str),
    /// A valid message the agent has no handler for
    Unsupported(&'static str),
    /// Not a decodable E2AP PDU
    Dropped(String),
}

// ============================================================================
// Agent
// ============================================================================

/// E2 agent bound to one transport.
pub struct E2Agent<T: E2Transport> {
    config: E2AgentConfig,
    transport: T,
    scheduler: TaskScheduler<AgentTask>,
    queue: TaskQueue<AgentTask>,
    session: Session,
    node_id: GlobalE2NodeId,
    ran_functions: Vec<RanFunctionItem>,
    events: Option<mpsc::UnboundedSender<AgentEvent>>,
    running: bool,
    last_dispatch: Option<Dispatch>,
}

impl<T: E2Transport> E2Agent<T> {
    /// Validates the configuration, runs the transport initialization steps
    /// through `connector` and moves to [`AgentState::Connecting`].
    pub async fn init<C>(config: E2AgentConfig, connector: &C) -> Result<Self, AgentError>
    where
        C: E2Connector<Transport = T>,
    {
        if !config.enable {
            return Err(AgentError::Disabled);
        }
        validate_e2_agent_config(&config)?;
        let ran_functions = ran_function_items(&config)?;

        let node_id = GlobalE2NodeId::Gnb(GnbNodeId {
            plmn: config.node.plmn,
            gnb_id: config.node.gnb_id,
            gnb_id_len: config.node.gnb_id_length,
            gnb_cu_up_id: None,
            gnb_du_id: None,
        });

        let scheduler = TaskScheduler::new();
        let queue = scheduler.make_task_queue();
        let endpoints = Endpoints {
            local: config.bind_addr(),
            remote: config.ric_addr(),
        };

        let transport = match connector.connect(endpoints, queue.clone()).await {
            Ok(transport) => transport,
            Err(e) => {
                match e.init_step() {
                    Some(step) => error!("E2 transport {} step failed: {}", step, e),
                    None => error!("E2 transport initialization failed: {}", e),
                }
                return Err(e.into());
            }
        };

        let mut session = Session::new();
        session.peer = Some(transport.peer_addr());
        session.transition(AgentState::Connecting)?;
        info!(
            "E2 agent connected to RIC {} ({} RAN function(s))",
            transport.peer_addr(),
            ran_functions.len()
        );

        Ok(Self {
            config,
            transport,
            scheduler,
            queue,
            session,
            node_id,
            ran_functions,
            events: None,
            running: true,
            last_dispatch: None,
        })
    }

    /// Returns a receiver for agent events. A later call replaces the
    /// previous subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AgentEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn state(&self) -> AgentState {
        self.session.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &E2AgentConfig {
        &self.config
    }

    /// Returns false once the run loop has to end.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Outcome of the last inbound datagram.
    pub fn last_dispatch(&self) -> Option<&Dispatch> {
        self.last_dispatch.as_ref()
    }

    pub fn task_queue(&self) -> TaskQueue<AgentTask> {
        self.queue.clone()
    }

    pub fn tick_handle(&self) -> TickHandle {
        self.scheduler.tick_handle()
    }

    /// Spawns the run loop and returns the owner's handle.
    pub fn start(self) -> AgentHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ticks = self.scheduler.tick_handle();
        let queue = self.queue.clone();
        let task = tokio::spawn(self.run(shutdown_rx));

        AgentHandle {
            shutdown_tx,
            ticks,
            queue,
            task,
        }
    }

    /// Runs until stopped through `shutdown`, setup fails or the transport
    /// is lost. The transport is closed on exit.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("E2 agent run loop started");

        while self.running && !*shutdown.borrow() {
            self.schedule_setup();

            let task = tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("E2 agent owner dropped its handle");
                        break;
                    }
                    continue;
                }
                task = self.scheduler.next_task() => task,
            };

            match task {
                Some(task) => self.execute(task).await,
                None => break,
            }
        }

        self.shutdown().await;
    }

    /// Executes one loop iteration: queues the E2 Setup Request if needed
    /// and runs the next task, waiting for it if necessary.
    ///
    /// Returns false once the run loop has to end.
    pub async fn run_once(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.schedule_setup();
        if let Some(task) = self.scheduler.next_task().await {
            self.execute(task).await;
        }
        self.running
    }

    /// Like [`run_once`](Self::run_once) but never waits. Returns true if a
    /// task was executed.
    pub async fn try_run_once(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.schedule_setup();
        match self.scheduler.try_next_task() {
            Some(task) => {
                self.execute(task).await;
                true
            }
            None => false,
        }
    }

    /// Closes the transport and reports [`AgentEvent::Stopped`].
    pub async fn shutdown(&mut self) {
        self.running = false;
        self.transport.close().await;
        self.emit(AgentEvent::Stopped);
        info!("E2 agent stopped in state {}", self.session.state());
    }

    // ------------------------------------------------------------------------
    // Task execution
    // ------------------------------------------------------------------------

    fn schedule_setup(&mut self) {
        if self.session.state() == AgentState::Connecting && !self.session.setup_sent {
            self.session.setup_sent = true;
            self.enqueue(AgentTask::SendSetupRequest);
        }
    }

    async fn execute(&mut self, task: AgentTask) {
        trace!("Executing {}", task.name());
        match task {
            AgentTask::HandleRx(datagram) => {
                let outcome = self.handle_rx(datagram);
                self.last_dispatch = Some(outcome);
            }
            AgentTask::SendSetupRequest => self.send_setup_request().await,
            AgentTask::SendResetRequest(cause) => self.send_reset_request(cause).await,
            AgentTask::SendPdu(pdu) => self.send(&pdu).await,
            AgentTask::SetupResponseTimeout => self.on_setup_response_timeout(),
            AgentTask::SetupBackoffExpired => self.on_setup_backoff_expired(),
            AgentTask::ResetResponseTimeout(transaction_id) => {
                self.on_reset_response_timeout(transaction_id)
            }
            AgentTask::TransportLost(reason) => self.on_transport_lost(reason),
        }
    }

    fn enqueue(&self, task: AgentTask) {
        if let Err(e) = self.queue.push(task) {
            error!("Failed to queue E2 agent task: {}", e);
        }
    }

    fn respond(&self, pdu: E2apPdu) {
        self.enqueue(AgentTask::send(pdu));
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    fn change_state(&mut self, to: AgentState) -> Result<(), StateError> {
        match self.session.transition(to) {
            Ok(from) => {
                info!("E2 agent state {} -> {}", from, to);
                self.emit(AgentEvent::StateChanged { from, to });
                Ok(())
            }
            Err(e) => {
                error!("{}", e);
                Err(e)
            }
        }
    }

    fn max_setup_attempts(&self) -> u32 {
        self.config.timers.max_setup_attempts.max(1)
    }

    // ------------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------------

    /// Encodes and sends one PDU. Encode failures drop the PDU; send
    /// failures are counted and may end the session.
    async fn send(&mut self, pdu: &E2apPdu) {
        let name = pdu.message_name();
        let bytes = match encode_e2ap_pdu(pdu) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to encode {}: {}", name, e);
                return;
            }
        };

        match self.transport.send(&bytes).await {
            Ok(sent) => {
                self.session.record_send(true);
                log_e2ap_message(Direction::Tx, name, &bytes);
                trace!("{} bytes of {} handed to the transport", sent, name);
            }
            Err(e) => {
                let failures = self.session.record_send(false);
                warn!(
                    "Failed to send {} ({} consecutive failure(s)): {}",
                    name, failures, e
                );
                let limit = self.config.timers.max_consecutive_send_failures;
                if limit > 0 && failures >= limit {
                    self.on_transport_lost(format!("{failures} consecutive send failures"));
                }
            }
        }
    }

    async fn send_setup_request(&mut self) {
        match self.session.state() {
            AgentState::Connecting => {
                if self.change_state(AgentState::AwaitingSetupResponse).is_err() {
                    return;
                }
            }
            AgentState::AwaitingSetupResponse => {}
            state => {
                debug!("Not sending E2 Setup Request in state {}", state);
                return;
            }
        }

        // Retries reuse the transaction of the first attempt
        let transaction_id = match self.session.setup_transaction_id {
            Some(id) => id,
            None => {
                let id = self.session.allocate_transaction_id();
                self.session.setup_transaction_id = Some(id);
                id
            }
        };
        self.session.setup_attempts += 1;

        info!(
            "Sending E2 Setup Request (transaction {}, attempt {}/{})",
            transaction_id,
            self.session.setup_attempts,
            self.max_setup_attempts()
        );

        let request = E2SetupRequest {
            transaction_id,
            global_e2_node_id: self.node_id,
            ran_functions_added: self.ran_functions.clone(),
            component_config_addition: Vec::new(),
        };
        self.scheduler.start_timer(
            TIMER_E2_SETUP_RESPONSE,
            self.config.timers.setup_response_timeout_ticks,
            AgentTask::SetupResponseTimeout,
        );
        self.send(&E2apPdu::initiating(request)).await;
    }

    async fn send_reset_request(&mut self, cause: Cause) {
        let state = self.session.state();
        if state != AgentState::Established {
            warn!("Ignoring Reset request in state {}", state);
            return;
        }

        let transaction_id = self.session.allocate_transaction_id();
        self.session.last_reset_transaction_id = Some(transaction_id);
        self.session.reset_pending = true;
        let released = self.session.clear_subscriptions();
        info!(
            "Sending Reset Request (transaction {}, cause {}), {} subscription(s) released",
            transaction_id, cause, released
        );

        self.scheduler.start_timer(
            TIMER_E2_RESET_RESPONSE,
            self.config.timers.reset_response_timeout_ticks,
            AgentTask::ResetResponseTimeout(transaction_id),
        );
        self.send(&E2apPdu::initiating(ResetRequest {
            transaction_id,
            cause,
        }))
        .await;
    }

    // ------------------------------------------------------------------------
    // Timers and transport events
    // ------------------------------------------------------------------------

    fn on_setup_response_timeout(&mut self) {
        if self.session.state() != AgentState::AwaitingSetupResponse {
            return;
        }

        let attempts = self.session.setup_attempts;
        if attempts >= self.max_setup_attempts() {
            self.fail_setup();
            return;
        }
        warn!(
            "No E2 Setup Response after attempt {}/{}, retrying",
            attempts,
            self.max_setup_attempts()
        );
        self.enqueue(AgentTask::SendSetupRequest);
    }

    fn on_setup_backoff_expired(&mut self) {
        if self.session.state() == AgentState::AwaitingSetupResponse {
            debug!("E2 Setup back-off elapsed");
            self.enqueue(AgentTask::SendSetupRequest);
        }
    }

    fn on_reset_response_timeout(&mut self, transaction_id: TransactionId) {
        if self.session.reset_pending
            && self.session.last_reset_transaction_id == Some(transaction_id)
        {
            warn!("No Reset Response for transaction {}", transaction_id);
            self.session.reset_pending = false;
        }
    }

    fn fail_setup(&mut self) {
        let attempts = self.session.setup_attempts;
        error!("E2 Setup failed after {} attempt(s)", attempts);
        self.scheduler.cancel_timer(TIMER_E2_SETUP_RESPONSE);
        self.scheduler.cancel_timer(TIMER_E2_SETUP_BACKOFF);
        self.emit(AgentEvent::SetupFailed { attempts });
        self.running = false;
    }

    fn on_transport_lost(&mut self, reason: String) {
        if !self.running {
            return;
        }
        warn!(
            "E2 transport lost in state {}: {}",
            self.session.state(),
            reason
        );

        if self.session.state() == AgentState::Established {
            let _ = self.change_state(AgentState::Idle);
        }
        self.scheduler.cancel_timer(TIMER_E2_SETUP_RESPONSE);
        self.scheduler.cancel_timer(TIMER_E2_SETUP_BACKOFF);
        self.scheduler.cancel_timer(TIMER_E2_RESET_RESPONSE);
        self.emit(AgentEvent::TransportLost { reason });
        self.running = false;
    }

    // ------------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------------

    fn handle_rx(&mut self, datagram: InboundDatagram) -> Dispatch {
        // An unreported PPID is accepted; a known foreign one is not
        if let Some(ppid) = datagram.ppid.filter(|&ppid| ppid != E2AP_PPID) {
            warn!(
                "Dropping {} byte datagram from {} with PPID {}",
                datagram.payload.len(),
                datagram.peer,
                ppid
            );
            return Dispatch::Dropped(format!("unexpected PPID {ppid}"));
        }

        let pdu = match decode_e2ap_pdu(&datagram.payload) {
            Ok(pdu) => pdu,
            Err(e) => {
                warn!(
                    "Failed to decode E2AP PDU from {} ({} bytes): {}",
                    datagram.peer,
                    datagram.payload.len(),
                    e
                );
                trace!("Undecodable payload: {}", HexDump(&datagram.payload));
                return Dispatch::Dropped(e.to_string());
            }
        };

        log_e2ap_message(Direction::Rx, pdu.message_name(), &datagram.payload);
        self.dispatch(pdu)
    }

    fn dispatch(&mut self, pdu: E2apPdu) -> Dispatch {
        let name = pdu.message_name();
        trace!("Dispatching {} {}", pdu.alternative_name(), name);

        let outcome = match pdu {
            E2apPdu::InitiatingMessage(msg) => self.dispatch_initiating(msg.value),
            E2apPdu::SuccessfulOutcome(msg) => self.dispatch_successful(msg.value),
            E2apPdu::UnsuccessfulOutcome(msg) => self.dispatch_unsuccessful(msg.value),
        };

        match &outcome {
            Dispatch::Handled(_) => {}
            Dispatch::Failed { message, error } => warn!("{} rejected: {}", message, error),
            Dispatch::Stub(message) => info!("{} received, not acted upon", message),
            Dispatch::Unsupported(message) => warn!("Unsupported message {} ignored", message),
            Dispatch::Dropped(reason) => warn!("{} dropped: {}", name, reason),
        }
        outcome
    }

    fn dispatch_initiating(&mut self, value: InitiatingMessageValue) -> Dispatch {
        let name = value.message_name();
        match value {
            InitiatingMessageValue::RicSubscriptionRequest(msg) => {
                processed(name, self.handle_subscription_request(msg))
            }
            InitiatingMessageValue::RicSubscriptionDeleteRequest(msg) => {
                processed(name, self.handle_subscription_delete_request(msg))
            }
            InitiatingMessageValue::RicSubscriptionModificationRequest(msg) => {
                processed(name, self.handle_subscription_modification_request(msg))
            }
            InitiatingMessageValue::ResetRequest(msg) => {
                processed(name, self.handle_reset_request(msg))
            }
            InitiatingMessageValue::ErrorIndication(msg) => {
                self.handle_error_indication(msg);
                Dispatch::Handled(name)
            }
            InitiatingMessageValue::RicControlRequest(_)
            | InitiatingMessageValue::E2ConnectionUpdate(_)
            | InitiatingMessageValue::E2RemovalRequest(_) => Dispatch::Stub(name),
            _ => Dispatch::Unsupported(name),
        }
    }

    fn dispatch_successful(&mut self, value: SuccessfulOutcomeValue) -> Dispatch {
        let name = value.message_name();
        match value {
            SuccessfulOutcomeValue::E2SetupResponse(msg) => {
                processed(name, self.handle_setup_response(msg))
            }
            SuccessfulOutcomeValue::ResetResponse(msg) => {
                processed(name, self.handle_reset_response(msg))
            }
            SuccessfulOutcomeValue::RicSubscriptionModificationConfirm(msg) => {
                processed(name, self.handle_modification_confirm(msg))
            }
            SuccessfulOutcomeValue::RicSubscriptionResponse(_)
            | SuccessfulOutcomeValue::RicControlAcknowledge(_)
            | SuccessfulOutcomeValue::RicServiceUpdateAcknowledge(_) => Dispatch::Stub(name),
            _ => Dispatch::Unsupported(name),
        }
    }

    fn dispatch_unsuccessful(&mut self, value: UnsuccessfulOutcomeValue) -> Dispatch {
        let name = value.message_name();
        match value {
            UnsuccessfulOutcomeValue::E2SetupFailure(msg) => {
                processed(name, self.handle_setup_failure(msg))
            }
            UnsuccessfulOutcomeValue::E2NodeConfigurationUpdateFailure(msg) => {
                warn!(
                    "E2 Node Configuration Update rejected (transaction {}): {}",
                    msg.transaction_id, msg.cause
                );
                Dispatch::Handled(name)
            }
            UnsuccessfulOutcomeValue::RicServiceUpdateFailure(msg) => {
                warn!(
                    "RIC Service Update rejected (transaction {}): {}",
                    msg.transaction_id, msg.cause
                );
                Dispatch::Handled(name)
            }
            UnsuccessfulOutcomeValue::E2RemovalFailure(msg) => {
                warn!(
                    "E2 Removal rejected (transaction {}): {}",
                    msg.transaction_id, msg.cause
                );
                Dispatch::Handled(name)
            }
            UnsuccessfulOutcomeValue::RicSubscriptionModificationRefuse(msg) => {
                processed(name, self.handle_modification_refuse(msg))
            }
            _ => Dispatch::Unsupported(name),
        }
    }

    fn require_established(&self, message: &'static str) -> Result<(), ProcedureError> {
        match self.session.state() {
            AgentState::Established => Ok(()),
            state => Err(ProcedureError::UnexpectedState { message, state }),
        }
    }

    fn has_ran_function(&self, id: RanFunctionId) -> bool {
        self.ran_functions.iter().any(|function| function.id == id)
    }

    // ------------------------------------------------------------------------
    // E2 Setup
    // ------------------------------------------------------------------------

    fn check_setup_transaction(
        &self,
        message: &'static str,
        received: TransactionId,
    ) -> Result<(), ProcedureError> {
        match self.session.setup_transaction_id {
            Some(expected) if expected != received => Err(ProcedureError::TransactionMismatch {
                message,
                expected,
                received,
            }),
            _ => Ok(()),
        }
    }

    fn handle_setup_response(&mut self, msg: E2SetupResponse) -> Result<(), ProcedureError> {
        let state = self.session.state();
        if !matches!(
            state,
            AgentState::Connecting | AgentState::AwaitingSetupResponse
        ) {
            return Err(ProcedureError::UnexpectedState {
                message: E2SetupResponse::NAME,
                state,
            });
        }
        self.check_setup_transaction(E2SetupResponse::NAME, msg.transaction_id)?;

        if state == AgentState::Connecting {
            self.change_state(AgentState::AwaitingSetupResponse)?;
        }
        self.scheduler.cancel_timer(TIMER_E2_SETUP_RESPONSE);
        self.scheduler.cancel_timer(TIMER_E2_SETUP_BACKOFF);
        self.session.setup_transaction_id = None;
        self.change_state(AgentState::Established)?;

        info!(
            "E2 Setup completed with RIC {}/{:#07x} after {} attempt(s)",
            msg.global_ric_id.plmn, msg.global_ric_id.ric_id, self.session.setup_attempts
        );
        if let Some(accepted) = &msg.ran_functions_accepted {
            for item in accepted {
                debug!("RAN function {} accepted (revision {})", item.id, item.revision);
            }
        }
        if let Some(rejected) = &msg.ran_functions_rejected {
            for item in rejected {
                warn!("RAN function {} rejected: {}", item.id, item.cause);
            }
        }
        Ok(())
    }

    fn handle_setup_failure(&mut self, msg: E2SetupFailure) -> Result<(), ProcedureError> {
        let state = self.session.state();
        if state != AgentState::AwaitingSetupResponse {
            return Err(ProcedureError::UnexpectedState {
                message: E2SetupFailure::NAME,
                state,
            });
        }
        self.check_setup_transaction(E2SetupFailure::NAME, msg.transaction_id)?;
        self.scheduler.cancel_timer(TIMER_E2_SETUP_RESPONSE);
        warn!("E2 Setup rejected by RIC: {}", msg.cause);

        match msg.time_to_wait {
            Some(time_to_wait) if self.session.setup_attempts < self.max_setup_attempts() => {
                let ticks = self.config.timers.millis_to_ticks(time_to_wait.as_millis());
                info!(
                    "Retrying E2 Setup in {} ms ({} ticks)",
                    time_to_wait.as_millis(),
                    ticks
                );
                self.scheduler.start_timer(
                    TIMER_E2_SETUP_BACKOFF,
                    ticks,
                    AgentTask::SetupBackoffExpired,
                );
            }
            _ => self.fail_setup(),
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------------

    fn handle_reset_request(&mut self, msg: ResetRequest) -> Result<(), ProcedureError> {
        self.require_established(ResetRequest::NAME)?;

        let released = self.session.clear_subscriptions();
        info!(
            "Reset requested by RIC (transaction {}, cause {}), {} subscription(s) released",
            msg.transaction_id, msg.cause, released
        );
        self.respond(E2apPdu::successful(ResetResponse {
            transaction_id: msg.transaction_id,
            criticality_diagnostics: None,
        }));
        Ok(())
    }

    fn handle_reset_response(&mut self, msg: ResetResponse) -> Result<(), ProcedureError> {
        self.require_established(ResetResponse::NAME)?;

        match self.session.last_reset_transaction_id {
            Some(expected) if self.session.reset_pending => {
                if expected != msg.transaction_id {
                    return Err(ProcedureError::TransactionMismatch {
                        message: ResetResponse::NAME,
                        expected,
                        received: msg.transaction_id,
                    });
                }
                self.session.reset_pending = false;
                self.scheduler.cancel_timer(TIMER_E2_RESET_RESPONSE);
                info!("Reset completed (transaction {})", expected);
                Ok(())
            }
            _ => Err(ProcedureError::NoOutstandingTransaction {
                message: ResetResponse::NAME,
                received: msg.transaction_id,
            }),
        }
    }

    // ------------------------------------------------------------------------
    // RIC subscriptions
    // ------------------------------------------------------------------------

    fn handle_subscription_request(
        &mut self,
        msg: RicSubscriptionRequest,
    ) -> Result<(), ProcedureError> {
        self.require_established(RicSubscriptionRequest::NAME)?;

        let key = (msg.ric_request_id, msg.ran_function_id);
        let mut actions: Vec<RicActionId> = msg
            .subscription_details
            .actions
            .iter()
            .map(|action| action.action_id)
            .collect();
        let requested = actions.clone();
        actions.sort_unstable();
        actions.dedup();

        let rejection = if !self.has_ran_function(msg.ran_function_id) {
            Some(CauseRicRequest::RanFunctionIdInvalid)
        } else if self.session.subscription(&key).is_some() {
            Some(CauseRicRequest::Unspecified)
        } else if actions.is_empty() {
            Some(CauseRicRequest::ActionNotSupported)
        } else if actions.len() != requested.len() {
            Some(CauseRicRequest::DuplicateAction)
        } else {
            None
        };

        if let Some(cause) = rejection {
            info!(
                "RIC Subscription {} for RAN function {} rejected: {:?}",
                msg.ric_request_id, msg.ran_function_id, cause
            );
            self.respond(E2apPdu::unsuccessful(RicSubscriptionFailure {
                ric_request_id: msg.ric_request_id,
                ran_function_id: msg.ran_function_id,
                cause: Cause::from(cause),
                criticality_diagnostics: None,
            }));
            return Ok(());
        }

        info!(
            "RIC Subscription {} for RAN function {} admitted with {} action(s)",
            msg.ric_request_id,
            msg.ran_function_id,
            actions.len()
        );
        self.session.add_subscription(Subscription {
            ric_request_id: msg.ric_request_id,
            ran_function_id: msg.ran_function_id,
            actions,
        });
        self.respond(E2apPdu::successful(RicSubscriptionResponse {
            ric_request_id: msg.ric_request_id,
            ran_function_id: msg.ran_function_id,
            actions_admitted: requested,
            actions_not_admitted: None,
        }));
        Ok(())
    }

    fn handle_subscription_delete_request(
        &mut self,
        msg: RicSubscriptionDeleteRequest,
    ) -> Result<(), ProcedureError> {
        self.require_established(RicSubscriptionDeleteRequest::NAME)?;

        let key = (msg.ric_request_id, msg.ran_function_id);
        if self.session.remove_subscription(&key).is_some() {
            info!(
                "RIC Subscription {} for RAN function {} deleted",
                msg.ric_request_id, msg.ran_function_id
            );
            self.respond(E2apPdu::successful(RicSubscriptionDeleteResponse {
                ric_request_id: msg.ric_request_id,
                ran_function_id: msg.ran_function_id,
            }));
        } else {
            info!(
                "RIC Subscription Delete for unknown subscription {}/{}",
                msg.ric_request_id, msg.ran_function_id
            );
            self.respond(E2apPdu::unsuccessful(RicSubscriptionDeleteFailure {
                ric_request_id: msg.ric_request_id,
                ran_function_id: msg.ran_function_id,
                cause: Cause::from(CauseRicRequest::RequestIdUnknown),
                criticality_diagnostics: None,
            }));
        }
        Ok(())
    }

    fn handle_subscription_modification_request(
        &mut self,
        msg: RicSubscriptionModificationRequest,
    ) -> Result<(), ProcedureError> {
        self.require_established(RicSubscriptionModificationRequest::NAME)?;

        let key = (msg.ric_request_id, msg.ran_function_id);
        let Some(subscription) = self.session.subscription_mut(&key) else {
            info!(
                "RIC Subscription Modification for unknown subscription {}/{}",
                msg.ric_request_id, msg.ran_function_id
            );
            self.respond(E2apPdu::unsuccessful(RicSubscriptionModificationFailure {
                ric_request_id: msg.ric_request_id,
                ran_function_id: msg.ran_function_id,
                cause: Cause::from(CauseRicRequest::RequestIdUnknown),
                criticality_diagnostics: None,
            }));
            return Ok(());
        };

        let mut removed = Vec::new();
        let mut failed_to_remove = Vec::new();
        for action_id in msg.actions_to_remove.unwrap_or_default() {
            if subscription.remove_action(action_id) {
                removed.push(action_id);
            } else {
                failed_to_remove.push(RicActionNotAdmittedItem {
                    action_id,
                    cause: Cause::from(CauseRicRequest::ActionNotSupported),
                });
            }
        }

        let mut added = Vec::new();
        let mut failed_to_add = Vec::new();
        for action in msg.actions_to_add.unwrap_or_default() {
            if subscription.add_action(action.action_id) {
                added.push(action.action_id);
            } else {
                failed_to_add.push(RicActionNotAdmittedItem {
                    action_id: action.action_id,
                    cause: Cause::from(CauseRicRequest::DuplicateAction),
                });
            }
        }

        info!(
            "RIC Subscription {} modified: {} removed, {} added, {} refused",
            msg.ric_request_id,
            removed.len(),
            added.len(),
            failed_to_remove.len() + failed_to_add.len()
        );
        self.respond(E2apPdu::successful(RicSubscriptionModificationResponse {
            ric_request_id: msg.ric_request_id,
            ran_function_id: msg.ran_function_id,
            actions_removed: non_empty(removed),
            actions_failed_to_remove: non_empty(failed_to_remove),
            actions_added: non_empty(added),
            actions_failed_to_add: non_empty(failed_to_add),
        }));
        Ok(())
    }

    fn handle_modification_confirm(
        &mut self,
        msg: RicSubscriptionModificationConfirm,
    ) -> Result<(), ProcedureError> {
        self.require_established(RicSubscriptionModificationConfirm::NAME)?;
        let key = (msg.ric_request_id, msg.ran_function_id);
        if self.session.subscription(&key).is_none() {
            return Err(ProcedureError::UnknownSubscription {
                message: RicSubscriptionModificationConfirm::NAME,
                ric_request_id: msg.ric_request_id,
                ran_function_id: msg.ran_function_id,
            });
        }

        info!(
            "RIC Subscription {} modification confirmed: {} modified, {} removed",
            msg.ric_request_id,
            msg.actions_confirmed_for_modification
                .as_ref()
                .map_or(0, Vec::len),
            msg.actions_confirmed_for_removal.as_ref().map_or(0, Vec::len)
        );
        Ok(())
    }

    fn handle_modification_refuse(
        &mut self,
        msg: RicSubscriptionModificationRefuse,
    ) -> Result<(), ProcedureError> {
        self.require_established(RicSubscriptionModificationRefuse::NAME)?;
        let key = (msg.ric_request_id, msg.ran_function_id);
        if self.session.subscription(&key).is_none() {
            return Err(ProcedureError::UnknownSubscription {
                message: RicSubscriptionModificationRefuse::NAME,
                ric_request_id: msg.ric_request_id,
                ran_function_id: msg.ran_function_id,
            });
        }

        warn!(
            "RIC Subscription {} modification refused: {}",
            msg.ric_request_id, msg.cause
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Error Indication
    // ------------------------------------------------------------------------

    fn handle_error_indication(&self, msg: ErrorIndication) {
        let cause = msg
            .cause
            .map_or_else(|| "none".to_string(), |cause| cause.to_string());
        warn!(
            transaction_id = ?msg.transaction_id.map(|id| id.0),
            ric_request_id = ?msg.ric_request_id,
            ran_function_id = ?msg.ran_function_id.map(|id| id.0),
            "Error Indication from RIC, cause {}",
            cause
        );
    }
}

fn processed(message: &'static str, result: Result<(), ProcedureError>) -> Dispatch {
    match result {
        Ok(()) => Dispatch::Handled(message),
        Err(error) => Dispatch::Failed { message, error },
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Builds the RAN function list announced in E2 Setup.
fn ran_function_items(config: &E2AgentConfig) -> Result<Vec<RanFunctionItem>, AgentError> {
    config
        .ran_functions
        .iter()
        .map(|function| {
            let definition = function
                .definition_bytes()
                .map_err(|e| ConfigValidationError::InvalidRanFunction(e.to_string()))?;
            Ok(RanFunctionItem {
                id: RanFunctionId(function.id),
                definition: Bytes::from(definition),
                revision: function.revision,
                oid: function.oid.clone(),
            })
        })
        .collect()
}

// ============================================================================
// Owner Handle
// ============================================================================

/// Owner side of a running agent.
#[derive(Debug)]
pub struct AgentHandle {
    shutdown_tx: watch::Sender<bool>,
    ticks: TickHandle,
    queue: TaskQueue<AgentTask>,
    task: JoinHandle<()>,
}

impl AgentHandle {
    /// Advances the agent's timers by one tick.
    pub fn tick(&self) {
        self.ticks.tick();
    }

    pub fn tick_handle(&self) -> TickHandle {
        self.ticks.clone()
    }

    /// Asks the agent to reset the E2 connection towards the RIC.
    pub fn request_reset(&self, cause: Cause) -> Result<(), QueueClosed> {
        self.queue.push(AgentTask::SendResetRequest(cause))
    }

    /// Returns true once the run loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the run loop to stop and waits until it has exited.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        self.join().await;
    }

    /// Waits for the run loop to exit on its own.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!("E2 agent run loop failed: {}", e);
        }
    }
}
