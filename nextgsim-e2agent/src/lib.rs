//! nextgsim-e2agent - E2 Node Agent
//!
//! This crate implements the E2 node side of the O-RAN E2 interface: it
//! connects a RAN node to a Near-RT RIC over SCTP, performs E2 Setup and
//! serves the RIC initiated procedures.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  E2Agent                      │
//! │  ┌───────────┐   ┌──────────┐   ┌──────────┐ │
//! │  │ Scheduler │──▶│ run loop │──▶│ Session  │ │
//! │  │ queue +   │   │ dispatch │   │ state,   │ │
//! │  │ timers    │   └────┬─────┘   │ subs     │ │
//! │  └─────▲─────┘        │         └──────────┘ │
//! │        │ HandleRx     │ send                 │
//! │  ┌─────┴──────────────▼─────┐                │
//! │  │  E2Transport (SCTP task)  │                │
//! │  └────────────┬─────────────┘                │
//! └───────────────┼──────────────────────────────┘
//!                 ▼
//!            Near-RT RIC
//! ```
//!
//! Everything the agent does is a task executed by one run loop, so the
//! session state has a single writer. Timers are driven by an external tick
//! source through [`TickHandle`].
//!
//! # Example
//!
//! ```rust,ignore
//! use nextgsim_e2agent::{app::load_and_validate_e2_agent_config, E2Agent, SctpConnector};
//!
//! let config = load_and_validate_e2_agent_config("config/e2agent.yaml")?;
//! let agent = E2Agent::init(config, &SctpConnector::default()).await?;
//! let handle = agent.start();
//! handle.tick();
//! handle.stop().await;
//! ```

pub mod agent;
pub mod app;
pub mod scheduler;
pub mod session;
pub mod tasks;
pub mod transport;

pub use agent::{AgentError, AgentHandle, Dispatch, E2Agent, ProcedureError};
pub use app::{
    load_and_validate_e2_agent_config, load_e2_agent_config, validate_e2_agent_config,
    ConfigError, ConfigValidationError,
};
pub use scheduler::{QueueClosed, TaskQueue, TaskScheduler, TickHandle, TimerWheel};
pub use session::{AgentState, Session, StateError, Subscription, SubscriptionKey};
pub use tasks::{AgentEvent, AgentTask};
pub use transport::{
    E2Connector, E2Transport, Endpoints, InboundDatagram, InitStep, LoopbackConnector,
    LoopbackTransport, RicPeer, SctpConnector, SctpTransport, TransportError,
};
