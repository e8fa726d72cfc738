//! Common types and utilities for nextgsim
//!
//! This crate provides shared types, configuration structures, and logging
//! utilities used across the nextgsim E2 agent crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{
    E2AgentConfig, E2NodeConfig, E2TimerConfig, RanFunctionConfig, DEFAULT_RIC_BIND_PORT,
    DEFAULT_RIC_PORT,
};
pub use error::Error;
pub use logging::{
    format_hex_dump, init_logging, init_logging_with_filter, log_e2ap_message, Direction,
    HexDump, LogLevel,
};
pub use types::*;
