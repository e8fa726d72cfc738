//! E2 Agent Application Support
//!
//! Configuration loading and validation shared by the `nr-e2agent` binary
//! and [`E2Agent::init`](crate::agent::E2Agent::init).

mod config_loader;

pub use config_loader::{
    load_and_validate_e2_agent_config, load_e2_agent_config, load_e2_agent_config_from_str,
    validate_e2_agent_config, ConfigError, ConfigValidationError,
};
