//! Configuration Loading for the E2 Agent
//!
//! Wraps [`E2AgentConfig`] from `nextgsim-common` with the validation the
//! agent needs before it announces anything to a RIC.
//!
//! # Example
//!
//! ```rust,ignore
//! use nextgsim_e2agent::app::load_and_validate_e2_agent_config;
//!
//! let config = load_and_validate_e2_agent_config("config/e2agent.yaml")?;
//! ```

use std::collections::HashSet;
use std::path::Path;

use nextgsim_common::config::E2AgentConfig;
use thiserror::Error;

/// Highest RANfunctionID and RANfunctionRevision
const MAX_RAN_FUNCTION_ID: u16 = 4095;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ConfigValidationError),
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Invalid PLMN
    #[error("Invalid PLMN: {0}")]
    InvalidPlmn(String),

    /// Invalid gNB ID or gNB ID length
    #[error("Invalid gNB ID: {0}")]
    InvalidGnbId(String),

    /// Invalid RAN function entry
    #[error("Invalid RAN function: {0}")]
    InvalidRanFunction(String),

    /// Invalid IP address configuration
    #[error("Invalid IP configuration: {0}")]
    InvalidIpConfig(String),

    /// Invalid timer configuration
    #[error("Invalid timer configuration: {0}")]
    InvalidTimer(String),
}

/// Loads an E2 agent configuration from a YAML file.
///
/// Only parsing is performed here; call [`validate_e2_agent_config`] (or use
/// [`load_and_validate_e2_agent_config`]) before starting an agent.
pub fn load_e2_agent_config<P: AsRef<Path>>(path: P) -> Result<E2AgentConfig, ConfigError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    load_e2_agent_config_from_str(&contents)
}

/// Loads an E2 agent configuration from a YAML string.
pub fn load_e2_agent_config_from_str(yaml: &str) -> Result<E2AgentConfig, ConfigError> {
    serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Validates an E2 agent configuration.
///
/// # Validation Rules
///
/// - PLMN MCC/MNC fit their digit counts
/// - gNB ID length is 22..=32 bits and the gNB ID fits in it
/// - RIC port is non-zero
/// - RAN function ids and revisions are at most 4095, ids are unique,
///   OIDs are non-empty PrintableStrings and definitions are valid hex
/// - tick period, setup response wait, reset response wait and setup
///   attempt budget are non-zero
pub fn validate_e2_agent_config(config: &E2AgentConfig) -> Result<(), ConfigValidationError> {
    let node = &config.node;
    if !node.plmn.is_valid() {
        return Err(ConfigValidationError::InvalidPlmn(format!(
            "{} is not a valid MCC/MNC combination",
            node.plmn
        )));
    }

    // gNB ID length 22-32 bits (O-RAN E2AP GNB-ID)
    if !(22..=32).contains(&node.gnb_id_length) {
        return Err(ConfigValidationError::InvalidGnbId(format!(
            "gNB ID length {} must be between 22 and 32 bits",
            node.gnb_id_length
        )));
    }
    if u64::from(node.gnb_id) >= 1u64 << node.gnb_id_length {
        return Err(ConfigValidationError::InvalidGnbId(format!(
            "gNB ID {} does not fit in {} bits",
            node.gnb_id, node.gnb_id_length
        )));
    }

    if config.ric_port == 0 {
        return Err(ConfigValidationError::InvalidIpConfig(
            "RIC port must be non-zero".to_string(),
        ));
    }

    let mut ids = HashSet::new();
    for function in &config.ran_functions {
        if function.id > MAX_RAN_FUNCTION_ID {
            return Err(ConfigValidationError::InvalidRanFunction(format!(
                "id {} exceeds {}",
                function.id, MAX_RAN_FUNCTION_ID
            )));
        }
        if !ids.insert(function.id) {
            return Err(ConfigValidationError::InvalidRanFunction(format!(
                "id {} configured twice",
                function.id
            )));
        }
        if function.revision > MAX_RAN_FUNCTION_ID {
            return Err(ConfigValidationError::InvalidRanFunction(format!(
                "RAN function {} revision {} exceeds {}",
                function.id, function.revision, MAX_RAN_FUNCTION_ID
            )));
        }
        if function.oid.is_empty() || !function.oid.chars().all(is_printable_string_char) {
            return Err(ConfigValidationError::InvalidRanFunction(format!(
                "RAN function {} has invalid OID {:?}",
                function.id, function.oid
            )));
        }
        function
            .definition_bytes()
            .map_err(|e| ConfigValidationError::InvalidRanFunction(e.to_string()))?;
    }

    let timers = &config.timers;
    if timers.tick_period_ms == 0 {
        return Err(ConfigValidationError::InvalidTimer(
            "tick period must be non-zero".to_string(),
        ));
    }
    if timers.setup_response_timeout_ticks == 0 || timers.reset_response_timeout_ticks == 0 {
        return Err(ConfigValidationError::InvalidTimer(
            "response timeouts must be non-zero".to_string(),
        ));
    }
    if timers.max_setup_attempts == 0 {
        return Err(ConfigValidationError::InvalidTimer(
            "at least one E2 Setup attempt is required".to_string(),
        ));
    }

    Ok(())
}

/// Loads and validates an E2 agent configuration from a YAML file.
pub fn load_and_validate_e2_agent_config<P: AsRef<Path>>(
    path: P,
) -> Result<E2AgentConfig, ConfigError> {
    let config = load_e2_agent_config(path)?;
    validate_e2_agent_config(&config)?;
    Ok(config)
}

/// PrintableString alphabet (X.680)
fn is_printable_string_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || " '()+,-./:=?".contains(c)
}
