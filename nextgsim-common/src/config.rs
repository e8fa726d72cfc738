//! Configuration structures for the E2 agent
//!
//! This module provides the configuration types for an E2 node's agent:
//! RIC endpoints, the global E2 node identity, the announced RAN functions
//! and the protocol timers.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::Plmn;

/// Default Near-RT RIC SCTP port for E2
pub const DEFAULT_RIC_PORT: u16 = 36421;
/// Default local SCTP port for E2
pub const DEFAULT_RIC_BIND_PORT: u16 = 36422;

fn default_true() -> bool {
    true
}

fn default_ric_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_ric_port() -> u16 {
    DEFAULT_RIC_PORT
}

fn default_ric_bind_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_ric_bind_port() -> u16 {
    DEFAULT_RIC_BIND_PORT
}

fn default_revision() -> u16 {
    1
}

/// E2 agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct E2AgentConfig {
    /// Whether the agent is started at all
    #[serde(default = "default_true")]
    pub enable: bool,
    /// Near-RT RIC address
    #[serde(default = "default_ric_ip")]
    pub ric_ip: IpAddr,
    /// Near-RT RIC SCTP port
    #[serde(default = "default_ric_port")]
    pub ric_port: u16,
    /// Local address to bind
    #[serde(default = "default_ric_bind_ip")]
    pub ric_bind_ip: IpAddr,
    /// Local SCTP port to bind
    #[serde(default = "default_ric_bind_port")]
    pub ric_bind_port: u16,
    /// Global E2 node identity
    #[serde(default)]
    pub node: E2NodeConfig,
    /// RAN functions announced in E2 Setup
    #[serde(default)]
    pub ran_functions: Vec<RanFunctionConfig>,
    /// Protocol timers
    #[serde(default)]
    pub timers: E2TimerConfig,
}

impl Default for E2AgentConfig {
    fn default() -> Self {
        Self {
            enable: true,
            ric_ip: default_ric_ip(),
            ric_port: DEFAULT_RIC_PORT,
            ric_bind_ip: default_ric_bind_ip(),
            ric_bind_port: DEFAULT_RIC_BIND_PORT,
            node: E2NodeConfig::default(),
            ran_functions: Vec::new(),
            timers: E2TimerConfig::default(),
        }
    }
}

/// gNB identity used as the Global E2 node ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct E2NodeConfig {
    /// Public Land Mobile Network identifier
    pub plmn: Plmn,
    /// gNB ID
    pub gnb_id: u32,
    /// gNB ID length in bits (22-32)
    pub gnb_id_length: u8,
}

impl Default for E2NodeConfig {
    fn default() -> Self {
        Self {
            plmn: Plmn::new(1, 1, false),
            gnb_id: 1,
            gnb_id_length: 22,
        }
    }
}

/// A RAN function announced to the RIC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RanFunctionConfig {
    /// RAN function ID (0-4095)
    pub id: u16,
    /// RAN function revision
    #[serde(default = "default_revision")]
    pub revision: u16,
    /// Service model OID
    pub oid: String,
    /// Hex encoded RAN function definition (E2SM specific, opaque here)
    #[serde(default)]
    pub definition: String,
}

impl RanFunctionConfig {
    /// Decodes the hex encoded RAN function definition.
    pub fn definition_bytes(&self) -> Result<Vec<u8>, Error> {
        hex::decode(self.definition.trim()).map_err(|e| {
            Error::Config(format!("RAN function {} definition: {e}", self.id))
        })
    }
}

/// Protocol timers, in ticks unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct E2TimerConfig {
    /// Tick period in milliseconds
    pub tick_period_ms: u64,
    /// Wait for E2 Setup Response before re-sending
    pub setup_response_timeout_ticks: u64,
    /// E2 Setup attempts before giving up
    pub max_setup_attempts: u32,
    /// Wait for Reset Response
    pub reset_response_timeout_ticks: u64,
    /// Consecutive send failures treated as transport loss (0 disables)
    pub max_consecutive_send_failures: u32,
}

impl Default for E2TimerConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1,
            setup_response_timeout_ticks: 5000,
            max_setup_attempts: 3,
            reset_response_timeout_ticks: 5000,
            max_consecutive_send_failures: 5,
        }
    }
}

impl E2TimerConfig {
    /// Converts a duration in milliseconds into ticks, rounding up.
    pub fn millis_to_ticks(&self, millis: u64) -> u64 {
        let period = self.tick_period_ms.max(1);
        millis.div_ceil(period)
    }
}

impl E2AgentConfig {
    /// Near-RT RIC endpoint
    pub fn ric_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ric_ip, self.ric_port)
    }

    /// Local endpoint
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ric_bind_ip, self.ric_bind_port)
    }

    /// Parses an E2 agent configuration from a YAML string.
    ///
    /// # Example
    /// ```
    /// use nextgsim_common::E2AgentConfig;
    ///
    /// let yaml = r#"
    /// ric_ip: 10.0.0.5
    /// node:
    ///   plmn:
    ///     mcc: 1
    ///     mnc: 1
    ///     long_mnc: false
    ///   gnb_id: 411
    ///   gnb_id_length: 22
    /// ran_functions:
    ///   - id: 2
    ///     oid: 1.3.6.1.4.1.53148.1.2.2.2
    ///     definition: "2043"
    /// timers:
    ///   max_setup_attempts: 5
    /// "#;
    ///
    /// let config = E2AgentConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.ric_port, 36421);
    /// assert_eq!(config.timers.max_setup_attempts, 5);
    /// assert_eq!(config.timers.setup_response_timeout_ticks, 5000);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads an E2 agent configuration from a YAML file.
    ///
    /// # Example
    /// ```no_run
    /// use nextgsim_common::E2AgentConfig;
    ///
    /// let config = E2AgentConfig::from_yaml_file("config/e2agent.yaml").unwrap();
    /// ```
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Serializes the configuration to a YAML string.
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}
