//! Test fixtures and configuration helpers
//!
//! Provides pre-configured agent and RIC settings for the scenario tests.

use nextgsim_common::{E2AgentConfig, Plmn, RanFunctionConfig};
use nextgsim_e2ap::ies::{GlobalRicId, RanFunctionId};

/// RAN functions announced by the test agent
pub const TEST_RAN_FUNCTIONS: [u16; 2] = [2, 3];

/// Builder for agent configurations used in tests
#[derive(Debug, Clone)]
pub struct TestAgentConfig {
    config: E2AgentConfig,
}

impl Default for TestAgentConfig {
    fn default() -> Self {
        let mut config = E2AgentConfig::default();
        config.node.plmn = Plmn::new(1, 1, false);
        config.node.gnb_id = 0x1a2b;
        config.node.gnb_id_length = 24;
        config.ran_functions = TEST_RAN_FUNCTIONS
            .iter()
            .map(|&id| RanFunctionConfig {
                id,
                revision: 1,
                oid: format!("1.3.6.1.4.1.53148.1.2.2.{id}"),
                definition: "c0ffee".to_string(),
            })
            .collect();
        config.timers.setup_response_timeout_ticks = 100;
        config.timers.reset_response_timeout_ticks = 100;
        config.timers.max_setup_attempts = 3;
        config.timers.max_consecutive_send_failures = 3;
        Self { config }
    }
}

impl TestAgentConfig {
    pub fn with_setup_response_timeout(mut self, ticks: u64) -> Self {
        self.config.timers.setup_response_timeout_ticks = ticks;
        self
    }

    pub fn with_max_setup_attempts(mut self, attempts: u32) -> Self {
        self.config.timers.max_setup_attempts = attempts;
        self
    }

    pub fn with_max_send_failures(mut self, failures: u32) -> Self {
        self.config.timers.max_consecutive_send_failures = failures;
        self
    }

    pub fn with_tick_period_ms(mut self, period: u64) -> Self {
        self.config.timers.tick_period_ms = period;
        self
    }

    pub fn build(self) -> E2AgentConfig {
        self.config
    }
}

/// Identity the mock RIC reports in E2 Setup Response
pub fn test_global_ric_id() -> GlobalRicId {
    GlobalRicId {
        plmn: Plmn::new(1, 1, false),
        ric_id: 0xabcde,
    }
}

pub fn test_ran_function_ids() -> Vec<RanFunctionId> {
    TEST_RAN_FUNCTIONS.iter().map(|&id| RanFunctionId(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nextgsim_e2agent::validate_e2_agent_config;

    #[test]
    fn test_default_fixture_is_valid() {
        let config = TestAgentConfig::default().build();
        assert!(validate_e2_agent_config(&config).is_ok());
        assert_eq!(config.ran_functions.len(), TEST_RAN_FUNCTIONS.len());
    }

    #[test]
    fn test_builder_overrides() {
        let config = TestAgentConfig::default()
            .with_setup_response_timeout(7)
            .with_max_setup_attempts(1)
            .with_max_send_failures(0)
            .with_tick_period_ms(10)
            .build();
        assert_eq!(config.timers.setup_response_timeout_ticks, 7);
        assert_eq!(config.timers.max_setup_attempts, 1);
        assert_eq!(config.timers.max_consecutive_send_failures, 0);
        assert_eq!(config.timers.millis_to_ticks(1000), 100);
    }
}
