//! Integration test framework for the nextgsim E2 agent
//!
//! This crate provides test utilities and a mock RIC for integration testing
//! of the E2 agent over the in-memory transport.
//!
//! # Components
//!
//! - [`mock_ric`] - Mock Near-RT RIC driving the RIC side of E2AP
//! - [`test_fixtures`] - Agent configuration builders
//! - [`test_utils`] - Utility functions for test setup and assertions
//!
//! # Test Categories
//!
//! 1. **E2 Setup** - setup, retries, TimeToWait back-off, give-up
//! 2. **RIC Subscriptions** - subscribe, modify, delete
//! 3. **Reset** - RIC and node initiated
//! 4. **Transport** - association loss, send failures, init failures

pub mod mock_ric;
pub mod test_fixtures;
pub mod test_utils;

pub use mock_ric::{MockRic, MockRicConfig, MockRicError, MockRicEvent};
pub use test_fixtures::{test_global_ric_id, test_ran_function_ids, TestAgentConfig};
pub use test_utils::{
    init_test_logging, tick_n, wait_for_condition, wait_for_event, TestResult,
    DEFAULT_POLL_INTERVAL, DEFAULT_TEST_TIMEOUT, QUIET_PERIOD,
};
