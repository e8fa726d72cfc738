//! End-to-End Scenario Tests for the E2 agent
//!
//! Each test starts a real agent run loop on the in-memory transport and
//! plays the RIC with [`MockRic`]. Timers are driven explicitly through the
//! agent's tick handle.
//!
//! These tests validate:
//! - E2 Setup, including retry on timeout and TimeToWait back-off
//! - RIC subscription procedures
//! - RIC and node initiated Reset
//! - Transport loss handling
//! - Robustness against undecodable input

use std::time::Duration;

use integration_tests::{
    init_test_logging, test_ran_function_ids, tick_n, wait_for_condition, wait_for_event, MockRic,
    MockRicConfig, MockRicError, MockRicEvent, TestAgentConfig, DEFAULT_POLL_INTERVAL,
    DEFAULT_TEST_TIMEOUT, QUIET_PERIOD,
};
use nextgsim_common::E2AgentConfig;
use nextgsim_e2agent::{
    AgentError, AgentEvent, AgentHandle, AgentState, E2Agent, InitStep, LoopbackConnector,
    TransportError,
};
use nextgsim_e2ap::encode_e2ap_pdu;
use nextgsim_e2ap::ies::{
    Cause, CauseMisc, CauseRicRequest, GlobalE2NodeId, RanFunctionId, RicActionId, RicRequestId,
    TimeToWait, TransactionId,
};
use nextgsim_e2ap::messages::RicSubscriptionDeleteRequest;
use nextgsim_e2ap::E2apPdu;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

type Events = mpsc::UnboundedReceiver<AgentEvent>;

async fn start_agent(config: E2AgentConfig, ric_config: MockRicConfig) -> (AgentHandle, MockRic, Events) {
    init_test_logging();
    let (connector, peer) = LoopbackConnector::pair();
    let mut agent = E2Agent::init(config, &connector)
        .await
        .expect("Failed to initialize agent");
    assert_eq!(agent.state(), AgentState::Connecting);

    let events = agent.subscribe();
    let handle = agent.start();
    (handle, MockRic::with_config(peer, ric_config), events)
}

/// Starts an agent and completes E2 Setup.
async fn established_agent(config: E2AgentConfig) -> (AgentHandle, MockRic, Events) {
    let (handle, mut ric, mut events) = start_agent(config, MockRicConfig::default()).await;

    match ric.next_event().await.expect("No E2 Setup Request") {
        MockRicEvent::SetupRequest { .. } => {}
        other => panic!("Expected E2 Setup Request, got {other:?}"),
    }
    wait_for_event(&mut events, |e| {
        matches!(
            e,
            AgentEvent::StateChanged {
                to: AgentState::Established,
                ..
            }
        )
    })
    .await
    .expect("Agent did not reach Established");

    (handle, ric, events)
}

/// Ticks in rounds until the RIC receives something or `max_rounds` pass.
/// Returns the event and the number of ticks given.
async fn tick_until_event(
    handle: &AgentHandle,
    ric: &mut MockRic,
    per_round: u64,
    max_rounds: u32,
) -> (MockRicEvent, u64) {
    let ticks = handle.tick_handle();
    let mut total = 0;
    for _ in 0..max_rounds {
        tick_n(&ticks, per_round);
        total += per_round;
        match ric.next_event_within(Duration::from_millis(20)).await {
            Ok(event) => return (event, total),
            Err(MockRicError::Timeout(_)) => {}
            Err(e) => panic!("Mock RIC failed: {e}"),
        }
    }
    panic!("Nothing received after {total} ticks");
}

/// E2E Test: E2 Setup followed by a full subscription lifecycle
///
/// 1. Agent sends E2 Setup Request announcing its RAN functions
/// 2. RIC accepts, agent becomes Established
/// 3. RIC subscribes, modifies and deletes a subscription
#[tokio::test]
async fn test_e2e_setup_and_subscription_flow() {
    let (handle, mut ric, mut events) =
        start_agent(TestAgentConfig::default().build(), MockRicConfig::default()).await;

    tracing::info!("[RAN] Phase 1: E2 Setup");
    match ric.next_event().await.unwrap() {
        MockRicEvent::SetupRequest {
            transaction_id,
            node_id,
            ran_functions,
        } => {
            assert_eq!(transaction_id, TransactionId(0));
            assert_eq!(ran_functions, test_ran_function_ids());
            match node_id {
                GlobalE2NodeId::Gnb(gnb) => {
                    assert_eq!(gnb.gnb_id, 0x1a2b);
                    assert_eq!(gnb.gnb_id_len, 24);
                }
                other => panic!("Unexpected node id {other:?}"),
            }
        }
        other => panic!("Expected E2 Setup Request, got {other:?}"),
    }

    assert_eq!(
        wait_for_event(&mut events, |_| true).await.unwrap(),
        AgentEvent::StateChanged {
            from: AgentState::Connecting,
            to: AgentState::AwaitingSetupResponse
        }
    );
    assert_eq!(
        wait_for_event(&mut events, |_| true).await.unwrap(),
        AgentEvent::StateChanged {
            from: AgentState::AwaitingSetupResponse,
            to: AgentState::Established
        }
    );

    tracing::info!("[RIC] Phase 2: RIC Subscription");
    let request_id = RicRequestId::new(10, 1);
    let function = RanFunctionId(2);
    ric.subscribe(request_id, function, &[1, 2]).unwrap();
    assert_eq!(
        ric.next_event().await.unwrap(),
        MockRicEvent::SubscriptionResponse {
            ric_request_id: request_id,
            admitted: vec![RicActionId(1), RicActionId(2)],
        }
    );

    tracing::info!("[RIC] Phase 3: RIC Subscription Modification");
    ric.modify_subscription(request_id, function, &[1], &[3]).unwrap();
    assert_eq!(
        ric.next_event().await.unwrap(),
        MockRicEvent::ModificationResponse {
            ric_request_id: request_id,
            removed: vec![RicActionId(1)],
            added: vec![RicActionId(3)],
            refused: 0,
        }
    );

    tracing::info!("[RIC] Phase 4: RIC Subscription Delete");
    ric.delete_subscription(request_id, function).unwrap();
    assert_eq!(
        ric.next_event().await.unwrap(),
        MockRicEvent::SubscriptionDeleteResponse {
            ric_request_id: request_id
        }
    );
    ric.delete_subscription(request_id, function).unwrap();
    assert_eq!(
        ric.next_event().await.unwrap(),
        MockRicEvent::SubscriptionDeleteFailure {
            ric_request_id: request_id,
            cause: Cause::from(CauseRicRequest::RequestIdUnknown),
        }
    );

    assert_eq!(ric.setup_requests(), 1);
    handle.stop().await;
    wait_for_event(&mut events, |e| *e == AgentEvent::Stopped)
        .await
        .unwrap();
    assert!(ric.peer().is_closed());
}

#[tokio::test]
async fn test_e2e_subscription_rejections() {
    let (handle, mut ric, _events) = established_agent(TestAgentConfig::default().build()).await;

    let cases: [(u16, u16, &[u8], CauseRicRequest); 3] = [
        (1, 99, &[1], CauseRicRequest::RanFunctionIdInvalid),
        (2, 2, &[], CauseRicRequest::ActionNotSupported),
        (3, 2, &[4, 4], CauseRicRequest::DuplicateAction),
    ];
    for (requestor, function, actions, cause) in cases {
        let request_id = RicRequestId::new(requestor, 0);
        ric.subscribe(request_id, RanFunctionId(function), actions)
            .unwrap();
        assert_eq!(
            ric.next_event().await.unwrap(),
            MockRicEvent::SubscriptionFailure {
                ric_request_id: request_id,
                cause: Cause::from(cause),
            }
        );
    }

    // Same key twice
    let request_id = RicRequestId::new(4, 0);
    ric.subscribe(request_id, RanFunctionId(3), &[1]).unwrap();
    assert!(matches!(
        ric.next_event().await.unwrap(),
        MockRicEvent::SubscriptionResponse { .. }
    ));
    ric.subscribe(request_id, RanFunctionId(3), &[2]).unwrap();
    assert!(matches!(
        ric.next_event().await.unwrap(),
        MockRicEvent::SubscriptionFailure { .. }
    ));

    // Same request id on another RAN function is a different subscription
    ric.subscribe(request_id, RanFunctionId(2), &[2]).unwrap();
    assert!(matches!(
        ric.next_event().await.unwrap(),
        MockRicEvent::SubscriptionResponse { .. }
    ));

    ric.modify_subscription(RicRequestId::new(77, 0), RanFunctionId(2), &[1], &[])
        .unwrap();
    assert!(matches!(
        ric.next_event().await.unwrap(),
        MockRicEvent::ModificationFailure { .. }
    ));

    handle.stop().await;
}

/// E2E Test: RIC initiated Reset
///
/// The agent answers exactly once with the request's transaction id and
/// releases every subscription.
#[tokio::test]
async fn test_e2e_ric_initiated_reset() {
    let (handle, mut ric, _events) = established_agent(TestAgentConfig::default().build()).await;

    let request_id = RicRequestId::new(5, 5);
    ric.subscribe(request_id, RanFunctionId(3), &[1]).unwrap();
    ric.next_event().await.unwrap();

    ric.send_reset_request(TransactionId(200), Cause::from(CauseMisc::OmIntervention))
        .unwrap();
    assert_eq!(
        ric.next_event().await.unwrap(),
        MockRicEvent::ResetResponse {
            transaction_id: TransactionId(200)
        }
    );
    assert!(ric.expect_silence().await);

    ric.delete_subscription(request_id, RanFunctionId(3)).unwrap();
    assert!(matches!(
        ric.next_event().await.unwrap(),
        MockRicEvent::SubscriptionDeleteFailure { .. }
    ));

    handle.stop().await;
}

#[tokio::test]
async fn test_e2e_node_initiated_reset() {
    let (handle, mut ric, _events) = established_agent(TestAgentConfig::default().build()).await;

    handle
        .request_reset(Cause::from(CauseMisc::HardwareFailure))
        .unwrap();
    let transaction_id = match ric.next_event().await.unwrap() {
        MockRicEvent::ResetRequest {
            transaction_id,
            cause,
        } => {
            assert_eq!(cause, Cause::from(CauseMisc::HardwareFailure));
            transaction_id
        }
        other => panic!("Expected Reset Request, got {other:?}"),
    };
    // E2 Setup used the first transaction id
    assert_eq!(transaction_id, TransactionId(1));

    ric.send_reset_response(transaction_id).unwrap();
    assert!(ric.expect_silence().await);

    handle.stop().await;
}

/// E2E Test: E2 Setup is re-sent when the response times out
#[tokio::test]
async fn test_e2e_setup_retry_on_timeout() {
    let config = TestAgentConfig::default()
        .with_setup_response_timeout(50)
        .build();
    let ric_config = MockRicConfig {
        auto_setup_response: false,
        ..MockRicConfig::default()
    };
    let (handle, mut ric, mut events) = start_agent(config, ric_config).await;

    let first = match ric.next_event().await.unwrap() {
        MockRicEvent::SetupRequest { transaction_id, .. } => transaction_id,
        other => panic!("Expected E2 Setup Request, got {other:?}"),
    };

    let (event, ticks) = tick_until_event(&handle, &mut ric, 10, 100).await;
    assert!(ticks >= 50);
    match event {
        MockRicEvent::SetupRequest { transaction_id, .. } => assert_eq!(transaction_id, first),
        other => panic!("Expected E2 Setup Request, got {other:?}"),
    }
    assert_eq!(ric.setup_requests(), 2);

    ric.send_setup_response(first).unwrap();
    wait_for_event(&mut events, |e| {
        *e == AgentEvent::StateChanged {
            from: AgentState::AwaitingSetupResponse,
            to: AgentState::Established,
        }
    })
    .await
    .unwrap();

    handle.stop().await;
}

/// E2E Test: E2 Setup Failure with TimeToWait delays the next attempt
#[tokio::test]
async fn test_e2e_setup_backoff_after_time_to_wait() {
    // Only the back-off may trigger a new request
    let config = TestAgentConfig::default()
        .with_setup_response_timeout(1_000_000)
        .with_tick_period_ms(10)
        .build();
    let ric_config = MockRicConfig {
        auto_setup_response: false,
        ..MockRicConfig::default()
    };
    let (handle, mut ric, mut events) = start_agent(config, ric_config).await;

    let transaction_id = match ric.next_event().await.unwrap() {
        MockRicEvent::SetupRequest { transaction_id, .. } => transaction_id,
        other => panic!("Expected E2 Setup Request, got {other:?}"),
    };
    ric.send_setup_failure(
        transaction_id,
        Cause::from(CauseMisc::ControlProcessingOverload),
        Some(TimeToWait::V2s),
    )
    .unwrap();
    assert!(ric.expect_silence().await);

    // 2 s at 10 ms per tick
    let (event, ticks) = tick_until_event(&handle, &mut ric, 10, 200).await;
    assert!(ticks >= 200, "re-sent after {ticks} ticks");
    assert!(matches!(event, MockRicEvent::SetupRequest { .. }));

    ric.send_setup_response(transaction_id).unwrap();
    wait_for_event(&mut events, |e| {
        matches!(
            e,
            AgentEvent::StateChanged {
                to: AgentState::Established,
                ..
            }
        )
    })
    .await
    .unwrap();

    handle.stop().await;
}

/// E2E Test: the agent gives up when E2 Setup is rejected for good
#[tokio::test]
async fn test_e2e_setup_gives_up() {
    let config = TestAgentConfig::default().with_max_setup_attempts(1).build();
    let ric_config = MockRicConfig {
        auto_setup_response: false,
        ..MockRicConfig::default()
    };
    let (handle, mut ric, mut events) = start_agent(config, ric_config).await;

    let transaction_id = match ric.next_event().await.unwrap() {
        MockRicEvent::SetupRequest { transaction_id, .. } => transaction_id,
        other => panic!("Expected E2 Setup Request, got {other:?}"),
    };
    ric.send_setup_failure(transaction_id, Cause::from(CauseMisc::Unspecified), None)
        .unwrap();

    assert_eq!(
        wait_for_event(&mut events, |e| e.is_terminal()).await.unwrap(),
        AgentEvent::SetupFailed { attempts: 1 }
    );
    assert_eq!(
        wait_for_event(&mut events, |_| true).await.unwrap(),
        AgentEvent::Stopped
    );
    handle.join().await;
    assert!(ric.peer().is_closed());
}

#[tokio::test]
async fn test_e2e_transport_loss() {
    let (handle, ric, mut events) = established_agent(TestAgentConfig::default().build()).await;

    ric.drop_association("RIC restarted").unwrap();
    assert_eq!(
        wait_for_event(&mut events, |_| true).await.unwrap(),
        AgentEvent::StateChanged {
            from: AgentState::Established,
            to: AgentState::Idle
        }
    );
    assert_eq!(
        wait_for_event(&mut events, |_| true).await.unwrap(),
        AgentEvent::TransportLost {
            reason: "RIC restarted".to_string()
        }
    );
    assert_eq!(
        wait_for_event(&mut events, |_| true).await.unwrap(),
        AgentEvent::Stopped
    );

    let agent = &handle;
    wait_for_condition(
        move || async move { agent.is_finished() },
        DEFAULT_TEST_TIMEOUT,
        DEFAULT_POLL_INTERVAL,
    )
    .await
    .expect("Run loop still alive after transport loss");
    handle.join().await;
}

#[tokio::test]
async fn test_e2e_send_failures_end_session() {
    let config = TestAgentConfig::default().with_max_send_failures(3).build();
    let (handle, ric, mut events) = established_agent(config).await;

    ric.peer().set_send_failure(true);
    for request in 0..3 {
        ric.delete_subscription(RicRequestId::new(request, 0), RanFunctionId(2))
            .unwrap();
    }

    let event = wait_for_event(&mut events, |e| e.is_terminal())
        .await
        .unwrap();
    assert!(matches!(event, AgentEvent::TransportLost { .. }));
    handle.join().await;
}

/// E2E Test: undecodable datagrams are dropped without side effects
#[tokio::test]
async fn test_e2e_garbage_input() {
    let (handle, mut ric, _events) = established_agent(TestAgentConfig::default().build()).await;
    let mut rng = StdRng::seed_from_u64(0x2e2a);

    for _ in 0..32 {
        let len = rng.gen_range(1..64);
        let mut payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        // Non-zero padding bits in the PDU choice octet
        payload[0] = rng.gen_range(1..0x20);
        ric.send_raw(payload).unwrap();
    }

    let valid = encode_e2ap_pdu(&E2apPdu::initiating(RicSubscriptionDeleteRequest {
        ric_request_id: RicRequestId::new(1, 1),
        ran_function_id: RanFunctionId(2),
    }))
    .unwrap();
    for len in 0..valid.len() {
        ric.send_raw(valid.slice(..len)).unwrap();
    }
    assert!(ric.expect_silence().await);

    // Still Established and serving requests
    let request_id = RicRequestId::new(9, 0);
    ric.subscribe(request_id, RanFunctionId(2), &[1]).unwrap();
    assert!(matches!(
        ric.next_event().await.unwrap(),
        MockRicEvent::SubscriptionResponse { .. }
    ));
    assert!(!handle.is_finished());

    handle.stop().await;
}

#[tokio::test]
async fn test_e2e_init_failure_at_each_step() {
    init_test_logging();
    for step in InitStep::ALL {
        let (connector, peer) = LoopbackConnector::pair();
        let connector = connector.fail_at(step);

        let result = E2Agent::init(TestAgentConfig::default().build(), &connector).await;
        match result {
            Err(AgentError::Transport(e)) => {
                assert_eq!(e.init_step(), Some(step));
                if step == InitStep::Bind {
                    assert!(matches!(e, TransportError::Bind { .. }));
                }
            }
            Err(e) => panic!("Unexpected error at {step}: {e}"),
            Ok(_) => panic!("Init succeeded although {step} failed"),
        }
        // Resources acquired by earlier steps are released
        assert!(peer.is_closed());
    }
}

#[tokio::test]
async fn test_e2e_stop_before_setup_response() {
    let ric_config = MockRicConfig {
        auto_setup_response: false,
        ..MockRicConfig::default()
    };
    let (handle, mut ric, mut events) =
        start_agent(TestAgentConfig::default().build(), ric_config).await;
    assert!(matches!(
        ric.next_event().await.unwrap(),
        MockRicEvent::SetupRequest { .. }
    ));

    tokio::time::sleep(QUIET_PERIOD).await;
    handle.stop().await;
    wait_for_event(&mut events, |e| *e == AgentEvent::Stopped)
        .await
        .unwrap();
    assert!(matches!(
        ric.next_event().await,
        Err(MockRicError::Closed)
    ));
}
