//! Cross-crate integration tests
//!
//! This module tests integration between the workspace crates:
//! - common <-> e2agent: YAML configuration through validation into the agent
//! - e2agent <-> e2ap: what the agent announces matches its configuration
//! - e2ap <-> common: choice access and hex logging of encoded PDUs

use std::time::Duration;

use integration_tests::init_test_logging;
use nextgsim_common::{format_hex_dump, E2AgentConfig};
use nextgsim_e2agent::app::load_e2_agent_config_from_str;
use nextgsim_e2agent::{
    validate_e2_agent_config, AgentError, ConfigValidationError, E2Agent, LoopbackConnector,
};
use nextgsim_e2ap::ies::{GlobalE2NodeId, RanFunctionId};
use nextgsim_e2ap::messages::E2SetupRequest;
use nextgsim_e2ap::{decode_e2ap_pdu, Choice, E2apPdu, InitiatingMessage, ProcedureCode};

const AGENT_YAML: &str = r#"
ric_ip: 127.0.0.1
ric_port: 36421
node:
  plmn:
    mcc: 310
    mnc: 410
    long_mnc: true
  gnb_id: 3584
  gnb_id_length: 28
ran_functions:
  - id: 1
    revision: 2
    oid: 1.3.6.1.4.1.53148.1.1.2.2
    definition: 0a0b0c
  - id: 147
    oid: 1.3.6.1.4.1.53148.1.1.2.3
timers:
  setup_response_timeout_ticks: 20
"#;

// ============================================================================
// common <-> e2agent
// ============================================================================

#[test]
fn test_yaml_config_validates() {
    let config = load_e2_agent_config_from_str(AGENT_YAML).unwrap();
    assert!(validate_e2_agent_config(&config).is_ok());
    assert!(config.node.plmn.long_mnc);
    assert_eq!(config.ran_functions[1].revision, 1);
    assert_eq!(config.timers.setup_response_timeout_ticks, 20);
    // Unset timers keep their defaults
    assert_eq!(config.timers.max_setup_attempts, 3);
}

#[tokio::test]
async fn test_invalid_config_rejected_by_agent() {
    let mut config = load_e2_agent_config_from_str(AGENT_YAML).unwrap();
    config.ran_functions[1].id = 1;

    let (connector, peer) = LoopbackConnector::pair();
    match E2Agent::init(config, &connector).await {
        Err(AgentError::Config(ConfigValidationError::InvalidRanFunction(_))) => {}
        Err(e) => panic!("Unexpected error {e}"),
        Ok(_) => panic!("Duplicate RAN function accepted"),
    }
    // Validation happens before any transport step
    assert!(!peer.is_closed());
}

#[tokio::test]
async fn test_disabled_agent_does_not_connect() {
    let config = E2AgentConfig {
        enable: false,
        ..E2AgentConfig::default()
    };
    let (connector, peer) = LoopbackConnector::pair();
    assert!(matches!(
        E2Agent::init(config, &connector).await,
        Err(AgentError::Disabled)
    ));
    assert!(!peer.is_closed());
}

// ============================================================================
// e2agent <-> e2ap
// ============================================================================

#[tokio::test]
async fn test_setup_request_reflects_config() {
    init_test_logging();
    let config = load_e2_agent_config_from_str(AGENT_YAML).unwrap();
    let (connector, mut peer) = LoopbackConnector::pair();
    let mut agent = E2Agent::init(config, &connector).await.unwrap();
    assert!(agent.run_once().await);

    let bytes = peer
        .recv_timeout(Duration::from_secs(1))
        .await
        .expect("No E2 Setup Request");
    tracing::debug!("E2 Setup Request:\n{}", format_hex_dump(&bytes));

    let pdu = decode_e2ap_pdu(&bytes).unwrap();
    assert!(pdu.is::<InitiatingMessage>());
    assert_eq!(pdu.procedure_code(), ProcedureCode::E2_SETUP);

    let initiating = pdu.get::<InitiatingMessage>().unwrap();
    let request = initiating
        .value
        .get_if::<E2SetupRequest>()
        .expect("Not an E2 Setup Request");

    match request.global_e2_node_id {
        GlobalE2NodeId::Gnb(gnb) => {
            assert_eq!(gnb.plmn.mcc, 310);
            assert_eq!(gnb.plmn.mnc, 410);
            assert_eq!(gnb.gnb_id, 3584);
            assert_eq!(gnb.gnb_id_len, 28);
        }
        other => panic!("Unexpected node id {other:?}"),
    }

    let functions = &request.ran_functions_added;
    assert_eq!(functions.len(), 2);
    assert_eq!(functions[0].id, RanFunctionId(1));
    assert_eq!(functions[0].revision, 2);
    assert_eq!(functions[0].definition.as_ref(), &[0x0a, 0x0b, 0x0c]);
    assert_eq!(functions[0].oid, "1.3.6.1.4.1.53148.1.1.2.2");
    assert_eq!(functions[1].id, RanFunctionId(147));
    assert!(functions[1].definition.is_empty());
}

#[test]
fn test_pdu_choice_access() {
    let decoded = E2apPdu::initiating(E2SetupRequest {
        transaction_id: nextgsim_e2ap::ies::TransactionId(3),
        global_e2_node_id: GlobalE2NodeId::Gnb(nextgsim_e2ap::ies::GnbNodeId {
            plmn: nextgsim_common::Plmn::new(1, 1, false),
            gnb_id: 1,
            gnb_id_len: 22,
            gnb_cu_up_id: None,
            gnb_du_id: None,
        }),
        ran_functions_added: Vec::new(),
        component_config_addition: Vec::new(),
    });
    let bytes = nextgsim_e2ap::encode_e2ap_pdu(&decoded).unwrap();
    let pdu = decode_e2ap_pdu(&bytes).unwrap();

    assert_eq!(pdu.alternative_name(), "InitiatingMessage");
    assert!(pdu.get::<nextgsim_e2ap::SuccessfulOutcome>().is_err());
    assert_eq!(pdu.message_name(), "E2SetupRequest");
    assert_eq!(pdu, decoded);
}
