//! End-to-end protocol tests against a real worker subprocess

use serde_json::{Value, json};
use std::time::{Duration, Instant};
use toolwire_core::client::{BlockingToolClient, ToolClient};
use toolwire_core::config::WorkerConfig;
use toolwire_core::error::WireError;
use toolwire_core::protocol::FailureKind;
use toolwire_core::types::{Arguments, ContentBlock};

fn worker_config() -> WorkerConfig {
    WorkerConfig::new(env!("CARGO_BIN_EXE_toolwire-echo"))
        .with_request_timeout(Duration::from_secs(5))
        .with_grace_period(Duration::from_secs(2))
}

fn args(pairs: &[(&str, Value)]) -> Arguments {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn lists_tools_in_registration_order() {
    let client = ToolClient::connect(worker_config()).await.unwrap();

    let tools = client.list_tools().await.unwrap();
    let names: Vec<String> = tools.into_iter().map(|t| t.name).collect();
    assert_eq!(
        names,
        vec![
            "echo".to_string(),
            "delay_echo".to_string(),
            "terminate".to_string()
        ]
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn echo_round_trip() {
    let client = ToolClient::connect(worker_config()).await.unwrap();

    let content = client
        .call_tool("echo", args(&[("text", json!("hi"))]))
        .await
        .unwrap();
    assert_eq!(content, vec![ContentBlock::text("hi")]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn missing_required_argument_is_reported_remotely() {
    let client = ToolClient::connect(worker_config()).await.unwrap();

    let err = client.call_tool("echo", Arguments::new()).await.unwrap_err();
    match err {
        WireError::Remote(descriptor) => {
            assert_eq!(descriptor.kind, FailureKind::InvalidArguments);
            assert!(descriptor.message.contains("text"));
        }
        other => panic!("expected Remote error, got {other:?}"),
    }

    client.close().await.unwrap();
}

#[tokio::test]
async fn unknown_tool_is_reported_remotely() {
    let client = ToolClient::connect(worker_config()).await.unwrap();

    let err = client
        .call_tool("no_such_tool", Arguments::new())
        .await
        .unwrap_err();
    match err {
        WireError::Remote(descriptor) => assert_eq!(descriptor.kind, FailureKind::UnknownTool),
        other => panic!("expected Remote error, got {other:?}"),
    }

    client.close().await.unwrap();
}

#[tokio::test]
async fn out_of_order_responses_resolve_their_own_callers() {
    let client = ToolClient::connect(worker_config()).await.unwrap();

    let slow = client.call_tool(
        "delay_echo",
        args(&[("text", json!("slow")), ("delay_ms", json!(400))]),
    );
    let fast = client.call_tool("echo", args(&[("text", json!("fast"))]));

    let started = Instant::now();
    let (slow_result, fast_result) = tokio::join!(slow, fast);
    let elapsed = started.elapsed();

    // Each caller got its own payload even though the responses crossed.
    assert_eq!(slow_result.unwrap(), vec![ContentBlock::text("slow")]);
    assert_eq!(fast_result.unwrap(), vec![ContentBlock::text("fast")]);
    // The calls ran concurrently: the pair finished with the slow one.
    assert!(elapsed >= Duration::from_millis(400));
    assert!(elapsed < Duration::from_millis(2000));

    client.close().await.unwrap();
}

#[tokio::test]
async fn fast_call_resolves_before_slow_call() {
    let client = ToolClient::connect(worker_config()).await.unwrap();

    let slow = client.call_tool(
        "delay_echo",
        args(&[("text", json!("slow")), ("delay_ms", json!(400))]),
    );
    let fast = client.call_tool("echo", args(&[("text", json!("fast"))]));

    let slow = async {
        let result = slow.await;
        (Instant::now(), result)
    };
    let fast = async {
        let result = fast.await;
        (Instant::now(), result)
    };
    let ((slow_done, slow_result), (fast_done, fast_result)) = tokio::join!(slow, fast);

    assert!(fast_done < slow_done);
    assert_eq!(fast_result.unwrap(), vec![ContentBlock::text("fast")]);
    assert_eq!(slow_result.unwrap(), vec![ContentBlock::text("slow")]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn timeout_releases_the_call_and_the_session_survives() {
    let client = ToolClient::connect(worker_config()).await.unwrap();

    let err = client
        .call_tool_with_timeout(
            "delay_echo",
            args(&[("text", json!("late")), ("delay_ms", json!(1000))]),
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WireError::Timeout { .. }));

    // The late response is discarded as stale; the session keeps working.
    let content = client
        .call_tool("echo", args(&[("text", json!("alive"))]))
        .await
        .unwrap();
    assert_eq!(content, vec![ContentBlock::text("alive")]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn worker_death_mid_call_is_a_protocol_violation() {
    let client = ToolClient::connect(worker_config()).await.unwrap();

    let err = client
        .call_tool("terminate", Arguments::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WireError::ProtocolViolation(_)), "got {err:?}");

    client.close().await.unwrap();
}

#[tokio::test]
async fn sequential_identical_calls_are_independent() {
    let client = ToolClient::connect(worker_config()).await.unwrap();

    // No caching at this layer: both calls go to the worker and both answer.
    let first = client
        .call_tool("echo", args(&[("text", json!("same"))]))
        .await
        .unwrap();
    let second = client
        .call_tool("echo", args(&[("text", json!("same"))]))
        .await
        .unwrap();
    assert_eq!(first, second);

    client.close().await.unwrap();
}

#[tokio::test]
async fn close_is_safe_to_repeat() {
    let client = ToolClient::connect(worker_config()).await.unwrap();

    client.close().await.unwrap();
    client.close().await.unwrap();
    assert!(!client.is_connected());
}

#[test]
fn blocking_client_runs_a_full_session() {
    let client = BlockingToolClient::connect(worker_config()).unwrap();

    let tools = client.list_tools().unwrap();
    assert_eq!(tools.len(), 3);

    let content = client
        .call_tool("echo", args(&[("text", json!("from a plain thread"))]))
        .unwrap();
    assert_eq!(content, vec![ContentBlock::text("from a plain thread")]);

    client.close().unwrap();
}

#[test]
fn blocking_client_translates_remote_errors() {
    let client = BlockingToolClient::connect(worker_config()).unwrap();

    let err = client.call_tool("echo", Arguments::new()).unwrap_err();
    assert!(matches!(err, WireError::Remote(_)));

    client.close().unwrap();
}
