//! HTTP client against a mocked Assistants API

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use serde_json::json;
use stock_assistant_relay::client::{AssistantsApi, OpenAiAssistantsClient};
use stock_assistant_relay::config::OpenAiConfig;
use stock_assistant_relay::error::RelayError;
use stock_assistant_relay::types::{
    AssistantStreamEvent, CreateMessageRequest, CreateRunRequest, RunStatus,
    SubmitToolOutputsRequest, ToolOutput,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> String {
    let path: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("assistants")
        .join(name);
    std::fs::read_to_string(path).expect("read fixture")
}

fn sse(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_raw(body, "text/event-stream")
}

fn client(server: &MockServer) -> OpenAiAssistantsClient {
    let cfg = OpenAiConfig::new("sk-test").with_base_url(format!("{}/v1", server.uri()));
    OpenAiAssistantsClient::new(cfg, reqwest::Client::new())
}

#[tokio::test]
async fn creates_thread_and_message_with_beta_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/threads"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("openai-beta", "assistants=v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "thread_1",
            "object": "thread",
            "created_at": 1_700_000_000,
            "metadata": {}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_1/messages"))
        .and(header("openai-beta", "assistants=v2"))
        .and(body_json(json!({"role": "user", "content": "price of apple?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_user",
            "object": "thread.message",
            "thread_id": "thread_1",
            "role": "user",
            "content": [{"type": "text", "text": {"value": "price of apple?", "annotations": []}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let cancel = CancellationToken::new();
    let thread = client.create_thread(&cancel).await.unwrap();
    assert_eq!(thread.id, "thread_1");

    let message = client
        .create_message(
            &thread.id,
            CreateMessageRequest::user("price of apple?"),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(message.id, "msg_user");
    assert_eq!(message.text(), "price of apple?");
}

#[tokio::test]
async fn streams_a_run_until_it_requires_action() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_1/runs"))
        .and(header("accept", "text/event-stream"))
        .and(body_json(json!({"assistant_id": "asst_stocks", "stream": true})))
        .respond_with(sse(fixture("run_requires_action.sse")))
        .mount(&server)
        .await;

    let mut stream = client(&server)
        .create_run_stream(
            "thread_1",
            CreateRunRequest::streaming("asst_stocks"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(item) = stream.next().await {
        events.push(item.unwrap());
    }

    let statuses: Vec<RunStatus> = events
        .iter()
        .filter_map(|e| e.run().map(|r| r.status))
        .collect();
    assert_eq!(
        statuses,
        [
            RunStatus::Queued,
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::RequiresAction
        ]
    );
    let last = events
        .iter()
        .rev()
        .find_map(AssistantStreamEvent::run)
        .unwrap();
    let calls = last.pending_tool_calls().expect("tool calls");
    assert_eq!(calls[0].function.name, "showStockPrice");
    assert_eq!(calls[0].function.arguments, r#"{"symbol":"AAPL"}"#);
}

#[tokio::test]
async fn submits_tool_outputs_and_streams_the_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_1/runs/run_1/submit_tool_outputs"))
        .and(header("openai-beta", "assistants=v2"))
        .and(body_json(json!({
            "tool_outputs": [{"tool_call_id": "call_1", "output": "AAPL"}],
            "stream": true
        })))
        .respond_with(sse(fixture("submit_completed.sse")))
        .expect(1)
        .mount(&server)
        .await;

    let request = SubmitToolOutputsRequest::streaming(vec![ToolOutput {
        tool_call_id: "call_1".into(),
        output: "AAPL".into(),
    }]);
    let stream = client(&server)
        .submit_tool_outputs_stream("thread_1", "run_1", request, &CancellationToken::new())
        .await
        .unwrap();
    let events: Vec<AssistantStreamEvent> = stream.map(|e| e.unwrap()).collect().await;

    let text: String = events
        .iter()
        .filter_map(|e| match e {
            AssistantStreamEvent::MessageDelta(d) => Some(d.text_values().collect::<String>()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "Apple trades at 150.");
    assert!(matches!(events.first(), Some(AssistantStreamEvent::RunStep { .. })));
    assert!(matches!(
        events.last(),
        Some(AssistantStreamEvent::Run { run, .. }) if run.status == RunStatus::Completed
    ));
}

#[tokio::test]
async fn error_event_ends_the_stream_with_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_1/runs"))
        .respond_with(sse(fixture("run_error.sse")))
        .mount(&server)
        .await;

    let stream = client(&server)
        .create_run_stream(
            "thread_1",
            CreateRunRequest::streaming("asst_stocks"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let items: Vec<_> = stream.collect().await;

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    match &items[1] {
        Err(RelayError::ApiError { message, .. }) => {
            assert!(message.contains("server had an error"))
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn maps_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/threads"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "type": "rate_limit_error"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_1/runs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let client = client(&server);
    let cancel = CancellationToken::new();

    let err = client.create_thread(&cancel).await.unwrap_err();
    assert!(matches!(err, RelayError::AuthenticationError(ref m) if m == "Incorrect API key provided"));

    let err = client
        .create_message("thread_1", CreateMessageRequest::user("hi"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::RateLimitError(_)));
    assert_eq!(err.http_status(), 429);

    let err = match client
        .create_run_stream("thread_1", CreateRunRequest::streaming("asst"), &cancel)
        .await
    {
        Err(e) => e,
        Ok(_) => panic!("expected an error status"),
    };
    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test]
async fn cancelled_token_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "thread_1"})))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = client(&server).create_thread(&cancel).await.unwrap_err();
    assert!(err.is_cancelled());
}
