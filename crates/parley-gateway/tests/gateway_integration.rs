#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use parley_agent::{AgentBackend, AgentClient, AgentConfig, AgentProvider, AgentReply, AgentRequest};
use parley_core::{ParleyError, ParleyResult};
use parley_gateway::GatewayServer;
use parley_session::FileTranscriptStore;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Replies with a canned envelope chosen by the input text.
struct CannedBackend {
    calls: AtomicU32,
}

#[async_trait]
impl AgentBackend for CannedBackend {
    fn name(&self) -> &str {
        "canned"
    }

    async fn invoke(&self, request: &AgentRequest) -> ParleyResult<AgentReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match request.input_text.as_str() {
            "stream" => Ok(AgentReply::Streaming(vec![b"Hel".to_vec(), b"lo".to_vec()])),
            "silent" => Ok(AgentReply::Direct(String::new())),
            "fail" => Err(ParleyError::Agent("ThrottlingException: slow down".into())),
            other => Ok(AgentReply::Direct(format!("you said: {other}"))),
        }
    }
}

struct TestServer {
    addr: String,
    data_dir: PathBuf,
    backend: Arc<CannedBackend>,
    _tmp: tempfile::TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn log_lines(&self, session_id: &str) -> Vec<serde_json::Value> {
        let raw = std::fs::read_to_string(self.data_dir.join(format!("{session_id}.jsonl")))
            .unwrap();
        raw.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }
}

async fn serve(agent: Arc<AgentClient>) -> (String, PathBuf, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().join("conversations");
    let store = Arc::new(FileTranscriptStore::new(data_dir.clone()).await.unwrap());
    let app = GatewayServer::build(agent, store);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Small yield to let the server task start
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    (addr, data_dir, tmp)
}

/// Helper: build a test server on a random port with a canned backend.
async fn start_test_server() -> TestServer {
    let backend = Arc::new(CannedBackend {
        calls: AtomicU32::new(0),
    });
    let agent = Arc::new(AgentClient::from_backend(backend.clone()));
    let (addr, data_dir, tmp) = serve(agent).await;
    TestServer {
        addr,
        data_dir,
        backend,
        _tmp: tmp,
    }
}

async fn post_message(server: &TestServer, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(server.url("/api/message"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = start_test_server().await;
    let resp = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "parley");
}

#[tokio::test]
async fn test_index_serves_chat_ui() {
    let server = start_test_server().await;
    let resp = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("<!doctype html>"));
    assert!(html.contains("/api/message"));
}

#[tokio::test]
async fn test_new_sessions_get_fresh_ids() {
    let server = start_test_server().await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let resp = post_message(&server, json!({"message": "hello"})).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["reply"], "you said: hello");
        ids.push(body["sessionId"].as_str().unwrap().to_string());
    }

    assert!(ids.iter().all(|id| !id.is_empty()));
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_blank_message_rejected() {
    let server = start_test_server().await;

    for body in [
        json!({"message": ""}),
        json!({"message": "   \n"}),
        json!({"sessionId": "sess-1"}),
        json!({}),
    ] {
        let resp = post_message(&server, body).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"error": "message is required"}));
    }

    assert_eq!(server.backend.calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_dir(&server.data_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn test_invalid_session_id_rejected() {
    let server = start_test_server().await;
    let resp = post_message(&server, json!({"message": "hi", "sessionId": "../escape"})).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "invalid sessionId"}));
    assert_eq!(server.backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fixed_session_accumulates_transcript() {
    let server = start_test_server().await;

    for text in ["first", "second"] {
        let resp = post_message(&server, json!({"message": text, "sessionId": "fixed-1"})).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["sessionId"], "fixed-1");
    }

    assert_eq!(
        server.log_lines("fixed-1"),
        vec![
            json!({"role": "user", "text": "first"}),
            json!({"role": "agent", "text": "you said: first"}),
            json!({"role": "user", "text": "second"}),
            json!({"role": "agent", "text": "you said: second"}),
        ]
    );
}

#[tokio::test]
async fn test_agent_failure_is_reply_not_http_error() {
    let server = start_test_server().await;

    let resp = post_message(&server, json!({"message": "fail", "sessionId": "err-1"})).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let reply = body["reply"].as_str().unwrap();
    assert!(reply.starts_with("[error] "));
    assert!(reply.contains("ThrottlingException"));

    let lines = server.log_lines("err-1");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], json!({"role": "agent", "text": reply}));
}

#[tokio::test]
async fn test_streaming_and_empty_replies() {
    let server = start_test_server().await;

    let resp = post_message(&server, json!({"message": "stream"})).await;
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["reply"], "Hello");

    let resp = post_message(&server, json!({"message": "silent", "sessionId": "quiet-1"})).await;
    let body: serde_json::Value = resp.json().await.unwrap();
    let placeholder = body["reply"].as_str().unwrap().to_string();
    assert!(placeholder.starts_with("[The agent returned no response"));
    assert_eq!(
        server.log_lines("quiet-1")[1],
        json!({"role": "agent", "text": placeholder})
    );
}

#[tokio::test]
async fn test_log_lines_have_only_role_and_text() {
    let server = start_test_server().await;
    for text in ["one", "fail", "silent", "stream"] {
        post_message(&server, json!({"message": text, "sessionId": "keys-1"})).await;
    }

    let lines = server.log_lines("keys-1");
    assert_eq!(lines.len(), 8);
    for line in lines {
        let obj = line.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj["role"] == "user" || obj["role"] == "agent");
        assert!(obj["text"].is_string());
    }
}

// --- End to end through the HTTP agent backend ---

#[tokio::test]
async fn test_end_to_end_with_http_backend() {
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let agent_api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"sessionId": "e2e-1", "inputText": "Hola"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "completion": [{"chunk": {"bytes": "wqFIb2xhIQ=="}}]
        })))
        .expect(1)
        .mount(&agent_api)
        .await;

    let config = AgentConfig {
        provider: AgentProvider::Http,
        url: Some(agent_api.uri()),
        ..AgentConfig::default()
    };
    let agent = Arc::new(AgentClient::new(&config).await.unwrap());
    let (addr, data_dir, _tmp) = serve(agent).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/message"))
        .json(&json!({"message": "  Hola  ", "sessionId": "e2e-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"sessionId": "e2e-1", "reply": "¡Hola!"}));

    let raw = std::fs::read_to_string(data_dir.join("e2e-1.jsonl")).unwrap();
    assert_eq!(
        raw,
        "{\"role\":\"user\",\"text\":\"Hola\"}\n{\"role\":\"agent\",\"text\":\"¡Hola!\"}\n"
    );
}

#[tokio::test]
async fn test_end_to_end_agent_service_down() {
    let config = AgentConfig {
        provider: AgentProvider::Http,
        // Point to a non-routable address so the HTTP client fails fast
        url: Some("http://127.0.0.1:1".to_string()),
        max_attempts: 1,
        ..AgentConfig::default()
    };
    let agent = Arc::new(AgentClient::new(&config).await.unwrap());
    let (addr, _data_dir, _tmp) = serve(agent).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/message"))
        .json(&json!({"message": "anyone there?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["reply"].as_str().unwrap().starts_with("[error] HTTP error:"));
}
