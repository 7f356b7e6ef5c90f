//! `ChatClient` against a throwaway local HTTP responder

use hovor::chat::ChatClient;
use hovor::config::ChatConfig;
use hovor::error::TransportError;
use hovor::messages::{Message, Role};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct CapturedRequest {
    head: String,
    body: serde_json::Value,
}

/// Serve one canned response and hand back what the client sent
async fn respond_once(status_line: &str, body: &str) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let body = serde_json::from_slice(&buf[head_end..head_end + content_length])
            .unwrap_or(serde_json::Value::Null);
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(CapturedRequest { head, body });
    });

    (endpoint, rx)
}

fn client(endpoint: String) -> ChatClient {
    ChatClient::new(
        ChatConfig::new("sk-test")
            .with_organization("org-test")
            .with_endpoint(endpoint),
    )
}

#[tokio::test]
async fn test_success_returns_first_choice() {
    let (endpoint, captured) = respond_once(
        "200 OK",
        r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Dobrý den"}}]}"#,
    )
    .await;

    let reply = client(endpoint).send(&[Message::user("Ahoj")]).await.unwrap();
    assert_eq!(reply.role(), Role::Assistant);
    assert_eq!(reply.content(), "Dobrý den");

    captured.await.unwrap();
}

#[tokio::test]
async fn test_request_headers_and_body() {
    let (endpoint, captured) = respond_once(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#,
    )
    .await;

    let history = vec![Message::user("Ahoj"), Message::assistant("Dobrý den"), Message::user("Jak se máš?")];
    client(endpoint).send(&history).await.unwrap();

    let request = captured.await.unwrap();
    assert!(request.head.starts_with("post /v1/chat/completions"));
    assert!(request.head.contains("content-type: application/json"));
    assert!(request.head.contains("authorization: bearer sk-test"));
    assert!(request.head.contains("openai-organization: org-test"));
    assert_eq!(
        request.body,
        serde_json::json!({
            "model": "gpt-3.5-turbo",
            "messages": [
                {"role": "user", "content": "Ahoj"},
                {"role": "assistant", "content": "Dobrý den"},
                {"role": "user", "content": "Jak se máš?"}
            ]
        })
    );
}

#[tokio::test]
async fn test_organization_header_is_optional() {
    let (endpoint, captured) = respond_once(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#,
    )
    .await;

    ChatClient::new(ChatConfig::new("sk-test").with_endpoint(endpoint))
        .send(&[Message::user("Ahoj")])
        .await
        .unwrap();

    let request = captured.await.unwrap();
    assert!(!request.head.contains("openai-organization"));
}

#[tokio::test]
async fn test_rate_limit_carries_remote_message() {
    let (endpoint, _captured) = respond_once(
        "429 Too Many Requests",
        r#"{"error":{"message":"rate limited","type":"requests"}}"#,
    )
    .await;

    let err = client(endpoint).send(&[Message::user("Ahoj")]).await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Api {
            status: 429,
            message: "rate limited".into()
        }
    );
}

#[tokio::test]
async fn test_server_error_without_body_uses_status_text() {
    let (endpoint, _captured) = respond_once("500 Internal Server Error", "").await;

    let err = client(endpoint).send(&[Message::user("Ahoj")]).await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Api {
            status: 500,
            message: "API Error: Internal Server Error".into()
        }
    );
}

#[tokio::test]
async fn test_missing_choices_is_malformed() {
    let (endpoint, _captured) = respond_once("200 OK", r#"{"id":"chatcmpl-1","choices":[]}"#).await;

    let err = client(endpoint).send(&[Message::user("Ahoj")]).await.unwrap_err();
    assert!(matches!(err, TransportError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
    drop(listener);

    let err = client(endpoint).send(&[Message::user("Ahoj")]).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}
