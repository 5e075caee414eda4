//! HTTP transport against a loopback peer that speaks just enough HTTP/1.1.

use domain::{Port, ServerDescriptor, ServerId, TransportClient, TransportFactory, TransportKind};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use transport::{DefaultTransportFactory, TransportSettings};

/// A request as seen by the test peer.
struct Captured {
    head: String,
    body: String,
}

/// Serves one request with `status` and `body`, reporting what it received.
async fn spawn_peer(status: &'static str, body: &'static str) -> (u16, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let captured = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        let _ = tx.send(captured);
    });

    (port, rx)
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(split) = text.find("\r\n\r\n") {
            let head = text[..split].to_string();
            let length = head
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            let body = &text[split + 4..];
            if body.len() >= length {
                return Captured {
                    head,
                    body: body.to_string(),
                };
            }
        }
    }
    panic!("peer closed before a full request arrived");
}

fn http_client(port: u16) -> Box<dyn TransportClient> {
    let descriptor = ServerDescriptor::new(
        ServerId::new("llm").unwrap(),
        "LLM host",
        "127.0.0.1",
        Port::new(port).unwrap(),
    )
    .with_protocol(TransportKind::Http);
    DefaultTransportFactory::new(TransportSettings::default())
        .unwrap()
        .create(&descriptor)
}

#[tokio::test]
async fn reply_field_is_returned() {
    let (port, request) = spawn_peer("200 OK", r#"{"reply":"pong"}"#).await;
    let mut client = http_client(port);

    client.connect().await.unwrap();
    assert_eq!(client.send("ping").await.unwrap(), "pong");

    let request = request.await.unwrap();
    assert!(request.head.starts_with("POST /mcp/message HTTP/1.1"));
    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body, serde_json::json!({ "message": "ping" }));
}

#[tokio::test]
async fn missing_reply_is_empty_string() {
    let (port, _request) = spawn_peer("200 OK", r#"{"status":"ok"}"#).await;
    let mut client = http_client(port);
    assert_eq!(client.send("ping").await.unwrap(), "");
}

#[tokio::test]
async fn server_error_message_is_preferred() {
    let (port, _request) = spawn_peer("500 Internal Server Error", r#"{"error":"LLM error"}"#).await;
    let mut client = http_client(port);
    let err = client.send("ping").await.unwrap_err();
    assert_eq!(err.message(), "LLM error");
}

#[tokio::test]
async fn status_text_is_the_fallback() {
    let (port, _request) = spawn_peer("404 Not Found", "not json").await;
    let mut client = http_client(port);
    let err = client.send("ping").await.unwrap_err();
    assert_eq!(err.message(), "Request failed with status code 404");
}

#[tokio::test]
async fn unreachable_endpoint_connects_but_fails_to_send() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut client = http_client(port);
    client.connect().await.unwrap();
    let err = client.send("ping").await.unwrap_err();
    assert!(!err.message().is_empty());
    client.disconnect().await;
}
