//! Manager driving real transports against loopback peers.

use std::sync::Arc;

use connection::{ConnectionManager, ReplyDispatcher};
use domain::{Port, ServerDescriptor, ServerId, ServerStore};
use registry::JsonFileStore;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use transport::{DefaultTransportFactory, TransportSettings};

/// Echoes each line back prefixed with `tag`; signals when the client closes.
async fn spawn_echo(tag: &'static str) -> (u16, oneshot::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (closed_tx, closed_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let reply = format!("{tag}:{line}");
            if writer.write_all(reply.as_bytes()).await.is_err() {
                break;
            }
        }
        let _ = closed_tx.send(());
    });

    (port, closed_rx)
}

async fn setup(dir: &TempDir, servers: &[(&str, u16)]) -> ConnectionManager {
    let store = Arc::new(JsonFileStore::new(dir.path().join("servers.json")));
    for (id, port) in servers {
        store
            .add(ServerDescriptor::new(
                ServerId::new(*id).unwrap(),
                *id,
                "127.0.0.1",
                Port::new(*port).unwrap(),
            ))
            .await
            .unwrap();
    }
    let factory = DefaultTransportFactory::new(TransportSettings::default()).unwrap();
    ConnectionManager::new(store, Arc::new(factory), Arc::new(ReplyDispatcher::new()))
}

#[tokio::test]
async fn switching_closes_the_previous_socket() {
    let (port_a, closed_a) = spawn_echo("a").await;
    let (port_b, _closed_b) = spawn_echo("b").await;
    let dir = TempDir::new().unwrap();
    let manager = setup(&dir, &[("a", port_a), ("b", port_b)]).await;
    let mut replies = manager.dispatcher().subscribe(4);

    manager.connect_to(&ServerId::new("a").unwrap()).await.unwrap();
    manager.send_to_active("hi").await.unwrap();
    assert_eq!(replies.recv().await.unwrap().content, "a:hi");

    manager.connect_to(&ServerId::new("b").unwrap()).await.unwrap();
    closed_a.await.expect("peer a should observe the socket closing");

    manager.send_to_active("hi").await.unwrap();
    assert_eq!(replies.recv().await.unwrap().content, "b:hi");
    assert_eq!(manager.active_server().await, ServerId::new("b"));
}

#[tokio::test]
async fn refused_connection_reports_detail() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let manager = setup(&dir, &[("gone", port)]).await;

    let err = manager
        .connect_to(&ServerId::new("gone").unwrap())
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Failed to connect: "));
    assert_eq!(manager.active_server().await, None);
}
