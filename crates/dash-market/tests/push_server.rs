//! End-to-end push path: engine event -> bridge -> WebSocket client.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use dash_market::{
    EngineEvent, Envelope, LocalRecorder, LogData, MarketBridge, PushServer, PushServerConfig,
    SnapshotStore, spawn_market_bridge,
};

async fn wait_for_clients(server: &PushServer, count: u64) {
    for _ in 0..100 {
        if server.stats().snapshot().active_connections == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("client never registered");
}

async fn next_envelope<S>(ws: &mut S) -> Envelope
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("message before timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_engine_log_reaches_websocket_client() {
    let dir = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (envelope_tx, envelope_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::channel(16);
    let (shutdown_tx, _) = broadcast::channel(1);

    let server = Arc::new(PushServer::new(PushServerConfig::default()));
    let server_task = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve(listener, envelope_rx).await })
    };

    let bridge = MarketBridge::new(LocalRecorder::new(), SnapshotStore::new(dir.path()), envelope_tx);
    let bridge_task = spawn_market_bridge(bridge, event_rx, shutdown_tx.subscribe());

    let (mut ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    wait_for_clients(&server, 1).await;

    let log = LogData {
        msg: "engine up".to_string(),
        level: "INFO".to_string(),
    };
    event_tx.send(EngineEvent::Log(log)).await.unwrap();

    let envelope = next_envelope(&mut ws).await;
    assert_eq!(envelope.kind, "log");
    assert_eq!(envelope.data["msg"], "engine up");

    shutdown_tx.send(()).unwrap();
    server.shutdown_handle().send(()).unwrap();
    bridge_task.await.unwrap();
    server_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_client_limit_rejects_extra_connections() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (_envelope_tx, envelope_rx) = mpsc::channel::<Envelope>(1);

    let config = PushServerConfig {
        port: 0,
        max_clients: 1,
    };
    let server = Arc::new(PushServer::new(config));
    {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve(listener, envelope_rx).await });
    }

    let (_first, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    wait_for_clients(&server, 1).await;

    let second = connect_async(format!("ws://{addr}")).await;
    assert!(second.is_err());
    assert_eq!(server.stats().snapshot().connections_rejected, 1);
}
