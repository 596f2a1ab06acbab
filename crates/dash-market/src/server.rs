//! Envelope push channel for dashboard browsers.
//!
//! Browsers subscribe by opening a WebSocket on the push port; they never
//! send anything but control frames. Every envelope the bridge produces is
//! encoded once and queued to each subscriber's own writer task, so one
//! slow browser cannot stall the bridge or the others.
//!
//! ```text
//! [MarketBridge] ──mpsc<Envelope>──► fan-out task ──► subscriber 1 writer ──► browser
//!                                                 └─► subscriber N writer ──► browser
//! ```
//!
//! Subscribers past `max_clients` are dropped before the handshake.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast, mpsc};
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use crate::envelope::Envelope;

// ============================================================================
// Configuration
// ============================================================================

/// Push port settings, from the `[websocket]` config section.
#[derive(Debug, Clone)]
pub struct PushServerConfig {
    pub port: u16,

    /// Browsers allowed to subscribe at once.
    pub max_clients: usize,
}

impl Default for PushServerConfig {
    fn default() -> Self {
        Self {
            port: 5001,
            max_clients: 100,
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Subscriber and delivery counters.
#[derive(Debug, Default)]
pub struct PushStats {
    pub connections_accepted: AtomicU64,

    /// Turned away at `max_clients`.
    pub connections_rejected: AtomicU64,

    pub active_connections: AtomicU64,

    /// Envelope copies queued, one per subscriber per envelope.
    pub envelopes_delivered: AtomicU64,

    /// Copies dropped because the subscriber was already gone.
    pub delivery_errors: AtomicU64,
}

impl PushStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> PushStatsSnapshot {
        PushStatsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            envelopes_delivered: self.envelopes_delivered.load(Ordering::Relaxed),
            delivery_errors: self.delivery_errors.load(Ordering::Relaxed),
        }
    }
}

/// Counter values read at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushStatsSnapshot {
    pub connections_accepted: u64,
    pub connections_rejected: u64,
    pub active_connections: u64,
    pub envelopes_delivered: u64,
    pub delivery_errors: u64,
}

// ============================================================================
// Subscribers
// ============================================================================

type ClientId = u64;

type SubscriberMap = Arc<RwLock<HashMap<ClientId, Subscriber>>>;

/// Queue into one browser's writer task.
struct Subscriber {
    tx: mpsc::UnboundedSender<Message>,
}

// ============================================================================
// Push Server
// ============================================================================

/// Fans bridge envelopes out to subscribed browsers.
pub struct PushServer {
    config: PushServerConfig,
    stats: Arc<PushStats>,
    clients: SubscriberMap,
    next_client_id: AtomicU64,
    shutdown_tx: broadcast::Sender<()>,
}

impl PushServer {
    pub fn new(config: PushServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            stats: Arc::new(PushStats::new()),
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_client_id: AtomicU64::new(1),
            shutdown_tx,
        }
    }

    pub fn stats(&self) -> &Arc<PushStats> {
        &self.stats
    }

    /// Sending on this stops accepting, closes every subscriber and ends `serve`.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Bind the configured port and serve until shutdown.
    pub async fn run(&self, envelopes: mpsc::Receiver<Envelope>) -> anyhow::Result<()> {
        let addr = format!("0.0.0.0:{}", self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener, envelopes).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(
        &self,
        listener: TcpListener,
        envelopes: mpsc::Receiver<Envelope>,
    ) -> anyhow::Result<()> {
        info!(
            addr = %listener.local_addr()?,
            max_clients = self.config.max_clients,
            "Envelope push server started"
        );

        let broadcast_handle = self.spawn_broadcast_task(envelopes);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            self.handle_new_connection(stream, addr).await;
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept subscriber");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Push server shutting down");
                    break;
                }
            }
        }

        broadcast_handle.abort();

        let clients = self.clients.read().await;
        for client in clients.values() {
            let _ = client.tx.send(Message::Close(None));
        }

        info!(
            envelopes_delivered = self.stats.envelopes_delivered.load(Ordering::Relaxed),
            "Push server stopped"
        );
        Ok(())
    }

    async fn handle_new_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let current_clients = self.stats.active_connections.load(Ordering::Relaxed);
        if current_clients >= self.config.max_clients as u64 {
            self.stats.connections_rejected.fetch_add(1, Ordering::Relaxed);
            warn!(
                addr = %addr,
                current = current_clients,
                max = self.config.max_clients,
                "Subscriber rejected: max_clients reached"
            );
            return;
        }

        let client_id = self.next_client_id.fetch_add(1, Ordering::Relaxed);

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!(addr = %addr, error = %e, "WebSocket handshake failed");
                return;
            }
        };

        self.stats.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.stats.active_connections.fetch_add(1, Ordering::Relaxed);

        info!(client_id, addr = %addr, "Dashboard subscribed");

        let (ws_tx, ws_rx) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel::<Message>();

        self.clients
            .write()
            .await
            .insert(client_id, Subscriber { tx });

        let stats = Arc::clone(&self.stats);
        let clients = Arc::clone(&self.clients);
        let shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            Self::client_task(client_id, ws_tx, ws_rx, rx, stats, clients, shutdown_rx).await;
        });
    }

    /// Writes queued envelopes to one browser and answers its control frames.
    async fn client_task(
        client_id: ClientId,
        mut ws_tx: SplitSink<WebSocketStream<TcpStream>, Message>,
        mut ws_rx: SplitStream<WebSocketStream<TcpStream>>,
        mut rx: mpsc::UnboundedReceiver<Message>,
        stats: Arc<PushStats>,
        clients: SubscriberMap,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    if let Err(e) = ws_tx.send(msg).await {
                        debug!(client_id, error = %e, "Envelope write failed");
                        break;
                    }
                }
                msg_result = ws_rx.next() => {
                    match msg_result {
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_tx.send(Message::Pong(data)).await {
                                debug!(client_id, error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            debug!(client_id, "Dashboard closed the socket");
                            break;
                        }
                        Some(Err(e)) => {
                            debug!(client_id, error = %e, "WebSocket error");
                            break;
                        }
                        None => {
                            debug!(client_id, "Connection closed");
                            break;
                        }
                        // Dashboards only listen.
                        _ => {}
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!(client_id, "Shutdown signal received");
                    break;
                }
            }
        }

        clients.write().await.remove(&client_id);
        stats.active_connections.fetch_sub(1, Ordering::Relaxed);
        info!(client_id, "Dashboard unsubscribed");
    }

    /// Encode each envelope once and queue it to every subscriber.
    fn spawn_broadcast_task(
        &self,
        mut envelopes: mpsc::Receiver<Envelope>,
    ) -> tokio::task::JoinHandle<()> {
        let clients = Arc::clone(&self.clients);
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            while let Some(envelope) = envelopes.recv().await {
                let json = match envelope.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        error!(kind = %envelope.kind, error = %e, "Failed to serialize envelope");
                        continue;
                    }
                };

                let clients_guard = clients.read().await;
                let client_count = clients_guard.len();
                if client_count == 0 {
                    continue;
                }

                let msg = Message::Text(json);
                let mut errors = 0u64;
                for client in clients_guard.values() {
                    if client.tx.send(msg.clone()).is_err() {
                        errors += 1;
                    }
                }

                stats
                    .envelopes_delivered
                    .fetch_add(client_count as u64, Ordering::Relaxed);
                if errors > 0 {
                    stats.delivery_errors.fetch_add(errors, Ordering::Relaxed);
                }

                debug!(kind = %envelope.kind, subscribers = client_count, errors, "Envelope fanned out");
            }
            debug!("Envelope channel closed, broadcast task exiting");
        })
    }
}

// ============================================================================
// Spawning
// ============================================================================

pub type SharedPushServer = Arc<PushServer>;

/// Start serving `envelopes` on the configured push port.
pub fn spawn_push_server(
    config: PushServerConfig,
    envelopes: mpsc::Receiver<Envelope>,
) -> (SharedPushServer, tokio::task::JoinHandle<anyhow::Result<()>>) {
    let server = Arc::new(PushServer::new(config));
    let server_clone = Arc::clone(&server);

    let handle = tokio::spawn(async move { server_clone.run(envelopes).await });

    (server, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_server_config_default() {
        let config = PushServerConfig::default();
        assert_eq!(config.port, 5001);
        assert_eq!(config.max_clients, 100);
    }

    #[test]
    fn test_push_stats_snapshot() {
        let stats = PushStats::new();

        stats.connections_accepted.store(10, Ordering::Relaxed);
        stats.active_connections.store(5, Ordering::Relaxed);
        stats.envelopes_delivered.store(100, Ordering::Relaxed);
        stats.delivery_errors.store(2, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.connections_accepted, 10);
        assert_eq!(snapshot.active_connections, 5);
        assert_eq!(snapshot.envelopes_delivered, 100);
        assert_eq!(snapshot.delivery_errors, 2);
        assert_eq!(snapshot.connections_rejected, 0);
    }

    #[tokio::test]
    async fn test_serve_returns_on_shutdown() {
        let server = Arc::new(PushServer::new(PushServerConfig::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (_tx, rx) = mpsc::channel(1);

        let shutdown = server.shutdown_handle();
        let task = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.serve(listener, rx).await })
        };

        // Give the accept loop a chance to subscribe before signaling.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown.send(()).unwrap();

        task.await.unwrap().unwrap();
    }
}
