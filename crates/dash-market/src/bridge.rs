//! Market data bridge.
//!
//! Turns engine callbacks into client envelopes. Events arrive on one
//! channel and are handled one at a time, so the recorder and the snapshot
//! store never see concurrent updates.
//!
//! ```text
//! [engine adapter] ──EngineEvent──► [MarketBridge] ──Envelope──► [PushServer]
//!                                      │      │
//!                                      │      └──► {symbol}.json snapshots
//!                                      └──► BarSink (ClickHouse)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use dash_common::{BarRow, ClickHouseClient, ClickHouseError};

use crate::envelope::Envelope;
use crate::recorder::Recorder;
use crate::snapshot::{SnapshotError, SnapshotStore};
use crate::types::{
    AccountData, BarData, ContractData, EngineEvent, LogData, OrderData, PositionData, SharedData,
    TickData, TradeData,
};

/// Default capacity of the engine event and envelope channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

pub type EngineEventSender = mpsc::Sender<EngineEvent>;
pub type EngineEventReceiver = mpsc::Receiver<EngineEvent>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("failed to persist bar: {0}")]
    Persist(#[from] ClickHouseError),

    #[error("push channel closed")]
    OutboundClosed,
}

// ============================================================================
// Bar Sink
// ============================================================================

/// Destination for completed bars.
#[async_trait]
pub trait BarSink: Send + Sync {
    async fn persist(&self, bar: &BarRow) -> Result<(), BridgeError>;
}

/// Writes each bar as one row of the ClickHouse `bars` table.
#[derive(Clone)]
pub struct ClickHouseBarSink {
    client: ClickHouseClient,
}

impl ClickHouseBarSink {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BarSink for ClickHouseBarSink {
    async fn persist(&self, bar: &BarRow) -> Result<(), BridgeError> {
        self.client.insert_bars(std::slice::from_ref(bar)).await?;
        Ok(())
    }
}

pub fn bar_row(bar: &BarData) -> BarRow {
    BarRow {
        local_symbol: bar.local_symbol.clone(),
        timestamp: bar.timestamp_millis(),
        open_price: bar.open_price,
        high_price: bar.high_price,
        low_price: bar.low_price,
        close_price: bar.close_price,
        volume: bar.volume,
    }
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Default)]
pub struct BridgeStats {
    pub events_handled: AtomicU64,
    pub envelopes_sent: AtomicU64,
    pub bars_persisted: AtomicU64,
    pub snapshot_errors: AtomicU64,
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BridgeStatsSnapshot {
        BridgeStatsSnapshot {
            events_handled: self.events_handled.load(Ordering::Relaxed),
            envelopes_sent: self.envelopes_sent.load(Ordering::Relaxed),
            bars_persisted: self.bars_persisted.load(Ordering::Relaxed),
            snapshot_errors: self.snapshot_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStatsSnapshot {
    pub events_handled: u64,
    pub envelopes_sent: u64,
    pub bars_persisted: u64,
    pub snapshot_errors: u64,
}

// ============================================================================
// Market Bridge
// ============================================================================

pub struct MarketBridge<R: Recorder> {
    recorder: R,
    snapshots: SnapshotStore,
    bar_sink: Option<Arc<dyn BarSink>>,
    outbound: mpsc::Sender<Envelope>,
    stats: Arc<BridgeStats>,
}

impl<R: Recorder> MarketBridge<R> {
    pub fn new(recorder: R, snapshots: SnapshotStore, outbound: mpsc::Sender<Envelope>) -> Self {
        Self {
            recorder,
            snapshots,
            bar_sink: None,
            outbound,
            stats: Arc::new(BridgeStats::new()),
        }
    }

    /// Persist bars to `sink` in addition to pushing them.
    pub fn with_bar_sink(mut self, sink: Arc<dyn BarSink>) -> Self {
        self.bar_sink = Some(sink);
        self
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Shared stats handle.
    pub fn stats_handle(&self) -> Arc<BridgeStats> {
        Arc::clone(&self.stats)
    }

    async fn emit(&self, envelope: Envelope) -> Result<(), BridgeError> {
        self.outbound
            .send(envelope)
            .await
            .map_err(|_| BridgeError::OutboundClosed)?;
        self.stats.envelopes_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Record `event` and dispatch it to its handler.
    pub async fn handle(&mut self, event: EngineEvent) -> Result<(), BridgeError> {
        self.recorder.record(&event);
        self.stats.events_handled.fetch_add(1, Ordering::Relaxed);

        match event {
            EngineEvent::Tick(tick) => self.on_tick(&tick).await,
            EngineEvent::Bar(bar) => self.on_bar(&bar).await,
            EngineEvent::Order(order) => self.on_order(&order).await,
            EngineEvent::Trade(trade) => self.on_trade(&trade).await,
            EngineEvent::Position(position) => self.on_position(&position).await,
            EngineEvent::Account(account) => self.on_account(&account).await,
            EngineEvent::Log(log) => self.on_log(&log).await,
            EngineEvent::Shared(shared) => self.on_shared(&shared).await,
            EngineEvent::Contract(contract) => {
                self.on_contract(&contract);
                Ok(())
            }
        }
    }

    pub async fn on_log(&mut self, log: &LogData) -> Result<(), BridgeError> {
        self.emit(Envelope::log(log)?).await
    }

    pub async fn on_account(&mut self, account: &AccountData) -> Result<(), BridgeError> {
        self.emit(Envelope::account(account)).await
    }

    pub fn on_contract(&mut self, contract: &ContractData) {
        debug!(symbol = %contract.local_symbol, "Contract received");
    }

    /// Persist the bar when a sink is configured, then push it.
    pub async fn on_bar(&mut self, bar: &BarData) -> Result<(), BridgeError> {
        if let Some(sink) = &self.bar_sink {
            match sink.persist(&bar_row(bar)).await {
                Ok(()) => {
                    self.stats.bars_persisted.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!(symbol = %bar.local_symbol, error = %e, "Bar not persisted");
                }
            }
        }
        self.emit(Envelope::bar(bar)).await
    }

    pub async fn on_order(&mut self, order: &OrderData) -> Result<(), BridgeError> {
        let active = self.recorder.all_active_orders(&order.local_symbol);
        self.emit(Envelope::active_order(&active)?).await?;

        let orders = self.recorder.all_orders();
        self.emit(Envelope::order(&orders)?).await
    }

    pub async fn on_position(&mut self, _position: &PositionData) -> Result<(), BridgeError> {
        let positions = self.recorder.all_positions();
        self.emit(Envelope::position(&positions)?).await
    }

    pub async fn on_trade(&mut self, _trade: &TradeData) -> Result<(), BridgeError> {
        let trades = self.recorder.all_trades();
        self.emit(Envelope::trade(&trades)?).await
    }

    pub async fn on_shared(&mut self, shared: &SharedData) -> Result<(), BridgeError> {
        self.emit(Envelope::shared(shared)?).await
    }

    /// Push the tick and positions, then update the symbol snapshot and push
    /// it whole.
    pub async fn on_tick(&mut self, tick: &TickData) -> Result<(), BridgeError> {
        self.emit(Envelope::tick(tick)?).await?;

        let positions = self.recorder.all_positions();
        self.emit(Envelope::position(&positions)?).await?;

        let snapshot = match self.snapshots.apply_tick(tick).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.stats.snapshot_errors.fetch_add(1, Ordering::Relaxed);
                return Err(e.into());
            }
        };
        self.emit(Envelope::update_all(&snapshot)?).await
    }

    /// Drain `events` until the channel closes or shutdown is signaled.
    ///
    /// Handler failures are logged and do not stop the loop.
    pub async fn run(mut self, mut events: EngineEventReceiver, mut shutdown: broadcast::Receiver<()>) {
        info!(snapshot_dir = %self.snapshots.dir().display(), "Market bridge started");

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            let kind = event.kind();
                            if let Err(e) = self.handle(event).await {
                                warn!(event = kind, error = %e, "Failed to handle engine event");
                            }
                        }
                        None => {
                            info!("Engine event channel closed");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Market bridge shutdown signal received");
                    break;
                }
            }
        }

        let stats = self.stats.snapshot();
        info!(
            events_handled = stats.events_handled,
            envelopes_sent = stats.envelopes_sent,
            bars_persisted = stats.bars_persisted,
            snapshot_errors = stats.snapshot_errors,
            "Market bridge stopped"
        );
    }
}

/// Spawn the bridge as a background task.
pub fn spawn_market_bridge<R: Recorder + 'static>(
    bridge: MarketBridge<R>,
    events: EngineEventReceiver,
    shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(bridge.run(events, shutdown))
}
