//! Trading-engine bridge for the dashboard.
//!
//! ```text
//! POST /api/engine/events ──► [ingest] ──mpsc──► [MarketBridge] ──mpsc──► [PushServer] ──► browsers
//!                                                   │
//!                                                   ├──► [SnapshotStore] {symbol}.json
//!                                                   └──► [BarSink] ClickHouse
//! ```
//!
//! ## Modules
//!
//! - `types`: engine callback payloads and the tagged `EngineEvent`
//! - `recorder`: order/trade/position books the bridge reads from
//! - `envelope`: `{type, data}` messages pushed to clients
//! - `snapshot`: one-minute candle series and their JSON files
//! - `bridge`: per-callback handlers and the event loop
//! - `server`: WebSocket push server
//! - `ingest`: HTTP intake for engine callbacks

pub mod bridge;
pub mod envelope;
pub mod ingest;
pub mod recorder;
pub mod server;
pub mod snapshot;
pub mod types;

pub use bridge::{
    BarSink, BridgeError, BridgeStats, BridgeStatsSnapshot, ClickHouseBarSink,
    DEFAULT_CHANNEL_CAPACITY, EngineEventReceiver, EngineEventSender, MarketBridge, bar_row,
    spawn_market_bridge,
};
pub use envelope::Envelope;
pub use ingest::{IngestState, create_ingest_router};
pub use recorder::{LocalRecorder, Recorder};
pub use server::{PushServer, PushServerConfig, PushStats, SharedPushServer, spawn_push_server};
pub use snapshot::{
    Candle, Depths, Snapshot, SnapshotData, SnapshotError, SnapshotStore, is_valid_symbol,
};
pub use types::*;
