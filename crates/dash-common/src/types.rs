//! Shared row types.
//!
//! Prices are pass-through values reported by the trading engine; nothing in
//! this workspace does arithmetic on them beyond candle high/low tracking, so
//! they are stored as `f64` (ClickHouse `Float64`).

use clickhouse::Row;
use serde::{Deserialize, Serialize};

/// One completed bar as reported by the engine's `on_bar` callback.
///
/// Maps to the `bars` table in ClickHouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Row)]
pub struct BarRow {
    /// Engine-local symbol (e.g. `rb2405.SHFE`).
    pub local_symbol: String,
    /// Bar open time, Unix milliseconds.
    pub timestamp: i64,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub volume: f64,
}
