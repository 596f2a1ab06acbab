//! Trading-engine domain objects.
//!
//! These mirror the payloads the engine hands to its callbacks. Prices and
//! volumes are passed through untouched, so they stay `f64`. Engine
//! timestamps are naive wall-clock values and are read as UTC wherever an
//! epoch value is needed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format used when a datetime is shown to dashboard clients.
pub const DISPLAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Render an engine datetime the way clients display it.
pub fn display_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(DISPLAY_DATETIME_FORMAT).to_string()
}

/// Unix milliseconds for an engine datetime.
pub fn epoch_millis(datetime: &NaiveDateTime) -> i64 {
    datetime.and_utc().timestamp_millis()
}

// ============================================================================
// Enums
// ============================================================================

/// Position / order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
    Net,
}

/// Open/close flag of an order or trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Offset {
    None,
    Open,
    Close,
    CloseToday,
    CloseYesterday,
}

/// Order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Submitting,
    NotTraded,
    PartTraded,
    AllTraded,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Whether the order can still trade.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            OrderStatus::Submitting | OrderStatus::NotTraded | OrderStatus::PartTraded
        )
    }
}

// ============================================================================
// Market data
// ============================================================================

/// Level-1 market data update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickData {
    /// Exchange symbol; also names the snapshot file.
    pub symbol: String,
    pub exchange: String,
    /// Engine-local symbol (`symbol.exchange`).
    pub local_symbol: String,
    pub datetime: NaiveDateTime,
    #[serde(default)]
    pub name: String,
    /// Cumulative traded volume for the trading day.
    pub volume: f64,
    #[serde(default)]
    pub open_interest: f64,
    pub last_price: f64,
    #[serde(default)]
    pub limit_up: f64,
    #[serde(default)]
    pub limit_down: f64,
    #[serde(default)]
    pub open_price: f64,
    #[serde(default)]
    pub high_price: f64,
    #[serde(default)]
    pub low_price: f64,
    #[serde(default)]
    pub pre_close: f64,
    pub bid_price_1: f64,
    pub bid_volume_1: f64,
    pub ask_price_1: f64,
    pub ask_volume_1: f64,
}

/// Completed bar from the engine's bar generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarData {
    pub symbol: String,
    pub exchange: String,
    pub local_symbol: String,
    pub datetime: NaiveDateTime,
    /// Bar interval in minutes.
    #[serde(default = "default_interval")]
    pub interval: u32,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub volume: f64,
}

fn default_interval() -> u32 {
    1
}

impl BarData {
    pub fn timestamp_millis(&self) -> i64 {
        epoch_millis(&self.datetime)
    }
}

/// Aggregated market statistics pushed alongside ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedData {
    pub local_symbol: String,
    pub datetime: NaiveDateTime,
    #[serde(default)]
    pub last_price: f64,
    #[serde(default)]
    pub average_price: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub open_interest: f64,
}

/// Static contract description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractData {
    pub symbol: String,
    pub exchange: String,
    pub local_symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub pricetick: f64,
}

// ============================================================================
// Trading state
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderData {
    pub symbol: String,
    pub exchange: String,
    pub local_symbol: String,
    pub order_id: String,
    /// Gateway-qualified order id, unique across sessions.
    pub local_order_id: String,
    pub direction: Direction,
    pub offset: Offset,
    pub price: f64,
    pub volume: f64,
    #[serde(default)]
    pub traded: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub time: String,
}

impl OrderData {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeData {
    pub symbol: String,
    pub exchange: String,
    pub local_symbol: String,
    pub order_id: String,
    pub trade_id: String,
    pub direction: Direction,
    pub offset: Offset,
    pub price: f64,
    pub volume: f64,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionData {
    pub symbol: String,
    pub exchange: String,
    pub local_symbol: String,
    pub direction: Direction,
    pub volume: f64,
    #[serde(default)]
    pub frozen: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub pnl: f64,
    #[serde(default)]
    pub yd_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    pub account_id: String,
    pub balance: f64,
    #[serde(default)]
    pub frozen: f64,
    pub available: f64,
}

impl AccountData {
    /// Account fields in display order.
    pub fn fields(&self) -> Vec<(&'static str, serde_json::Value)> {
        vec![
            ("account_id", self.account_id.clone().into()),
            ("balance", self.balance.into()),
            ("frozen", self.frozen.into()),
            ("available", self.available.into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogData {
    pub msg: String,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

// ============================================================================
// Engine Event
// ============================================================================

/// One engine callback, tagged as `{"type": ..., "data": ...}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EngineEvent {
    Tick(TickData),
    Bar(BarData),
    Order(OrderData),
    Trade(TradeData),
    Position(PositionData),
    Account(AccountData),
    Log(LogData),
    Shared(SharedData),
    Contract(ContractData),
}

impl EngineEvent {
    /// Wire tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::Tick(_) => "tick",
            EngineEvent::Bar(_) => "bar",
            EngineEvent::Order(_) => "order",
            EngineEvent::Trade(_) => "trade",
            EngineEvent::Position(_) => "position",
            EngineEvent::Account(_) => "account",
            EngineEvent::Log(_) => "log",
            EngineEvent::Shared(_) => "shared",
            EngineEvent::Contract(_) => "contract",
        }
    }
}
