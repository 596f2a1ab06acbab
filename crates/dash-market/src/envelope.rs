//! Outbound `{type, data}` messages pushed to dashboard clients.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::snapshot::Snapshot;
use crate::types::{
    AccountData, BarData, LogData, OrderData, PositionData, SharedData, TickData, TradeData,
    display_datetime,
};

/// One message to every connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, data: &impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            kind: kind.into(),
            data: serde_json::to_value(data)?,
        })
    }

    pub fn log(log: &LogData) -> serde_json::Result<Self> {
        Self::new("log", log)
    }

    /// Account fields as a `[{key, value}, ...]` list.
    pub fn account(account: &AccountData) -> Self {
        let pairs: Vec<Value> = account
            .fields()
            .into_iter()
            .map(|(key, value)| json!({ "key": key, "value": value }))
            .collect();
        Self {
            kind: "account".to_string(),
            data: Value::Array(pairs),
        }
    }

    /// `[timestamp_ms, open, high, low, close, volume]`.
    pub fn bar(bar: &BarData) -> Self {
        Self {
            kind: "bar".to_string(),
            data: json!([
                bar.timestamp_millis(),
                bar.open_price,
                bar.high_price,
                bar.low_price,
                bar.close_price,
                bar.volume
            ]),
        }
    }

    pub fn active_order(orders: &[OrderData]) -> serde_json::Result<Self> {
        Self::new("active_order", &orders)
    }

    pub fn order(orders: &[OrderData]) -> serde_json::Result<Self> {
        Self::new("order", &orders)
    }

    pub fn position(positions: &[PositionData]) -> serde_json::Result<Self> {
        Self::new("position", &positions)
    }

    pub fn trade(trades: &[TradeData]) -> serde_json::Result<Self> {
        Self::new("trade", &trades)
    }

    pub fn tick(tick: &TickData) -> serde_json::Result<Self> {
        let mut envelope = Self::new("tick", tick)?;
        envelope.set_display_datetime(&display_datetime(&tick.datetime));
        Ok(envelope)
    }

    pub fn shared(shared: &SharedData) -> serde_json::Result<Self> {
        let mut envelope = Self::new("shared", shared)?;
        envelope.set_display_datetime(&display_datetime(&shared.datetime));
        Ok(envelope)
    }

    pub fn update_all(snapshot: &Snapshot) -> serde_json::Result<Self> {
        Self::new("update_all", snapshot)
    }

    fn set_display_datetime(&mut self, datetime: &str) {
        if let Value::Object(fields) = &mut self.data {
            fields.insert("datetime".to_string(), Value::String(datetime.to_string()));
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
