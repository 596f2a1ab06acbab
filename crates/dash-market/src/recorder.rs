//! Engine recorder view.
//!
//! The bridge answers "all orders", "active orders for a symbol" and the
//! like from a recorder. `LocalRecorder` rebuilds that view from the event
//! stream itself, for engines that only push callbacks.

use std::collections::{BTreeMap, HashMap};

use crate::types::{Direction, EngineEvent, OrderData, PositionData, TradeData};

/// Read access to the engine's order, trade and position books.
pub trait Recorder: Send + Sync {
    /// Apply an event before the bridge reacts to it.
    fn record(&mut self, event: &EngineEvent);

    /// Orders on `local_symbol` that can still trade.
    fn all_active_orders(&self, local_symbol: &str) -> Vec<OrderData>;

    fn all_orders(&self) -> Vec<OrderData>;

    fn all_positions(&self) -> Vec<PositionData>;

    fn all_trades(&self) -> Vec<TradeData>;
}

/// In-process recorder fed by the event stream.
#[derive(Debug, Default)]
pub struct LocalRecorder {
    /// Orders in first-seen order.
    orders: Vec<OrderData>,
    /// `local_order_id` -> index into `orders`.
    order_index: HashMap<String, usize>,
    trades: Vec<TradeData>,
    positions: BTreeMap<(String, Direction), PositionData>,
}

impl LocalRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn upsert_order(&mut self, order: &OrderData) {
        match self.order_index.get(&order.local_order_id) {
            Some(&index) => self.orders[index] = order.clone(),
            None => {
                self.order_index
                    .insert(order.local_order_id.clone(), self.orders.len());
                self.orders.push(order.clone());
            }
        }
    }
}

impl Recorder for LocalRecorder {
    fn record(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Order(order) => self.upsert_order(order),
            EngineEvent::Trade(trade) => self.trades.push(trade.clone()),
            EngineEvent::Position(position) => {
                self.positions.insert(
                    (position.local_symbol.clone(), position.direction),
                    position.clone(),
                );
            }
            _ => {}
        }
    }

    fn all_active_orders(&self, local_symbol: &str) -> Vec<OrderData> {
        self.orders
            .iter()
            .filter(|o| o.local_symbol == local_symbol && o.is_active())
            .cloned()
            .collect()
    }

    fn all_orders(&self) -> Vec<OrderData> {
        self.orders.clone()
    }

    fn all_positions(&self) -> Vec<PositionData> {
        self.positions.values().cloned().collect()
    }

    fn all_trades(&self) -> Vec<TradeData> {
        self.trades.clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{Offset, OrderStatus};

    pub(crate) fn order(id: &str, symbol: &str, status: OrderStatus) -> OrderData {
        OrderData {
            symbol: symbol.to_string(),
            exchange: "SHFE".to_string(),
            local_symbol: format!("{symbol}.SHFE"),
            order_id: id.to_string(),
            local_order_id: format!("ctp.{id}"),
            direction: Direction::Long,
            offset: Offset::Open,
            price: 3650.0,
            volume: 1.0,
            traded: 0.0,
            status,
            time: "09:30:00".to_string(),
        }
    }

    pub(crate) fn position(symbol: &str, direction: Direction, volume: f64) -> PositionData {
        PositionData {
            symbol: symbol.to_string(),
            exchange: "SHFE".to_string(),
            local_symbol: format!("{symbol}.SHFE"),
            direction,
            volume,
            frozen: 0.0,
            price: 3650.0,
            pnl: 0.0,
            yd_volume: 0.0,
        }
    }

    #[test]
    fn test_order_update_replaces_in_place() {
        let mut recorder = LocalRecorder::new();
        recorder.record(&EngineEvent::Order(order("1", "rb2405", OrderStatus::NotTraded)));
        recorder.record(&EngineEvent::Order(order("2", "rb2405", OrderStatus::NotTraded)));
        recorder.record(&EngineEvent::Order(order("1", "rb2405", OrderStatus::AllTraded)));

        let orders = recorder.all_orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id, "1");
        assert_eq!(orders[0].status, OrderStatus::AllTraded);
    }

    #[test]
    fn test_active_orders_filter_by_symbol_and_status() {
        let mut recorder = LocalRecorder::new();
        recorder.record(&EngineEvent::Order(order("1", "rb2405", OrderStatus::NotTraded)));
        recorder.record(&EngineEvent::Order(order("2", "rb2405", OrderStatus::Cancelled)));
        recorder.record(&EngineEvent::Order(order("3", "ag2406", OrderStatus::PartTraded)));

        let active = recorder.all_active_orders("rb2405.SHFE");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].order_id, "1");
    }

    #[test]
    fn test_positions_keyed_by_symbol_and_direction() {
        let mut recorder = LocalRecorder::new();
        recorder.record(&EngineEvent::Position(position("rb2405", Direction::Long, 1.0)));
        recorder.record(&EngineEvent::Position(position("rb2405", Direction::Short, 2.0)));
        recorder.record(&EngineEvent::Position(position("rb2405", Direction::Long, 3.0)));

        let positions = recorder.all_positions();
        assert_eq!(positions.len(), 2);
        let long = positions
            .iter()
            .find(|p| p.direction == Direction::Long)
            .unwrap();
        assert_eq!(long.volume, 3.0);
    }
}
