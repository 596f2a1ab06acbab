//! Per-symbol candle snapshot persisted as JSON.
//!
//! Every tick is folded into a one-minute candle series and the whole
//! snapshot is rewritten to `{dir}/{symbol}.json`:
//!
//! ```text
//! {"success": true,
//!  "data": {"lines":  [[ts_ms, open, high, low, close, volume], ...],
//!           "depths": {"asks": [[price, volume]], "bids": [[price, volume]]}}}
//! ```
//!
//! History is loaded once per symbol, on its first tick. A missing or
//! unreadable file just means no history.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{TickData, epoch_millis};

const MINUTE_MS: i64 = 60_000;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("symbol {0:?} is not a plain file name")]
    InvalidSymbol(String),
}

/// True when `symbol` can name a snapshot file inside the snapshot dir.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol != "."
        && symbol != ".."
        && !symbol.chars().any(|c| matches!(c, '/' | '\\' | ':' | '\0'))
}

/// `[timestamp_ms, open, high, low, close, volume]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle(pub i64, pub f64, pub f64, pub f64, pub f64, pub f64);

impl Candle {
    fn opened_by(minute: i64, price: f64, volume: f64) -> Self {
        Candle(minute, price, price, price, price, volume)
    }

    pub fn timestamp(&self) -> i64 {
        self.0
    }

    pub fn close(&self) -> f64 {
        self.4
    }

    pub fn volume(&self) -> f64 {
        self.5
    }

    fn fold(&mut self, price: f64, volume: f64) {
        self.2 = self.2.max(price);
        self.3 = self.3.min(price);
        self.4 = price;
        self.5 += volume;
    }
}

/// Level-1 book as `[[price, volume]]` per side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Depths {
    pub asks: Vec<[f64; 2]>,
    pub bids: Vec<[f64; 2]>,
}

impl Depths {
    pub fn level_one(tick: &TickData) -> Self {
        Self {
            asks: vec![[tick.ask_price_1, tick.ask_volume_1]],
            bids: vec![[tick.bid_price_1, tick.bid_volume_1]],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    pub lines: Vec<Candle>,
    pub depths: Depths,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub success: bool,
    pub data: SnapshotData,
}

/// Candle history and snapshot files for every symbol seen so far.
///
/// In-memory series are keyed by `local_symbol`; files are named after
/// `symbol`.
#[derive(Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
    loaded: HashSet<String>,
    lines: HashMap<String, Vec<Candle>>,
    last_volume: HashMap<String, f64>,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            loaded: HashSet::new(),
            lines: HashMap::new(),
            last_volume: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.json"))
    }

    /// Candles held for `local_symbol`.
    pub fn lines(&self, local_symbol: &str) -> &[Candle] {
        self.lines
            .get(local_symbol)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Fold `tick` into its symbol's series and rewrite the snapshot file.
    pub async fn apply_tick(&mut self, tick: &TickData) -> Result<Snapshot, SnapshotError> {
        if !is_valid_symbol(&tick.symbol) {
            return Err(SnapshotError::InvalidSymbol(tick.symbol.clone()));
        }

        if self.loaded.insert(tick.local_symbol.clone()) {
            let history = load_history(&self.path_for(&tick.symbol)).await;
            debug!(
                symbol = %tick.local_symbol,
                candles = history.len(),
                "Loaded snapshot history"
            );
            self.lines
                .entry(tick.local_symbol.clone())
                .or_default()
                .extend(history);
        }

        let volume = self.volume_delta(tick);
        let series = self.lines.entry(tick.local_symbol.clone()).or_default();
        fold_tick(series, epoch_millis(&tick.datetime), tick.last_price, volume);

        let snapshot = Snapshot {
            success: true,
            data: SnapshotData {
                lines: series.clone(),
                depths: Depths::level_one(tick),
            },
        };

        self.write(&tick.symbol, &snapshot).await?;
        Ok(snapshot)
    }

    /// Volume traded since the previous tick; 0 for the first tick and when
    /// the cumulative counter goes backwards.
    fn volume_delta(&mut self, tick: &TickData) -> f64 {
        let previous = self
            .last_volume
            .insert(tick.local_symbol.clone(), tick.volume);
        match previous {
            Some(previous) => (tick.volume - previous).max(0.0),
            None => 0.0,
        }
    }

    /// Write to a sibling temp file, then rename over the target.
    async fn write(&self, symbol: &str, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let path = self.path_for(symbol);
        let tmp = self.dir.join(format!(".{symbol}.json.tmp"));
        let body = serde_json::to_vec(snapshot)?;
        let write_err = |source| SnapshotError::Write {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;
        tokio::fs::write(&tmp, &body).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(write_err)?;
        Ok(())
    }
}

/// Fold one trade print into a one-minute series.
fn fold_tick(series: &mut Vec<Candle>, timestamp_ms: i64, price: f64, volume: f64) {
    let minute = timestamp_ms - timestamp_ms.rem_euclid(MINUTE_MS);
    match series.last_mut() {
        Some(last) if last.timestamp() == minute => last.fold(price, volume),
        Some(last) if last.timestamp() > minute => {}
        _ => series.push(Candle::opened_by(minute, price, volume)),
    }
}

/// Candle history from an existing snapshot file.
async fn load_history(path: &Path) -> Vec<Candle> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable snapshot, starting empty");
            return Vec::new();
        }
    };

    let parsed: Value = match serde_json::from_slice(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Malformed snapshot, starting empty");
            return Vec::new();
        }
    };

    let Some(lines) = parsed.pointer("/data/lines").filter(|l| l.is_array()) else {
        warn!(path = %path.display(), "Snapshot has no candle list, starting empty");
        return Vec::new();
    };

    match serde_json::from_value(lines.clone()) {
        Ok(candles) => candles,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Bad candle in snapshot, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    pub(crate) fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    pub(crate) fn tick(datetime: NaiveDateTime, price: f64, volume: f64) -> TickData {
        TickData {
            symbol: "rb2405".to_string(),
            exchange: "SHFE".to_string(),
            local_symbol: "rb2405.SHFE".to_string(),
            datetime,
            name: String::new(),
            volume,
            open_interest: 0.0,
            last_price: price,
            limit_up: 0.0,
            limit_down: 0.0,
            open_price: 0.0,
            high_price: 0.0,
            low_price: 0.0,
            pre_close: 0.0,
            bid_price_1: price - 1.0,
            bid_volume_1: 3.0,
            ask_price_1: price + 1.0,
            ask_volume_1: 4.0,
        }
    }

    #[tokio::test]
    async fn test_first_tick_without_history_gives_single_candle() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::new(dir.path());
        let t = tick(at(9, 30, 15), 3650.0, 100.0);

        let snapshot = store.apply_tick(&t).await.unwrap();

        let minute = epoch_millis(&at(9, 30, 0));
        assert!(snapshot.success);
        assert_eq!(
            snapshot.data.lines,
            vec![Candle(minute, 3650.0, 3650.0, 3650.0, 3650.0, 0.0)]
        );
        assert_eq!(snapshot.data.depths.asks, vec![[3651.0, 4.0]]);
        assert_eq!(snapshot.data.depths.bids, vec![[3649.0, 3.0]]);

        let on_disk: Snapshot =
            serde_json::from_slice(&std::fs::read(store.path_for("rb2405")).unwrap()).unwrap();
        assert_eq!(on_disk, snapshot);
    }

    #[tokio::test]
    async fn test_ticks_fold_into_minute_candles() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::new(dir.path());

        store.apply_tick(&tick(at(9, 30, 0), 10.0, 100.0)).await.unwrap();
        store.apply_tick(&tick(at(9, 30, 20), 12.0, 105.0)).await.unwrap();
        store.apply_tick(&tick(at(9, 30, 40), 9.0, 107.0)).await.unwrap();
        let snapshot = store.apply_tick(&tick(at(9, 31, 5), 11.0, 110.0)).await.unwrap();

        let lines = snapshot.data.lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], Candle(epoch_millis(&at(9, 30, 0)), 10.0, 12.0, 9.0, 9.0, 7.0));
        assert_eq!(lines[1], Candle(epoch_millis(&at(9, 31, 0)), 11.0, 11.0, 11.0, 11.0, 3.0));
    }

    #[tokio::test]
    async fn test_stale_tick_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::new(dir.path());

        store.apply_tick(&tick(at(9, 31, 0), 10.0, 100.0)).await.unwrap();
        let snapshot = store.apply_tick(&tick(at(9, 29, 0), 99.0, 101.0)).await.unwrap();

        assert_eq!(snapshot.data.lines.len(), 1);
        assert_eq!(snapshot.data.lines[0].close(), 10.0);
    }

    #[tokio::test]
    async fn test_history_loaded_once_from_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let old = epoch_millis(&at(9, 0, 0));
        let body = serde_json::json!({
            "success": true,
            "data": {"lines": [[old, 1.0, 2.0, 0.5, 1.5, 9.0]], "depths": {"asks": [], "bids": []}}
        });
        std::fs::write(dir.path().join("rb2405.json"), body.to_string()).unwrap();

        let mut store = SnapshotStore::new(dir.path());
        store.apply_tick(&tick(at(9, 30, 0), 10.0, 100.0)).await.unwrap();
        let snapshot = store.apply_tick(&tick(at(9, 31, 0), 11.0, 100.0)).await.unwrap();

        assert_eq!(snapshot.data.lines.len(), 3);
        assert_eq!(snapshot.data.lines[0].timestamp(), old);
        assert_eq!(store.lines("rb2405.SHFE").len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_or_wrong_shape_file_gives_no_history() {
        for body in ["{not json", r#"{"success": true, "data": {"lines": 5}}"#, "[]"] {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("rb2405.json"), body).unwrap();

            let mut store = SnapshotStore::new(dir.path());
            let snapshot = store.apply_tick(&tick(at(9, 30, 0), 10.0, 1.0)).await.unwrap();
            assert_eq!(snapshot.data.lines.len(), 1, "body {body:?}");
        }
    }

    #[tokio::test]
    async fn test_volume_counter_reset_counts_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::new(dir.path());

        store.apply_tick(&tick(at(9, 30, 0), 10.0, 500.0)).await.unwrap();
        let snapshot = store.apply_tick(&tick(at(9, 30, 10), 10.0, 3.0)).await.unwrap();

        assert_eq!(snapshot.data.lines[0].volume(), 0.0);
    }

    #[tokio::test]
    async fn test_symbol_outside_snapshot_dir_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("json");
        let mut store = SnapshotStore::new(&dir);

        let escape = format!("/../../../../../../../../..{}/escaped", root.path().display());
        for symbol in [escape.as_str(), "../escaped", "..", "", "a\\b", "C:evil"] {
            let mut t = tick(at(9, 30, 0), 10.0, 1.0);
            t.symbol = symbol.to_string();
            let result = store.apply_tick(&t).await;
            assert!(
                matches!(result, Err(SnapshotError::InvalidSymbol(_))),
                "symbol {symbol:?}"
            );
        }

        assert!(!root.path().join("escaped.json").exists());
        assert!(store.lines("rb2405.SHFE").is_empty());
    }

    #[test]
    fn test_valid_symbols() {
        assert!(is_valid_symbol("rb2405"));
        assert!(is_valid_symbol("IF2406.CFFEX"));
        assert!(!is_valid_symbol("x/y"));
        assert!(!is_valid_symbol("."));
    }

    #[test]
    fn test_candle_serializes_as_array() {
        let json = serde_json::to_value(Candle(1, 2.0, 3.0, 1.0, 2.5, 7.0)).unwrap();
        assert_eq!(json, serde_json::json!([1, 2.0, 3.0, 1.0, 2.5, 7.0]));
    }
}
