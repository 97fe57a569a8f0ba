#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashSet},
    io::Write,
    path::Path,
    sync::Mutex,
};

use async_trait::async_trait;
use ohlc_ingestor::{
    Bar, BarSeries, Interval, OhlcRequest, OhlcSource, ProviderError,
    io::sink::{DataSink, SinkError},
    providers::ApiSnafu,
};

pub const M: Interval = Interval::MINUTE;

/// Minute-aligned base so fixtures stay on the epoch grid.
pub const T0: i64 = 1_736_150_400;

pub fn bar(ts: i64, close: f64) -> Bar {
    Bar::new(ts, close, close + 1.0, close - 1.0, close, 2.0)
}

pub fn minutes(from: i64, count: i64) -> Vec<i64> {
    (0..count).map(|n| from + n * 60).collect()
}

/// A fake exchange: answers each request like the real API, honoring
/// `start` and `limit`, from a fixed set of bars.
pub struct MarketSource {
    bars: BTreeMap<i64, Bar>,
    page_cap: Option<usize>,
    fail_on_call: HashSet<usize>,
    seen: Mutex<Vec<OhlcRequest>>,
}

impl MarketSource {
    pub fn new(bars: impl IntoIterator<Item = Bar>) -> Self {
        Self {
            bars: bars.into_iter().map(|b| (b.timestamp, b)).collect(),
            page_cap: None,
            fail_on_call: HashSet::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Every stamp in `stamps`, close = index.
    pub fn with_stamps(stamps: &[i64]) -> Self {
        Self::new(stamps.iter().enumerate().map(|(i, &t)| bar(t, i as f64)))
    }

    /// Return at most `cap` rows per call regardless of `limit`.
    pub fn page_cap(mut self, cap: usize) -> Self {
        self.page_cap = Some(cap);
        self
    }

    /// Make the n-th call (0-based) fail.
    pub fn fail_on(mut self, call: usize) -> Self {
        self.fail_on_call.insert(call);
        self
    }

    pub fn requests(&self) -> Vec<OhlcRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl OhlcSource for MarketSource {
    async fn fetch_bars(&self, request: &OhlcRequest) -> Result<Vec<Bar>, ProviderError> {
        let call = {
            let mut seen = self.seen.lock().unwrap();
            seen.push(request.clone());
            seen.len() - 1
        };
        if self.fail_on_call.contains(&call) {
            return Err(ApiSnafu {
                message: "HTTP 503: unavailable",
            }
            .build());
        }
        let take = self
            .page_cap
            .map_or(request.limit as usize, |cap| cap.min(request.limit as usize));
        // like the live API, limit wins over end
        Ok(self
            .bars
            .range(request.start..)
            .map(|(_, b)| *b)
            .take(take)
            .collect())
    }
}

/// Keeps the last written series in memory.
#[derive(Default)]
pub struct MemorySink {
    pub written: Mutex<Vec<BarSeries>>,
}

impl MemorySink {
    pub fn writes(&self) -> usize {
        self.written.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<BarSeries> {
        self.written.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl DataSink for MemorySink {
    type Output = usize;

    async fn write(&self, series: &BarSeries) -> Result<usize, SinkError> {
        self.written.lock().unwrap().push(series.clone());
        Ok(series.len())
    }
}

/// Writes `lines` (header first) to `path`.
pub fn write_csv(path: &Path, lines: &[&str]) {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).unwrap();
    }
    let mut f = std::fs::File::create(path).unwrap();
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
}

/// Canonical CSV for `stamps`, close = 100 + index.
pub fn write_canonical(path: &Path, stamps: &[i64]) {
    let mut lines = vec!["timestamp,open,high,low,close,volume".to_string()];
    for (i, t) in stamps.iter().enumerate() {
        let c = 100.0 + i as f64;
        lines.push(format!("{t},{c},{c},{c},{c},1.5"));
    }
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_csv(path, &refs);
}
