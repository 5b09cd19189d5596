#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use stock_etl::{
    EtlConfig,
    io::{
        ArtifactSink, ObjectStore,
        object_store::{ObjectStoreError, PutSnafu},
    },
    models::{
        dataset::RunTimestamp,
        raw_frame::{ColumnHeader, RawFrame, RawValue},
        window::{HistoryRange, HistoryRequest},
    },
    pipeline::Pipeline,
    providers::{ApiSnafu, DataProvider, ProviderError},
};

pub const RUN_STAMP: &str = "2025-10-01_08-00-00";

pub fn run_stamp() -> RunTimestamp {
    RUN_STAMP.parse().unwrap()
}

/// What the fake answers for one (symbol, range kind).
#[derive(Clone)]
pub enum Reply {
    /// `n` consecutive daily bars from 2025-09-01.
    Bars(usize),
    Empty,
    Fail,
    /// Never answers.
    Hang,
}

/// In-memory provider shaped like the Yahoo chart adapter: a flat `Date`
/// column and `(Field, SYMBOL)` price columns.
#[derive(Default)]
pub struct FakeProvider {
    window: HashMap<String, Reply>,
    full: HashMap<String, Reply>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<HistoryRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(mut self, symbol: &str, reply: Reply) -> Self {
        self.window.insert(symbol.to_string(), reply);
        self
    }

    pub fn full_history(mut self, symbol: &str, reply: Reply) -> Self {
        self.full.insert(symbol.to_string(), reply);
        self
    }

    pub fn delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<HistoryRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn answer(&self, request: &HistoryRequest) -> Result<RawFrame, ProviderError> {
        if let Some(delay) = self.delays.get(&request.symbol) {
            tokio::time::sleep(*delay).await;
        }
        let replies = match request.range {
            HistoryRange::Trailing { .. } => &self.window,
            HistoryRange::Max => &self.full,
        };
        match replies.get(&request.symbol).cloned().unwrap_or(Reply::Empty) {
            Reply::Bars(n) => Ok(frame(&request.symbol, n)),
            Reply::Empty => Ok(RawFrame::default()),
            Reply::Fail => ApiSnafu {
                message: format!("no data for {}", request.symbol),
            }
            .fail(),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl DataProvider for FakeProvider {
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<RawFrame, ProviderError> {
        self.calls.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.answer(request).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn frame(symbol: &str, n: usize) -> RawFrame {
    let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let mut columns = vec![ColumnHeader::flat("Date")];
    columns.extend(
        ["Open", "High", "Low", "Close", "Volume"]
            .into_iter()
            .map(|field| ColumnHeader::nested([field, symbol])),
    );
    let rows = (0..n)
        .map(|i| {
            let base = 100.0 + i as f64;
            vec![
                RawValue::Date(start.checked_add_days(Days::new(i as u64)).unwrap()),
                RawValue::Number(base),
                RawValue::Number(base + 2.0),
                RawValue::Number(base - 1.0),
                RawValue::Number(base + 1.0),
                RawValue::Number(1_000.0 + i as f64),
            ]
        })
        .collect();
    RawFrame::new(columns, rows).unwrap()
}

/// Records uploads with the file contents seen at upload time.
#[derive(Default)]
pub struct FakeObjectStore {
    fail: bool,
    puts: Mutex<Vec<(String, String, String)>>,
}

impl FakeObjectStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn puts(&self) -> Vec<(String, String, String)> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> Result<(), ObjectStoreError> {
        if self.fail {
            return PutSnafu {
                bucket,
                key,
                message: "AccessDenied",
            }
            .fail();
        }
        let body = std::fs::read_to_string(path).unwrap();
        self.puts
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), body));
        Ok(())
    }
}

pub fn config(symbols: &[&str], output_dir: &Path) -> EtlConfig {
    EtlConfig {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        include_extrema: false,
        output_dir: output_dir.to_path_buf(),
        ..EtlConfig::default()
    }
}

pub fn local_pipeline(config: &EtlConfig, provider: Arc<FakeProvider>) -> Pipeline {
    Pipeline::new(config, provider, Arc::new(ArtifactSink::local(&config.output_dir)))
}

pub fn artifact_path(dir: &Path) -> PathBuf {
    dir.join(format!("stocks_{RUN_STAMP}.csv"))
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
