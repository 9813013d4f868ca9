//! Shared fixtures for integration tests
//!
//! `StatsFixture` renders casadm-style `--stats` CSV and `FakeSource` replays
//! canned casadm output through the real decoders, so tests exercise the same
//! parsing path as production without a casadm binary.

#![allow(dead_code)]

use async_trait::async_trait;
use cas_exporter::casadm::types::stats_columns;
use cas_exporter::casadm::{
    parse_cache_list, parse_cache_stats, Cache, CacheSource, CacheStats, Operation, StatValue,
};
use cas_exporter::error::{ExporterError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub const LIST_HEADER: &str = "type,id,disk,status,write policy,device";

/// Build `--list-caches` output from `(id, device)` pairs
pub fn list_csv(caches: &[(u16, &str)]) -> String {
    let mut out = format!("{}\n", LIST_HEADER);
    for (id, device) in caches {
        out.push_str(&format!("cache,{},/dev/nvme0n1,Running,wt,{}\n", id, device));
    }
    out
}

/// A `--stats` row with one value pair per statistic
#[derive(Debug, Clone)]
pub struct StatsFixture {
    pub id: u16,
    pub values: Vec<StatValue>,
}

impl StatsFixture {
    /// Distinct, predictable values: statistic `i` gets count `1000 * (i + 1) + id`
    /// and percent `i + 0.25`.
    pub fn new(id: u16) -> Self {
        let values = (0..stats_columns::STATS.len())
            .map(|i| StatValue::new((1000 * (i + 1)) as f64 + id as f64, i as f64 + 0.25))
            .collect();
        Self { id, values }
    }

    /// Override statistic `index` (position in `stats_columns::STATS`)
    pub fn with(mut self, index: usize, value: StatValue) -> Self {
        self.values[index] = value;
        self
    }

    /// Canonical header names in casadm order
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![
            "Cache Id".to_string(),
            "Cache Size [4KiB Blocks]".to_string(),
            "Cache Device".to_string(),
            "Write Policy".to_string(),
            "Status".to_string(),
        ];
        for stat in stats_columns::STATS {
            header.push(stat.count.name().to_string());
            header.push(stat.percent.name().to_string());
        }
        header
    }

    pub fn cells(&self) -> Vec<String> {
        let mut cells = vec![
            self.id.to_string(),
            "2621440".to_string(),
            "/dev/nvme0n1".to_string(),
            "wt".to_string(),
            "Running".to_string(),
        ];
        for value in &self.values {
            cells.push(value.count.to_string());
            cells.push(value.percent.to_string());
        }
        cells
    }

    pub fn to_csv(&self) -> String {
        format!("{}\n{}\n", self.header().join(","), self.cells().join(","))
    }

    /// Same data with the columns in reverse order
    pub fn to_reversed_csv(&self) -> String {
        let mut header = self.header();
        let mut cells = self.cells();
        header.reverse();
        cells.reverse();
        format!("{}\n{}\n", header.join(","), cells.join(","))
    }
}

fn unavailable(operation: Operation) -> ExporterError {
    ExporterError::Spawn {
        operation,
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "casadm not available"),
    }
}

/// In-memory `CacheSource` replaying canned casadm output
#[derive(Default)]
pub struct FakeSource {
    list: Mutex<Option<String>>,
    stats: Mutex<HashMap<u16, String>>,
    sampled: Mutex<Vec<u16>>,
    list_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(list: String) -> Self {
        Self {
            list: Mutex::new(Some(list)),
            ..Default::default()
        }
    }

    /// A source whose listing always fails
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_stats(self, id: u16, csv: String) -> Self {
        self.stats.lock().unwrap().insert(id, csv);
        self
    }

    pub fn set_list(&self, list: Option<String>) {
        *self.list.lock().unwrap() = list;
    }

    pub fn remove_stats(&self, id: u16) {
        self.stats.lock().unwrap().remove(&id);
    }

    /// IDs passed to `cache_stats`, in call order
    pub fn sampled(&self) -> Vec<u16> {
        self.sampled.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheSource for FakeSource {
    async fn list_caches(&self, _token: &CancellationToken) -> Result<Vec<Cache>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let operation = Operation::ListCaches;
        let output = self
            .list
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| unavailable(operation))?;
        parse_cache_list(&output).map_err(|source| ExporterError::Decode {
            operation,
            source,
            output,
        })
    }

    async fn cache_stats(&self, _token: &CancellationToken, id: u16) -> Result<CacheStats> {
        self.sampled.lock().unwrap().push(id);
        let operation = Operation::CacheStats(id);
        let output = self
            .stats
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| unavailable(operation))?;
        match parse_cache_stats(&output) {
            Ok(Some(stats)) => Ok(stats),
            Ok(None) => Err(ExporterError::Empty { operation, output }),
            Err(source) => Err(ExporterError::Decode {
                operation,
                source,
                output,
            }),
        }
    }
}
