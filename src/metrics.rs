//! Prometheus Metrics Definitions
//!
//! This module defines the metric model the exporter serves.
//!
//! # Metrics
//!
//! - `ocf_count` - Absolute value of a cache statistic (blocks or requests)
//!   - Labels: device, id, category, subcategory
//! - `ocf_percentage` - Percentage value of a cache statistic
//!   - Labels: device, id, category, subcategory
//! - `ocf_duration_seconds` - Duration of the last extraction cycle
//! - `ocf_success` - Whether the last extraction cycle succeeded (1/0)
//! - `ocf_exporter_build_info` - Always 1, labeled with the exporter version
//!
//! # Categories
//!
//! Every `(category, subcategory)` pair comes from the fixed table returned by
//! [`Category::subcategories`]. Observations outside that table are dropped.
//!
//! # Lifecycle
//!
//! Series are created on first observation and never removed. A cache that
//! disappears keeps exposing its last values until the process restarts.

use crate::casadm::Cache;
use crate::error::Result;
use prometheus::{Encoder, Gauge, GaugeVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::warn;

const NAMESPACE: &str = "ocf";
const POINT_LABELS: &[&str] = &["device", "id", "category", "subcategory"];

/// Statistic group, exposed as the `category` label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Usage,
    Requests,
    Blocks,
    Errors,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Usage,
        Category::Requests,
        Category::Blocks,
        Category::Errors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Usage => "usage",
            Category::Requests => "requests",
            Category::Blocks => "blocks",
            Category::Errors => "errors",
        }
    }

    pub fn subcategories(&self) -> &'static [&'static str] {
        match self {
            Category::Usage => &["occupancy", "free", "clean", "dirty"],
            Category::Requests => &[
                "rd_hits",
                "rd_partial_misses",
                "rd_full_misses",
                "rd_total",
                "wr_hits",
                "wr_partial_misses",
                "wr_full_misses",
                "wr_total",
                "rd_pt",
                "wr_pt",
                "serviced",
                "total",
            ],
            Category::Blocks => &[
                "core_volume_rd",
                "core_volume_wr",
                "core_volume_total",
                "cache_volume_rd",
                "cache_volume_wr",
                "cache_volume_total",
                "volume_rd",
                "volume_wr",
                "volume_total",
            ],
            Category::Errors => &[
                "cache_volume_rd",
                "cache_volume_wr",
                "cache_volume_total",
                "core_volume_rd",
                "core_volume_wr",
                "core_volume_total",
                "total",
            ],
        }
    }

    /// The interned subcategory name, if it belongs to this category
    pub fn subcategory(&self, name: &str) -> Option<&'static str> {
        self.subcategories().iter().copied().find(|s| *s == name)
    }

    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.as_str() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two parallel gauges a point lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PointKind {
    Count,
    Percentage,
}

/// One exposed series and its current value
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub kind: PointKind,
    pub id: u16,
    pub device: String,
    pub category: Category,
    pub subcategory: &'static str,
    pub value: f64,
}

/// Result of the most recent extraction cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleOutcome {
    pub duration_seconds: f64,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SeriesKey {
    kind: PointKind,
    id: u16,
    device: String,
    category: Category,
    subcategory: &'static str,
}

impl SeriesKey {
    fn labels(&self) -> [String; 4] {
        [
            self.device.clone(),
            self.id.to_string(),
            self.category.as_str().to_string(),
            self.subcategory.to_string(),
        ]
    }
}

/// Metrics collector for Open CAS statistics
///
/// Cloning is cheap and every clone shares the same registry, so the
/// extraction loop and the HTTP server each hold their own handle.
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    pub count: Arc<GaugeVec>,
    pub percentage: Arc<GaugeVec>,
    pub duration_seconds: Arc<Gauge>,
    pub success: Arc<Gauge>,
    pub build_info: Arc<IntGaugeVec>,

    series: Arc<Mutex<BTreeSet<SeriesKey>>>,
}

impl MetricsCollector {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let count = GaugeVec::new(
            Opts::new("count", "OCF count value").namespace(NAMESPACE),
            POINT_LABELS,
        )?;

        let percentage = GaugeVec::new(
            Opts::new("percentage", "OCF percentage value").namespace(NAMESPACE),
            POINT_LABELS,
        )?;

        let duration_seconds = Gauge::with_opts(
            Opts::new("duration_seconds", "OCF stats extraction duration").namespace(NAMESPACE),
        )?;

        let success = Gauge::with_opts(
            Opts::new("success", "Whether OCF stats extraction has succeeded")
                .namespace(NAMESPACE),
        )?;

        let build_info = IntGaugeVec::new(
            Opts::new("exporter_build_info", "Exporter build information").namespace(NAMESPACE),
            &["version"],
        )?;
        build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1);

        registry.register(Box::new(count.clone()))?;
        registry.register(Box::new(percentage.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(success.clone()))?;
        registry.register(Box::new(build_info.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            count: Arc::new(count),
            percentage: Arc::new(percentage),
            duration_seconds: Arc::new(duration_seconds),
            success: Arc::new(success),
            build_info: Arc::new(build_info),
            series: Arc::new(Mutex::new(BTreeSet::new())),
        })
    }

    /// Set the absolute value of one statistic; the last write wins
    pub fn observe_count(&self, cache: &Cache, category: Category, subcategory: &str, value: f64) {
        self.observe(PointKind::Count, cache, category, subcategory, value);
    }

    /// Set the percentage value of one statistic; the last write wins
    pub fn observe_percent(
        &self,
        cache: &Cache,
        category: Category,
        subcategory: &str,
        value: f64,
    ) {
        self.observe(PointKind::Percentage, cache, category, subcategory, value);
    }

    /// Record how long the last cycle took and whether it succeeded
    pub fn observe_cycle(&self, duration: Duration, success: bool) {
        self.duration_seconds.set(duration.as_secs_f64());
        self.success.set(if success { 1.0 } else { 0.0 });
    }

    pub fn last_cycle(&self) -> CycleOutcome {
        CycleOutcome {
            duration_seconds: self.duration_seconds.get(),
            success: self.success.get() > 0.0,
        }
    }

    fn observe(
        &self,
        kind: PointKind,
        cache: &Cache,
        category: Category,
        subcategory: &str,
        value: f64,
    ) {
        let Some(subcategory) = category.subcategory(subcategory) else {
            warn!(
                "Ignoring unknown subcategory '{}' for category '{}'",
                subcategory, category
            );
            return;
        };

        let key = SeriesKey {
            kind,
            id: cache.id,
            device: cache.device.clone(),
            category,
            subcategory,
        };
        let labels = key.labels();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();

        self.gauge(kind).with_label_values(&labels).set(value);
        self.series
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
    }

    fn gauge(&self, kind: PointKind) -> &GaugeVec {
        match kind {
            PointKind::Count => &self.count,
            PointKind::Percentage => &self.percentage,
        }
    }

    /// Every point observed so far, with its current value
    pub fn points(&self) -> Vec<MetricPoint> {
        let keys: Vec<SeriesKey> = self
            .series
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();

        keys.into_iter()
            .map(|key| {
                let labels = key.labels();
                let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
                let value = self.gauge(key.kind).with_label_values(&labels).get();
                MetricPoint {
                    kind: key.kind,
                    id: key.id,
                    device: key.device,
                    category: key.category,
                    subcategory: key.subcategory,
                    value,
                }
            })
            .collect()
    }

    /// Current value of one point, if it has been observed
    pub fn value(
        &self,
        kind: PointKind,
        id: u16,
        category: Category,
        subcategory: &str,
    ) -> Option<f64> {
        self.points()
            .into_iter()
            .find(|p| {
                p.kind == kind
                    && p.id == id
                    && p.category == category
                    && p.subcategory == subcategory
            })
            .map(|p| p.value)
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics collector")
    }
}
