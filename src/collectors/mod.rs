//! Metrics Collectors
//!
//! This module turns one casadm statistics sample into metric points. There is
//! one collector per statistic category, each mapping its part of
//! [`CacheStats`] onto the fixed subcategory names of [`Category`].
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - Accept a `CollectionContext` containing shared state
//! - Query the cache source
//! - Update metrics through `observe_count` / `observe_percent`
//! - Return `CollectionStatus`
//!
//! # Error Handling
//!
//! A failed sample is non-fatal: it is logged as a warning and reported as
//! `CollectionStatus::Failed`, so the extraction loop can move on to the next
//! cache.

use crate::casadm::{Cache, CacheSource, CacheStats, StatValue};
use crate::metrics::{Category, MetricsCollector};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub mod blocks;
pub mod errors;
pub mod requests;
pub mod usage;

pub use blocks::collect_block_metrics;
pub use errors::collect_error_metrics;
pub use requests::collect_request_metrics;
pub use usage::collect_usage_metrics;

/// Shared context passed to all collectors
#[derive(Clone, Copy)]
pub struct CollectionContext<'a> {
    /// Where listings and samples come from
    pub source: &'a dyn CacheSource,
    /// Metrics collector for updating Prometheus metrics
    pub metrics: &'a MetricsCollector,
    /// Cancellation for in-flight casadm calls
    pub token: &'a CancellationToken,
}

/// Status of a metrics collection operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Metrics were successfully collected and updated
    Success,
    /// Collection failed but is non-fatal (already logged as warning)
    Failed,
}

/// One statistic as it is exposed: a subcategory and its value pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatPoint {
    pub subcategory: &'static str,
    pub value: StatValue,
}

impl StatPoint {
    pub fn new(subcategory: &'static str, value: StatValue) -> Self {
        Self { subcategory, value }
    }
}

/// Push a category's points into both gauges
pub fn record_points(
    metrics: &MetricsCollector,
    cache: &Cache,
    category: Category,
    points: &[StatPoint],
) {
    for point in points {
        metrics.observe_count(cache, category, point.subcategory, point.value.count);
        metrics.observe_percent(cache, category, point.subcategory, point.value.percent);
    }
}

/// Record every category of an already sampled cache
pub fn record_cache_stats(metrics: &MetricsCollector, cache: &Cache, stats: &CacheStats) {
    collect_usage_metrics(metrics, cache, &stats.usage);
    collect_request_metrics(metrics, cache, &stats.requests);
    collect_block_metrics(metrics, cache, &stats.blocks);
    collect_error_metrics(metrics, cache, &stats.errors);
}

/// Sample one cache and record all of its statistics
pub async fn collect_cache_metrics(ctx: &CollectionContext<'_>, cache: &Cache) -> CollectionStatus {
    match ctx.source.cache_stats(ctx.token, cache.id).await {
        Ok(stats) => {
            record_cache_stats(ctx.metrics, cache, &stats);
            debug!("Updated metrics for cache {} ({})", cache.id, cache.device);
            CollectionStatus::Success
        }
        Err(e) => {
            warn!("Failed to get stats for cache {}: {}", cache.id, e);
            CollectionStatus::Failed
        }
    }
}
