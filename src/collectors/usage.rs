//! Usage Metrics Collector
//!
//! # Metrics Produced
//! - `ocf_count{category="usage"}` - occupancy/free/clean/dirty in 4KiB blocks
//! - `ocf_percentage{category="usage"}` - the same, as a share of the cache

use super::{record_points, StatPoint};
use crate::casadm::types::UsageStats;
use crate::casadm::Cache;
use crate::metrics::{Category, MetricsCollector};

pub fn usage_points(usage: &UsageStats) -> [StatPoint; 4] {
    [
        StatPoint::new("occupancy", usage.occupancy),
        StatPoint::new("free", usage.free),
        StatPoint::new("clean", usage.clean),
        StatPoint::new("dirty", usage.dirty),
    ]
}

pub fn collect_usage_metrics(metrics: &MetricsCollector, cache: &Cache, usage: &UsageStats) {
    record_points(metrics, cache, Category::Usage, &usage_points(usage));
}
