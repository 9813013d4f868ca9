use super::{record_points, StatPoint};
use crate::casadm::types::ErrorStats;
use crate::casadm::Cache;
use crate::metrics::{Category, MetricsCollector};

pub fn error_points(errors: &ErrorStats) -> [StatPoint; 7] {
    [
        StatPoint::new("cache_volume_rd", errors.cache_read),
        StatPoint::new("cache_volume_wr", errors.cache_write),
        StatPoint::new("cache_volume_total", errors.cache_total),
        StatPoint::new("core_volume_rd", errors.core_read),
        StatPoint::new("core_volume_wr", errors.core_write),
        StatPoint::new("core_volume_total", errors.core_total),
        StatPoint::new("total", errors.total),
    ]
}

/// Record read/write/total error counts per device role
pub fn collect_error_metrics(metrics: &MetricsCollector, cache: &Cache, errors: &ErrorStats) {
    record_points(metrics, cache, Category::Errors, &error_points(errors));
}
