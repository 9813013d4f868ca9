//! Block Traffic Metrics Collector
//!
//! `core_volume_*` is traffic to/from the core (backing) device,
//! `cache_volume_*` to/from the cache device, and `volume_*` to/from the
//! exported CAS object.

use super::{record_points, StatPoint};
use crate::casadm::types::BlockStats;
use crate::casadm::Cache;
use crate::metrics::{Category, MetricsCollector};

pub fn block_points(blocks: &BlockStats) -> [StatPoint; 9] {
    [
        StatPoint::new("core_volume_rd", blocks.core_reads),
        StatPoint::new("core_volume_wr", blocks.core_writes),
        StatPoint::new("core_volume_total", blocks.core_total),
        StatPoint::new("cache_volume_rd", blocks.cache_reads),
        StatPoint::new("cache_volume_wr", blocks.cache_writes),
        StatPoint::new("cache_volume_total", blocks.cache_total),
        StatPoint::new("volume_rd", blocks.exported_reads),
        StatPoint::new("volume_wr", blocks.exported_writes),
        StatPoint::new("volume_total", blocks.exported_total),
    ]
}

pub fn collect_block_metrics(metrics: &MetricsCollector, cache: &Cache, blocks: &BlockStats) {
    record_points(metrics, cache, Category::Blocks, &block_points(blocks));
}
