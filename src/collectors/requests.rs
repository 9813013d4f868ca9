//! Request Metrics Collector
//!
//! # Metrics Produced
//! - `ocf_count{category="requests"}` - request counts
//!   - read/write hits, partial misses, full misses and totals
//!   - pass-through reads (`rd_pt`) and writes (`wr_pt`)
//!   - serviced and total requests
//! - `ocf_percentage{category="requests"}` - the same, as a share of all requests

use super::{record_points, StatPoint};
use crate::casadm::types::RequestStats;
use crate::casadm::Cache;
use crate::metrics::{Category, MetricsCollector};

pub fn request_points(requests: &RequestStats) -> [StatPoint; 12] {
    [
        StatPoint::new("rd_hits", requests.read_hits),
        StatPoint::new("rd_partial_misses", requests.read_partial_misses),
        StatPoint::new("rd_full_misses", requests.read_full_misses),
        StatPoint::new("rd_total", requests.read_total),
        StatPoint::new("wr_hits", requests.write_hits),
        StatPoint::new("wr_partial_misses", requests.write_partial_misses),
        StatPoint::new("wr_full_misses", requests.write_full_misses),
        StatPoint::new("wr_total", requests.write_total),
        StatPoint::new("rd_pt", requests.pass_through_reads),
        StatPoint::new("wr_pt", requests.pass_through_writes),
        StatPoint::new("serviced", requests.serviced),
        StatPoint::new("total", requests.total),
    ]
}

pub fn collect_request_metrics(metrics: &MetricsCollector, cache: &Cache, requests: &RequestStats) {
    record_points(metrics, cache, Category::Requests, &request_points(requests));
}
