//! Extraction Loop
//!
//! Drives periodic sampling of every Open CAS cache instance.
//!
//! # Cycle
//!
//! Each tick runs one enumerate-then-sample pass:
//! 1. List caches. If that fails the cycle is marked failed and nothing is
//!    sampled.
//! 2. Sample every active cache (device not `-`) that passes the cache-id
//!    filter. A failed sample is logged and the loop moves on; the cycle is
//!    still marked failed.
//! 3. Record the cycle duration and outcome.
//!
//! Cycles are strictly sequential. Cancellation is checked before every cycle
//! and interrupts the wait between cycles, as well as any casadm call in
//! flight.

use crate::casadm::CacheSource;
use crate::collectors::{self, CollectionContext, CollectionStatus};
use crate::config::MetricsConfig;
use crate::metrics::MetricsCollector;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Summary of one extraction cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub duration: Duration,
    pub success: bool,
    pub sampled: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Periodic sampler feeding the metric model
pub struct Extractor {
    source: Arc<dyn CacheSource>,
    metrics: MetricsCollector,
    config: MetricsConfig,
}

impl Extractor {
    pub fn new(source: Arc<dyn CacheSource>, metrics: MetricsCollector, config: MetricsConfig) -> Self {
        Self {
            source,
            metrics,
            config,
        }
    }

    /// Run cycles until `token` is cancelled
    pub async fn run(&self, token: CancellationToken) {
        let interval = self.config.extraction_interval();
        info!(
            "Starting extraction loop (interval: {}s)",
            interval.as_secs_f64()
        );

        loop {
            if token.is_cancelled() {
                break;
            }

            self.run_cycle(&token).await;

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("Extraction loop stopped");
    }

    /// Run a single enumerate-then-sample pass and record its outcome
    pub async fn run_cycle(&self, token: &CancellationToken) -> CycleReport {
        let start = Instant::now();
        let ctx = CollectionContext {
            source: self.source.as_ref(),
            metrics: &self.metrics,
            token,
        };

        let mut report = CycleReport {
            duration: Duration::ZERO,
            success: true,
            sampled: 0,
            failed: 0,
            skipped: 0,
        };

        match self.source.list_caches(token).await {
            Ok(caches) => {
                for cache in caches {
                    if token.is_cancelled() {
                        report.success = false;
                        break;
                    }
                    if !cache.is_active() || !self.config.includes(cache.id) {
                        report.skipped += 1;
                        continue;
                    }

                    match collectors::collect_cache_metrics(&ctx, &cache).await {
                        CollectionStatus::Success => report.sampled += 1,
                        CollectionStatus::Failed => {
                            report.failed += 1;
                            report.success = false;
                        }
                    }
                }
            }
            Err(e) => {
                error!("Failed to list caches: {}", e);
                report.success = false;
            }
        }

        report.duration = start.elapsed();
        self.metrics.observe_cycle(report.duration, report.success);

        info!(
            "Extraction cycle finished in {:.3}s (success: {}, sampled: {}, failed: {}, skipped: {})",
            report.duration.as_secs_f64(),
            report.success,
            report.sampled,
            report.failed,
            report.skipped
        );

        report
    }
}
