//! casadm Command Client
//!
//! Runs the `casadm` administration tool and decodes its CSV output.
//!
//! # Invocations
//!
//! - `casadm --list-caches --output-format csv`
//! - `casadm --stats --cache-id <N> --output-format csv`
//!
//! Every call races the caller's [`CancellationToken`]; if the token fires
//! first the child process is killed and [`ExporterError::Cancelled`] is
//! returned. An optional per-call timeout can be configured on top of that.
//!
//! There is no retry here. A failed call is reported to the caller, which
//! decides whether the next extraction cycle tries again.
//!
//! # Example
//!
//! ```no_run
//! use cas_exporter::casadm::{CacheSource, CasadmClient};
//! use cas_exporter::config::CasadmConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = CasadmClient::new(CasadmConfig::default());
//! let token = CancellationToken::new();
//! for cache in client.list_caches(&token).await? {
//!     println!("cache {} on {}", cache.id, cache.device);
//! }
//! # Ok(())
//! # }
//! ```

use super::table::Table;
use super::types::{Cache, CacheStats};
use crate::config::CasadmConfig;
use crate::error::{ExporterError, Result};
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A casadm invocation, used for arguments and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListCaches,
    CacheStats(u16),
}

impl Operation {
    pub fn args(&self) -> Vec<String> {
        match self {
            Operation::ListCaches => vec!["--list-caches".into()],
            Operation::CacheStats(id) => {
                vec!["--stats".into(), "--cache-id".into(), id.to_string()]
            }
        }
        .into_iter()
        .chain(["--output-format".to_string(), "csv".to_string()])
        .collect()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ListCaches => write!(f, "list caches"),
            Operation::CacheStats(id) => write!(f, "stats for cache {}", id),
        }
    }
}

/// Source of cache listings and statistics
///
/// [`CasadmClient`] is the production implementation; the extraction loop only
/// depends on this trait.
#[async_trait]
pub trait CacheSource: Send + Sync {
    /// Enumerate all cache instances
    async fn list_caches(&self, token: &CancellationToken) -> Result<Vec<Cache>>;

    /// Sample one cache instance
    async fn cache_stats(&self, token: &CancellationToken, id: u16) -> Result<CacheStats>;
}

/// Client that shells out to casadm
pub struct CasadmClient {
    config: CasadmConfig,
}

impl CasadmClient {
    pub fn new(config: CasadmConfig) -> Self {
        Self { config }
    }

    /// Run casadm and return its stdout
    ///
    /// On a non-zero exit the error carries stdout followed by stderr, which is
    /// where casadm writes its diagnostics.
    async fn execute(&self, operation: Operation, token: &CancellationToken) -> Result<String> {
        debug!("Running {} {:?}", self.config.binary, operation.args());

        let mut command = Command::new(&self.config.binary);
        command
            .args(operation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let run = async {
            let output = command.output();
            let result = match self.config.command_timeout() {
                Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| {
                    ExporterError::Timeout {
                        operation,
                        seconds: limit.as_secs(),
                    }
                })?,
                None => output.await,
            };
            result.map_err(|source| ExporterError::Spawn { operation, source })
        };

        let output = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ExporterError::Cancelled { operation }),
            output = run => output?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExporterError::Command {
                operation,
                status: output.status,
                output: format!("{}{}", stdout, stderr),
            });
        }

        Ok(stdout)
    }
}

#[async_trait]
impl CacheSource for CasadmClient {
    async fn list_caches(&self, token: &CancellationToken) -> Result<Vec<Cache>> {
        let operation = Operation::ListCaches;
        let output = self.execute(operation, token).await?;
        parse_cache_list(&output).map_err(|source| ExporterError::Decode {
            operation,
            source,
            output,
        })
    }

    async fn cache_stats(&self, token: &CancellationToken, id: u16) -> Result<CacheStats> {
        let operation = Operation::CacheStats(id);
        let output = self.execute(operation, token).await?;
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

/// Decode `--list-caches` CSV output
pub fn parse_cache_list(output: &str) -> std::result::Result<Vec<Cache>, super::DecodeError> {
    Cache::from_table(&Table::parse(output)?)
}

/// Decode `--stats` CSV output; `None` when the table has no rows
pub fn parse_cache_stats(
    output: &str,
) -> std::result::Result<Option<CacheStats>, super::DecodeError> {
    CacheStats::from_table(&Table::parse(output)?)
}
