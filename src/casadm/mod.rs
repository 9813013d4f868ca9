pub mod client;
pub mod table;
pub mod types;

pub use client::{parse_cache_list, parse_cache_stats, CacheSource, CasadmClient, Operation};
pub use table::{Column, DecodeError, Table};
pub use types::{Cache, CacheStats, StatValue, INACTIVE_DEVICE};
