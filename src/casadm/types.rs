//! casadm Record Types
//!
//! Typed views of the two casadm tables the exporter reads:
//!
//! - `casadm --list-caches` → [`Cache`]
//! - `casadm --stats --cache-id N` → [`CacheStats`]
//!
//! Every statistic in `--stats` comes as a pair of columns: an absolute value
//! (`[4KiB Blocks]` or `[Requests]`) and a share (`[%]`). [`StatValue`] holds one
//! such pair; the pairs are grouped the same way the exporter labels them.
//!
//! Descriptive columns are `Option` because older casadm releases omit some of
//! them. Statistic columns are required.

use super::table::{Column, DecodeError, Row, Table};

/// Device value casadm prints for caches that have no usable device
pub const INACTIVE_DEVICE: &str = "-";

/// One row of `casadm --list-caches`
#[derive(Debug, Clone, PartialEq)]
pub struct Cache {
    pub id: u16,
    pub device: String,
    pub kind: Option<String>,
    pub disk: Option<String>,
    pub status: Option<String>,
    pub write_policy: Option<String>,
}

mod list_columns {
    use super::Column;

    pub const ID: Column = Column::new(&["id"]);
    pub const DEVICE: Column = Column::new(&["device"]);
    pub const TYPE: Column = Column::new(&["type"]);
    pub const DISK: Column = Column::new(&["disk"]);
    pub const STATUS: Column = Column::new(&["status"]);
    pub const WRITE_POLICY: Column = Column::new(&["write policy", "mode"]);

    pub const REQUIRED: &[Column] = &[ID, DEVICE];
}

impl Cache {
    pub fn new(id: u16, device: impl Into<String>) -> Self {
        Self {
            id,
            device: device.into(),
            kind: None,
            disk: None,
            status: None,
            write_policy: None,
        }
    }

    /// Whether this instance has a device worth sampling
    pub fn is_active(&self) -> bool {
        let device = self.device.trim();
        !device.is_empty() && device != INACTIVE_DEVICE
    }

    /// Decode every row of a `--list-caches` table
    ///
    /// A header-only table is a valid, empty listing, but it must still carry
    /// the required columns.
    pub fn from_table(table: &Table) -> Result<Vec<Self>, DecodeError> {
        use list_columns::*;

        table.require(REQUIRED)?;
        table
            .rows()
            .map(|row| -> Result<Self, DecodeError> {
                Ok(Self {
                    id: row.number(&ID)?,
                    device: row.text(&DEVICE)?.to_string(),
                    kind: owned(row.optional_text(&TYPE)),
                    disk: owned(row.optional_text(&DISK)),
                    status: owned(row.optional_text(&STATUS)),
                    write_policy: owned(row.optional_text(&WRITE_POLICY)),
                })
            })
            .collect()
    }
}

fn owned(cell: Option<&str>) -> Option<String> {
    cell.filter(|value| !value.is_empty()).map(str::to_string)
}

/// An absolute value and its percentage, as casadm reports them side by side
///
/// The two are decoded independently; the percentage is never derived from
/// the count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatValue {
    pub count: f64,
    pub percent: f64,
}

impl StatValue {
    pub fn new(count: f64, percent: f64) -> Self {
        Self { count, percent }
    }
}

/// Columns for one [`StatValue`]
#[derive(Debug, Clone, Copy)]
pub struct StatColumns {
    pub count: Column,
    pub percent: Column,
}

impl StatColumns {
    const fn new(count: &'static [&'static str], percent: &'static [&'static str]) -> Self {
        Self {
            count: Column::new(count),
            percent: Column::new(percent),
        }
    }

    fn read(&self, row: &Row<'_>) -> Result<StatValue, DecodeError> {
        Ok(StatValue {
            count: row.number(&self.count)?,
            percent: row.number(&self.percent)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageStats {
    pub occupancy: StatValue,
    pub free: StatValue,
    pub clean: StatValue,
    pub dirty: StatValue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestStats {
    pub read_hits: StatValue,
    pub read_partial_misses: StatValue,
    pub read_full_misses: StatValue,
    pub read_total: StatValue,
    pub write_hits: StatValue,
    pub write_partial_misses: StatValue,
    pub write_full_misses: StatValue,
    pub write_total: StatValue,
    pub pass_through_reads: StatValue,
    pub pass_through_writes: StatValue,
    pub serviced: StatValue,
    pub total: StatValue,
}

/// Block traffic between the core device, the cache device and the exported
/// object, in 4KiB blocks
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockStats {
    pub core_reads: StatValue,
    pub core_writes: StatValue,
    pub core_total: StatValue,
    pub cache_reads: StatValue,
    pub cache_writes: StatValue,
    pub cache_total: StatValue,
    pub exported_reads: StatValue,
    pub exported_writes: StatValue,
    pub exported_total: StatValue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorStats {
    pub cache_read: StatValue,
    pub cache_write: StatValue,
    pub cache_total: StatValue,
    pub core_read: StatValue,
    pub core_write: StatValue,
    pub core_total: StatValue,
    pub total: StatValue,
}

/// One row of `casadm --stats --cache-id N`
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub id: u16,
    pub cache_size_blocks: Option<f64>,
    pub cache_size_gib: Option<f64>,
    pub cache_device: Option<String>,
    pub exported_object: Option<String>,
    pub core_devices: Option<u32>,
    pub inactive_core_devices: Option<u32>,
    pub write_policy: Option<String>,
    pub cleaning_policy: Option<String>,
    pub promotion_policy: Option<String>,
    pub cache_line_size_kib: Option<f64>,
    pub metadata_footprint_mib: Option<f64>,
    pub dirty_for_seconds: Option<f64>,
    pub status: Option<String>,

    pub usage: UsageStats,
    pub requests: RequestStats,
    pub blocks: BlockStats,
    pub errors: ErrorStats,
}

pub mod stats_columns {
    use super::{Column, StatColumns};

    pub const ID: Column = Column::new(&["Cache Id"]);
    pub const CACHE_SIZE_BLOCKS: Column = Column::new(&["Cache Size [4KiB Blocks]"]);
    pub const CACHE_SIZE_GIB: Column = Column::new(&["Cache Size [GiB]"]);
    pub const CACHE_DEVICE: Column = Column::new(&["Cache Device"]);
    pub const EXPORTED_OBJECT: Column = Column::new(&["Exported Object"]);
    pub const CORE_DEVICES: Column = Column::new(&["Core Devices"]);
    pub const INACTIVE_CORE_DEVICES: Column = Column::new(&["Inactive Core Devices"]);
    pub const WRITE_POLICY: Column = Column::new(&["Write Policy"]);
    pub const CLEANING_POLICY: Column = Column::new(&["Cleaning Policy"]);
    pub const PROMOTION_POLICY: Column = Column::new(&["Promotion Policy"]);
    pub const CACHE_LINE_SIZE: Column = Column::new(&["Cache line size [KiB]"]);
    pub const METADATA_FOOTPRINT: Column = Column::new(&["Metadata Memory Footprint [MiB]"]);
    pub const DIRTY_FOR_SECONDS: Column = Column::new(&["Dirty for [s]"]);
    pub const STATUS: Column = Column::new(&["Status"]);

    // Usage
    pub const OCCUPANCY: StatColumns =
        StatColumns::new(&["Occupancy [4KiB Blocks]"], &["Occupancy [%]"]);
    pub const FREE: StatColumns = StatColumns::new(&["Free [4KiB Blocks]"], &["Free [%]"]);
    pub const CLEAN: StatColumns = StatColumns::new(&["Clean [4KiB Blocks]"], &["Clean [%]"]);
    pub const DIRTY: StatColumns = StatColumns::new(&["Dirty [4KiB Blocks]"], &["Dirty [%]"]);

    // Requests
    pub const READ_HITS: StatColumns =
        StatColumns::new(&["Read hits [Requests]"], &["Read hits [%]"]);
    pub const READ_PARTIAL_MISSES: StatColumns = StatColumns::new(
        &["Read partial misses [Requests]"],
        &["Read partial misses [%]"],
    );
    pub const READ_FULL_MISSES: StatColumns = StatColumns::new(
        &["Read full misses [Requests]"],
        &["Read full misses [%]"],
    );
    pub const READ_TOTAL: StatColumns =
        StatColumns::new(&["Read total [Requests]"], &["Read total [%]"]);
    pub const WRITE_HITS: StatColumns =
        StatColumns::new(&["Write hits [Requests]"], &["Write hits [%]"]);
    pub const WRITE_PARTIAL_MISSES: StatColumns = StatColumns::new(
        &["Write partial misses [Requests]"],
        &["Write partial misses [%]"],
    );
    pub const WRITE_FULL_MISSES: StatColumns = StatColumns::new(
        &["Write full misses [Requests]"],
        &["Write full misses [%]"],
    );
    pub const WRITE_TOTAL: StatColumns =
        StatColumns::new(&["Write total [Requests]"], &["Write total [%]"]);
    pub const PASS_THROUGH_READS: StatColumns = StatColumns::new(
        &["Pass-Through reads [Requests]", "Pass-through reads [Requests]"],
        &["Pass-Through reads [%]", "Pass-through reads [%]"],
    );
    pub const PASS_THROUGH_WRITES: StatColumns = StatColumns::new(
        &["Pass-Through writes [Requests]", "Pass-through writes [Requests]"],
        &["Pass-Through writes [%]", "Pass-through writes [%]"],
    );
    pub const SERVICED: StatColumns = StatColumns::new(
        &["Serviced requests [Requests]"],
        &["Serviced requests [%]"],
    );
    pub const TOTAL_REQUESTS: StatColumns =
        StatColumns::new(&["Total requests [Requests]"], &["Total requests [%]"]);

    // Blocks
    pub const CORE_READS: StatColumns = StatColumns::new(
        &["Reads from core(s) [4KiB Blocks]", "Reads from core [4KiB Blocks]"],
        &["Reads from core(s) [%]", "Reads from core [%]"],
    );
    pub const CORE_WRITES: StatColumns = StatColumns::new(
        &["Writes to core(s) [4KiB Blocks]", "Writes to core [4KiB Blocks]"],
        &["Writes to core(s) [%]", "Writes to core [%]"],
    );
    pub const CORE_TOTAL: StatColumns = StatColumns::new(
        &["Total to/from core(s) [4KiB Blocks]", "Total to/from core [4KiB Blocks]"],
        &["Total to/from core(s) [%]", "Total to/from core [%]"],
    );
    pub const CACHE_READS: StatColumns = StatColumns::new(
        &["Reads from cache [4KiB Blocks]"],
        &["Reads from cache [%]"],
    );
    pub const CACHE_WRITES: StatColumns = StatColumns::new(
        &["Writes to cache [4KiB Blocks]"],
        &["Writes to cache [%]"],
    );
    pub const CACHE_TOTAL: StatColumns = StatColumns::new(
        &["Total to/from cache [4KiB Blocks]"],
        &["Total to/from cache [%]"],
    );
    pub const EXPORTED_READS: StatColumns = StatColumns::new(
        &[
            "Reads from exported object(s) [4KiB Blocks]",
            "Reads from exported object [4KiB Blocks]",
        ],
        &[
            "Reads from exported object(s) [%]",
            "Reads from exported object [%]",
        ],
    );
    pub const EXPORTED_WRITES: StatColumns = StatColumns::new(
        &[
            "Writes to exported object(s) [4KiB Blocks]",
            "Writes to exported object [4KiB Blocks]",
        ],
        &[
            "Writes to exported object(s) [%]",
            "Writes to exported object [%]",
        ],
    );
    pub const EXPORTED_TOTAL: StatColumns = StatColumns::new(
        &[
            "Total to/from exported object(s) [4KiB Blocks]",
            "Total to/from exported object [4KiB Blocks]",
        ],
        &[
            "Total to/from exported object(s) [%]",
            "Total to/from exported object [%]",
        ],
    );

    // Errors
    pub const CACHE_READ_ERRORS: StatColumns = StatColumns::new(
        &["Cache read errors [Requests]"],
        &["Cache read errors [%]"],
    );
    pub const CACHE_WRITE_ERRORS: StatColumns = StatColumns::new(
        &["Cache write errors [Requests]"],
        &["Cache write errors [%]"],
    );
    pub const CACHE_TOTAL_ERRORS: StatColumns = StatColumns::new(
        &["Cache total errors [Requests]"],
        &["Cache total errors [%]"],
    );
    pub const CORE_READ_ERRORS: StatColumns = StatColumns::new(
        &["Core read errors [Requests]"],
        &["Core read errors [%]"],
    );
    pub const CORE_WRITE_ERRORS: StatColumns = StatColumns::new(
        &["Core write errors [Requests]"],
        &["Core write errors [%]"],
    );
    pub const CORE_TOTAL_ERRORS: StatColumns = StatColumns::new(
        &["Core total errors [Requests]"],
        &["Core total errors [%]"],
    );
    pub const TOTAL_ERRORS: StatColumns =
        StatColumns::new(&["Total errors [Requests]"], &["Total errors [%]"]);

    /// Every statistic pair, in the order casadm prints them
    pub const STATS: &[StatColumns] = &[
        OCCUPANCY,
        FREE,
        CLEAN,
        DIRTY,
        READ_HITS,
        READ_PARTIAL_MISSES,
        READ_FULL_MISSES,
        READ_TOTAL,
        WRITE_HITS,
        WRITE_PARTIAL_MISSES,
        WRITE_FULL_MISSES,
        WRITE_TOTAL,
        PASS_THROUGH_READS,
        PASS_THROUGH_WRITES,
        SERVICED,
        TOTAL_REQUESTS,
        CORE_READS,
        CORE_WRITES,
        CORE_TOTAL,
        CACHE_READS,
        CACHE_WRITES,
        CACHE_TOTAL,
        EXPORTED_READS,
        EXPORTED_WRITES,
        EXPORTED_TOTAL,
        CACHE_READ_ERRORS,
        CACHE_WRITE_ERRORS,
        CACHE_TOTAL_ERRORS,
        CORE_READ_ERRORS,
        CORE_WRITE_ERRORS,
        CORE_TOTAL_ERRORS,
        TOTAL_ERRORS,
    ];

    /// Every column a stats table must carry
    pub fn required() -> Vec<Column> {
        std::iter::once(ID)
            .chain(STATS.iter().flat_map(|s| [s.count, s.percent]))
            .collect()
    }
}

impl CacheStats {
    /// Decode the first row of a `--stats` table
    ///
    /// Returns `Ok(None)` when the table has a header but no rows.
    pub fn from_table(table: &Table) -> Result<Option<Self>, DecodeError> {
        table.require(&stats_columns::required())?;
        table.rows().next().map(|row| Self::from_row(&row)).transpose()
    }

    fn from_row(row: &Row<'_>) -> Result<Self, DecodeError> {
        use stats_columns::*;

        Ok(Self {
            id: row.number(&ID)?,
            cache_size_blocks: row.optional_number(&CACHE_SIZE_BLOCKS)?,
            cache_size_gib: row.optional_number(&CACHE_SIZE_GIB)?,
            cache_device: owned(row.optional_text(&CACHE_DEVICE)),
            exported_object: owned(row.optional_text(&EXPORTED_OBJECT)),
            core_devices: row.optional_number(&CORE_DEVICES)?,
            inactive_core_devices: row.optional_number(&INACTIVE_CORE_DEVICES)?,
            write_policy: owned(row.optional_text(&WRITE_POLICY)),
            cleaning_policy: owned(row.optional_text(&CLEANING_POLICY)),
            promotion_policy: owned(row.optional_text(&PROMOTION_POLICY)),
            cache_line_size_kib: row.optional_number(&CACHE_LINE_SIZE)?,
            metadata_footprint_mib: row.optional_number(&METADATA_FOOTPRINT)?,
            dirty_for_seconds: row.optional_number(&DIRTY_FOR_SECONDS)?,
            status: owned(row.optional_text(&STATUS)),

            usage: UsageStats {
                occupancy: OCCUPANCY.read(row)?,
                free: FREE.read(row)?,
                clean: CLEAN.read(row)?,
                dirty: DIRTY.read(row)?,
            },
            requests: RequestStats {
                read_hits: READ_HITS.read(row)?,
                read_partial_misses: READ_PARTIAL_MISSES.read(row)?,
                read_full_misses: READ_FULL_MISSES.read(row)?,
                read_total: READ_TOTAL.read(row)?,
                write_hits: WRITE_HITS.read(row)?,
                write_partial_misses: WRITE_PARTIAL_MISSES.read(row)?,
                write_full_misses: WRITE_FULL_MISSES.read(row)?,
                write_total: WRITE_TOTAL.read(row)?,
                pass_through_reads: PASS_THROUGH_READS.read(row)?,
                pass_through_writes: PASS_THROUGH_WRITES.read(row)?,
                serviced: SERVICED.read(row)?,
                total: TOTAL_REQUESTS.read(row)?,
            },
            blocks: BlockStats {
                core_reads: CORE_READS.read(row)?,
                core_writes: CORE_WRITES.read(row)?,
                core_total: CORE_TOTAL.read(row)?,
                cache_reads: CACHE_READS.read(row)?,
                cache_writes: CACHE_WRITES.read(row)?,
                cache_total: CACHE_TOTAL.read(row)?,
                exported_reads: EXPORTED_READS.read(row)?,
                exported_writes: EXPORTED_WRITES.read(row)?,
                exported_total: EXPORTED_TOTAL.read(row)?,
            },
            errors: ErrorStats {
                cache_read: CACHE_READ_ERRORS.read(row)?,
                cache_write: CACHE_WRITE_ERRORS.read(row)?,
                cache_total: CACHE_TOTAL_ERRORS.read(row)?,
                core_read: CORE_READ_ERRORS.read(row)?,
                core_write: CORE_WRITE_ERRORS.read(row)?,
                core_total: CORE_TOTAL_ERRORS.read(row)?,
                total: TOTAL_ERRORS.read(row)?,
            },
        })
    }
}
