//! casadm output decoding tests
//!
//! Tests that casadm CSV is decoded by column name, tolerating the format
//! drift seen across casadm releases.

mod common;

use cas_exporter::casadm::{parse_cache_list, parse_cache_stats, DecodeError, StatValue};
use common::{list_csv, StatsFixture};

#[test]
fn test_list_caches_decodes_all_rows() {
    // Given: A listing with an active and an inactive instance
    let output = list_csv(&[(1, "/dev/sda"), (2, "-")]);

    // When: Decoding it
    let caches = parse_cache_list(&output).expect("listing should decode");

    // Then: Both rows are present with their devices
    assert_eq!(caches.len(), 2);
    assert_eq!(caches[0].id, 1);
    assert_eq!(caches[0].device, "/dev/sda");
    assert_eq!(caches[0].kind.as_deref(), Some("cache"));
    assert_eq!(caches[0].write_policy.as_deref(), Some("wt"));
    assert!(caches[0].is_active());
    assert_eq!(caches[1].id, 2);
    assert!(!caches[1].is_active());
}

#[test]
fn test_list_caches_tolerates_reordered_and_unknown_columns() {
    // Given: Columns in a different order plus a column this exporter doesn't know
    let output = "device,firmware,id\n/dev/sdb,1.2.3,7\n";

    // When: Decoding it
    let caches = parse_cache_list(output).expect("listing should decode");

    // Then: Fields are matched by name
    assert_eq!(caches.len(), 1);
    assert_eq!(caches[0].id, 7);
    assert_eq!(caches[0].device, "/dev/sdb");
    assert_eq!(caches[0].kind, None);
}

#[test]
fn test_quoted_cell_with_line_break_stays_in_its_row() {
    // Given: A disk cell that spans two lines inside quotes
    let output = "type,id,disk,status,write policy,device\n\
                  cache,1,\"/dev/a\nb\",Running,wt,/dev/sda\n";

    // When: Decoding it
    let caches = parse_cache_list(output).expect("listing should decode");

    // Then: It is one record with the line break kept in the cell
    assert_eq!(caches.len(), 1);
    assert_eq!(caches[0].disk.as_deref(), Some("/dev/a\nb"));
    assert_eq!(caches[0].device, "/dev/sda");
}

#[test]
fn test_header_only_listing_is_empty() {
    let caches = parse_cache_list("type,id,disk,status,write policy,device\n").unwrap();
    assert!(caches.is_empty());
}

#[test]
fn test_listing_without_device_column_is_structural() {
    // Given: A listing that lacks the device column
    let output = "type,id,disk\ncache,1,/dev/nvme0n1\n";

    // When: Decoding it
    let err = parse_cache_list(output).unwrap_err();

    // Then: The missing column is named
    assert_eq!(err, DecodeError::MissingColumn { column: "device" });
}

#[test]
fn test_empty_device_cell_is_inactive() {
    let caches = parse_cache_list("id,device\n3,\n").unwrap();
    assert!(!caches[0].is_active());
}

#[test]
fn test_stats_decode_every_statistic() {
    // Given: A stats row with known values
    let fixture = StatsFixture::new(1).with(0, StatValue::new(100.0, 42.5));

    // When: Decoding it
    let stats = parse_cache_stats(&fixture.to_csv()).unwrap().expect("one row");

    // Then: Values land in the right fields
    assert_eq!(stats.id, 1);
    assert_eq!(stats.usage.occupancy, StatValue::new(100.0, 42.5));
    assert_eq!(stats.usage.free, fixture.values[1]);
    assert_eq!(stats.requests.pass_through_reads, fixture.values[12]);
    assert_eq!(stats.requests.pass_through_writes, fixture.values[13]);
    assert_eq!(stats.blocks.exported_total, fixture.values[24]);
    assert_eq!(stats.errors.total, fixture.values[31]);
    assert_eq!(stats.cache_size_blocks, Some(2621440.0));
    assert_eq!(stats.cache_device.as_deref(), Some("/dev/nvme0n1"));
    assert_eq!(stats.status.as_deref(), Some("Running"));
    assert_eq!(stats.cleaning_policy, None);
}

#[test]
fn test_stats_column_order_does_not_matter() {
    let fixture = StatsFixture::new(4);

    let forward = parse_cache_stats(&fixture.to_csv()).unwrap();
    let reversed = parse_cache_stats(&fixture.to_reversed_csv()).unwrap();

    assert_eq!(forward, reversed);
}

#[test]
fn test_stats_header_aliases_are_accepted() {
    // Given: Older casadm spelling ("blocks" lowercase, singular "core")
    let fixture = StatsFixture::new(1);
    let output = fixture
        .to_csv()
        .replace("[4KiB Blocks]", "[4KiB blocks]")
        .replace("Reads from core(s)", "Reads from core");

    // When: Decoding it
    let stats = parse_cache_stats(&output).unwrap().expect("one row");

    // Then: The aliased columns still decode
    assert_eq!(stats.usage.occupancy, fixture.values[0]);
    assert_eq!(stats.blocks.core_reads, fixture.values[16]);
}

#[test]
fn test_stats_missing_required_column_is_reported() {
    // Given: Output without the dirty percentage column
    let fixture = StatsFixture::new(1);
    let header = fixture.header();
    let cells = fixture.cells();
    let keep: Vec<usize> = (0..header.len())
        .filter(|i| header[*i] != "Dirty [%]")
        .collect();
    let output = format!(
        "{}\n{}\n",
        keep.iter().map(|i| header[*i].as_str()).collect::<Vec<_>>().join(","),
        keep.iter().map(|i| cells[*i].as_str()).collect::<Vec<_>>().join(",")
    );

    // When: Decoding it
    let err = parse_cache_stats(&output).unwrap_err();

    // Then: The column is named
    assert_eq!(err, DecodeError::MissingColumn { column: "Dirty [%]" });
}

#[test]
fn test_stats_with_no_rows_is_none() {
    let fixture = StatsFixture::new(1);
    let output = format!("{}\n", fixture.header().join(","));

    assert_eq!(parse_cache_stats(&output).unwrap(), None);
}

#[test]
fn test_stats_with_non_numeric_value_fails() {
    let fixture = StatsFixture::new(1);
    let output = fixture.to_csv().replacen(",1001,", ",lots,", 1);

    let err = parse_cache_stats(&output).unwrap_err();

    assert!(matches!(err, DecodeError::InvalidNumber { .. }));
}

#[test]
fn test_garbage_output_fails_to_decode() {
    assert_eq!(parse_cache_stats("").unwrap_err(), DecodeError::MissingHeader);
    assert!(matches!(
        parse_cache_list("id,device\n1,/dev/sda,extra\n").unwrap_err(),
        DecodeError::RaggedRow { line: 2, .. }
    ));
}
