use super::helpers::*;
use crate::{sort_file, SortConfig};
use std::fs;
use tempfile::tempdir;

/// A configuration with every threshold shrunk, so the medium and large
/// strategies can be exercised on files of a few hundred records.
fn tiny() -> SortConfig {
    SortConfig {
        small_max: 10,
        large_min: 100,
        chunk: 50,
        insertion_threshold: 8,
    }
}

// -------------------- Small regime --------------------

#[test]
fn small_file_sorts_and_preserves_pairs() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 100, scattered);
    let before = multiset(&read_pairs(&path));

    sort_file(&path, 4, &SortConfig::default()).unwrap();

    let after = read_pairs(&path);
    assert_sorted(&after);
    assert_eq!(multiset(&after), before);
}

#[test]
fn single_record_file_sorts_trivially() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 1, |_| (42, -7));

    sort_file(&path, 1, &SortConfig::default()).unwrap();

    assert_eq!(read_pairs(&path), vec![(42, -7)]);
}

#[test]
fn empty_file_is_a_noop() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 0, scattered);

    let report = sort_file(&path, 3, &SortConfig::default()).unwrap();

    assert_eq!(report.records, 0);
    assert_eq!(report.stats.disk_reads, 0);
    assert_eq!(report.stats.disk_writes, 0);
    assert_eq!(fs::read(&path).unwrap().len(), 0);
}

#[test]
fn one_block_through_one_buffer() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 1024, scattered);

    let report = sort_file(&path, 1, &SortConfig::default()).unwrap();

    assert_sorted(&read_pairs(&path));
    assert_eq!(report.stats.disk_reads, 1);
    assert!(report.stats.disk_writes >= 1);
}

// -------------------- Medium regime --------------------

#[test]
fn merge_sort_handles_two_blocks_through_one_buffer() {
    // Descending input drives the merge through its worst case while a
    // single buffer forces an eviction on every block alternation.
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 2048, descending);
    let before = multiset(&read_pairs(&path));

    let config = SortConfig {
        small_max: 100,
        ..SortConfig::default()
    };
    let report = sort_file(&path, 1, &config).unwrap();

    let after = read_pairs(&path);
    assert_sorted(&after);
    assert_eq!(multiset(&after), before);
    assert!(report.stats.disk_reads >= 2);
}

#[test]
fn medium_file_sorts_and_preserves_pairs() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 6_000, scattered);
    let before = multiset(&read_pairs(&path));

    sort_file(&path, 4, &SortConfig::default()).unwrap();

    let after = read_pairs(&path);
    assert_sorted(&after);
    assert_eq!(multiset(&after), before);
}

#[test]
fn ten_blocks_through_five_buffers_hit_the_cache() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 10 * 1024, scattered);

    let report = sort_file(&path, 5, &SortConfig::default()).unwrap();

    assert_sorted(&read_pairs(&path));
    assert!(report.stats.cache_hits > 0);
}

// -------------------- Large regime --------------------

#[test]
fn chunked_sort_handles_a_scattered_file() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 523, scattered);
    let before = multiset(&read_pairs(&path));

    sort_file(&path, 3, &tiny()).unwrap();

    let after = read_pairs(&path);
    assert_sorted(&after);
    assert_eq!(multiset(&after), before);
}

#[test]
fn chunked_sort_sweeps_an_odd_tail_chunk() {
    // n = 2*chunk + 1: the first round leaves the one-record tail run
    // unmerged; the next round's doubled width must pick it up.
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 101, descending);
    let before = multiset(&read_pairs(&path));

    sort_file(&path, 3, &tiny()).unwrap();

    let after = read_pairs(&path);
    assert_sorted(&after);
    assert_eq!(multiset(&after), before);
}

#[test]
fn chunked_sort_handles_three_exact_chunks() {
    // n = 3*chunk: round one merges the first pair and carries the third
    // chunk forward; round two merges it in.
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 150, descending);
    let before = multiset(&read_pairs(&path));

    sort_file(&path, 3, &tiny()).unwrap();

    let after = read_pairs(&path);
    assert_sorted(&after);
    assert_eq!(multiset(&after), before);
}

#[test]
fn chunked_sort_handles_an_exact_power_of_two_of_chunks() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 200, scattered);
    let before = multiset(&read_pairs(&path));

    sort_file(&path, 3, &tiny()).unwrap();

    let after = read_pairs(&path);
    assert_sorted(&after);
    assert_eq!(multiset(&after), before);
}

// -------------------- Cross-cutting properties --------------------

#[test]
fn sorting_twice_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 2_000, scattered);

    sort_file(&path, 4, &SortConfig::default()).unwrap();
    let first = fs::read(&path).unwrap();

    sort_file(&path, 4, &SortConfig::default()).unwrap();
    assert_eq!(fs::read(&path).unwrap(), first);
}

#[test]
fn all_equal_keys_keep_their_values() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 500, |i| (7, (i % 100) as i16));
    let before = multiset(&read_pairs(&path));

    sort_file(&path, 2, &SortConfig::default()).unwrap();

    let after = read_pairs(&path);
    assert_sorted(&after);
    assert_eq!(multiset(&after), before);
}

#[test]
fn report_carries_size_and_counters() {
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 1024, scattered);

    let report = sort_file(&path, 2, &SortConfig::default()).unwrap();

    assert_eq!(report.records, 1024);
    assert!(report.stats.disk_reads >= 1);
    assert!(report.stats.disk_writes >= 1);
}

#[test]
fn undersized_file_not_a_block_multiple_still_sorts() {
    // 100 records occupy 400 bytes: a lone partial block with an EOF tail.
    let dir = tempdir().unwrap();
    let path = write_pattern(dir.path(), 100, descending);

    sort_file(&path, 1, &SortConfig::default()).unwrap();

    let after = read_pairs(&path);
    assert_eq!(after.len(), 100);
    assert_sorted(&after);
    assert_eq!(fs::read(&path).unwrap().len(), 400);
}
