//! Merge sort over the record accessor, and the chunked large-file variant.
//!
//! Both strategies share [`merge_range`], which materialises the two sorted
//! halves into temporary record arrays and writes the merged output back
//! through the accessor. The temporaries are what bound the working set: a
//! merge only ever holds `hi - lo + 1` records in memory, so the large-file
//! strategy keeps that span proportional to the current run width instead of
//! the whole file.

use crate::{insertion, SortConfig};
use anyhow::Result;
use records::{Record, RecordFile};

/// Recursive merge sort over the inclusive index range `[lo, hi]`.
///
/// Ranges within the insertion threshold are handed to the insertion kernel.
/// After the two halves are sorted, the merge is skipped entirely when the
/// boundary pair is already ordered.
pub(crate) fn merge_sort(
    file: &mut RecordFile,
    lo: u64,
    hi: u64,
    config: &SortConfig,
) -> Result<()> {
    if lo >= hi {
        return Ok(());
    }
    if hi - lo <= config.insertion_threshold {
        return insertion::insertion_sort(file, lo, hi);
    }

    let mid = lo + (hi - lo) / 2;
    merge_sort(file, lo, mid, config)?;
    merge_sort(file, mid + 1, hi, config)?;

    // Touching records mid and mid+1 costs at most two block fetches and
    // saves a full merge pass when the halves are already in order.
    if file.key(mid)? <= file.key(mid + 1)? {
        return Ok(());
    }
    merge_range(file, lo, mid, hi)
}

/// Merges the sorted runs `[lo, mid]` and `[mid+1, hi]` in place.
pub(crate) fn merge_range(file: &mut RecordFile, lo: u64, mid: u64, hi: u64) -> Result<()> {
    let mut left: Vec<Record> = Vec::with_capacity((mid - lo + 1) as usize);
    for r in lo..=mid {
        left.push(file.record(r)?);
    }
    let mut right: Vec<Record> = Vec::with_capacity((hi - mid) as usize);
    for r in (mid + 1)..=hi {
        right.push(file.record(r)?);
    }

    let (mut l, mut r, mut out) = (0usize, 0usize, lo);
    while l < left.len() && r < right.len() {
        if left[l].key <= right[r].key {
            file.set(out, left[l])?;
            l += 1;
        } else {
            file.set(out, right[r])?;
            r += 1;
        }
        out += 1;
    }
    while l < left.len() {
        file.set(out, left[l])?;
        l += 1;
        out += 1;
    }
    while r < right.len() {
        file.set(out, right[r])?;
        r += 1;
        out += 1;
    }
    Ok(())
}

/// Large-file strategy: sort fixed-size chunks, then pairwise-merge adjacent
/// runs of geometrically growing width until one run remains.
///
/// In a round with `runs` runs of width `w`, pair `i` covers
/// `[i*2w, min(i*2w + w - 1, n-1)]` and `[.. , min(mid + w, n-1)]`; a pair
/// whose right side is empty (`mid >= end`) is carried forward unmerged. An
/// odd tail run is therefore untouched in that round, which is sound because
/// it is already sorted and the next round's doubled width sweeps it in.
pub(crate) fn chunked_sort(file: &mut RecordFile, config: &SortConfig) -> Result<()> {
    let n = file.len();
    let chunk = config.chunk.max(1);

    let mut start = 0;
    while start < n {
        let end = (start + chunk - 1).min(n - 1);
        merge_sort(file, start, end, config)?;
        start += chunk;
    }

    let mut width = chunk;
    let mut runs = (n + chunk - 1) / chunk;
    while runs > 1 {
        let mut pair = 0;
        loop {
            let lo = pair * 2 * width;
            if lo >= n {
                break;
            }
            let mid = (lo + width - 1).min(n - 1);
            let end = (mid + width).min(n - 1);
            if mid < end {
                merge_range(file, lo, mid, end)?;
            }
            pair += 1;
        }
        width *= 2;
        runs = (runs + 1) / 2;
    }
    Ok(())
}
