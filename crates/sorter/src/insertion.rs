//! In-place insertion sort through the record accessor.

use anyhow::Result;
use records::RecordFile;

/// Sorts the inclusive index range `[lo, hi]` by insertion.
///
/// The record being inserted is held in a local while larger keys shift one
/// slot right; the final write of the held record is skipped when it never
/// moved. Every read and write goes through the accessor, so the kernel
/// inherits the pool's caching behaviour for free.
pub(crate) fn insertion_sort(file: &mut RecordFile, lo: u64, hi: u64) -> Result<()> {
    for i in (lo + 1)..=hi {
        let held = file.record(i)?;
        let mut pos = i;
        while pos > lo && file.key(pos - 1)? > held.key {
            let shifted = file.record(pos - 1)?;
            file.set(pos, shifted)?;
            pos -= 1;
        }
        if pos != i {
            file.set(pos, held)?;
        }
    }
    Ok(())
}
