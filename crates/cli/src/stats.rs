//! Statistics sink: one appended text entry per completed sort.
//!
//! ```text
//! File: <dataFile>
//! Cache hits: <hits>
//! Disk reads: <reads>
//! Disk writes: <writes>
//! Sort time: <ms> ms
//! <blank>
//! ```

use anyhow::Result;
use sorter::SortReport;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Appends one entry for `data_file` to the statistics file at `path`,
/// creating it if needed.
pub fn append_entry<P: AsRef<Path>>(path: P, data_file: &str, report: &SortReport) -> Result<()> {
    let mut f = OpenOptions::new().append(true).create(true).open(path)?;
    writeln!(f, "File: {}", data_file)?;
    writeln!(f, "Cache hits: {}", report.stats.cache_hits)?;
    writeln!(f, "Disk reads: {}", report.stats.disk_reads)?;
    writeln!(f, "Disk writes: {}", report.stats.disk_writes)?;
    writeln!(f, "Sort time: {} ms", report.elapsed.as_millis())?;
    writeln!(f)?;
    Ok(())
}
