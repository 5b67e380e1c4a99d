//! # CLI - Riffle block-cached record sort
//!
//! Sorts a flat binary file of 4-byte `(key, value)` records in place,
//! routing every access through a fixed pool of block buffers, then appends
//! an entry of cache/disk counters to a statistics file.
//!
//! ## Usage
//!
//! ```text
//! cli <data-file> <num-buffers> <stats-file>
//! ```
//!
//! * `data-file` — the record file to sort in place.
//! * `num-buffers` — pool capacity, an integer in `1..=20`.
//! * `stats-file` — text file the run's statistics entry is appended to.
//!
//! Argument problems and sort errors are reported as a single line on
//! stdout; the process always exits normally.
//!
//! ## Configuration
//!
//! The adaptive-dispatch tunables can be overridden via environment
//! variables (records; unparsable values fall back to the defaults):
//!
//! ```text
//! RIFFLE_SMALL_MAX  largest file sorted fully in memory   (default: 5000)
//! RIFFLE_LARGE_MIN  largest file for plain merge sort     (default: 50000)
//! RIFFLE_CHUNK      chunk size of the large-file strategy (default: 10000)
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli -- data.bin 10 stats.txt
//! File sorted successfully
//! $ tail -6 stats.txt
//! File: data.bin
//! Cache hits: 18391
//! Disk reads: 52
//! Disk writes: 43
//! Sort time: 31 ms
//! ```

use anyhow::Context;
use bufpool::{MAX_BUFFERS, MIN_BUFFERS};
use cli::{stats, verify};
use sorter::SortConfig;
use std::env;

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Builds the sort configuration from `RIFFLE_*` overrides.
fn config_from_env() -> SortConfig {
    let defaults = SortConfig::default();
    SortConfig {
        small_max: env_or("RIFFLE_SMALL_MAX", "5000")
            .parse()
            .unwrap_or(defaults.small_max),
        large_min: env_or("RIFFLE_LARGE_MIN", "50000")
            .parse()
            .unwrap_or(defaults.large_min),
        chunk: env_or("RIFFLE_CHUNK", "10000")
            .parse()
            .unwrap_or(defaults.chunk),
        insertion_threshold: defaults.insertion_threshold,
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 3 {
        println!("Usage: cli <data-file> <num-buffers> <stats-file>");
        return;
    }

    let data_file = &args[0];
    let stats_file = &args[2];

    // Parse as a signed integer: "-5" is a perfectly good integer that is
    // merely out of range, not an invalid number.
    let buffers: i64 = match args[1].parse() {
        Ok(n) => n,
        Err(_) => {
            println!("Error: Invalid number of buffers");
            return;
        }
    };
    if !(MIN_BUFFERS as i64..=MAX_BUFFERS as i64).contains(&buffers) {
        println!("Number of buffers must be between 1 and 20");
        return;
    }
    let buffers = buffers as usize;

    let config = config_from_env();
    let report = match sorter::sort_file(data_file, buffers, &config)
        .with_context(|| format!("failed to sort {}", data_file))
    {
        Ok(r) => r,
        Err(e) => {
            println!("Error: {:#}", e);
            return;
        }
    };

    if let Err(e) = stats::append_entry(stats_file, data_file, &report)
        .with_context(|| format!("failed to record statistics in {}", stats_file))
    {
        println!("Error: {:#}", e);
        return;
    }

    match verify::is_sorted(data_file).with_context(|| format!("failed to verify {}", data_file))
    {
        Ok(true) => println!("File sorted successfully"),
        Ok(false) => println!("Error: File not sorted correctly"),
        Err(e) => println!("Error: {:#}", e),
    }
}
