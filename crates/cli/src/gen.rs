//! Test-input generator: flat files of random or adversarial records.

use anyhow::Result;
use byteorder::{BigEndian, WriteBytesExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `records` seeded-random `(key, value)` pairs to `path`.
///
/// The same seed always produces the same file, which keeps failing tests
/// reproducible.
pub fn random<P: AsRef<Path>>(path: P, records: u64, seed: u64) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..records {
        w.write_i16::<BigEndian>(rng.gen())?;
        w.write_i16::<BigEndian>(rng.gen())?;
    }
    w.flush()?;
    Ok(())
}

/// Writes `records` pairs with strictly descending keys, cycling every
/// 32 768 records to stay inside `i16`. The worst case for an ascending
/// merge: every comparison picks the opposite run.
pub fn descending<P: AsRef<Path>>(path: P, records: u64) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for i in 0..records {
        let key = (i16::MAX as i64 - (i as i64 & 0x7FFF)) as i16;
        w.write_i16::<BigEndian>(key)?;
        w.write_i16::<BigEndian>(i as i16)?;
    }
    w.flush()?;
    Ok(())
}
