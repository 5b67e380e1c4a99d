//! Post-sort verifier.
//!
//! Streams the raw file independently of the buffer pool — the verifier must
//! not trust the code it is checking — and confirms the keys never decrease.

use anyhow::Result;
use byteorder::{BigEndian, ReadBytesExt};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Returns `true` iff every adjacent key pair in `path` satisfies
/// `key(i) <= key(i+1)`. An empty file is sorted.
pub fn is_sorted<P: AsRef<Path>>(path: P) -> Result<bool> {
    let mut r = BufReader::new(File::open(path)?);
    let mut prev: Option<i16> = None;

    loop {
        let key = match r.read_i16::<BigEndian>() {
            Ok(k) => k,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(true),
            Err(e) => return Err(e.into()),
        };
        let _value = r.read_i16::<BigEndian>()?;

        if let Some(p) = prev {
            if key < p {
                return Ok(false);
            }
        }
        prev = Some(key);
    }
}
