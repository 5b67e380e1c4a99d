use byteorder::{BigEndian, WriteBytesExt};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Writes `n` records produced by `gen(index)` as raw big-endian pairs.
pub fn write_pattern<F>(dir: &Path, n: u64, gen: F) -> PathBuf
where
    F: Fn(u64) -> (i16, i16),
{
    let path = dir.join("input.bin");
    let mut w = BufWriter::new(fs::File::create(&path).unwrap());
    for i in 0..n {
        let (key, value) = gen(i);
        w.write_i16::<BigEndian>(key).unwrap();
        w.write_i16::<BigEndian>(value).unwrap();
    }
    drop(w);
    path
}

/// Deterministic key scatter; enough dispersion to defeat any pre-ordering.
pub fn scattered(i: u64) -> (i16, i16) {
    let key = ((i.wrapping_mul(7919).wrapping_add(131)) % 65536) as u16 as i16;
    (key, (i % 32768) as i16)
}

/// Strictly descending keys (worst case for an ascending merge), cycling
/// every 32768 records to stay within `i16`.
pub fn descending(i: u64) -> (i16, i16) {
    ((i16::MAX as i64 - (i as i64 & 0x7FFF)) as i16, (i & 0xFF) as i16)
}

/// Reads the file back as `(key, value)` pairs.
pub fn read_pairs(path: &Path) -> Vec<(i16, i16)> {
    let data = fs::read(path).unwrap();
    data.chunks_exact(4)
        .map(|c| {
            (
                i16::from_be_bytes([c[0], c[1]]),
                i16::from_be_bytes([c[2], c[3]]),
            )
        })
        .collect()
}

pub fn assert_sorted(pairs: &[(i16, i16)]) {
    for w in pairs.windows(2) {
        assert!(w[0].0 <= w[1].0, "keys out of order: {:?} before {:?}", w[0], w[1]);
    }
}

/// The multiset of pairs, as a sorted clone suitable for equality checks.
pub fn multiset(pairs: &[(i16, i16)]) -> Vec<(i16, i16)> {
    let mut sorted = pairs.to_vec();
    sorted.sort_unstable();
    sorted
}
