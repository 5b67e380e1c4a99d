//! # Records — fixed-width record accessor
//!
//! Translates record indices into block-level operations on the
//! [`bufpool::BufferPool`] and owns the binary codec for individual records.
//!
//! ## Record format
//!
//! ```text
//! [key: i16 BE][value: i16 BE]
//! ```
//!
//! A data file is a flat sequence of these 4-byte records with no header,
//! padding, or delimiter. Each 4096-byte block holds exactly 1024 consecutive
//! records, so for record index `r`:
//!
//! ```text
//! block  = r / 1024
//! offset = (r % 1024) * 4
//! ```
//!
//! ## Aliasing
//!
//! Read accessors return copies and mutation goes through an internal write
//! path, so no caller ever holds a reference into a pool slot across a pool
//! call. [`RecordFile::swap`] relies on this: its cross-block path copies
//! both records to stack temporaries before writing either back, which keeps
//! it correct even when the second fetch evicts the first block.

use bufpool::{BufferPool, PoolError, PoolStats, BYTES_PER_BLOCK};
use byteorder::{BigEndian, ByteOrder};
use std::path::Path;
use thiserror::Error;

/// Size of the key field in bytes.
pub const BYTES_IN_KEY: usize = 2;

/// Size of the value field in bytes.
pub const BYTES_IN_VALUE: usize = 2;

/// Size of one record in bytes.
pub const BYTES_PER_RECORD: usize = BYTES_IN_KEY + BYTES_IN_VALUE;

/// Number of records held by one block.
pub const RECORDS_PER_BLOCK: u64 = (BYTES_PER_BLOCK / BYTES_PER_RECORD) as u64;

/// A single `(key, value)` record.
///
/// Ordering during a sort is strict numeric order on `key`; the value is an
/// opaque payload that travels with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub key: i16,
    pub value: i16,
}

impl Record {
    /// Decodes a record from the first [`BYTES_PER_RECORD`] bytes of `buf`.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Self {
        Self {
            key: BigEndian::read_i16(&buf[..BYTES_IN_KEY]),
            value: BigEndian::read_i16(&buf[BYTES_IN_KEY..BYTES_PER_RECORD]),
        }
    }

    /// Encodes the record into the first [`BYTES_PER_RECORD`] bytes of `buf`.
    pub fn encode(&self, buf: &mut [u8]) {
        BigEndian::write_i16(&mut buf[..BYTES_IN_KEY], self.key);
        BigEndian::write_i16(&mut buf[BYTES_IN_KEY..BYTES_PER_RECORD], self.value);
    }
}

/// Errors surfaced by the record accessor.
#[derive(Debug, Error)]
pub enum RecordError {
    /// An error from the underlying buffer pool.
    #[error("{0}")]
    Pool(#[from] PoolError),

    /// A record index at or past the end of the file.
    #[error("record {index} out of range (file holds {len} records)")]
    OutOfRange { index: u64, len: u64 },

    /// A file whose length is not a whole number of records.
    #[error("file length {0} is not a multiple of the 4-byte record size")]
    Misaligned(u64),
}

/// Record-level view of a data file, layered on a [`BufferPool`].
///
/// The accessor owns the pool for its lifetime; every read and write flows
/// through it, so the pool counters account for all I/O the sort performs.
pub struct RecordFile {
    pool: BufferPool,
    /// Number of records in the file, fixed at open.
    len: u64,
}

impl RecordFile {
    /// Opens `path` through a pool of `capacity` block buffers.
    ///
    /// # Errors
    ///
    /// [`RecordError::Misaligned`] if the file length is not a multiple of
    /// the record size, or any [`PoolError`] from opening the pool.
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, RecordError> {
        let pool = BufferPool::open(path, capacity)?;
        let file_len = pool.file_len();
        if file_len % BYTES_PER_RECORD as u64 != 0 {
            return Err(RecordError::Misaligned(file_len));
        }
        Ok(Self {
            pool,
            len: file_len / BYTES_PER_RECORD as u64,
        })
    }

    /// Number of records in the file.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the file holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the key of record `index`.
    pub fn key(&mut self, index: u64) -> Result<i16, RecordError> {
        self.check(index)?;
        let (block, offset) = locate(index);
        let bytes = self.pool.get_block(block)?;
        Ok(BigEndian::read_i16(&bytes[offset..offset + BYTES_IN_KEY]))
    }

    /// Returns the value of record `index`.
    pub fn value(&mut self, index: u64) -> Result<i16, RecordError> {
        self.check(index)?;
        let (block, offset) = locate(index);
        let bytes = self.pool.get_block(block)?;
        Ok(BigEndian::read_i16(
            &bytes[offset + BYTES_IN_KEY..offset + BYTES_PER_RECORD],
        ))
    }

    /// Returns a copy of record `index`.
    pub fn record(&mut self, index: u64) -> Result<Record, RecordError> {
        self.check(index)?;
        let (block, offset) = locate(index);
        let bytes = self.pool.get_block(block)?;
        Ok(Record::decode(&bytes[offset..offset + BYTES_PER_RECORD]))
    }

    /// Overwrites record `index` with `record` and marks its block dirty.
    ///
    /// Key and value are written together; the block is marked dirty once
    /// for the pair.
    pub fn set(&mut self, index: u64, record: Record) -> Result<(), RecordError> {
        self.check(index)?;
        let (block, offset) = locate(index);
        let bytes = self.pool.get_block(block)?;
        record.encode(&mut bytes[offset..offset + BYTES_PER_RECORD]);
        self.pool.mark_dirty(block)?;
        Ok(())
    }

    /// Exchanges records `i` and `j`. A self-swap touches nothing.
    ///
    /// When both records share a block the swap is a single block access:
    /// one fetch, an in-buffer three-way copy, one dirty mark. Across blocks,
    /// both records are copied to stack temporaries before either write, so
    /// the second fetch is free to evict the first block.
    pub fn swap(&mut self, i: u64, j: u64) -> Result<(), RecordError> {
        if i == j {
            return Ok(());
        }
        self.check(i)?;
        self.check(j)?;

        let (block_i, off_i) = locate(i);
        let (block_j, off_j) = locate(j);

        if block_i == block_j {
            let bytes = self.pool.get_block(block_i)?;
            let mut tmp = [0u8; BYTES_PER_RECORD];
            tmp.copy_from_slice(&bytes[off_i..off_i + BYTES_PER_RECORD]);
            bytes.copy_within(off_j..off_j + BYTES_PER_RECORD, off_i);
            bytes[off_j..off_j + BYTES_PER_RECORD].copy_from_slice(&tmp);
            self.pool.mark_dirty(block_i)?;
        } else {
            let rec_i = self.record(i)?;
            let rec_j = self.record(j)?;
            self.set(i, rec_j)?;
            self.set(j, rec_i)?;
        }
        Ok(())
    }

    /// Writes back every dirty block.
    pub fn flush(&mut self) -> Result<(), RecordError> {
        self.pool.flush_all()?;
        Ok(())
    }

    /// Flushes and releases the underlying pool and file.
    pub fn close(self) -> Result<(), RecordError> {
        self.pool.close()?;
        Ok(())
    }

    /// Snapshot of the pool's I/O counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    fn check(&self, index: u64) -> Result<(), RecordError> {
        if index >= self.len {
            return Err(RecordError::OutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }
}

/// Maps a record index to its `(block, byte offset within block)` pair.
fn locate(index: u64) -> (u64, usize) {
    let block = index / RECORDS_PER_BLOCK;
    let offset = (index % RECORDS_PER_BLOCK) as usize * BYTES_PER_RECORD;
    (block, offset)
}
