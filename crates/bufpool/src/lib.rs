//! # Bufpool — Block Buffer Pool
//!
//! A fixed-capacity cache of 4 KiB file blocks with LRU replacement and a
//! write-back policy. Every byte the Riffle sorter reads or writes flows
//! through this pool; sort quality is judged as much by the pool counters
//! (`cache_hits`, `disk_reads`, `disk_writes`) as by the final ordering.
//!
//! ## Slot life cycle
//!
//! ```text
//!            open()                 get_block(b) miss
//! ┌───────┐ ───────► ┌───────┐ ──────────────────────► ┌─────────────┐
//! │ (none)│          │ EMPTY │                          │ RESIDENT(b) │
//! └───────┘          └───────┘ ◄─── failed load ─────── │ clean       │
//!                                                       └─────────────┘
//!                                          mark_dirty(b)   │       ▲
//!                                                          ▼       │ write-back
//!                                                       ┌─────────────┐
//!                                                       │ RESIDENT(b) │
//!                                                       │ dirty       │
//!                                                       └─────────────┘
//! ```
//!
//! ## Replacement policy
//!
//! On a miss the victim is the first **empty** slot (lowest index), else the
//! resident slot with the smallest LRU stamp. Stamps come from an internal
//! monotonic counter rather than a wall clock, so two accesses can never tie;
//! a strict `<` comparison still resolves any equal stamps to the lowest slot
//! index. A dirty victim is written back before its slot is reused.
//!
//! ## Borrow discipline
//!
//! [`BufferPool::get_block`] hands out a `&mut` borrow of the slot bytes that
//! ends at the next pool call. Any later call may evict the block, so callers
//! must finish with the buffer (or copy out of it) before touching the pool
//! again. The record layer above copies records to stack temporaries for
//! exactly this reason.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use thiserror::Error;

/// Size of one block (and of every pool slot) in bytes.
pub const BYTES_PER_BLOCK: usize = 4096;

/// Smallest allowed pool capacity.
pub const MIN_BUFFERS: usize = 1;

/// Largest allowed pool capacity.
pub const MAX_BUFFERS: usize = 20;

/// Errors surfaced by the buffer pool.
///
/// Every error propagates to the caller unchanged; the pool never retries
/// and never recovers silently.
#[derive(Debug, Error)]
pub enum PoolError {
    /// An underlying seek/read/write failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Pool capacity outside the supported `1..=20` range.
    #[error("buffer capacity {0} outside supported range 1..=20")]
    Capacity(usize),

    /// A block whose first byte lies at or past end-of-file.
    #[error("block {block} starts past end of file ({file_len} bytes)")]
    OutOfRange { block: u64, file_len: u64 },

    /// A block read came up short of the bytes the file length promised.
    #[error("short read of block {block}: got {got} of {expected} bytes")]
    ShortRead {
        block: u64,
        got: usize,
        expected: usize,
    },
}

/// Snapshot of the pool's I/O counters.
///
/// `cache_hits` counts [`BufferPool::get_block`] calls satisfied from memory;
/// `disk_reads` counts block loads; `disk_writes` counts write-backs,
/// including those performed by [`BufferPool::flush_all`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub cache_hits: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
}

/// One fixed buffer: a block image plus residency metadata.
struct Slot {
    /// Resident block id, or `None` for an empty slot.
    block: Option<u64>,
    bytes: Box<[u8; BYTES_PER_BLOCK]>,
    /// `true` iff `bytes` diverges from the on-disk image.
    dirty: bool,
    /// LRU stamp assigned at the most recent residency update.
    stamp: u64,
}

impl Slot {
    fn empty() -> Self {
        Self {
            block: None,
            bytes: Box::new([0u8; BYTES_PER_BLOCK]),
            dirty: false,
            stamp: 0,
        }
    }
}

/// A fixed set of block buffers over one backing file.
///
/// The pool owns the file handle exclusively for its lifetime. All state is
/// single-threaded and mutated strictly in program order: residency, dirty
/// flags, and stamps are observed by each operation exactly as the previous
/// one left them.
///
/// # Failure semantics
///
/// A failed block load leaves the victim slot empty (its previous occupant
/// was already written back); a failed write-back leaves the slot resident
/// and dirty, so the in-memory image stays authoritative.
pub struct BufferPool {
    file: File,
    /// Captured at open; the file length never changes while the pool lives.
    file_len: u64,
    slots: Vec<Slot>,
    /// Monotonic LRU clock. Incremented on every residency update or hit.
    clock: u64,
    stats: PoolStats,
}

impl BufferPool {
    /// Opens `path` read/write and allocates `capacity` empty slots.
    ///
    /// # Errors
    ///
    /// [`PoolError::Capacity`] if `capacity` is outside `1..=20`, or
    /// [`PoolError::Io`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, PoolError> {
        if !(MIN_BUFFERS..=MAX_BUFFERS).contains(&capacity) {
            return Err(PoolError::Capacity(capacity));
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let file_len = file.metadata()?.len();
        let slots = (0..capacity).map(|_| Slot::empty()).collect();
        Ok(Self {
            file,
            file_len,
            slots,
            clock: 0,
            stats: PoolStats::default(),
        })
    }

    /// Returns the in-memory image of block `block`, loading it on a miss.
    ///
    /// On a hit the slot is restamped and `cache_hits` is bumped. On a miss
    /// the victim slot (empty first, else least-recently stamped) is written
    /// back if dirty, then the block is read from disk and `disk_reads` is
    /// bumped. A read that reaches end-of-file exactly at the file length
    /// zero-fills the remainder of the buffer; any other short read is an
    /// error.
    ///
    /// The returned borrow is only valid until the next pool call, which may
    /// evict the block.
    ///
    /// # Errors
    ///
    /// [`PoolError::OutOfRange`] if the block starts at or past end-of-file,
    /// [`PoolError::ShortRead`] on a short read not aligned with EOF, or
    /// [`PoolError::Io`] on any seek/read/write failure.
    pub fn get_block(&mut self, block: u64) -> Result<&mut [u8; BYTES_PER_BLOCK], PoolError> {
        if let Some(idx) = self.resident_index(block) {
            self.stats.cache_hits += 1;
            self.slots[idx].stamp = self.tick();
            return Ok(&mut self.slots[idx].bytes);
        }

        // Reject past-end requests before disturbing any slot.
        if block * BYTES_PER_BLOCK as u64 >= self.file_len {
            return Err(PoolError::OutOfRange {
                block,
                file_len: self.file_len,
            });
        }

        let idx = self.victim_index();
        if self.slots[idx].dirty {
            self.write_back(idx)?;
        }
        // The victim is clean now; forget its occupant before the read so a
        // failed load cannot leave stale bytes advertised as resident.
        self.slots[idx].block = None;
        self.load_into(idx, block)?;
        Ok(&mut self.slots[idx].bytes)
    }

    /// Marks block `block` dirty, loading it first if it is not resident.
    ///
    /// Postcondition: the block is resident and its slot is dirty.
    pub fn mark_dirty(&mut self, block: u64) -> Result<(), PoolError> {
        if self.resident_index(block).is_none() {
            self.get_block(block)?;
        }
        if let Some(idx) = self.resident_index(block) {
            self.slots[idx].dirty = true;
        }
        Ok(())
    }

    /// Writes back every resident dirty slot, in ascending slot order.
    ///
    /// Each write-back clears the slot's dirty flag and bumps `disk_writes`.
    pub fn flush_all(&mut self) -> Result<(), PoolError> {
        for idx in 0..self.slots.len() {
            if self.slots[idx].dirty {
                self.write_back(idx)?;
            }
        }
        Ok(())
    }

    /// Flushes all dirty slots, syncs the file, and releases it.
    pub fn close(mut self) -> Result<(), PoolError> {
        self.flush_all()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Returns a snapshot of the I/O counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Returns the number of slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the backing file length in bytes, captured at open.
    #[must_use]
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Index of the slot holding `block`, if resident. At most one slot can
    /// ever hold a given block.
    fn resident_index(&self, block: u64) -> Option<usize> {
        self.slots.iter().position(|s| s.block == Some(block))
    }

    /// Picks the eviction victim: the first empty slot, else the resident
    /// slot with the smallest stamp (lowest index wins on equal stamps).
    fn victim_index(&self) -> usize {
        let mut victim = 0;
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.block.is_none() {
                return idx;
            }
            if slot.stamp < self.slots[victim].stamp {
                victim = idx;
            }
        }
        victim
    }

    /// Reads `block` from disk into slot `idx` and installs it. The caller
    /// has already checked that the block starts inside the file.
    ///
    /// Residency metadata is only updated after the read succeeds.
    fn load_into(&mut self, idx: usize, block: u64) -> Result<(), PoolError> {
        let offset = block * BYTES_PER_BLOCK as u64;

        // The last block of a file whose length is not a multiple of the
        // block size is shorter on disk; the in-memory tail is zero-filled.
        let expected = (self.file_len - offset).min(BYTES_PER_BLOCK as u64) as usize;

        self.file.seek(SeekFrom::Start(offset))?;
        let slot = &mut self.slots[idx];
        let mut got = 0;
        while got < expected {
            match self.file.read(&mut slot.bytes[got..expected]) {
                Ok(0) => break, // EOF
                Ok(n) => got += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(PoolError::Io(e)),
            }
        }
        if got < expected {
            // The file length promised more bytes than the read delivered.
            return Err(PoolError::ShortRead {
                block,
                got,
                expected,
            });
        }
        slot.bytes[expected..].fill(0);
        slot.block = Some(block);
        slot.dirty = false;

        let stamp = self.tick();
        self.slots[idx].stamp = stamp;
        self.stats.disk_reads += 1;
        Ok(())
    }

    /// Persists slot `idx` to disk and clears its dirty flag.
    ///
    /// Only the bytes that exist on disk are written, so a zero-filled EOF
    /// tail never extends the file. Empty slots are ignored.
    fn write_back(&mut self, idx: usize) -> Result<(), PoolError> {
        let block = match self.slots[idx].block {
            Some(b) => b,
            None => return Ok(()),
        };
        let offset = block * BYTES_PER_BLOCK as u64;
        let len = (self.file_len - offset).min(BYTES_PER_BLOCK as u64) as usize;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&self.slots[idx].bytes[..len])?;
        self.slots[idx].dirty = false;
        self.stats.disk_writes += 1;
        Ok(())
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.slots.len())
            .field("file_len", &self.file_len)
            .field(
                "resident",
                &self.slots.iter().filter(|s| s.block.is_some()).count(),
            )
            .field("dirty", &self.slots.iter().filter(|s| s.dirty).count())
            .field("cache_hits", &self.stats.cache_hits)
            .field("disk_reads", &self.stats.disk_reads)
            .field("disk_writes", &self.stats.disk_writes)
            .finish()
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        // Best-effort flush for pools that were not explicitly closed.
        let _ = self.flush_all();
    }
}
