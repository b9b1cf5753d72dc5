use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Error, Result};

/// Source of zero-initialized byte regions for column buffers.
///
/// Implementations decide how memory is accounted for. Returned buffers give
/// their bytes back when dropped.
pub trait BufferAllocator: Send + Sync {
    fn buffer(&self, len: usize) -> Result<Buffer>;

    /// Upper bound on outstanding bytes, if the allocator has one.
    fn limit(&self) -> usize {
        usize::MAX
    }
}

#[derive(Debug)]
struct Ledger {
    limit: usize,
    allocated: AtomicUsize,
}

impl Ledger {
    fn try_acquire(&self, len: usize) -> Result<()> {
        let mut current = self.allocated.load(Ordering::Relaxed);
        loop {
            let next = current
                .checked_add(len)
                .filter(|&n| n <= self.limit)
                .ok_or(Error::AllocationFailure {
                    requested: len,
                    limit: self.limit,
                })?;
            match self.allocated.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self, len: usize) {
        self.allocated.fetch_sub(len, Ordering::AcqRel);
    }
}

/// Allocator with a hard cap on the number of outstanding bytes.
///
/// Clones share the same ledger.
#[derive(Debug, Clone)]
pub struct RootAllocator {
    ledger: Arc<Ledger>,
}

impl RootAllocator {
    pub fn new(limit: usize) -> Self {
        Self {
            ledger: Arc::new(Ledger {
                limit,
                allocated: AtomicUsize::new(0),
            }),
        }
    }

    pub fn limit(&self) -> usize {
        self.ledger.limit
    }

    pub fn allocated_bytes(&self) -> usize {
        self.ledger.allocated.load(Ordering::Acquire)
    }
}

impl Default for RootAllocator {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl BufferAllocator for RootAllocator {
    fn limit(&self) -> usize {
        self.ledger.limit
    }

    fn buffer(&self, len: usize) -> Result<Buffer> {
        if let Err(err) = self.ledger.try_acquire(len) {
            log::warn!(
                "allocation of {len} bytes refused: {} of {} bytes in use",
                self.allocated_bytes(),
                self.ledger.limit
            );
            return Err(err);
        }
        let mut bytes = Vec::new();
        if bytes.try_reserve_exact(len).is_err() {
            self.ledger.release(len);
            return Err(Error::AllocationFailure {
                requested: len,
                limit: self.ledger.limit,
            });
        }
        bytes.resize(len, 0);
        Ok(Buffer {
            bytes,
            charged: len,
            ledger: Some(Arc::clone(&self.ledger)),
        })
    }
}

/// Owned, fixed-length byte region.
#[derive(Debug)]
pub struct Buffer {
    bytes: Vec<u8>,
    charged: usize,
    ledger: Option<Arc<Ledger>>,
}

impl Buffer {
    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Wraps caller-owned bytes. The result is not charged to any allocator.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            charged: 0,
            ledger: None,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.bytes.as_mut_slice()
    }

    pub fn set_bytes(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(src.len())
            .ok_or_else(|| Error::Other("size overflow".to_string()))?;
        if end > self.bytes.len() {
            return Err(Error::IndexOutOfBounds {
                index: end,
                bound: self.bytes.len(),
            });
        }
        self.bytes[offset..end].copy_from_slice(src);
        Ok(())
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(ledger) = self.ledger.take() {
            ledger.release(self.charged);
        }
    }
}
