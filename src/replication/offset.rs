use std::sync::atomic::{AtomicU64, Ordering};

/// Byte count of the replication stream.
///
/// On a master it grows by the size of every propagated command; on a
/// replica it grows by the size of every command applied from the master.
#[derive(Debug, Default)]
pub struct OffsetTracker {
    bytes: AtomicU64,
}

impl OffsetTracker {
    pub fn new(start: u64) -> Self {
        Self {
            bytes: AtomicU64::new(start),
        }
    }

    pub fn get(&self) -> u64 {
        self.bytes.load(Ordering::SeqCst)
    }

    /// Adds `bytes` and returns the new offset.
    pub fn advance(&self, bytes: usize) -> u64 {
        self.bytes.fetch_add(bytes as u64, Ordering::SeqCst) + bytes as u64
    }

    pub fn reset(&self, offset: u64) {
        self.bytes.store(offset, Ordering::SeqCst);
    }
}
