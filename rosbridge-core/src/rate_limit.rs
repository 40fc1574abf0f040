//! Rate-limited outgoing byte buffer.
//!
//! Messages are appended whole. A flush releases at most one chunk, and
//! chunks are spaced at least `1 s / max_chunks_per_second` apart, measured
//! from the last chunk written even if that chunk emptied the buffer. Only
//! the first flush after startup or [`reset`](OutgoingBuffer::reset) is
//! immediate.

use heapless::Vec;

use crate::config::LinkConfig;

/// Capacity of the outgoing buffer.
pub const OUTGOING_BUFFER_LEN: usize = 2048;

/// A message did not fit and was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferFull {
    /// Size of the rejected message.
    pub needed: usize,
    /// Free bytes at the time.
    pub available: usize,
}

pub struct OutgoingBuffer<const N: usize = OUTGOING_BUFFER_LEN> {
    buf: Vec<u8, N>,
    max_chunk: usize,
    min_interval_us: Option<u64>,
    last_flush_us: Option<u64>,
}

impl<const N: usize> OutgoingBuffer<N> {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            buf: Vec::new(),
            max_chunk: config.max_bytes_per_chunk as usize,
            min_interval_us: config.min_chunk_interval_us(),
            last_flush_us: None,
        }
    }

    /// Discard pending bytes and the flush history.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.last_flush_us = None;
    }

    /// Append the concatenation of `parts` as one message.
    ///
    /// Either every byte is queued or none is.
    pub fn enqueue(&mut self, parts: &[&[u8]]) -> Result<(), BufferFull> {
        let needed: usize = parts.iter().map(|p| p.len()).sum();
        let available = N - self.buf.len();
        if needed > available {
            return Err(BufferFull { needed, available });
        }
        for part in parts {
            // Cannot fail: room checked above
            let _ = self.buf.extend_from_slice(part);
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn available(&self) -> usize {
        N - self.buf.len()
    }

    /// The bytes a flush at `now_us` may write, if any.
    ///
    /// Call [`consume`](Self::consume) with the chunk length once written.
    pub fn ready_chunk(&self, now_us: u64) -> Option<&[u8]> {
        if self.buf.is_empty() {
            return None;
        }
        let Some(interval) = self.min_interval_us else {
            return Some(&self.buf[..]);
        };
        if let Some(last) = self.last_flush_us {
            if now_us.saturating_sub(last) < interval {
                return None;
            }
        }
        let len = self.buf.len().min(self.max_chunk);
        Some(&self.buf[..len])
    }

    /// Remove the first `n` bytes after a flush at `now_us`.
    pub fn consume(&mut self, n: usize, now_us: u64) {
        let n = n.min(self.buf.len());
        if n == 0 {
            return;
        }
        self.buf.copy_within(n.., 0);
        self.buf.truncate(self.buf.len() - n);
        self.last_flush_us = Some(now_us);
    }
}
