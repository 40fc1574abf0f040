//! Delimiter framing for streaming links.

/// Largest frame body the accumulator holds, delimiter excluded.
pub const MAX_FRAME_LEN: usize = 512;

/// The result of pushing one byte.
#[derive(Debug, PartialEq, Eq)]
pub enum FeedResult<'buf> {
    /// Byte stored (or discarded while overflowing), frame still open.
    Consumed,
    /// Delimiter seen. Holds the frame body, delimiter stripped.
    Frame(&'buf [u8]),
    /// Delimiter seen after an overflow. The frame was lost.
    Overflowed,
}

/// Splits a byte stream into delimiter-terminated frames.
///
/// A frame that outgrows the buffer is discarded up to and including its
/// delimiter; the next frame is read normally. Zero-length frames are
/// reported like any other.
pub struct FrameAccumulator<const N: usize = MAX_FRAME_LEN> {
    buf: [u8; N],
    idx: usize,
    delimiter: u8,
    in_overflow: bool,
}

impl<const N: usize> FrameAccumulator<N> {
    pub const fn new(delimiter: u8) -> Self {
        Self {
            buf: [0; N],
            idx: 0,
            delimiter,
            in_overflow: false,
        }
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.idx = 0;
        self.in_overflow = false;
    }

    /// Bytes of the frame currently being assembled.
    #[inline]
    pub fn pending(&self) -> usize {
        self.idx
    }

    #[inline]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Feed one byte.
    pub fn push(&mut self, byte: u8) -> FeedResult<'_> {
        if byte == self.delimiter {
            let len = core::mem::replace(&mut self.idx, 0);
            if core::mem::replace(&mut self.in_overflow, false) {
                return FeedResult::Overflowed;
            }
            return FeedResult::Frame(&self.buf[..len]);
        }

        if self.in_overflow {
            return FeedResult::Consumed;
        }
        if self.idx == N {
            self.in_overflow = true;
            self.idx = 0;
            return FeedResult::Consumed;
        }
        self.buf[self.idx] = byte;
        self.idx += 1;
        FeedResult::Consumed
    }
}
