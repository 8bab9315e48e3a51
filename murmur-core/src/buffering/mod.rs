//! Frame reassembly: arbitrary byte chunks in, fixed-size analysis frames out.
//!
//! Capture loops hand over whatever the device produced (3000 bytes, 3117
//! bytes, a single byte). Classifiers need exactly `frame_bytes` every time.
//! `FrameReassembler` bridges the two by carrying the remainder across calls,
//! so splitting the same stream differently never changes the frames seen.

pub mod frame;

use frame::AudioFrame;

/// Accumulates PCM bytes and slices them into frames of a constant size.
#[derive(Debug, Clone)]
pub struct FrameReassembler {
    frame_bytes: usize,
    sample_rate: u32,
    /// Bytes received but not yet emitted as part of a frame.
    carry: Vec<u8>,
}

impl FrameReassembler {
    /// `frame_bytes` must be a positive even number; detectors validate this
    /// through their config before building a reassembler.
    pub fn new(frame_bytes: usize, sample_rate: u32) -> Self {
        debug_assert!(frame_bytes > 0 && frame_bytes % 2 == 0);
        Self {
            frame_bytes,
            sample_rate,
            carry: Vec::with_capacity(frame_bytes * 2),
        }
    }

    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }

    /// Bytes currently held back waiting for a complete frame.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Append `chunk` and return the complete frames now available.
    ///
    /// Frames are decoded lazily. If the iterator is dropped before it is
    /// exhausted, the unconsumed frames stay buffered and come out first on
    /// the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Frames<'_> {
        self.carry.extend_from_slice(chunk);
        Frames {
            carry: &mut self.carry,
            frame_bytes: self.frame_bytes,
            sample_rate: self.sample_rate,
            consumed: 0,
        }
    }

    /// Drop any buffered remainder.
    pub fn clear(&mut self) {
        self.carry.clear();
    }
}

/// Iterator over the complete frames produced by one [`FrameReassembler::feed`].
pub struct Frames<'a> {
    carry: &'a mut Vec<u8>,
    frame_bytes: usize,
    sample_rate: u32,
    consumed: usize,
}

impl Iterator for Frames<'_> {
    type Item = AudioFrame;

    fn next(&mut self) -> Option<AudioFrame> {
        let end = self.consumed + self.frame_bytes;
        if end > self.carry.len() {
            return None;
        }
        let frame = AudioFrame::from_le_bytes(&self.carry[self.consumed..end], self.sample_rate);
        self.consumed = end;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.carry.len() - self.consumed) / self.frame_bytes;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Frames<'_> {}

impl Drop for Frames<'_> {
    fn drop(&mut self) {
        self.carry.drain(..self.consumed);
    }
}
