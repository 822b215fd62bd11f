//! Single-Slot Sample Mailbox
//!
//! Handoff between the capture callback (interrupt priority) and the
//! capture loop (thread mode). There is exactly one writer and one reader.
//!
//! The mailbox holds one frame. A deposit made before the reader drained
//! the previous one overwrites it: under overrun the newest audio wins and
//! the older frame is lost. The reader may even observe a frame that is
//! being overwritten while it copies it out. Both outcomes are accepted
//! data loss for a continuous stream; nothing queues and nothing signals.
//!
//! Samples live in atomic cells so a torn frame is well defined. The ready
//! count is published with release ordering after the samples are stored
//! and read with acquire ordering before they are loaded.

use core::sync::atomic::{AtomicI16, AtomicU32, AtomicUsize, Ordering};

use crate::config::{BYTES_PER_SAMPLE, SAMPLE_CAPACITY};

/// Mailbox sized for the reference capture chunk
pub type AudioMailbox = SampleMailbox<SAMPLE_CAPACITY>;

/// Fixed-capacity sample buffer plus ready count
pub struct SampleMailbox<const N: usize = SAMPLE_CAPACITY> {
    samples: [AtomicI16; N],
    ready: AtomicUsize,
    overruns: AtomicU32,
}

impl<const N: usize> SampleMailbox<N> {
    pub const fn new() -> Self {
        Self {
            samples: [const { AtomicI16::new(0) }; N],
            ready: AtomicUsize::new(0),
            overruns: AtomicU32::new(0),
        }
    }

    /// Number of samples the mailbox holds
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Frame length in bytes when the whole buffer is emitted
    pub const fn frame_len(&self) -> usize {
        N * BYTES_PER_SAMPLE
    }

    /// Store a chunk and publish its sample count.
    ///
    /// Never blocks. Chunks longer than the capacity are truncated to it.
    /// Returns the number of samples stored.
    pub fn deposit(&self, chunk: &[i16]) -> usize {
        let count = chunk.len().min(N);

        for (cell, sample) in self.samples.iter().zip(&chunk[..count]) {
            cell.store(*sample, Ordering::Relaxed);
        }

        if self.ready.swap(count, Ordering::AcqRel) != 0 {
            let _ = self.overruns.fetch_add(1, Ordering::Relaxed);
        }

        count
    }

    /// Samples published by the last deposit, zero once drained
    pub fn ready(&self) -> usize {
        self.ready.load(Ordering::Acquire)
    }

    /// Read one sample
    pub fn sample(&self, index: usize) -> Option<i16> {
        self.samples.get(index).map(|cell| cell.load(Ordering::Relaxed))
    }

    /// Encode the whole buffer as little-endian PCM into `frame`.
    ///
    /// Returns the number of bytes written, `min(frame.len(), frame_len())`
    /// rounded down to whole samples.
    pub fn snapshot_into(&self, frame: &mut [u8]) -> usize {
        let mut written = 0;
        for (bytes, cell) in frame.chunks_exact_mut(BYTES_PER_SAMPLE).zip(self.samples.iter()) {
            bytes.copy_from_slice(&cell.load(Ordering::Relaxed).to_le_bytes());
            written += BYTES_PER_SAMPLE;
        }
        written
    }

    /// Mark the current frame as consumed
    pub fn clear(&self) {
        self.ready.store(0, Ordering::Release);
    }

    /// Deposits that replaced a frame the reader never drained
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for SampleMailbox<N> {
    fn default() -> Self {
        Self::new()
    }
}
