//! Capture Loop
//!
//! Thread-mode consumer of the sample mailbox. Whenever a frame is ready it
//! is written to the serial link as raw little-endian PCM (no header, no
//! framing) and the mailbox is cleared. When nothing is ready the loop
//! sleeps for one scheduling quantum so lower-priority tasks get to run.
//!
//! The serial link belongs to this loop alone. No other task may write to
//! it; this is a convention of the firmware and is not enforced.

use defmt::{debug, info, Format};
use embassy_nrf::uarte::{self, UarteTx};
use embassy_time::{Duration, Timer};

use crate::audio::mailbox::AudioMailbox;
use crate::config::FRAME_BYTES;

/// Destination of encoded audio frames
#[allow(async_fn_in_trait)]
pub trait SampleSink {
    type Error;

    /// Write one frame. Delivery is best effort.
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error>;
}

impl SampleSink for UarteTx<'_> {
    type Error = uarte::Error;

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.write(frame).await
    }
}

/// Result of one mailbox check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Drain {
    /// A frame was written (or the write was attempted and dropped)
    Emitted,
    /// Nothing was pending
    Idle,
}

/// Serial streaming loop
pub struct CaptureLoop<'a, S: SampleSink> {
    mailbox: &'a AudioMailbox,
    sink: S,
    frame: [u8; FRAME_BYTES],
    yield_quantum: Duration,
    frames_sent: u32,
    write_failures: u32,
}

impl<'a, S: SampleSink> CaptureLoop<'a, S> {
    pub fn new(mailbox: &'a AudioMailbox, sink: S, yield_quantum: Duration) -> Self {
        Self {
            mailbox,
            sink,
            frame: [0; FRAME_BYTES],
            yield_quantum,
            frames_sent: 0,
            write_failures: 0,
        }
    }

    /// Check the mailbox once without sleeping.
    ///
    /// A non-zero ready count produces exactly one write of the full frame,
    /// after which the ready count is reset to zero whatever the write
    /// outcome.
    pub async fn poll_once(&mut self) -> Drain {
        if self.mailbox.ready() == 0 {
            return Drain::Idle;
        }

        let len = self.mailbox.snapshot_into(&mut self.frame);
        match self.sink.write_frame(&self.frame[..len]).await {
            Ok(()) => self.frames_sent = self.frames_sent.wrapping_add(1),
            Err(_) => {
                self.write_failures = self.write_failures.wrapping_add(1);
                debug!("Serial write dropped ({} so far)", self.write_failures);
            }
        }
        self.mailbox.clear();

        Drain::Emitted
    }

    /// Stream forever
    pub async fn run(&mut self) -> ! {
        info!("Capture loop running, quantum {} us", self.yield_quantum.as_micros());
        loop {
            if self.poll_once().await == Drain::Idle {
                Timer::after(self.yield_quantum).await;
            }
        }
    }

    /// Frames handed to the sink without error
    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    /// Frames whose write reported an error
    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }

    /// Access the sink (used by tests to inspect mock output)
    pub fn sink(&self) -> &S {
        &self.sink
    }
}
