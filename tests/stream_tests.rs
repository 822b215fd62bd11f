//! Capture loop tests against a mock serial sink
//!
//! These tests run on the target hardware using defmt-test

#![no_std]
#![no_main]

mod common;

use core::cell::Cell;

use embassy_futures::block_on;
use embassy_futures::select::{select3, Either3};
use embassy_time::{Duration, Timer};
use nano_sense_firmware::audio::capture::capture_callback;
use nano_sense_firmware::audio::mailbox::AudioMailbox;
use nano_sense_firmware::audio::stream::{CaptureLoop, Drain, SampleSink};
use nano_sense_firmware::config::{FRAME_BYTES, SAMPLE_CAPACITY};

/// Records every frame it receives, optionally failing each write
struct MockSink {
    writes: usize,
    last_len: usize,
    last_frame: [u8; FRAME_BYTES],
    fail: bool,
}

impl MockSink {
    fn new() -> Self {
        Self {
            writes: 0,
            last_len: 0,
            last_frame: [0; FRAME_BYTES],
            fail: false,
        }
    }

    fn failing() -> Self {
        Self { fail: true, ..Self::new() }
    }
}

impl SampleSink for MockSink {
    type Error = ();

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.writes += 1;
        self.last_len = frame.len();
        self.last_frame[..frame.len()].copy_from_slice(frame);
        if self.fail {
            Err(())
        } else {
            Ok(())
        }
    }
}

const QUANTUM: Duration = Duration::from_millis(1);

#[defmt_test::tests]
mod tests {
    use defmt::{assert, assert_eq};

    use super::*;
    use crate::common::*;

    #[init]
    fn init() {
        // Time driver for the run() tests
        let _ = embassy_nrf::init(Default::default());
    }

    #[test]
    fn test_idle_when_nothing_ready() {
        let mailbox = AudioMailbox::new();
        let mut stream = CaptureLoop::new(&mailbox, MockSink::new(), QUANTUM);

        assert_eq!(block_on(stream.poll_once()), Drain::Idle);
        assert_eq!(stream.sink().writes, 0);
    }

    #[test]
    fn test_ready_frame_written_once() {
        let mailbox = AudioMailbox::new();
        let mut stream = CaptureLoop::new(&mailbox, MockSink::new(), QUANTUM);

        capture_callback(&mailbox, &ramp::<SAMPLE_CAPACITY>(-256));

        assert_eq!(block_on(stream.poll_once()), Drain::Emitted);
        assert_eq!(block_on(stream.poll_once()), Drain::Idle);

        assert_eq!(stream.sink().writes, 1);
        assert_eq!(stream.frames_sent(), 1);
        assert_eq!(mailbox.ready(), 0);
    }

    #[test]
    fn test_frame_is_exactly_1024_raw_bytes() {
        let mailbox = AudioMailbox::new();
        let mut stream = CaptureLoop::new(&mailbox, MockSink::new(), QUANTUM);

        capture_callback(&mailbox, &ramp::<SAMPLE_CAPACITY>(1000));
        block_on(stream.poll_once());

        let sink = stream.sink();
        assert_eq!(sink.last_len, 1024);
        assert_eq!(frame_sample(&sink.last_frame, 0), 1000);
        assert_eq!(frame_sample(&sink.last_frame, 511), 1511);
    }

    #[test]
    fn test_partial_chunk_still_emits_full_frame() {
        let mailbox = AudioMailbox::new();
        let mut stream = CaptureLoop::new(&mailbox, MockSink::new(), QUANTUM);

        capture_callback(&mailbox, &[7i16; 10]);
        block_on(stream.poll_once());

        assert_eq!(stream.sink().last_len, FRAME_BYTES);
        assert_eq!(frame_sample(&stream.sink().last_frame, 9), 7);
    }

    #[test]
    fn test_write_error_still_resets_ready() {
        let mailbox = AudioMailbox::new();
        let mut stream = CaptureLoop::new(&mailbox, MockSink::failing(), QUANTUM);

        capture_callback(&mailbox, &[1i16; SAMPLE_CAPACITY]);

        assert_eq!(block_on(stream.poll_once()), Drain::Emitted);
        assert_eq!(mailbox.ready(), 0);
        assert_eq!(stream.write_failures(), 1);
        assert_eq!(stream.frames_sent(), 0);

        // No retry of the dropped frame
        assert_eq!(block_on(stream.poll_once()), Drain::Idle);
        assert_eq!(stream.sink().writes, 1);
    }

    #[test]
    fn test_one_write_per_deposit() {
        let mailbox = AudioMailbox::new();
        let mut stream = CaptureLoop::new(&mailbox, MockSink::new(), QUANTUM);

        for round in 0..5i16 {
            capture_callback(&mailbox, &[round; SAMPLE_CAPACITY]);
            assert_eq!(block_on(stream.poll_once()), Drain::Emitted);
            assert_eq!(frame_sample(&stream.sink().last_frame, 0), round);
        }

        assert_eq!(stream.sink().writes, 5);
        assert!(mailbox.overruns() == 0);
    }

    #[test]
    fn test_overrun_emits_only_newest() {
        let mailbox = AudioMailbox::new();
        let mut stream = CaptureLoop::new(&mailbox, MockSink::new(), QUANTUM);

        capture_callback(&mailbox, &[1i16; SAMPLE_CAPACITY]);
        capture_callback(&mailbox, &[2i16; SAMPLE_CAPACITY]);

        block_on(stream.poll_once());
        block_on(stream.poll_once());

        assert_eq!(stream.sink().writes, 1);
        assert_eq!(frame_sample(&stream.sink().last_frame, 0), 2);
        assert_eq!(mailbox.overruns(), 1);
    }

    #[test]
    fn test_run_emits_deposit_made_while_idle() {
        let mailbox = AudioMailbox::new();
        let mut stream = CaptureLoop::new(&mailbox, MockSink::new(), QUANTUM);
        let other_polls = Cell::new(0u32);

        let producer = async {
            // Several idle quanta pass before the deposit
            Timer::after_millis(5).await;
            capture_callback(&mailbox, &[42i16; SAMPLE_CAPACITY]);
            Timer::after_millis(5).await;
        };
        let other = async {
            loop {
                other_polls.set(other_polls.get() + 1);
                Timer::after_micros(250).await;
            }
        };

        let outcome = block_on(select3(stream.run(), producer, other));
        assert!(matches!(outcome, Either3::Second(_)));

        assert_eq!(stream.sink().writes, 1);
        assert_eq!(frame_sample(&stream.sink().last_frame, 0), 42);
        assert_eq!(mailbox.ready(), 0);
        // The idle sleep hands the CPU to other work
        assert!(other_polls.get() > 10);
    }

    #[test]
    fn test_run_with_longer_quantum_still_drains() {
        let mailbox = AudioMailbox::new();
        let mut stream = CaptureLoop::new(&mailbox, MockSink::new(), Duration::from_millis(4));

        let producer = async {
            Timer::after_millis(3).await;
            capture_callback(&mailbox, &[7i16; SAMPLE_CAPACITY]);
            Timer::after_millis(3).await;
            capture_callback(&mailbox, &[8i16; SAMPLE_CAPACITY]);
            Timer::after_millis(12).await;
        };

        let outcome = block_on(select3(stream.run(), producer, core::future::pending::<()>()));
        assert!(matches!(outcome, Either3::Second(_)));

        // Both deposits land in separate quanta, the newest is on the wire last
        assert_eq!(stream.sink().writes, 2);
        assert_eq!(frame_sample(&stream.sink().last_frame, 0), 8);
        assert_eq!(mailbox.ready(), 0);
    }

    #[test]
    fn test_run_without_deposits_never_writes() {
        let mailbox = AudioMailbox::new();
        let mut stream = CaptureLoop::new(&mailbox, MockSink::new(), QUANTUM);

        let outcome = block_on(select3(stream.run(), Timer::after_millis(10), core::future::pending::<()>()));
        assert!(matches!(outcome, Either3::Second(_)));

        assert_eq!(stream.sink().writes, 0);
        assert_eq!(stream.frames_sent(), 0);
    }
}
