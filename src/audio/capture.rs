//! PDM Capture
//!
//! The PDM peripheral fills one half of a double buffer while the other half
//! is handed to [`capture_callback`]. The task hosting the sampler runs on
//! the interrupt executor, above every thread-mode task, so the callback
//! must stay short: it copies the chunk into the mailbox and returns. No
//! logging, no serial access, no locks.

use defmt::{debug, error, info, warn, Debug2Format, Format};
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::pdm::{self, Edge, Frequency, OperationMode, Pdm, Ratio, SamplerState};
use embassy_time::Timer;
use fixed::types::I7F1;

use crate::audio::mailbox::SampleMailbox;
use crate::board::{Irqs, MicResources};
use crate::config::{AudioConfig, MAX_GAIN_DB, SAMPLE_CAPACITY, SAMPLE_RATE_HZ};
use crate::status::{HaltReason, SubsystemState, SubsystemStatus};

/// Microphone wake-up time after its supply is switched on
const MIC_STARTUP_MS: u64 = 10;

/// Hand a freshly captured chunk to the consumer.
///
/// Overwrites whatever the consumer has not drained yet. Returns the number
/// of samples now marked ready.
pub fn capture_callback<const N: usize>(mailbox: &SampleMailbox<N>, chunk: &[i16]) -> usize {
    mailbox.deposit(chunk)
}

/// PCM rates the PDM clock/ratio table can produce
pub const SUPPORTED_SAMPLE_RATES: [u32; 3] = [12_800, SAMPLE_RATE_HZ, 20_000];

/// Rate the PDM peripheral actually runs at for a requested rate.
///
/// Unsupported requests fall back to the default 16 kHz.
pub fn effective_sample_rate(requested: u32) -> u32 {
    if SUPPORTED_SAMPLE_RATES.contains(&requested) {
        requested
    } else {
        SAMPLE_RATE_HZ
    }
}

/// Translate the audio parameters into the PDM peripheral configuration
pub fn pdm_config(config: &AudioConfig) -> pdm::Config {
    let (frequency, ratio) = match effective_sample_rate(config.sample_rate_hz) {
        20_000 => (Frequency::_1280K, Ratio::RATIO64),
        12_800 => (Frequency::DEFAULT, Ratio::RATIO80),
        _ => (Frequency::_1280K, Ratio::RATIO80),
    };

    let operation_mode = if config.channels > 1 {
        OperationMode::Stereo
    } else {
        OperationMode::Mono
    };

    let gain_db = config.gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB);
    let gain = I7F1::from_num(gain_db);

    pdm::Config {
        operation_mode,
        edge: Edge::LeftFalling,
        frequency,
        ratio,
        gain_left: gain,
        gain_right: gain,
    }
}

/// Run the PDM sampler until it fails.
///
/// A sampler failure halts the audio subsystem only; the wireless
/// peripheral keeps running.
#[embassy_executor::task]
pub async fn capture_task(
    resources: MicResources,
    config: AudioConfig,
    mailbox: &'static SampleMailbox<SAMPLE_CAPACITY>,
    status: &'static SubsystemStatus,
) {
    let MicResources { pdm, clk, din, power } = resources;

    let _power = Output::new(power, Level::High, OutputDrive::Standard);
    Timer::after_millis(MIC_STARTUP_MS).await;

    let mut pdm = Pdm::new(pdm, Irqs, clk, din, pdm_config(&config));
    let mut bufs = [[0i16; SAMPLE_CAPACITY]; 2];

    let rate = effective_sample_rate(config.sample_rate_hz);
    if rate != config.sample_rate_hz {
        warn!("Unsupported sample rate {} Hz, using {} Hz", config.sample_rate_hz, rate);
    }
    info!(
        "PDM capture starting: {} Hz, {} channel(s), gain {} dB",
        rate, config.channels, config.gain_db
    );
    status.set(SubsystemState::Running);

    let result = pdm
        .run_task_sampler(&mut bufs, |chunk| {
            capture_callback(mailbox, chunk);
            SamplerState::Sampled
        })
        .await;

    let err = match result {
        Ok(()) => CaptureError::Stopped,
        Err(e) => {
            debug!("PDM error: {:?}", Debug2Format(&e));
            CaptureError::Sampler
        }
    };
    error!("Audio capture halted: {:?}", err);

    status.halt(err.halt_reason());
}

/// Why the sampler stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum CaptureError {
    /// The PDM driver refused to start or reported an error
    Sampler,
    /// The sampler returned without an error
    Stopped,
}

impl CaptureError {
    pub fn halt_reason(self) -> HaltReason {
        HaltReason::Capture
    }
}
