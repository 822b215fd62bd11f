//! PDM configuration and capture error tests
//!
//! These tests run on the target hardware using defmt-test

#![no_std]
#![no_main]

mod common;

use embassy_nrf::pdm::OperationMode;
use fixed::types::I7F1;
use nano_sense_firmware::audio::capture::{effective_sample_rate, pdm_config, CaptureError, SUPPORTED_SAMPLE_RATES};
use nano_sense_firmware::config::AudioConfig;
use nano_sense_firmware::status::HaltReason;

#[defmt_test::tests]
mod tests {
    use defmt::{assert, assert_eq};

    use super::*;

    #[test]
    fn test_default_is_mono_at_max_gain() {
        let config = pdm_config(&AudioConfig::default());

        assert!(matches!(config.operation_mode, OperationMode::Mono));
        assert!(config.gain_left == I7F1::from_num(20));
        assert!(config.gain_right == I7F1::from_num(20));
    }

    #[test]
    fn test_gain_is_clamped() {
        let loud = AudioConfig {
            gain_db: 35.0,
            ..AudioConfig::default()
        };
        let quiet = AudioConfig {
            gain_db: -40.0,
            ..AudioConfig::default()
        };

        assert!(pdm_config(&loud).gain_left == I7F1::from_num(20));
        assert!(pdm_config(&quiet).gain_left == I7F1::from_num(-20));
    }

    #[test]
    fn test_half_db_gain_steps() {
        let config = AudioConfig {
            gain_db: 3.5,
            ..AudioConfig::default()
        };

        assert!(pdm_config(&config).gain_left == I7F1::from_num(3.5));
    }

    #[test]
    fn test_two_channels_select_stereo() {
        let config = AudioConfig {
            channels: 2,
            ..AudioConfig::default()
        };

        assert!(matches!(pdm_config(&config).operation_mode, OperationMode::Stereo));
    }

    #[test]
    fn test_capture_errors_halt_capture() {
        assert_eq!(CaptureError::Sampler.halt_reason(), HaltReason::Capture);
        assert_eq!(CaptureError::Stopped.halt_reason(), HaltReason::Capture);
    }

    #[test]
    fn test_supported_rates_are_kept() {
        for rate in SUPPORTED_SAMPLE_RATES {
            assert_eq!(effective_sample_rate(rate), rate);
        }
    }

    #[test]
    fn test_unsupported_rate_falls_back_to_16k() {
        assert_eq!(effective_sample_rate(44_100), 16_000);
        assert_eq!(effective_sample_rate(0), 16_000);
    }
}
