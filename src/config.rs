//! Build-Time Configuration
//!
//! Every parameter of the firmware is fixed at compile time. The constants
//! are grouped into [`AudioConfig`] and [`PeripheralConfig`] so that tests
//! can construct variants without touching the defaults.

use embassy_time::Duration;

/// Samples held by the capture mailbox
pub const SAMPLE_CAPACITY: usize = 512;

/// Bytes per sample (16-bit signed PCM)
pub const BYTES_PER_SAMPLE: usize = 2;

/// Bytes emitted on the serial link per frame
pub const FRAME_BYTES: usize = SAMPLE_CAPACITY * BYTES_PER_SAMPLE;

/// PCM output rate of the microphone path
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Number of audio channels (mono)
pub const CHANNELS: u8 = 1;

/// PDM gain in dB. +20 dB is the ceiling of the nRF52840 PDM peripheral.
pub const MAX_GAIN_DB: f32 = 20.0;

/// Serial link baudrate in bits per second
pub const SERIAL_BAUD: u32 = 1_000_000;

/// Idle sleep of the capture loop when no frame is pending
pub const YIELD_QUANTUM: Duration = Duration::from_millis(1);

/// Advertised local name
pub const DEVICE_NAME: &str = "Humidity monitor";

/// Environmental Sensing service
pub const ENVIRONMENTAL_SENSING_UUID: u16 = 0x181A;

/// Humidity characteristic
pub const HUMIDITY_CHAR_UUID: u16 = 0x2A6F;

/// Characteristic User Description descriptor
pub const USER_DESCRIPTION_UUID: u16 = 0x2901;

/// Text carried by the user description descriptor
pub const HUMIDITY_DESCRIPTION: &str = "Humidity";

/// Sensor poll period while a central is connected
pub const HUMIDITY_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Minimum absolute change (in %RH) that triggers a notification
pub const HUMIDITY_THRESHOLD: f32 = 1.0;

/// Scale applied before truncating a reading to an integer
pub const HUMIDITY_SCALE: f32 = 100.0;

/// Pause before re-advertising after an advertising error
pub const ADVERTISE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Period of the status heartbeat log
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Audio path parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioConfig {
    pub sample_rate_hz: u32,
    pub channels: u8,
    pub gain_db: f32,
    /// Scheduling quantum handed to lower-priority work when idle.
    ///
    /// Whether it is long enough for the peripheral task to make progress
    /// depends on the executor load, so it stays tunable.
    pub yield_quantum: Duration,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: SAMPLE_RATE_HZ,
            channels: CHANNELS,
            gain_db: MAX_GAIN_DB,
            yield_quantum: YIELD_QUANTUM,
        }
    }
}

/// Wireless peripheral parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeripheralConfig {
    pub device_name: &'static str,
    pub service_uuid: u16,
    pub characteristic_uuid: u16,
    pub description: &'static str,
    pub poll_interval: Duration,
    pub threshold: f32,
    pub advertise_retry: Duration,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME,
            service_uuid: ENVIRONMENTAL_SENSING_UUID,
            characteristic_uuid: HUMIDITY_CHAR_UUID,
            description: HUMIDITY_DESCRIPTION,
            poll_interval: HUMIDITY_POLL_INTERVAL,
            threshold: HUMIDITY_THRESHOLD,
            advertise_retry: ADVERTISE_RETRY_DELAY,
        }
    }
}
