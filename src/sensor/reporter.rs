//! Humidity Reporting Policy
//!
//! A reading reaches the central only when it moved at least the threshold
//! away from the last value sent. Small sensor noise is suppressed, which
//! also means the central may hold a stale value until the change is large
//! enough.
//!
//! On the air the value is `trunc(percent * 100)` as an unsigned 32-bit
//! little-endian integer: two decimals carried as a whole number.

use defmt::{debug, warn, Debug2Format};

use super::HumiditySensor;
use crate::config::HUMIDITY_SCALE;

/// Scale and truncate a reading. Negative or NaN input encodes as 0.
pub fn encode_humidity(percent: f32) -> u32 {
    (percent * HUMIDITY_SCALE) as u32
}

/// Characteristic payload for an encoded value
pub fn humidity_payload(encoded: u32) -> [u8; 4] {
    encoded.to_le_bytes()
}

/// Hysteresis on the last value sent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumidityReporter {
    last_sent: f32,
    threshold: f32,
}

impl HumidityReporter {
    pub const fn new(threshold: f32) -> Self {
        Self {
            last_sent: 0.0,
            threshold,
        }
    }

    /// Decide whether `reading` must be pushed.
    ///
    /// Returns the encoded value and records it as last sent when
    /// `|reading - last_sent| >= threshold`.
    pub fn evaluate(&mut self, reading: f32) -> Option<u32> {
        let delta = reading - self.last_sent;
        let magnitude = if delta < 0.0 { -delta } else { delta };

        if magnitude >= self.threshold {
            self.last_sent = reading;
            Some(encode_humidity(reading))
        } else {
            None
        }
    }

    pub fn last_sent(&self) -> f32 {
        self.last_sent
    }
}

/// Reads the sensor and applies the reporting policy
pub struct HumidityPoller<S: HumiditySensor> {
    sensor: S,
    reporter: HumidityReporter,
}

impl<S: HumiditySensor> HumidityPoller<S> {
    pub fn new(sensor: S, threshold: f32) -> Self {
        Self {
            sensor,
            reporter: HumidityReporter::new(threshold),
        }
    }

    /// One poll period: read, compare, maybe return a value to notify.
    ///
    /// A failed read is logged and skipped.
    pub async fn tick(&mut self) -> Option<u32> {
        match self.sensor.read_humidity().await {
            Ok(reading) => {
                let update = self.reporter.evaluate(reading);
                if let Some(value) = update {
                    debug!("Humidity {} %RH -> notify {}", reading, value);
                }
                update
            }
            Err(e) => {
                warn!("Failed to read humidity: {:?}", Debug2Format(&e));
                None
            }
        }
    }

    pub fn reporter(&self) -> &HumidityReporter {
        &self.reporter
    }
}
