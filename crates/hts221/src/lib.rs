#![no_std]

//! Driver for the ST HTS221 relative humidity sensor
//!
//! One-shot mode only: the device identity is checked and its factory
//! calibration loaded at construction, then every
//! [`Hts221::read_humidity`] call triggers one conversion.
//! Temperature output is not used.

pub mod ll;
pub use ll::reg;

use embedded_hal_async::{delay, i2c};
use ll::DeviceInterface;

/// Fixed 7-bit bus address
pub const ADDRESS: u8 = ll::ADDR;

/// Expected WHO_AM_I value
pub const DEVICE_ID: u8 = 0xBC;

const CTRL1_POWER_ON: u8 = 0x80;
const CTRL1_BLOCK_DATA_UPDATE: u8 = 0x04;
const CTRL2_ONE_SHOT: u8 = 0x01;
const STATUS_HUMIDITY_READY: u8 = 0x02;

// Conversion poll budget: 20 x 5 ms
const CONVERSION_POLLS: u8 = 20;
const CONVERSION_POLL_MS: u32 = 5;

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus transaction failed
    Bus(E),
    /// WHO_AM_I did not match [`DEVICE_ID`]
    WrongDevice(u8),
    /// Both calibration points report the same raw output
    InvalidCalibration,
    /// Conversion did not complete within the poll budget
    Timeout,
}

/// Factory calibration points for humidity
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    h0_rh: f32,
    h1_rh: f32,
    h0_out: i16,
    h1_out: i16,
}

impl Calibration {
    /// Build from raw register contents. `H*_rH_x2` registers hold twice the
    /// relative humidity of each calibration point.
    pub fn from_registers(h0_rh_x2: u8, h1_rh_x2: u8, h0_out: i16, h1_out: i16) -> Option<Self> {
        if h0_out == h1_out {
            return None;
        }

        Some(Self {
            h0_rh: f32::from(h0_rh_x2) / 2.0,
            h1_rh: f32::from(h1_rh_x2) / 2.0,
            h0_out,
            h1_out,
        })
    }

    /// Linear interpolation between the calibration points, clamped to 0..=100 %RH
    pub fn humidity(&self, raw: i16) -> f32 {
        let span = f32::from(self.h1_out) - f32::from(self.h0_out);
        let offset = f32::from(raw) - f32::from(self.h0_out);
        let rh = self.h0_rh + (self.h1_rh - self.h0_rh) * offset / span;
        rh.clamp(0.0, 100.0)
    }
}

pub struct Hts221<I2C: i2c::I2c, D: delay::DelayNs> {
    iface: DeviceInterface<I2C>,
    delay: D,
    calibration: Calibration,
}

impl<I2C: i2c::I2c, D: delay::DelayNs> Hts221<I2C, D> {
    /// Check the device identity, power it up and load its calibration
    pub async fn new(i2c: I2C, delay: D) -> Result<Self, Error<I2C::Error>> {
        let mut iface = DeviceInterface::new(i2c);

        let id = iface.read_u8(reg::WHO_AM_I).await.map_err(Error::Bus)?;
        if id != DEVICE_ID {
            return Err(Error::WrongDevice(id));
        }

        // One-shot mode (ODR = 0) with block data update
        iface
            .write_u8(reg::CTRL_REG1, CTRL1_POWER_ON | CTRL1_BLOCK_DATA_UPDATE)
            .await
            .map_err(Error::Bus)?;

        let h0_rh_x2 = iface.read_u8(reg::H0_RH_X2).await.map_err(Error::Bus)?;
        let h1_rh_x2 = iface.read_u8(reg::H1_RH_X2).await.map_err(Error::Bus)?;
        let h0_out = iface.read_i16(reg::H0_T0_OUT_L).await.map_err(Error::Bus)?;
        let h1_out = iface.read_i16(reg::H1_T0_OUT_L).await.map_err(Error::Bus)?;

        let calibration = Calibration::from_registers(h0_rh_x2, h1_rh_x2, h0_out, h1_out)
            .ok_or(Error::InvalidCalibration)?;

        Ok(Self {
            iface,
            delay,
            calibration,
        })
    }

    /// Trigger one conversion and return relative humidity in percent
    pub async fn read_humidity(&mut self) -> Result<f32, Error<I2C::Error>> {
        self.iface
            .write_u8(reg::CTRL_REG2, CTRL2_ONE_SHOT)
            .await
            .map_err(Error::Bus)?;

        let mut ready = false;
        for _ in 0..CONVERSION_POLLS {
            let status = self.iface.read_u8(reg::STATUS_REG).await.map_err(Error::Bus)?;
            if status & STATUS_HUMIDITY_READY != 0 {
                ready = true;
                break;
            }
            self.delay.delay_ms(CONVERSION_POLL_MS).await;
        }
        if !ready {
            return Err(Error::Timeout);
        }

        let raw = self
            .iface
            .read_i16(reg::HUMIDITY_OUT_L)
            .await
            .map_err(Error::Bus)?;

        Ok(self.calibration.humidity(raw))
    }

    /// Release the bus and delay provider
    pub fn release(self) -> (I2C, D) {
        (self.iface.i2c, self.delay)
    }
}
