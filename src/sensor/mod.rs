//! Environmental Sensing
//!
//! The peripheral task only needs relative humidity, so the sensor is seen
//! through the [`HumiditySensor`] trait. [`hts221`] drives the on-board part
//! and [`reporter`] decides which readings reach the central.

pub mod hts221;
pub mod reporter;

use core::fmt::Debug;

/// Source of relative humidity readings in percent
#[allow(async_fn_in_trait)]
pub trait HumiditySensor {
    type Error: Debug;

    async fn read_humidity(&mut self) -> Result<f32, Self::Error>;
}
