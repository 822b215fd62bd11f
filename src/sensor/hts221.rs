//! On-board HTS221 humidity sensor
//!
//! The register-level driver lives in the `hts221-async` crate; this module
//! adapts it to [`HumiditySensor`].

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
pub use hts221_async::{reg, Calibration, Error as Hts221Error, Hts221, ADDRESS, DEVICE_ID};

use super::HumiditySensor;

impl<I2C: I2c, D: DelayNs> HumiditySensor for Hts221<I2C, D> {
    type Error = Hts221Error<I2C::Error>;

    async fn read_humidity(&mut self) -> Result<f32, Self::Error> {
        Hts221::read_humidity(self).await
    }
}
