//! Low level register and interface definitions
use embedded_hal_async::i2c;

/// Fixed 7-bit bus address
pub const ADDR: u8 = 0x5F;

/// Register map (humidity subset)
pub mod reg {
    pub const WHO_AM_I: u8 = 0x0F;
    pub const CTRL_REG1: u8 = 0x20;
    pub const CTRL_REG2: u8 = 0x21;
    pub const STATUS_REG: u8 = 0x27;
    pub const HUMIDITY_OUT_L: u8 = 0x28;
    pub const H0_RH_X2: u8 = 0x30;
    pub const H1_RH_X2: u8 = 0x31;
    pub const H0_T0_OUT_L: u8 = 0x36;
    pub const H1_T0_OUT_L: u8 = 0x3A;

    /// Sub-address flag enabling register auto-increment
    pub const AUTO_INCREMENT: u8 = 0x80;
}

#[derive(Debug)]
pub struct DeviceInterface<I2c: i2c::I2c> {
    pub i2c: I2c,
}

impl<I2c: i2c::I2c> DeviceInterface<I2c> {
    pub fn new(i2c: I2c) -> Self {
        Self { i2c }
    }

    /// Read a single register
    pub async fn read_u8(&mut self, reg: u8) -> Result<u8, I2c::Error> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(ADDR, &[reg], &mut buf).await?;
        Ok(buf[0])
    }

    /// Read a little-endian register pair starting at `reg`
    pub async fn read_i16(&mut self, reg: u8) -> Result<i16, I2c::Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(ADDR, &[reg | reg::AUTO_INCREMENT], &mut buf)
            .await?;
        Ok(i16::from_le_bytes(buf))
    }

    /// Write a single register
    pub async fn write_u8(&mut self, reg: u8, value: u8) -> Result<(), I2c::Error> {
        self.i2c.write(ADDR, &[reg, value]).await
    }
}
