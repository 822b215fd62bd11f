//! Board Support
//!
//! Peripheral split for the Arduino Nano 33 BLE Sense (rev1, nRF52840).
//!
//! Pins:
//! - PDM microphone: CLK=P0.26, DIN=P0.25, PWR=P0.17
//! - HTS221 (internal I2C): SDA=P0.14, SCL=P0.15, VDD_ENV=P0.22, PULLUP=P1.00
//! - Serial TX: P1.03 (D1)
//! - Connection LED: P0.13 (LED_BUILTIN)
//!
//! Interrupt priorities avoid the SoftDevice reserved levels (0, 1, 4).

use embassy_executor::{InterruptExecutor, SendSpawner};
use embassy_nrf::config::Config;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt;
use embassy_nrf::interrupt::{InterruptExt, Priority};
use embassy_nrf::peripherals::{
    self, P0_13, P0_14, P0_15, P0_17, P0_22, P0_25, P0_26, P1_00, P1_03, PDM, TWISPI0, UARTE0,
};
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::uarte::{self, UarteTx};
use embassy_nrf::{bind_interrupts, pdm, Peri};
use embassy_time::Timer;
use static_cell::ConstStaticCell;

use crate::config::SERIAL_BAUD;

bind_interrupts!(pub struct Irqs {
    PDM => pdm::InterruptHandler<peripherals::PDM>;
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
    UARTE0 => uarte::InterruptHandler<peripherals::UARTE0>;
});

/// Sensor supply settle time before the first I2C transaction
const SENSOR_POWER_UP_MS: u64 = 10;

/// PDM microphone
pub struct MicResources {
    pub pdm: Peri<'static, PDM>,
    pub clk: Peri<'static, P0_26>,
    pub din: Peri<'static, P0_25>,
    pub power: Peri<'static, P0_17>,
}

/// Internal I2C bus carrying the environmental sensor
pub struct SensorResources {
    pub twim: Peri<'static, TWISPI0>,
    pub sda: Peri<'static, P0_14>,
    pub scl: Peri<'static, P0_15>,
    pub vdd_env: Peri<'static, P0_22>,
    pub pullup: Peri<'static, P1_00>,
}

/// Serial link for the audio stream
pub struct SerialResources {
    pub uarte: Peri<'static, UARTE0>,
    pub tx: Peri<'static, P1_03>,
}

/// All resources used by the firmware
pub struct Board {
    pub mic: MicResources,
    pub sensor: SensorResources,
    pub serial: SerialResources,
    pub led: Peri<'static, P0_13>,
}

impl Board {
    /// Bring up embassy-nrf and split the peripherals
    pub fn init() -> Self {
        let mut config = Config::default();
        config.gpiote_interrupt_priority = Priority::P2;
        config.time_interrupt_priority = Priority::P2;

        let p = embassy_nrf::init(config);

        // Audio above everything else the application owns
        interrupt::PDM.set_priority(Priority::P2);
        interrupt::TWISPI0.set_priority(Priority::P3);
        interrupt::UARTE0.set_priority(Priority::P3);

        Self {
            mic: MicResources {
                pdm: p.PDM,
                clk: p.P0_26,
                din: p.P0_25,
                power: p.P0_17,
            },
            sensor: SensorResources {
                twim: p.TWISPI0,
                sda: p.P0_14,
                scl: p.P0_15,
                vdd_env: p.P0_22,
                pullup: p.P1_00,
            },
            serial: SerialResources {
                uarte: p.UARTE0,
                tx: p.P1_03,
            },
            led: p.P0_13,
        }
    }
}

/// Keeps the sensor supply and I2C pull-ups switched on while alive
pub struct EnvironmentRail {
    _vdd: Output<'static>,
    _pullup: Output<'static>,
}

impl SensorResources {
    /// Power the sensor and open the I2C bus
    pub async fn configure(self) -> (Twim<'static>, EnvironmentRail) {
        static RAM_BUFFER: ConstStaticCell<[u8; 32]> = ConstStaticCell::new([0; 32]);

        let rail = EnvironmentRail {
            _vdd: Output::new(self.vdd_env, Level::High, OutputDrive::HighDrive),
            _pullup: Output::new(self.pullup, Level::High, OutputDrive::Standard),
        };
        Timer::after_millis(SENSOR_POWER_UP_MS).await;

        let mut config = twim::Config::default();
        config.frequency = twim::Frequency::K400;

        let bus = Twim::new(self.twim, Irqs, self.sda, self.scl, config, RAM_BUFFER.take());
        (bus, rail)
    }
}

impl SerialResources {
    /// Transmit-only UARTE, 8N1, no flow control
    pub fn configure(self) -> UarteTx<'static> {
        let mut config = uarte::Config::default();
        config.parity = uarte::Parity::EXCLUDED;
        config.baudrate = baudrate(SERIAL_BAUD);

        UarteTx::new(self.uarte, Irqs, self.tx, config)
    }
}

fn baudrate(bps: u32) -> uarte::Baudrate {
    match bps {
        115_200 => uarte::Baudrate::BAUD115200,
        230_400 => uarte::Baudrate::BAUD230400,
        460_800 => uarte::Baudrate::BAUD460800,
        921_600 => uarte::Baudrate::BAUD921600,
        _ => uarte::Baudrate::BAUD1M,
    }
}

/// Connection indicator LED, off at boot
pub fn led(pin: Peri<'static, P0_13>) -> Output<'static> {
    Output::new(pin, Level::Low, OutputDrive::Standard)
}

static CAPTURE_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn EGU0_SWI0() {
    CAPTURE_EXECUTOR.on_interrupt()
}

/// Start the executor hosting the capture callback.
///
/// Runs from EGU0_SWI0 at the PDM priority so capture preempts every
/// thread-mode task.
pub fn start_capture_executor() -> SendSpawner {
    interrupt::EGU0_SWI0.set_priority(Priority::P2);
    CAPTURE_EXECUTOR.start(interrupt::EGU0_SWI0)
}
