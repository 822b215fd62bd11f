//! Common test utilities and setup for embedded tests
//!
//! Shared by all defmt-test based tests:
//! - logger, panic handler and the crates that provide vectors and the
//!   critical section
//! - heap for proptest
//! - frame inspection helpers
//! - an in-memory HTS221 on a mock I2C bus

pub use defmt_rtt as _; // global logger
pub use embassy_executor as _;
// Provides the interrupt vectors and the critical section
pub use nrf_softdevice as _;
pub use panic_probe as _; // panic handler
pub use {embassy_nrf as _, embassy_time as _};

// Global allocator for proptest (required for alloc feature in no_std)
pub extern crate alloc;
#[allow(unused)]
pub use alloc::vec;
use core::sync::atomic::{AtomicBool, Ordering};

pub use embedded_alloc::LlffHeap as Heap;

#[global_allocator]
pub static HEAP: Heap = Heap::empty();

pub static mut HEAP_MEM: [u8; 8192] = [0; 8192];

static HEAP_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Ensure heap is initialized exactly once
pub fn ensure_heap_initialized() {
    if !HEAP_INITIALIZED.swap(true, Ordering::Relaxed) {
        unsafe {
            let ptr = core::ptr::addr_of_mut!(HEAP_MEM) as *mut u8;
            HEAP.init(ptr as usize, 8192);
        }
    }
}

/// Sample `index` of a little-endian PCM frame
#[allow(unused)]
pub fn frame_sample(frame: &[u8], index: usize) -> i16 {
    i16::from_le_bytes([frame[index * 2], frame[index * 2 + 1]])
}

/// Ramp chunk `start, start + 1, ...` of length `N`
#[allow(unused)]
pub fn ramp<const N: usize>(start: i16) -> [i16; N] {
    let mut chunk = [0i16; N];
    for (i, sample) in chunk.iter_mut().enumerate() {
        *sample = start.wrapping_add(i as i16);
    }
    chunk
}

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{Error, ErrorKind, ErrorType, I2c, Operation};
use nano_sense_firmware::sensor::hts221::{reg, ADDRESS, DEVICE_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    Nack,
}

impl Error for BusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Register-file model of the sensor
#[allow(unused)]
pub struct MockHts221 {
    pub regs: [u8; 0x40],
    pointer: usize,
    /// Set STATUS_REG humidity-ready when a one-shot is triggered
    pub converts: bool,
    /// NACK every transaction
    pub fail: bool,
}

#[allow(unused)]
impl MockHts221 {
    pub fn new() -> Self {
        let mut regs = [0u8; 0x40];
        regs[reg::WHO_AM_I as usize] = DEVICE_ID;
        // 20 %RH at -1000 counts, 80 %RH at 5000 counts
        regs[reg::H0_RH_X2 as usize] = 40;
        regs[reg::H1_RH_X2 as usize] = 160;
        put_i16(&mut regs, reg::H0_T0_OUT_L, -1000);
        put_i16(&mut regs, reg::H1_T0_OUT_L, 5000);
        Self {
            regs,
            pointer: 0,
            converts: true,
            fail: false,
        }
    }

    pub fn unreachable() -> Self {
        Self { fail: true, ..Self::new() }
    }

    pub fn set_raw_humidity(&mut self, raw: i16) {
        put_i16(&mut self.regs, reg::HUMIDITY_OUT_L, raw);
    }

    pub fn register(&self, address: u8) -> u8 {
        self.regs[address as usize]
    }
}

#[allow(unused)]
pub fn put_i16(regs: &mut [u8; 0x40], address: u8, value: i16) {
    let bytes = value.to_le_bytes();
    regs[address as usize] = bytes[0];
    regs[address as usize + 1] = bytes[1];
}

impl ErrorType for MockHts221 {
    type Error = BusError;
}

impl I2c for MockHts221 {
    async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if self.fail || address != ADDRESS {
            return Err(BusError::Nack);
        }

        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.pointer = (bytes[0] & !reg::AUTO_INCREMENT) as usize;
                    for value in &bytes[1..] {
                        self.regs[self.pointer] = *value;
                        if self.pointer == reg::CTRL_REG2 as usize && value & 0x01 != 0 && self.converts {
                            self.regs[reg::STATUS_REG as usize] |= 0x02;
                        }
                        self.pointer += 1;
                    }
                }
                Operation::Read(buf) => {
                    for slot in buf.iter_mut() {
                        *slot = self.regs[self.pointer];
                        self.pointer += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Counts delay calls without waiting
pub struct NoDelay {
    pub calls: u32,
}

#[allow(unused)]
impl NoDelay {
    pub fn new() -> Self {
        Self { calls: 0 }
    }
}

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        self.calls += 1;
    }
}

/// Connection LED stand-in: last level and how often it changed
pub struct MockLed {
    pub on: bool,
    pub toggles: u32,
}

#[allow(unused)]
impl MockLed {
    pub fn new() -> Self {
        Self { on: false, toggles: 0 }
    }
}

impl nano_sense_firmware::ble::link::Indicator for MockLed {
    fn set_active(&mut self, active: bool) {
        if self.on != active {
            self.toggles += 1;
        }
        self.on = active;
    }
}
