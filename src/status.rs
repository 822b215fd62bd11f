//! Subsystem Status
//!
//! The audio path and the wireless peripheral are independent failure
//! domains. Each publishes its lifecycle state into its own
//! [`SubsystemStatus`] cell so a supervisor (the heartbeat task, or a
//! debugger) can observe a halted subsystem without the other one being
//! affected.

use core::sync::atomic::{AtomicU8, Ordering};

use defmt::Format;

/// Why a subsystem stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
#[repr(u8)]
pub enum HaltReason {
    /// PDM sampler refused to start or stopped with an error
    Capture = 1,
    /// Environmental sensor did not answer or reported bad calibration
    Sensor = 2,
    /// GATT service registration failed
    Radio = 3,
}

/// Lifecycle state of a subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum SubsystemState {
    Starting,
    Running,
    Advertising,
    Connected,
    Halted(HaltReason),
}

impl SubsystemState {
    const fn encode(self) -> u8 {
        match self {
            SubsystemState::Starting => 0,
            SubsystemState::Running => 1,
            SubsystemState::Advertising => 2,
            SubsystemState::Connected => 3,
            SubsystemState::Halted(reason) => 0x80 | reason as u8,
        }
    }

    const fn decode(raw: u8) -> Self {
        match raw {
            1 => SubsystemState::Running,
            2 => SubsystemState::Advertising,
            3 => SubsystemState::Connected,
            0x81 => SubsystemState::Halted(HaltReason::Capture),
            0x82 => SubsystemState::Halted(HaltReason::Sensor),
            0x83 => SubsystemState::Halted(HaltReason::Radio),
            _ => SubsystemState::Starting,
        }
    }

    /// True once the subsystem has stopped for good
    pub fn is_halted(self) -> bool {
        matches!(self, SubsystemState::Halted(_))
    }
}

/// Single-writer status cell
pub struct SubsystemStatus {
    raw: AtomicU8,
}

impl SubsystemStatus {
    pub const fn new() -> Self {
        Self {
            raw: AtomicU8::new(SubsystemState::Starting.encode()),
        }
    }

    /// Publish a new state. A halted subsystem stays halted.
    pub fn set(&self, state: SubsystemState) {
        let current = self.get();
        if current.is_halted() {
            return;
        }
        self.raw.store(state.encode(), Ordering::Release);
    }

    /// Record a fatal initialization or runtime failure
    pub fn halt(&self, reason: HaltReason) {
        self.set(SubsystemState::Halted(reason));
    }

    pub fn get(&self) -> SubsystemState {
        SubsystemState::decode(self.raw.load(Ordering::Acquire))
    }
}

impl Default for SubsystemStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Status of both subsystems
pub struct SystemStatus {
    pub capture: SubsystemStatus,
    pub peripheral: SubsystemStatus,
}

impl SystemStatus {
    pub const fn new() -> Self {
        Self {
            capture: SubsystemStatus::new(),
            peripheral: SubsystemStatus::new(),
        }
    }
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self::new()
    }
}
