//! Link State
//!
//! State machine of the wireless peripheral:
//!
//! ```text
//! Initializing -> Advertising <-> Connected
//!      |
//!      +-------> Halted
//! ```
//!
//! The indicator is driven high on entering `Connected` and low on leaving
//! it. Every transition is mirrored into the subsystem status cell.

use defmt::{debug, info, warn, Format};
use embassy_nrf::gpio::Output;

use crate::status::{HaltReason, SubsystemState, SubsystemStatus};

/// Connection indicator output
pub trait Indicator {
    fn set_active(&mut self, active: bool);
}

impl Indicator for Output<'_> {
    fn set_active(&mut self, active: bool) {
        if active {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

/// Peripheral lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum LinkState {
    Initializing,
    Advertising,
    Connected,
    Halted(HaltReason),
}

/// Transition not allowed from the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct LinkError {
    pub from: LinkState,
}

/// Link state plus the indicator it drives
pub struct Link<'a, I: Indicator> {
    state: LinkState,
    indicator: I,
    status: &'a SubsystemStatus,
}

impl<'a, I: Indicator> Link<'a, I> {
    pub fn new(mut indicator: I, status: &'a SubsystemStatus) -> Self {
        indicator.set_active(false);
        status.set(SubsystemState::Starting);
        Self {
            state: LinkState::Initializing,
            indicator,
            status,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Initialization finished, start advertising
    pub fn ready(&mut self) -> Result<(), LinkError> {
        self.transition(LinkState::Initializing, LinkState::Advertising)
    }

    /// A central linked
    pub fn connected(&mut self) -> Result<(), LinkError> {
        self.transition(LinkState::Advertising, LinkState::Connected)?;
        self.indicator.set_active(true);
        Ok(())
    }

    /// The central went away, advertise again
    pub fn disconnected(&mut self) -> Result<(), LinkError> {
        self.transition(LinkState::Connected, LinkState::Advertising)?;
        self.indicator.set_active(false);
        Ok(())
    }

    /// Fatal initialization failure. The link never leaves this state.
    pub fn halt(&mut self, reason: HaltReason) {
        warn!("Peripheral halted: {:?}", reason);
        self.indicator.set_active(false);
        self.state = LinkState::Halted(reason);
        self.status.halt(reason);
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    fn transition(&mut self, from: LinkState, to: LinkState) -> Result<(), LinkError> {
        if self.state != from {
            debug!("Rejected link transition {:?} -> {:?}", self.state, to);
            return Err(LinkError { from: self.state });
        }

        info!("Link {:?} -> {:?}", from, to);
        self.state = to;
        self.status.set(match to {
            LinkState::Connected => SubsystemState::Connected,
            LinkState::Advertising => SubsystemState::Advertising,
            LinkState::Initializing => SubsystemState::Starting,
            LinkState::Halted(reason) => SubsystemState::Halted(reason),
        });
        Ok(())
    }
}
