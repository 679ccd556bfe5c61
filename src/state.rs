//! Device lifecycle state machine
//!
//! The motion library moves through four phases, in order:
//!
//! ```text
//! SerialClosed -> SerialOpened -> DmpOpened -> DmpStarted
//! ```
//!
//! Calibration and bias configuration may only be written while the DMP is
//! opened but not running; the FIFO pump only runs once the DMP is started.
//! Every privileged operation checks its precondition here before touching
//! the device, so a call made in the wrong phase has no side effects.

use crate::Error;

/// Lifecycle phase of the device
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// No transport handle is held
    #[default]
    SerialClosed = 0,
    /// Transport is open, DMP not configured
    SerialOpened = 1,
    /// DMP configuration is open (calibration window)
    DmpOpened = 2,
    /// DMP is running and producing FIFO packets
    DmpStarted = 3,
}

impl DeviceState {
    /// Ordinal of the phase (0 = closed, 3 = started)
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    const fn is_adjacent(self, other: Self) -> bool {
        self.ordinal().abs_diff(other.ordinal()) == 1
    }
}

/// Tracks the current [`DeviceState`] and validates transitions
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateMachine {
    state: DeviceState,
}

impl StateMachine {
    /// Create a state machine in [`DeviceState::SerialClosed`]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DeviceState::SerialClosed,
        }
    }

    /// Current lifecycle phase
    #[must_use]
    pub const fn state(&self) -> DeviceState {
        self.state
    }

    /// Move to `target`
    ///
    /// Closing is legal from any phase. Any other target must be one step
    /// away from the current phase. Requesting the current phase is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImproperState`] if the move is not legal.
    pub fn transition<E>(&mut self, target: DeviceState) -> Result<(), Error<E>> {
        if target == self.state {
            return Ok(());
        }

        if target != DeviceState::SerialClosed && !self.state.is_adjacent(target) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Illegal state transition {} -> {}", self.state, target);
            return Err(Error::ImproperState);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("State transition {} -> {}", self.state, target);

        self.state = target;
        Ok(())
    }

    /// Require the device to be exactly in `state`
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImproperState`] otherwise.
    pub fn require<E>(&self, state: DeviceState) -> Result<(), Error<E>> {
        if self.state == state {
            Ok(())
        } else {
            Err(Error::ImproperState)
        }
    }

    /// Require the device to be at `minimum` or later in its lifecycle
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImproperState`] otherwise.
    pub fn require_at_least<E>(&self, minimum: DeviceState) -> Result<(), Error<E>> {
        if self.state >= minimum {
            Ok(())
        } else {
            Err(Error::ImproperState)
        }
    }
}
