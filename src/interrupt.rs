//! Interrupt sources and the DMP interrupt callback registry
//!
//! The data pump checks two trigger sources after every FIFO pass:
//! - [`InterruptSource::Aux1`]: the auxiliary line, cleared and otherwise ignored
//! - [`InterruptSource::Mpu`]: the motion processor itself; when it fires every
//!   registered [`InterruptCallback`] runs once, in registration order
//!
//! # Example
//!
//! ```ignore
//! # use motion_dmp::{MotionContext, MotionProcessor};
//! # let mut mpl: MotionProcessor<_> = todo!();
//! fn on_dmp_interrupt(ctx: &mut MotionContext) {
//!     // inspect ctx.motion_state, ctx.gyro_sf, ...
//! }
//!
//! mpl.register_interrupt_callback(on_dmp_interrupt)?;
//! # Ok::<(), motion_dmp::Error<()>>(())
//! ```

use bitflags::bitflags;
use heapless::Vec;

use crate::Error;
use crate::context::MotionContext;

/// Maximum number of interrupt callbacks that can be registered
pub const MAX_INTERRUPT_CALLBACKS: usize = 5;

/// Callback run when the motion processor raises an interrupt
pub type InterruptCallback = fn(&mut MotionContext);

/// Interrupt trigger line checked by the data pump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptSource {
    /// Auxiliary interrupt line
    Aux1,
    /// Motion processor interrupt
    Mpu,
}

bitflags! {
    /// DMP interrupt classes currently enabled
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InterruptSources: u8 {
        /// Motion / no-motion transitions
        const MOTION = 0x01;
        /// FIFO packet ready
        const FIFO = 0x02;
    }
}

/// Bounded, insertion-ordered list of interrupt callbacks
#[derive(Debug, Default, Clone)]
pub struct CallbackRegistry {
    callbacks: Vec<InterruptCallback, MAX_INTERRUPT_CALLBACKS>,
}

impl CallbackRegistry {
    /// Create an empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Append a callback
    ///
    /// The same callback may be registered more than once and then runs
    /// once per entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CallbackRegistryFull`] if the registry is at capacity.
    pub fn register<E>(&mut self, callback: InterruptCallback) -> Result<(), Error<E>> {
        self.callbacks
            .push(callback)
            .map_err(|_| Error::CallbackRegistryFull)
    }

    /// Remove the first entry for a callback, keeping the order of the others
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the callback is not registered.
    pub fn unregister<E>(&mut self, callback: InterruptCallback) -> Result<(), Error<E>> {
        let index = self
            .callbacks
            .iter()
            .position(|&cb| core::ptr::fn_addr_eq(cb, callback))
            .ok_or(Error::InvalidParameter)?;
        self.callbacks.remove(index);
        Ok(())
    }

    /// True if `callback` is registered
    #[must_use]
    pub fn contains(&self, callback: InterruptCallback) -> bool {
        self.callbacks
            .iter()
            .any(|&cb| core::ptr::fn_addr_eq(cb, callback))
    }

    /// Number of registered callbacks
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// True if no callback is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Remove every callback
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// Run every callback once, in registration order
    pub fn dispatch(&self, ctx: &mut MotionContext) {
        for callback in &self.callbacks {
            callback(ctx);
        }
    }
}
