// src/lifecycle/guard.rs
//! Scoped release of resources acquired during bootstrap.

use crate::hw_info::{HwInfoFactory, HwInfoInterface, SharedHwInfo};
use log::debug;
use std::ops::Deref;

/// Destroys the hardware-info provider on drop unless disarmed.
///
/// Bootstrap arms the guard as soon as the provider exists; any early
/// return before the provider is stored in the core releases it.
pub(crate) struct HwInfoGuard<'a> {
    factory: &'a dyn HwInfoFactory,
    hw_info: SharedHwInfo,
    armed: bool,
}

impl<'a> HwInfoGuard<'a> {
    pub(crate) fn new(factory: &'a dyn HwInfoFactory, hw_info: SharedHwInfo) -> Self {
        Self {
            factory,
            hw_info,
            armed: true,
        }
    }

    /// Hands the provider over; dropping the guard no longer releases it.
    pub(crate) fn disarm(mut self) -> SharedHwInfo {
        self.armed = false;
        self.hw_info.clone()
    }
}

impl Deref for HwInfoGuard<'_> {
    type Target = dyn HwInfoInterface;

    fn deref(&self) -> &Self::Target {
        self.hw_info.as_ref()
    }
}

impl Drop for HwInfoGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Bootstrap aborted, releasing hardware info provider");
            self.factory.destroy(self.hw_info.clone());
        }
    }
}
