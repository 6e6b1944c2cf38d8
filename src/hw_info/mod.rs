// src/hw_info/mod.rs
//! Hardware information boundary.
//!
//! - HwInfoInterface: capability and topology queries against the hardware
//! - HwInfoFactory: create/destroy pair the core uses during bootstrap and teardown
//! - StaticHwInfo: answers from a declarative description (config file)
//! - DrmSysfsHwInfo: enumerates connectors under /sys/class/drm

pub mod drm_sysfs;
pub mod static_info;

pub use drm_sysfs::{DrmSysfsHwInfo, DrmSysfsHwInfoFactory};
pub use static_info::{StaticHwInfo, StaticHwInfoFactory};

use crate::error::DisplayResult;
use crate::types::{DisplayVariant, HwDisplayInterfaceInfo, HwDisplaysInfo, HwResourceInfo};
use std::sync::Arc;

/// Queries answered by the hardware layer.
///
/// The core shares one provider with every display it creates, so
/// implementations synchronize their own state.
pub trait HwInfoInterface: Send + Sync {
    /// Composition capabilities. Queried once during bootstrap.
    fn get_hw_resource_info(&self) -> DisplayResult<HwResourceInfo>;

    /// Current status of every display the hardware knows about.
    fn get_displays_status(&self) -> DisplayResult<HwDisplaysInfo>;

    fn get_max_displays_supported(&self, variant: DisplayVariant) -> DisplayResult<u32>;

    fn get_first_display_interface_type(&self) -> DisplayResult<HwDisplayInterfaceInfo>;
}

pub type SharedHwInfo = Arc<dyn HwInfoInterface>;

/// Creates and releases the hardware-info provider.
pub trait HwInfoFactory: Send + Sync {
    fn create(&self) -> DisplayResult<SharedHwInfo>;

    /// Releases the core's reference. Displays still holding the provider
    /// keep it alive until they are destroyed.
    fn destroy(&self, hw_info: SharedHwInfo);
}

/// First interface in id order, which is how both providers enumerate.
pub(crate) fn first_interface(displays: &HwDisplaysInfo) -> Option<HwDisplayInterfaceInfo> {
    displays.values().next().map(|info| HwDisplayInterfaceInfo {
        display_type: info.display_type,
        is_connected: info.is_connected,
    })
}
