// src/hw_info/static_info.rs
//! Hardware info answered from a fixed description.

use super::{first_interface, HwInfoFactory, HwInfoInterface, SharedHwInfo};
use crate::error::{DisplayError, DisplayResult};
use crate::types::{
    DisplayVariant, HwDisplayInfo, HwDisplayInterfaceInfo, HwDisplaysInfo, HwResourceInfo,
};
use log::{debug, info};
use std::sync::Arc;

pub struct StaticHwInfo {
    resource: HwResourceInfo,
    displays: HwDisplaysInfo,
}

impl StaticHwInfo {
    pub fn new(resource: HwResourceInfo, displays: impl IntoIterator<Item = HwDisplayInfo>) -> Self {
        let displays = displays
            .into_iter()
            .map(|info| (info.display_id, info))
            .collect();
        Self {
            resource,
            displays,
        }
    }
}

impl HwInfoInterface for StaticHwInfo {
    fn get_hw_resource_info(&self) -> DisplayResult<HwResourceInfo> {
        Ok(self.resource.clone())
    }

    fn get_displays_status(&self) -> DisplayResult<HwDisplaysInfo> {
        debug!("StaticHwInfo: reporting {} displays", self.displays.len());
        Ok(self.displays.clone())
    }

    fn get_max_displays_supported(&self, variant: DisplayVariant) -> DisplayResult<u32> {
        Ok(self.resource.max_displays(variant))
    }

    fn get_first_display_interface_type(&self) -> DisplayResult<HwDisplayInterfaceInfo> {
        first_interface(&self.displays)
            .ok_or_else(|| DisplayError::Hardware("no display interfaces described".to_string()))
    }
}

/// Hands out `StaticHwInfo` providers built from the same description.
#[derive(Debug, Clone)]
pub struct StaticHwInfoFactory {
    resource: HwResourceInfo,
    displays: Vec<HwDisplayInfo>,
}

impl StaticHwInfoFactory {
    pub fn new(resource: HwResourceInfo, displays: Vec<HwDisplayInfo>) -> Self {
        Self {
            resource,
            displays,
        }
    }
}

impl HwInfoFactory for StaticHwInfoFactory {
    fn create(&self) -> DisplayResult<SharedHwInfo> {
        info!(
            "StaticHwInfoFactory: creating provider ({} displays)",
            self.displays.len()
        );
        Ok(Arc::new(StaticHwInfo::new(
            self.resource.clone(),
            self.displays.clone(),
        )))
    }

    fn destroy(&self, hw_info: SharedHwInfo) {
        debug!(
            "StaticHwInfoFactory: releasing provider ({} references left elsewhere)",
            Arc::strong_count(&hw_info) - 1
        );
    }
}
