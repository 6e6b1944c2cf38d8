// src/color_manager.rs

//! Color management bootstrap. Best effort: the core keeps running without it.

use crate::error::{DisplayError, DisplayResult};
use crate::types::{HwCapabilities, HwResourceInfo};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait ColorManager: Send + Sync {
    fn init(&self, hw_resource: &HwResourceInfo) -> DisplayResult<()>;

    fn deinit(&self);
}

pub type SharedColorManager = Arc<dyn ColorManager>;

/// Enables color services when the hardware has a color pipeline.
#[derive(Debug, Default)]
pub struct ColorManagerProxy {
    active: AtomicBool,
}

impl ColorManagerProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl ColorManager for ColorManagerProxy {
    fn init(&self, hw_resource: &HwResourceInfo) -> DisplayResult<()> {
        if !hw_resource
            .capabilities
            .contains(HwCapabilities::COLOR_PIPELINE)
            || hw_resource.num_dspp == 0
        {
            debug!("ColorManagerProxy: no color pipeline in hardware");
            return Err(DisplayError::NotSupported);
        }
        self.active.store(true, Ordering::Release);
        info!(
            "ColorManagerProxy: color services enabled ({} dspp blocks)",
            hw_resource.num_dspp
        );
        Ok(())
    }

    fn deinit(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            info!("ColorManagerProxy: color services disabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn it_should_require_a_color_pipeline() {
        let proxy = ColorManagerProxy::new();
        let resource = HwResourceInfo {
            num_dspp: 0,
            ..HwResourceInfo::default()
        };
        assert_eq!(proxy.init(&resource), Err(DisplayError::NotSupported));
        assert!(!proxy.is_active());
    }

    #[test_log::test]
    fn it_should_toggle_on_init_and_deinit() {
        let proxy = ColorManagerProxy::new();
        proxy.init(&HwResourceInfo::default()).unwrap();
        assert!(proxy.is_active());
        proxy.deinit();
        assert!(!proxy.is_active());
    }
}
