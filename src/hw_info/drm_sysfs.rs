// src/hw_info/drm_sysfs.rs
//! Hardware info backed by the kernel's DRM connector entries.
//!
//! Connector directories look like `card0-eDP-1` or `card1-HDMI-A-2`; each
//! carries a `status` file (`connected`, `disconnected`, `unknown`) and, on
//! recent kernels, a `connector_id` file. The resource description cannot be
//! read from sysfs and is supplied by configuration.

use super::{first_interface, HwInfoFactory, HwInfoInterface, SharedHwInfo};
use crate::error::{DisplayError, DisplayResult};
use crate::types::{
    DisplayVariant, HwDisplayInfo, HwDisplayInterfaceInfo, HwDisplaysInfo, HwResourceInfo,
};
use log::{debug, info, trace, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_DRM_SYSFS_ROOT: &str = "/sys/class/drm";

/// Maps a connector type (`eDP`, `HDMI-A`, ...) to the display kind driving it.
fn variant_for_connector(connector_type: &str) -> Option<DisplayVariant> {
    match connector_type {
        "eDP" | "DSI" | "LVDS" | "DPI" => Some(DisplayVariant::BuiltIn),
        "HDMI-A" | "HDMI-B" | "DP" | "DVI-I" | "DVI-D" | "DVI-A" | "VGA" | "USB" => {
            Some(DisplayVariant::Pluggable)
        }
        "Virtual" | "Writeback" => Some(DisplayVariant::Virtual),
        _ => None,
    }
}

/// Splits `card0-HDMI-A-1` into `("HDMI-A", "HDMI-A-1")`.
fn parse_connector_name(entry_name: &str) -> Option<(&str, &str)> {
    if !entry_name.starts_with("card") {
        return None;
    }
    let (_, connector) = entry_name.split_once('-')?;
    let (connector_type, index) = connector.rsplit_once('-')?;
    if connector_type.is_empty() || index.parse::<u32>().is_err() {
        return None;
    }
    Some((connector_type, connector))
}

pub struct DrmSysfsHwInfo {
    root: PathBuf,
    resource: HwResourceInfo,
}

impl DrmSysfsHwInfo {
    pub fn new(root: impl Into<PathBuf>, resource: HwResourceInfo) -> Self {
        Self {
            root: root.into(),
            resource,
        }
    }

    fn read_trimmed(path: &Path) -> Option<String> {
        fs::read_to_string(path).ok().map(|s| s.trim().to_string())
    }

    fn scan(&self) -> DisplayResult<HwDisplaysInfo> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            DisplayError::Hardware(format!("read_dir {}: {}", self.root.display(), e))
        })?;

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();

        // (connector_id, entry) in directory-name order
        let mut connectors: Vec<(Option<i32>, HwDisplayInfo)> = Vec::new();
        for name in names {
            let Some((connector_type, connector)) = parse_connector_name(&name) else {
                continue;
            };
            let Some(variant) = variant_for_connector(connector_type) else {
                debug!("DrmSysfsHwInfo: skipping unsupported connector {}", name);
                continue;
            };

            let dir = self.root.join(&name);
            let is_connected = Self::read_trimmed(&dir.join("status"))
                .map(|status| status == "connected")
                .unwrap_or(false);
            let connector_id = Self::read_trimmed(&dir.join("connector_id"))
                .and_then(|id| id.parse::<i32>().ok());

            connectors.push((
                connector_id,
                HwDisplayInfo {
                    display_id: connector_id.unwrap_or_default(),
                    display_type: variant,
                    is_connected,
                    is_primary: false,
                    name: connector.to_string(),
                },
            ));
        }

        // Kernel ids are claimed first; connectors without one take the
        // lowest ids left over, in name order.
        let mut assigned: Vec<Option<i32>> = vec![None; connectors.len()];
        let mut taken = BTreeSet::new();
        for (slot, (connector_id, info)) in assigned.iter_mut().zip(&connectors) {
            let Some(id) = *connector_id else { continue };
            if taken.insert(id) {
                *slot = Some(id);
            } else {
                warn!(
                    "DrmSysfsHwInfo: duplicate connector id {} for {}, ignoring",
                    id, info.name
                );
            }
        }
        let mut next_fallback_id = 0i32;
        for (slot, (connector_id, _)) in assigned.iter_mut().zip(&connectors) {
            if connector_id.is_some() {
                continue;
            }
            while taken.contains(&next_fallback_id) {
                next_fallback_id += 1;
            }
            taken.insert(next_fallback_id);
            *slot = Some(next_fallback_id);
        }

        let mut displays = HwDisplaysInfo::new();
        let mut primary_assigned = false;
        for (slot, (_, info)) in assigned.into_iter().zip(connectors) {
            let Some(display_id) = slot else { continue };
            let is_primary = !primary_assigned
                && info.is_connected
                && info.display_type == DisplayVariant::BuiltIn;
            primary_assigned |= is_primary;

            trace!(
                "DrmSysfsHwInfo: {} -> id {} ({}, connected={})",
                info.name,
                display_id,
                info.display_type,
                info.is_connected
            );
            displays.insert(
                display_id,
                HwDisplayInfo {
                    display_id,
                    is_primary,
                    ..info
                },
            );
        }

        Ok(displays)
    }
}

impl HwInfoInterface for DrmSysfsHwInfo {
    fn get_hw_resource_info(&self) -> DisplayResult<HwResourceInfo> {
        Ok(self.resource.clone())
    }

    fn get_displays_status(&self) -> DisplayResult<HwDisplaysInfo> {
        self.scan()
    }

    fn get_max_displays_supported(&self, variant: DisplayVariant) -> DisplayResult<u32> {
        Ok(self.resource.max_displays(variant))
    }

    fn get_first_display_interface_type(&self) -> DisplayResult<HwDisplayInterfaceInfo> {
        let displays = self.scan()?;
        first_interface(&displays).ok_or_else(|| {
            DisplayError::Hardware(format!("no connectors under {}", self.root.display()))
        })
    }
}

#[derive(Debug, Clone)]
pub struct DrmSysfsHwInfoFactory {
    root: PathBuf,
    resource: HwResourceInfo,
}

impl DrmSysfsHwInfoFactory {
    pub fn new(root: impl Into<PathBuf>, resource: HwResourceInfo) -> Self {
        Self {
            root: root.into(),
            resource,
        }
    }
}

impl HwInfoFactory for DrmSysfsHwInfoFactory {
    fn create(&self) -> DisplayResult<SharedHwInfo> {
        if !self.root.is_dir() {
            return Err(DisplayError::Hardware(format!(
                "{} not found",
                self.root.display()
            )));
        }
        info!("DrmSysfsHwInfoFactory: using {}", self.root.display());
        Ok(Arc::new(DrmSysfsHwInfo::new(
            self.root.clone(),
            self.resource.clone(),
        )))
    }

    fn destroy(&self, _hw_info: SharedHwInfo) {
        debug!("DrmSysfsHwInfoFactory: releasing provider");
    }
}
