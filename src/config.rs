// src/config.rs

//! Configuration for the display core and the collaborators it is built with.
//!
//! The configuration is a JSON document. Every struct carries
//! `#[serde(default)]`, so a file only needs the settings it changes and an
//! empty object yields the defaults.
//!
//! - `extension`: where to find the vendor extension module, if anywhere
//! - `hardware`: which hardware-info source to use and what it reports
//! - `sockets`: where the daemon sockets handed to collaborators live

use crate::color_manager::ColorManagerProxy;
use crate::comp_manager::ResourceCompManager;
use crate::extension::{
    dylib::{DEFAULT_CREATE_SYMBOL, DEFAULT_DESTROY_SYMBOL, DEFAULT_EXTENSION_LIBRARY},
    DylibExtensionLoader, ExtensionLoader, NoExtension, EXTENSION_VERSION_TAG,
};
use crate::hw_info::{
    drm_sysfs::{DrmSysfsHwInfoFactory, DEFAULT_DRM_SYSFS_ROOT},
    static_info::StaticHwInfoFactory,
    HwInfoFactory,
};
use crate::lifecycle::{Collaborators, DisplayCore};
use crate::services::{HeapBufferAllocator, UnixSocketHandler};
use crate::types::{HwDisplayInfo, HwResourceInfo};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Names the configuration file when `--config` is not given.
pub const CONFIG_PATH_ENV: &str = "DISPLAY_CORE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub extension: ExtensionConfig,
    pub hardware: HardwareConfig,
    pub sockets: SocketConfig,
}

impl Config {
    /// Picks the configuration path: an explicit path wins over the
    /// environment.
    pub fn resolve_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
        explicit.or_else(|| {
            std::env::var_os(CONFIG_PATH_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Config: parsed {}", path.display());
        Ok(config)
    }

    /// Loads the file named by `explicit` or `DISPLAY_CORE_CONFIG`, falling
    /// back to defaults when neither names one.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        match Self::resolve_path(explicit) {
            Some(path) => {
                let config = Self::from_file(&path)?;
                info!("Config: loaded {}", path.display());
                Ok(config)
            }
            None => {
                info!("Config: no configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            extension_loader: self.extension.loader(),
            hw_info_factory: self.hardware.factory(),
            comp_manager: Arc::new(ResourceCompManager::new()),
            color_manager: Arc::new(ColorManagerProxy::new()),
        }
    }

    /// Builds a core wired to the configured collaborators. The core is not
    /// bootstrapped.
    pub fn build_core(&self) -> DisplayCore {
        DisplayCore::new(
            Arc::new(HeapBufferAllocator::default()),
            Arc::new(UnixSocketHandler::new(self.sockets.directory.clone())),
            self.collaborators(),
        )
    }
}

// --- Extension Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// When false the core always runs without an extension.
    pub enabled: bool,
    pub library: String,
    /// Searched in order before the dynamic linker's own path.
    pub search_dirs: Vec<PathBuf>,
    pub create_symbol: String,
    pub destroy_symbol: String,
    pub version_tag: u32,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        let loader = DylibExtensionLoader::default();
        ExtensionConfig {
            enabled: true,
            library: DEFAULT_EXTENSION_LIBRARY.to_string(),
            search_dirs: loader.search_dirs,
            create_symbol: DEFAULT_CREATE_SYMBOL.to_string(),
            destroy_symbol: DEFAULT_DESTROY_SYMBOL.to_string(),
            version_tag: EXTENSION_VERSION_TAG,
        }
    }
}

impl ExtensionConfig {
    pub fn loader(&self) -> Arc<dyn ExtensionLoader> {
        if !self.enabled {
            return Arc::new(NoExtension);
        }
        Arc::new(DylibExtensionLoader {
            library_name: self.library.clone(),
            search_dirs: self.search_dirs.clone(),
            create_symbol: self.create_symbol.clone(),
            destroy_symbol: self.destroy_symbol.clone(),
            version_tag: self.version_tag,
        })
    }
}

// --- Hardware Configuration ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HwInfoSource {
    /// Resource description and display list taken from this file.
    Static,
    /// Display list scanned from DRM connectors in sysfs.
    #[default]
    DrmSysfs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub source: HwInfoSource,
    pub sysfs_root: PathBuf,
    /// Used by both sources; sysfs carries no resource description.
    pub resource: HwResourceInfo,
    /// Only consulted by the static source.
    pub displays: Vec<HwDisplayInfo>,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        HardwareConfig {
            source: HwInfoSource::default(),
            sysfs_root: PathBuf::from(DEFAULT_DRM_SYSFS_ROOT),
            resource: HwResourceInfo::default(),
            displays: Vec::new(),
        }
    }
}

impl HardwareConfig {
    pub fn factory(&self) -> Arc<dyn HwInfoFactory> {
        match self.source {
            HwInfoSource::Static => Arc::new(StaticHwInfoFactory::new(
                self.resource.clone(),
                self.displays.clone(),
            )),
            HwInfoSource::DrmSysfs => Arc::new(DrmSysfsHwInfoFactory::new(
                self.sysfs_root.clone(),
                self.resource.clone(),
            )),
        }
    }
}

// --- Socket Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    pub directory: PathBuf,
}

impl Default for SocketConfig {
    fn default() -> Self {
        SocketConfig {
            directory: PathBuf::from("/run/display-core"),
        }
    }
}
