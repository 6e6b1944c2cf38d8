// src/types.rs

//! Data model shared between the display core and its collaborators.

use crate::error::DisplayError;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of display kinds the core knows how to construct.
///
/// Adding a kind means adding a variant here and a constructor arm in
/// `display::construct`; there is no open-ended registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayVariant {
    /// Panel wired into the device (DSI, eDP, LVDS).
    BuiltIn,
    /// External panel attached through a pluggable connector (HDMI, DP).
    Pluggable,
    /// Off-screen target with no physical panel behind it.
    Virtual,
}

impl DisplayVariant {
    pub const ALL: [DisplayVariant; 3] = [
        DisplayVariant::BuiltIn,
        DisplayVariant::Pluggable,
        DisplayVariant::Virtual,
    ];

    /// Raw code used by hardware status reports and the extension ABI.
    pub fn code(self) -> i32 {
        match self {
            DisplayVariant::BuiltIn => 0,
            DisplayVariant::Pluggable => 1,
            DisplayVariant::Virtual => 2,
        }
    }
}

impl TryFrom<i32> for DisplayVariant {
    type Error = DisplayError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(DisplayVariant::BuiltIn),
            1 => Ok(DisplayVariant::Pluggable),
            2 => Ok(DisplayVariant::Virtual),
            _ => Err(DisplayError::Parameters),
        }
    }
}

impl FromStr for DisplayVariant {
    type Err = DisplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "builtin" | "built_in" | "primary" => Ok(DisplayVariant::BuiltIn),
            "pluggable" | "external" => Ok(DisplayVariant::Pluggable),
            "virtual" => Ok(DisplayVariant::Virtual),
            _ => Err(DisplayError::Parameters),
        }
    }
}

impl fmt::Display for DisplayVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayVariant::BuiltIn => write!(f, "builtin"),
            DisplayVariant::Pluggable => write!(f, "pluggable"),
            DisplayVariant::Virtual => write!(f, "virtual"),
        }
    }
}

bitflags! {
    /// Optional blocks present in the composition hardware.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct HwCapabilities: u32 {
        const ROTATOR = 1 << 0;
        const COLOR_PIPELINE = 1 << 1;
        const HDR = 1 << 2;
        const CONCURRENT_WRITEBACK = 1 << 3;
        const DEST_SCALER = 1 << 4;
    }
}

/// Pixel layouts a layer buffer can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerBufferFormat {
    Rgba8888,
    Rgbx8888,
    Bgra8888,
    Rgb888,
    Rgb565,
    Rgba1010102,
    Nv12,
    Nv21,
    YCbCr420P010,
    YCbCr420Ubwc,
}

/// Bandwidth policy requested from the composition manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HwBwMode {
    #[default]
    Default,
    /// Bandwidth reserved for a concurrent camera pipeline.
    Vfe,
    /// Bandwidth capped to the hardware's sustained budget.
    Optimal,
}

/// Composition-relevant hardware capabilities, discovered once at bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HwResourceInfo {
    pub hw_version: u32,
    pub num_vig_pipe: u32,
    pub num_rgb_pipe: u32,
    pub num_dma_pipe: u32,
    pub num_blending_stages: u32,
    pub num_mixers: u32,
    pub num_dspp: u32,
    pub max_bandwidth_kbps: u64,
    pub capabilities: HwCapabilities,
    pub rotator_formats: Vec<LayerBufferFormat>,
    pub max_builtin_displays: u32,
    pub max_pluggable_displays: u32,
    pub max_virtual_displays: u32,
}

impl Default for HwResourceInfo {
    fn default() -> Self {
        HwResourceInfo {
            hw_version: 0x0500_0000,
            num_vig_pipe: 2,
            num_rgb_pipe: 0,
            num_dma_pipe: 2,
            num_blending_stages: 7,
            num_mixers: 2,
            num_dspp: 1,
            max_bandwidth_kbps: 6_800_000,
            capabilities: HwCapabilities::ROTATOR | HwCapabilities::COLOR_PIPELINE,
            rotator_formats: vec![
                LayerBufferFormat::Rgba8888,
                LayerBufferFormat::Rgbx8888,
                LayerBufferFormat::Nv12,
                LayerBufferFormat::YCbCr420Ubwc,
            ],
            max_builtin_displays: 1,
            max_pluggable_displays: 1,
            max_virtual_displays: 1,
        }
    }
}

impl HwResourceInfo {
    /// Upper bound on concurrently active displays of `variant`.
    pub fn max_displays(&self, variant: DisplayVariant) -> u32 {
        match variant {
            DisplayVariant::BuiltIn => self.max_builtin_displays,
            DisplayVariant::Pluggable => self.max_pluggable_displays,
            DisplayVariant::Virtual => self.max_virtual_displays,
        }
    }
}

/// One entry of the display topology as reported by the hardware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwDisplayInfo {
    pub display_id: i32,
    pub display_type: DisplayVariant,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub name: String,
}

/// Topology snapshot keyed by hardware display id.
pub type HwDisplaysInfo = BTreeMap<i32, HwDisplayInfo>;

/// Transport of the first display interface enumerated by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwDisplayInterfaceInfo {
    pub display_type: DisplayVariant,
    pub is_connected: bool,
}
