// src/lib.rs

//! Bootstrap and lifecycle core of a display subsystem.
//!
//! `DisplayCore` brings up the optional vendor extension, the hardware-info
//! provider, the composition manager and the color manager, then acts as the
//! factory for per-display objects until it is torn down.

pub mod color_manager;
pub mod comp_manager;
pub mod config;
pub mod display;
pub mod error;
pub mod extension;
pub mod hw_info;
pub mod lifecycle;
pub mod os;
pub mod services;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use config::Config;
pub use error::{DisplayError, DisplayResult};
pub use lifecycle::{Collaborators, DisplayCore};
pub use types::{DisplayVariant, HwBwMode, HwDisplayInfo, HwDisplaysInfo, HwResourceInfo};
