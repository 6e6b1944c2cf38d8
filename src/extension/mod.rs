// src/extension/mod.rs
//! Optional vendor extension module.
//!
//! The extension is a capability resolved once at bootstrap: either a
//! loaded interface or nothing. A missing module is a supported
//! configuration; a module that is present but broken is not.

pub mod dylib;

pub use dylib::{DylibExtension, DylibExtensionLoader};

use crate::error::DisplayResult;
use std::sync::Arc;

/// Interface version the core requests from extension modules.
pub const EXTENSION_VERSION_TAG: u32 = 0x0001_0000;

/// Opaque handle to a vendor extension interface.
///
/// The core never calls into the extension itself; it forwards the handle
/// to the composition manager.
pub trait ExtensionInterface: Send + Sync {
    /// Version tag the interface was created with.
    fn version_tag(&self) -> u32;

    /// Raw interface pointer for collaborators speaking the vendor ABI.
    fn as_raw(&self) -> *mut libc::c_void;
}

pub type SharedExtension = Arc<dyn ExtensionInterface>;

/// Resolves the extension interface.
///
/// - `Ok(Some(_))`: module loaded and interface created
/// - `Ok(None)`: no module available (non-fatal)
/// - `Err(_)`: module present but unusable (fatal to bootstrap)
pub trait ExtensionLoader: Send + Sync {
    fn load(&self) -> DisplayResult<Option<SharedExtension>>;
}

/// Loader for builds and tests without a vendor module.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExtension;

impl ExtensionLoader for NoExtension {
    fn load(&self) -> DisplayResult<Option<SharedExtension>> {
        Ok(None)
    }
}
