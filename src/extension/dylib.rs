// src/extension/dylib.rs
//! Extension loading through a shared library.
//!
//! The module exports a create/destroy pair:
//!
//! ```text
//! int CreateExtensionInterface(uint32_t version_tag, void **intf);
//! int DestroyExtensionInterface(void *intf);
//! ```
//!
//! A zero return is success; other values follow `DisplayError::from_status`.

use super::{ExtensionInterface, ExtensionLoader, SharedExtension};
use crate::error::{DisplayError, DisplayResult};
use libc::{c_int, c_void};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_EXTENSION_LIBRARY: &str = "libdisplay-extension.so";
pub const DEFAULT_CREATE_SYMBOL: &str = "CreateExtensionInterface";
pub const DEFAULT_DESTROY_SYMBOL: &str = "DestroyExtensionInterface";

/// Overrides the configured search when set.
pub const EXTENSION_PATH_ENV: &str = "DISPLAY_EXTENSION_LIBRARY_PATH";

type CreateFn = unsafe extern "C" fn(u32, *mut *mut c_void) -> c_int;
type DestroyFn = unsafe extern "C" fn(*mut c_void) -> c_int;

/// An interface created by a loaded extension library.
///
/// Dropping it destroys the interface, then unloads the library.
pub struct DylibExtension {
    interface: *mut c_void,
    destroy: DestroyFn,
    version_tag: u32,
    library_path: String,
    _library: libloading::Library,
}

// The interface pointer is only ever handed to collaborators speaking the
// vendor ABI, which is thread-safe per its contract. The library stays
// loaded for the lifetime of the handle.
unsafe impl Send for DylibExtension {}
unsafe impl Sync for DylibExtension {}

impl DylibExtension {
    pub fn library_path(&self) -> &str {
        &self.library_path
    }
}

impl ExtensionInterface for DylibExtension {
    fn version_tag(&self) -> u32 {
        self.version_tag
    }

    fn as_raw(&self) -> *mut c_void {
        self.interface
    }
}

impl Drop for DylibExtension {
    fn drop(&mut self) {
        let ret = unsafe { (self.destroy)(self.interface) };
        if ret != 0 {
            warn!(
                "DylibExtension: destroy interface from {} returned {}",
                self.library_path, ret
            );
        } else {
            debug!("DylibExtension: destroyed interface from {}", self.library_path);
        }
    }
}

/// Loads the extension library by name from a list of directories.
#[derive(Debug, Clone)]
pub struct DylibExtensionLoader {
    pub library_name: String,
    pub search_dirs: Vec<PathBuf>,
    pub create_symbol: String,
    pub destroy_symbol: String,
    pub version_tag: u32,
}

impl Default for DylibExtensionLoader {
    fn default() -> Self {
        Self {
            library_name: DEFAULT_EXTENSION_LIBRARY.to_string(),
            search_dirs: vec![
                PathBuf::from("/vendor/lib64"),
                PathBuf::from("/usr/lib/display-core"),
                PathBuf::from("/usr/local/lib/display-core"),
            ],
            create_symbol: DEFAULT_CREATE_SYMBOL.to_string(),
            destroy_symbol: DEFAULT_DESTROY_SYMBOL.to_string(),
            version_tag: super::EXTENSION_VERSION_TAG,
        }
    }
}

impl DylibExtensionLoader {
    /// Candidate paths in search order. A bare library name at the end lets
    /// the dynamic linker apply its own search path.
    fn candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        if let Ok(explicit) = std::env::var(EXTENSION_PATH_ENV) {
            if !explicit.is_empty() {
                candidates.push(explicit);
            }
        }
        if self.library_name.contains('/') {
            candidates.push(self.library_name.clone());
            return candidates;
        }
        for dir in &self.search_dirs {
            let path = dir.join(&self.library_name);
            if path.exists() {
                candidates.push(path.display().to_string());
            }
        }
        candidates.push(self.library_name.clone());
        candidates
    }

    fn open(&self) -> Option<(libloading::Library, String)> {
        for candidate in self.candidates() {
            // Safety: the extension is a vendor-managed module named by
            // configuration, not an arbitrary blob.
            match unsafe { libloading::Library::new(&candidate) } {
                Ok(library) => return Some((library, candidate)),
                Err(e) => debug!("DylibExtensionLoader: dlopen {} failed: {}", candidate, e),
            }
        }
        None
    }

    fn symbol_bytes(name: &str) -> Vec<u8> {
        let mut bytes = name.as_bytes().to_vec();
        bytes.push(0);
        bytes
    }
}

impl ExtensionLoader for DylibExtensionLoader {
    fn load(&self) -> DisplayResult<Option<SharedExtension>> {
        let Some((library, path)) = self.open() else {
            warn!(
                "Unable to load {}, continuing without extension",
                self.library_name
            );
            return Ok(None);
        };

        let create_name = Self::symbol_bytes(&self.create_symbol);
        let destroy_name = Self::symbol_bytes(&self.destroy_symbol);

        let create: CreateFn = match unsafe { library.get::<CreateFn>(&create_name) } {
            Ok(symbol) => *symbol,
            Err(e) => {
                error!("Unable to load symbols from {}, error = {}", path, e);
                return Err(DisplayError::Undefined(format!(
                    "symbol {}: {}",
                    self.create_symbol, e
                )));
            }
        };
        let destroy: DestroyFn = match unsafe { library.get::<DestroyFn>(&destroy_name) } {
            Ok(symbol) => *symbol,
            Err(e) => {
                error!("Unable to load symbols from {}, error = {}", path, e);
                return Err(DisplayError::Undefined(format!(
                    "symbol {}: {}",
                    self.destroy_symbol, e
                )));
            }
        };

        let mut interface: *mut c_void = std::ptr::null_mut();
        let ret = unsafe { create(self.version_tag, std::ptr::addr_of_mut!(interface)) };
        if ret != 0 {
            error!("Unable to create extension interface from {} ({})", path, ret);
            return Err(DisplayError::from_status(ret));
        }
        if interface.is_null() {
            error!("Extension {} returned a null interface", path);
            return Err(DisplayError::Undefined(format!(
                "{} returned a null interface",
                self.create_symbol
            )));
        }

        info!(
            "Loaded extension {} (version tag {:#x})",
            path, self.version_tag
        );
        Ok(Some(Arc::new(DylibExtension {
            interface,
            destroy,
            version_tag: self.version_tag,
            library_path: path,
            _library: library,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LIBC_DIRS: &[&str] = &[
        "/lib/x86_64-linux-gnu",
        "/usr/lib/x86_64-linux-gnu",
        "/lib/aarch64-linux-gnu",
        "/usr/lib/aarch64-linux-gnu",
        "/lib64",
        "/usr/lib64",
        "/usr/lib",
        "/lib",
    ];

    #[test_log::test]
    fn it_should_treat_a_missing_module_as_no_extension() {
        let loader = DylibExtensionLoader {
            library_name: "libdisplay-core-missing-extension.so".to_string(),
            search_dirs: vec![PathBuf::from("/nonexistent/display-core")],
            ..DylibExtensionLoader::default()
        };
        assert!(loader.load().unwrap().is_none());
    }

    #[test_log::test]
    fn it_should_treat_an_unloadable_file_as_no_extension() {
        let dir = std::env::temp_dir().join(format!("display-core-ext-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("libbroken-extension.so"), b"not an ELF image").unwrap();

        let loader = DylibExtensionLoader {
            library_name: "libbroken-extension.so".to_string(),
            search_dirs: vec![dir.clone()],
            ..DylibExtensionLoader::default()
        };
        let result = loader.load();
        let _ = fs::remove_dir_all(&dir);

        assert!(result.unwrap().is_none());
    }

    #[test_log::test]
    fn it_should_fail_when_a_loaded_module_lacks_the_entry_points() {
        let Some(dir) = LIBC_DIRS
            .iter()
            .map(PathBuf::from)
            .find(|dir| dir.join("libc.so.6").exists())
        else {
            return;
        };

        let loader = DylibExtensionLoader {
            library_name: "libc.so.6".to_string(),
            search_dirs: vec![dir],
            ..DylibExtensionLoader::default()
        };
        assert!(matches!(loader.load(), Err(DisplayError::Undefined(_))));
    }
}
