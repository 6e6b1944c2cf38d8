// src/lifecycle/mod.rs
//! DisplayCore - bootstrap, display factory and teardown.
//!
//! The core is a monitor: every public operation takes the same lock for its
//! full duration, so bootstrap, teardown, display creation and destruction,
//! and all accessors execute one at a time. The lock guards the extension
//! handle, the hardware-info provider, the resource description and the
//! cached display topology.
//!
//! ## Bootstrap order
//! 1. Extension module (absent: continue; broken: abort)
//! 2. Hardware-info provider
//! 3. Hardware resource description
//! 4. Composition manager
//! 5. Color manager (failure tolerated)
//! 6. Display topology snapshot (failure tolerated)
//! 7. Broken-pipe policy
//!
//! A failure in steps 1-4 releases what was acquired so far, in reverse
//! order, and returns the originating error.
//!
//! ## Topology
//! The topology snapshot is refreshed at bootstrap and by
//! `get_displays_status()` only. Creation by display id resolves against
//! the snapshot, so a display attached since the last refresh is rejected
//! until the caller refreshes.

mod guard;


use crate::color_manager::SharedColorManager;
use crate::comp_manager::SharedCompManager;
use crate::display::{construct, DisplayContext, DisplayHandle, SharedEventHandler};
use crate::error::{DisplayError, DisplayResult};
use crate::extension::{ExtensionLoader, SharedExtension};
use crate::hw_info::{HwInfoFactory, SharedHwInfo};
use crate::os::signal::ignore_broken_pipe;
use crate::services::{SharedAllocator, SharedSocketHandler};
use crate::types::{
    DisplayVariant, HwBwMode, HwDisplayInterfaceInfo, HwDisplaysInfo, HwResourceInfo,
    LayerBufferFormat,
};
use guard::HwInfoGuard;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Collaborators the core orchestrates. All are shared: the core hands the
/// same instances to every display it creates.
#[derive(Clone)]
pub struct Collaborators {
    pub extension_loader: Arc<dyn ExtensionLoader>,
    pub hw_info_factory: Arc<dyn HwInfoFactory>,
    pub comp_manager: SharedCompManager,
    pub color_manager: SharedColorManager,
}

/// State owned by the core between bootstrap and teardown.
#[derive(Default)]
struct CoreState {
    extension: Option<SharedExtension>,
    hw_info: Option<SharedHwInfo>,
    hw_resource: Option<Arc<HwResourceInfo>>,
    hw_displays_info: HwDisplaysInfo,
}

pub struct DisplayCore {
    buffer_allocator: SharedAllocator,
    socket_handler: SharedSocketHandler,
    collaborators: Collaborators,
    state: Mutex<CoreState>,
}

impl DisplayCore {
    pub fn new(
        buffer_allocator: SharedAllocator,
        socket_handler: SharedSocketHandler,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            buffer_allocator,
            socket_handler,
            collaborators,
            state: Mutex::new(CoreState::default()),
        }
    }

    // Operations never panic while holding the lock, but a panicking
    // collaborator must not wedge every later caller.
    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs the bootstrap sequence. Must complete before any factory call.
    pub fn init(&self) -> DisplayResult<()> {
        let mut state = self.lock();
        if state.hw_info.is_some() {
            error!("DisplayCore: init called on an initialized core");
            return Err(DisplayError::Parameters);
        }

        let extension = self.collaborators.extension_loader.load()?;
        match &extension {
            Some(ext) => info!(
                "DisplayCore: extension interface ready (version tag {:#x})",
                ext.version_tag()
            ),
            None => warn!("DisplayCore: no extension interface, continuing without it"),
        }

        let hw_factory = self.collaborators.hw_info_factory.as_ref();
        let hw_info = HwInfoGuard::new(hw_factory, hw_factory.create()?);

        let hw_resource = Arc::new(hw_info.get_hw_resource_info()?);
        debug!("DisplayCore: hardware resources {:?}", hw_resource);

        self.collaborators.comp_manager.init(
            &hw_resource,
            extension.clone(),
            self.buffer_allocator.clone(),
            self.socket_handler.clone(),
        )?;

        if let Err(e) = self.collaborators.color_manager.init(&hw_resource) {
            warn!(
                "DisplayCore: unable to create color manager ({}), continuing without it",
                e
            );
        }

        let hw_displays_info = match hw_info.get_displays_status() {
            Ok(displays) => displays,
            Err(e) => {
                warn!("DisplayCore: failed getting displays status: {}", e);
                HwDisplaysInfo::new()
            }
        };

        ignore_broken_pipe();

        info!(
            "DisplayCore: initialized with {} displays in topology",
            hw_displays_info.len()
        );
        state.hw_info = Some(hw_info.disarm());
        state.extension = extension;
        state.hw_resource = Some(hw_resource);
        state.hw_displays_info = hw_displays_info;
        Ok(())
    }

    /// Releases color manager, composition manager and hardware-info
    /// provider, in that order, then drops the extension and topology.
    pub fn deinit(&self) -> DisplayResult<()> {
        let mut state = self.lock();

        self.collaborators.color_manager.deinit();
        self.collaborators.comp_manager.deinit();
        match state.hw_info.take() {
            Some(hw_info) => self.collaborators.hw_info_factory.destroy(hw_info),
            None => warn!("DisplayCore: deinit without a hardware info provider"),
        }

        state.hw_resource = None;
        state.hw_displays_info.clear();
        state.extension = None;
        info!("DisplayCore: deinitialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().hw_info.is_some()
    }

    /// Creates and initializes a display of the given kind.
    pub fn create_display(
        &self,
        variant: DisplayVariant,
        event_handler: Option<SharedEventHandler>,
    ) -> DisplayResult<DisplayHandle> {
        let state = self.lock();
        let event_handler = event_handler.ok_or(DisplayError::Parameters)?;
        self.create_locked(&state, variant, None, event_handler)
    }

    /// `create_display` for a raw variant code as reported across process
    /// or ABI boundaries.
    pub fn create_display_raw(
        &self,
        variant_code: i32,
        event_handler: Option<SharedEventHandler>,
    ) -> DisplayResult<DisplayHandle> {
        let state = self.lock();
        let event_handler = event_handler.ok_or(DisplayError::Parameters)?;
        let variant = DisplayVariant::try_from(variant_code).map_err(|e| {
            error!("DisplayCore: spurious display type {}", variant_code);
            e
        })?;
        self.create_locked(&state, variant, None, event_handler)
    }

    /// Creates the display the cached topology reports under `display_id`.
    pub fn create_display_by_id(
        &self,
        display_id: i32,
        event_handler: Option<SharedEventHandler>,
    ) -> DisplayResult<DisplayHandle> {
        let state = self.lock();
        let event_handler = event_handler.ok_or(DisplayError::Parameters)?;

        let Some(entry) = state.hw_displays_info.get(&display_id) else {
            error!("DisplayCore: spurious display id {}", display_id);
            return Err(DisplayError::Parameters);
        };
        let variant = entry.display_type;
        self.create_locked(&state, variant, Some(display_id), event_handler)
    }

    fn create_locked(
        &self,
        state: &CoreState,
        variant: DisplayVariant,
        display_id: Option<i32>,
        event_handler: SharedEventHandler,
    ) -> DisplayResult<DisplayHandle> {
        let hw_info = state.hw_info.clone().ok_or(DisplayError::NotInitialized)?;
        let ctx = DisplayContext {
            event_handler,
            hw_info,
            allocator: self.buffer_allocator.clone(),
            comp_manager: self.collaborators.comp_manager.clone(),
        };

        let mut display = construct(variant, display_id, ctx);
        if let Err(e) = display.init() {
            warn!(
                "DisplayCore: {} display {:?} failed to initialize: {}",
                variant, display_id, e
            );
            return Err(e);
        }

        info!("DisplayCore: created display {}", display.name());
        Ok(display)
    }

    /// Deinitializes and releases a display created by this core.
    ///
    /// The handle is released even when its deinit reports an error.
    pub fn destroy_display(&self, display: Option<DisplayHandle>) -> DisplayResult<()> {
        let _state = self.lock();
        let mut display = display.ok_or(DisplayError::Parameters)?;

        let name = display.name().to_string();
        let result = display.deinit();
        drop(display);

        match &result {
            Ok(()) => info!("DisplayCore: destroyed display {}", name),
            Err(e) => warn!("DisplayCore: display {} deinit failed: {}", name, e),
        }
        result
    }

    pub fn set_max_bandwidth_mode(&self, mode: HwBwMode) -> DisplayResult<()> {
        let _state = self.lock();
        self.collaborators.comp_manager.set_max_bandwidth_mode(mode)
    }

    pub fn get_first_display_interface_type(&self) -> DisplayResult<HwDisplayInterfaceInfo> {
        let state = self.lock();
        Self::hw_info(&state)?.get_first_display_interface_type()
    }

    /// Queries the hardware topology and, on success, replaces the cached
    /// snapshot used by `create_display_by_id`.
    pub fn get_displays_status(&self) -> DisplayResult<HwDisplaysInfo> {
        let mut state = self.lock();
        let displays = Self::hw_info(&state)?.get_displays_status()?;
        state.hw_displays_info = displays.clone();
        Ok(displays)
    }

    pub fn get_max_displays_supported(&self, variant: DisplayVariant) -> DisplayResult<u32> {
        let state = self.lock();
        Self::hw_info(&state)?.get_max_displays_supported(variant)
    }

    pub fn is_rotator_supported_format(&self, format: LayerBufferFormat) -> bool {
        let _state = self.lock();
        self.collaborators
            .comp_manager
            .is_rotator_supported_format(format)
    }

    /// Snapshot the id-based factory currently resolves against.
    pub fn cached_topology(&self) -> HwDisplaysInfo {
        self.lock().hw_displays_info.clone()
    }

    pub fn hw_resource_info(&self) -> Option<Arc<HwResourceInfo>> {
        self.lock().hw_resource.clone()
    }

    pub fn has_extension(&self) -> bool {
        self.lock().extension.is_some()
    }

    fn hw_info(state: &CoreState) -> DisplayResult<&SharedHwInfo> {
        state.hw_info.as_ref().ok_or(DisplayError::NotInitialized)
    }
}
