// src/comp_manager.rs

//! Composition resource manager boundary.
//!
//! One manager instance is shared by the core and every display it creates.
//! It owns the hardware composition resources (mixers, per-kind display
//! slots, bandwidth policy) and synchronizes its own state.

use crate::error::{DisplayError, DisplayResult};
use crate::extension::SharedExtension;
use crate::services::{SharedAllocator, SharedSocketHandler};
use crate::types::{
    DisplayVariant, HwBwMode, HwCapabilities, HwResourceInfo, LayerBufferFormat,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Token identifying a display registered with the composition manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompRegistration(u64);

pub trait CompManager: Send + Sync {
    fn init(
        &self,
        hw_resource: &HwResourceInfo,
        extension: Option<SharedExtension>,
        allocator: SharedAllocator,
        socket_handler: SharedSocketHandler,
    ) -> DisplayResult<()>;

    fn deinit(&self);

    fn set_max_bandwidth_mode(&self, mode: HwBwMode) -> DisplayResult<()>;

    fn is_rotator_supported_format(&self, format: LayerBufferFormat) -> bool;

    /// Claims composition resources for a display.
    fn register_display(
        &self,
        variant: DisplayVariant,
        display_id: Option<i32>,
    ) -> DisplayResult<CompRegistration>;

    fn unregister_display(&self, registration: CompRegistration);
}

pub type SharedCompManager = Arc<dyn CompManager>;

struct ActiveDisplay {
    variant: DisplayVariant,
    display_id: Option<i32>,
}

struct Initialized {
    hw_resource: HwResourceInfo,
    extension: Option<SharedExtension>,
    _allocator: SharedAllocator,
    _socket_handler: SharedSocketHandler,
}

#[derive(Default)]
struct CompState {
    initialized: Option<Initialized>,
    bw_mode: HwBwMode,
    active: HashMap<CompRegistration, ActiveDisplay>,
    next_registration: u64,
}

/// Default manager: bounds active displays by the resource description.
#[derive(Default)]
pub struct ResourceCompManager {
    state: Mutex<CompState>,
}

impl ResourceCompManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CompState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn bandwidth_mode(&self) -> HwBwMode {
        self.lock().bw_mode
    }

    pub fn active_displays(&self) -> usize {
        self.lock().active.len()
    }

    pub fn has_extension(&self) -> bool {
        self.lock()
            .initialized
            .as_ref()
            .is_some_and(|init| init.extension.is_some())
    }
}

impl CompManager for ResourceCompManager {
    fn init(
        &self,
        hw_resource: &HwResourceInfo,
        extension: Option<SharedExtension>,
        allocator: SharedAllocator,
        socket_handler: SharedSocketHandler,
    ) -> DisplayResult<()> {
        let mut state = self.lock();
        if state.initialized.is_some() {
            warn!("ResourceCompManager: init called twice");
            return Err(DisplayError::Parameters);
        }
        if hw_resource.num_mixers == 0 {
            warn!("ResourceCompManager: hardware reports no layer mixers");
            return Err(DisplayError::Resources);
        }

        info!(
            "ResourceCompManager: init - {} mixers, {} kbps, extension={}",
            hw_resource.num_mixers,
            hw_resource.max_bandwidth_kbps,
            extension.is_some()
        );
        state.initialized = Some(Initialized {
            hw_resource: hw_resource.clone(),
            extension,
            _allocator: allocator,
            _socket_handler: socket_handler,
        });
        state.bw_mode = HwBwMode::Default;
        Ok(())
    }

    fn deinit(&self) {
        let mut state = self.lock();
        if !state.active.is_empty() {
            warn!(
                "ResourceCompManager: deinit with {} displays still registered",
                state.active.len()
            );
        }
        state.active.clear();
        state.initialized = None;
        info!("ResourceCompManager: deinit");
    }

    fn set_max_bandwidth_mode(&self, mode: HwBwMode) -> DisplayResult<()> {
        let mut state = self.lock();
        let init = state
            .initialized
            .as_ref()
            .ok_or(DisplayError::NotInitialized)?;
        if mode == HwBwMode::Optimal && init.hw_resource.max_bandwidth_kbps == 0 {
            return Err(DisplayError::NotSupported);
        }
        debug!("ResourceCompManager: bandwidth mode {:?}", mode);
        state.bw_mode = mode;
        Ok(())
    }

    fn is_rotator_supported_format(&self, format: LayerBufferFormat) -> bool {
        let state = self.lock();
        state.initialized.as_ref().is_some_and(|init| {
            init.hw_resource.capabilities.contains(HwCapabilities::ROTATOR)
                && init.hw_resource.rotator_formats.contains(&format)
        })
    }

    fn register_display(
        &self,
        variant: DisplayVariant,
        display_id: Option<i32>,
    ) -> DisplayResult<CompRegistration> {
        let mut state = self.lock();
        let init = state
            .initialized
            .as_ref()
            .ok_or(DisplayError::NotInitialized)?;
        let limit = init.hw_resource.max_displays(variant);
        let mixers = init.hw_resource.num_mixers as usize;

        if display_id.is_some()
            && state
                .active
                .values()
                .any(|active| active.display_id == display_id)
        {
            warn!(
                "ResourceCompManager: display id {:?} is already driven",
                display_id
            );
            return Err(DisplayError::Resources);
        }

        let same_kind = state
            .active
            .values()
            .filter(|active| active.variant == variant)
            .count();
        if same_kind >= limit as usize {
            warn!(
                "ResourceCompManager: {} limit of {} reached",
                variant, limit
            );
            return Err(DisplayError::Resources);
        }

        if variant != DisplayVariant::Virtual {
            let on_mixers = state
                .active
                .values()
                .filter(|active| active.variant != DisplayVariant::Virtual)
                .count();
            if on_mixers >= mixers {
                warn!("ResourceCompManager: all {} mixers in use", mixers);
                return Err(DisplayError::Resources);
            }
        }

        let registration = CompRegistration(state.next_registration);
        state.next_registration += 1;
        state.active.insert(
            registration,
            ActiveDisplay {
                variant,
                display_id,
            },
        );
        debug!(
            "ResourceCompManager: registered {} display {:?} as {:?}",
            variant, display_id, registration
        );
        Ok(registration)
    }

    fn unregister_display(&self, registration: CompRegistration) {
        if self.lock().active.remove(&registration).is_none() {
            warn!(
                "ResourceCompManager: unknown registration {:?}",
                registration
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{HeapBufferAllocator, UnixSocketHandler};

    fn init_manager(resource: &HwResourceInfo) -> ResourceCompManager {
        let manager = ResourceCompManager::new();
        manager
            .init(
                resource,
                None,
                Arc::new(HeapBufferAllocator::default()),
                Arc::new(UnixSocketHandler::new("/tmp")),
            )
            .unwrap();
        manager
    }

    #[test_log::test]
    fn it_should_bound_displays_per_variant() {
        let manager = init_manager(&HwResourceInfo::default());
        let first = manager
            .register_display(DisplayVariant::Pluggable, Some(1))
            .unwrap();
        assert_eq!(
            manager.register_display(DisplayVariant::Pluggable, Some(2)),
            Err(DisplayError::Resources)
        );
        manager.unregister_display(first);
        assert!(manager
            .register_display(DisplayVariant::Pluggable, Some(2))
            .is_ok());
    }

    #[test_log::test]
    fn it_should_not_drive_the_same_display_twice() {
        let resource = HwResourceInfo {
            max_builtin_displays: 2,
            ..HwResourceInfo::default()
        };
        let manager = init_manager(&resource);
        manager
            .register_display(DisplayVariant::BuiltIn, Some(0))
            .unwrap();
        assert_eq!(
            manager.register_display(DisplayVariant::BuiltIn, Some(0)),
            Err(DisplayError::Resources)
        );
    }

    #[test_log::test]
    fn it_should_require_init_before_registration() {
        let manager = ResourceCompManager::new();
        assert_eq!(
            manager.register_display(DisplayVariant::Virtual, None),
            Err(DisplayError::NotInitialized)
        );
        assert_eq!(
            manager.set_max_bandwidth_mode(HwBwMode::Vfe),
            Err(DisplayError::NotInitialized)
        );
        assert!(!manager.is_rotator_supported_format(LayerBufferFormat::Nv12));
    }

    #[test_log::test]
    fn it_should_answer_rotator_formats_from_the_resource_description() {
        let manager = init_manager(&HwResourceInfo::default());
        assert!(manager.is_rotator_supported_format(LayerBufferFormat::Nv12));
        assert!(!manager.is_rotator_supported_format(LayerBufferFormat::Rgb565));

        let no_rotator = HwResourceInfo {
            capabilities: HwCapabilities::COLOR_PIPELINE,
            ..HwResourceInfo::default()
        };
        let manager = init_manager(&no_rotator);
        assert!(!manager.is_rotator_supported_format(LayerBufferFormat::Nv12));
    }

    #[test_log::test]
    fn it_should_reject_optimal_bandwidth_without_a_budget() {
        let resource = HwResourceInfo {
            max_bandwidth_kbps: 0,
            ..HwResourceInfo::default()
        };
        let manager = init_manager(&resource);
        assert_eq!(
            manager.set_max_bandwidth_mode(HwBwMode::Optimal),
            Err(DisplayError::NotSupported)
        );
        manager.set_max_bandwidth_mode(HwBwMode::Vfe).unwrap();
        assert_eq!(manager.bandwidth_mode(), HwBwMode::Vfe);
    }

    #[test_log::test]
    fn it_should_refuse_hardware_without_mixers() {
        let resource = HwResourceInfo {
            num_mixers: 0,
            ..HwResourceInfo::default()
        };
        let manager = ResourceCompManager::new();
        let result = manager.init(
            &resource,
            None,
            Arc::new(HeapBufferAllocator::default()),
            Arc::new(UnixSocketHandler::new("/tmp")),
        );
        assert_eq!(result, Err(DisplayError::Resources));
    }
}
