// src/mock.rs
//! Recording collaborators for unit tests.
//!
//! Every mock appends to a shared `CallLog` so tests can assert the order in
//! which the core drives its collaborators, and each carries an injectable
//! failure.

use crate::color_manager::ColorManager;
use crate::comp_manager::{CompManager, CompRegistration, ResourceCompManager};
use crate::display::{DisplayEventHandler, DisplayHandle, DisplayInterface, DisplayState};
use crate::error::{DisplayError, DisplayResult};
use crate::extension::{ExtensionInterface, ExtensionLoader, SharedExtension};
use crate::hw_info::{HwInfoFactory, HwInfoInterface, SharedHwInfo};
use crate::services::{SharedAllocator, SharedSocketHandler};
use crate::types::{
    DisplayVariant, HwBwMode, HwDisplayInfo, HwDisplayInterfaceInfo, HwDisplaysInfo,
    HwResourceInfo, LayerBufferFormat,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared by every mock: the ordered call record, plus a count of mock
/// calls in progress so tests can catch two core operations overlapping.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c == call)
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Marks a mock call as running until the guard drops. The short sleep
    /// widens the window in which an unserialized caller would overlap.
    pub fn enter(&self) -> InFlight {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_micros(50));
        InFlight(self.in_flight.clone())
    }

    /// Highest number of mock calls seen running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

pub struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn hw_display(id: i32, variant: DisplayVariant, connected: bool) -> HwDisplayInfo {
    HwDisplayInfo {
        display_id: id,
        display_type: variant,
        is_connected: connected,
        is_primary: false,
        name: format!("{}-{}", variant, id),
    }
}

// --- Hardware info ---

pub struct MockHwInfo {
    log: CallLog,
    pub resource: Mutex<DisplayResult<HwResourceInfo>>,
    pub displays: Mutex<HwDisplaysInfo>,
    pub status_error: Mutex<Option<DisplayError>>,
    /// Status queries issued by the displays themselves are not logged.
    pub status_queries: AtomicUsize,
}

impl MockHwInfo {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            resource: Mutex::new(Ok(HwResourceInfo::default())),
            displays: Mutex::new(HwDisplaysInfo::new()),
            status_error: Mutex::new(None),
            status_queries: AtomicUsize::new(0),
        }
    }

    pub fn set_displays(&self, displays: impl IntoIterator<Item = HwDisplayInfo>) {
        *self.displays.lock().unwrap() = displays
            .into_iter()
            .map(|info| (info.display_id, info))
            .collect();
    }
}

impl HwInfoInterface for MockHwInfo {
    fn get_hw_resource_info(&self) -> DisplayResult<HwResourceInfo> {
        self.log.push("hw.resource");
        self.resource.lock().unwrap().clone()
    }

    fn get_displays_status(&self) -> DisplayResult<HwDisplaysInfo> {
        let _busy = self.log.enter();
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.status_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(self.displays.lock().unwrap().clone())
    }

    fn get_max_displays_supported(&self, variant: DisplayVariant) -> DisplayResult<u32> {
        self.log.push("hw.max_displays");
        self.resource
            .lock()
            .unwrap()
            .as_ref()
            .map(|resource| resource.max_displays(variant))
            .map_err(|e| e.clone())
    }

    fn get_first_display_interface_type(&self) -> DisplayResult<HwDisplayInterfaceInfo> {
        self.log.push("hw.first_interface");
        crate::hw_info::first_interface(&self.displays.lock().unwrap())
            .ok_or(DisplayError::NotSupported)
    }
}

pub struct MockHwInfoFactory {
    log: CallLog,
    pub hw_info: Arc<MockHwInfo>,
    pub create_error: Mutex<Option<DisplayError>>,
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
}

impl MockHwInfoFactory {
    pub fn new(log: CallLog) -> Self {
        Self {
            hw_info: Arc::new(MockHwInfo::new(log.clone())),
            log,
            create_error: Mutex::new(None),
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
        }
    }

    pub fn live(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.destroyed.load(Ordering::SeqCst)
    }
}

impl HwInfoFactory for MockHwInfoFactory {
    fn create(&self) -> DisplayResult<SharedHwInfo> {
        self.log.push("hw.create");
        if let Some(e) = self.create_error.lock().unwrap().clone() {
            return Err(e);
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self.hw_info.clone())
    }

    fn destroy(&self, _hw_info: SharedHwInfo) {
        self.log.push("hw.destroy");
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

// --- Extension ---

pub struct MockExtension {
    log: CallLog,
}

impl ExtensionInterface for MockExtension {
    fn version_tag(&self) -> u32 {
        crate::extension::EXTENSION_VERSION_TAG
    }

    fn as_raw(&self) -> *mut libc::c_void {
        std::ptr::null_mut()
    }
}

impl Drop for MockExtension {
    fn drop(&mut self) {
        self.log.push("ext.destroy");
    }
}

pub enum ExtensionOutcome {
    Absent,
    Present,
    Fail(DisplayError),
}

pub struct MockExtensionLoader {
    log: CallLog,
    pub outcome: Mutex<ExtensionOutcome>,
}

impl MockExtensionLoader {
    pub fn new(log: CallLog, outcome: ExtensionOutcome) -> Self {
        Self {
            log,
            outcome: Mutex::new(outcome),
        }
    }
}

impl ExtensionLoader for MockExtensionLoader {
    fn load(&self) -> DisplayResult<Option<SharedExtension>> {
        self.log.push("ext.load");
        match &*self.outcome.lock().unwrap() {
            ExtensionOutcome::Absent => Ok(None),
            ExtensionOutcome::Present => Ok(Some(Arc::new(MockExtension {
                log: self.log.clone(),
            }))),
            ExtensionOutcome::Fail(e) => Err(e.clone()),
        }
    }
}

// --- Composition manager ---

pub struct MockCompManager {
    log: CallLog,
    pub inner: ResourceCompManager,
    pub init_error: Mutex<Option<DisplayError>>,
    pub register_error: Mutex<Option<DisplayError>>,
    pub extension_seen: Mutex<Option<bool>>,
}

impl MockCompManager {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            inner: ResourceCompManager::new(),
            init_error: Mutex::new(None),
            register_error: Mutex::new(None),
            extension_seen: Mutex::new(None),
        }
    }
}

impl CompManager for MockCompManager {
    fn init(
        &self,
        hw_resource: &HwResourceInfo,
        extension: Option<SharedExtension>,
        allocator: SharedAllocator,
        socket_handler: SharedSocketHandler,
    ) -> DisplayResult<()> {
        self.log.push("comp.init");
        *self.extension_seen.lock().unwrap() = Some(extension.is_some());
        if let Some(e) = self.init_error.lock().unwrap().clone() {
            return Err(e);
        }
        self.inner
            .init(hw_resource, extension, allocator, socket_handler)
    }

    fn deinit(&self) {
        self.log.push("comp.deinit");
        self.inner.deinit();
    }

    fn set_max_bandwidth_mode(&self, mode: HwBwMode) -> DisplayResult<()> {
        self.log.push("comp.bandwidth");
        self.inner.set_max_bandwidth_mode(mode)
    }

    fn is_rotator_supported_format(&self, format: LayerBufferFormat) -> bool {
        self.log.push("comp.rotator");
        self.inner.is_rotator_supported_format(format)
    }

    fn register_display(
        &self,
        variant: DisplayVariant,
        display_id: Option<i32>,
    ) -> DisplayResult<CompRegistration> {
        let _busy = self.log.enter();
        if let Some(e) = self.register_error.lock().unwrap().clone() {
            return Err(e);
        }
        self.inner.register_display(variant, display_id)
    }

    fn unregister_display(&self, registration: CompRegistration) {
        let _busy = self.log.enter();
        self.inner.unregister_display(registration)
    }
}

// --- Color manager ---

pub struct MockColorManager {
    log: CallLog,
    pub init_error: Mutex<Option<DisplayError>>,
}

impl MockColorManager {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            init_error: Mutex::new(None),
        }
    }
}

impl ColorManager for MockColorManager {
    fn init(&self, _hw_resource: &HwResourceInfo) -> DisplayResult<()> {
        self.log.push("color.init");
        match self.init_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn deinit(&self) {
        self.log.push("color.deinit");
    }
}

// --- Event handler ---

#[derive(Default)]
pub struct RecordingEventHandler {
    pub refreshes: Mutex<Vec<(DisplayVariant, Option<i32>)>>,
    pub states: Mutex<Vec<(DisplayVariant, Option<i32>, DisplayState)>>,
}

impl DisplayEventHandler for RecordingEventHandler {
    fn refresh(&self, variant: DisplayVariant, display_id: Option<i32>) {
        self.refreshes.lock().unwrap().push((variant, display_id));
    }

    fn state_changed(&self, variant: DisplayVariant, display_id: Option<i32>, state: DisplayState) {
        self.states.lock().unwrap().push((variant, display_id, state));
    }
}

// --- Displays ---

/// Wraps a created display and fails `deinit()` without releasing anything,
/// leaving the release to drop.
pub struct FailingDeinitDisplay {
    pub inner: DisplayHandle,
    pub error: DisplayError,
}

impl DisplayInterface for FailingDeinitDisplay {
    fn variant(&self) -> DisplayVariant {
        self.inner.variant()
    }

    fn display_id(&self) -> Option<i32> {
        self.inner.display_id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn state(&self) -> DisplayState {
        self.inner.state()
    }

    fn set_display_state(&mut self, state: DisplayState) -> DisplayResult<()> {
        self.inner.set_display_state(state)
    }

    fn init(&mut self) -> DisplayResult<()> {
        self.inner.init()
    }

    fn deinit(&mut self) -> DisplayResult<()> {
        Err(self.error.clone())
    }
}
