// src/display/driver.rs
//! Per-display interface handed to callers of the display core.
//!
//! ## Lifecycle
//! 1. Construction - Pure wiring: collaborators are stored, nothing is claimed
//! 2. `init()` - Bind hardware, claim composition resources
//! 3. Caller drives the display (`set_display_state`, queries)
//! 4. `deinit()` - Release everything claimed in `init()`
//!
//! A display whose `init()` fails holds no resources and is dropped by the
//! core without ever reaching the caller.

use crate::error::DisplayResult;
use crate::types::DisplayVariant;
use std::sync::Arc;

/// Power state of a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Off,
    On,
    /// Low-power mode that keeps the panel showing its last frame.
    Doze,
    /// Powered but not scanning out.
    Standby,
}

/// Callbacks from a display to its owner.
///
/// Callbacks only fire from calls the owner makes on the display itself
/// (`set_display_state`). Creation and `deinit()` run under the core's lock
/// and never call back, so a handler may re-enter the core.
pub trait DisplayEventHandler: Send + Sync {
    /// The display needs a new frame (power-on, mode change).
    fn refresh(&self, variant: DisplayVariant, display_id: Option<i32>);

    /// The display changed power state.
    fn state_changed(&self, variant: DisplayVariant, display_id: Option<i32>, state: DisplayState) {
        let _ = (variant, display_id, state);
    }
}

pub type SharedEventHandler = Arc<dyn DisplayEventHandler>;

/// Capability set of a display created by the core.
pub trait DisplayInterface: Send {
    fn variant(&self) -> DisplayVariant;

    /// Hardware display id the object is bound to, once known.
    fn display_id(&self) -> Option<i32>;

    fn name(&self) -> &str;

    fn state(&self) -> DisplayState;

    fn set_display_state(&mut self, state: DisplayState) -> DisplayResult<()>;

    fn init(&mut self) -> DisplayResult<()>;

    fn deinit(&mut self) -> DisplayResult<()>;
}

/// Ownership of a created display. Returned to the core for destruction.
pub type DisplayHandle = Box<dyn DisplayInterface>;
