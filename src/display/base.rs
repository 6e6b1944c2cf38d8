// src/display/base.rs
//! State and resource handling shared by every display kind.

use crate::comp_manager::{CompRegistration, SharedCompManager};
use crate::display::driver::{DisplayState, SharedEventHandler};
use crate::error::{DisplayError, DisplayResult};
use crate::hw_info::SharedHwInfo;
use crate::services::SharedAllocator;
use crate::types::{DisplayVariant, HwDisplayInfo};
use log::{debug, info, warn};

/// Collaborators every display is constructed with. None of them are owned
/// by the display; each is shared with the core and the other displays.
#[derive(Clone)]
pub struct DisplayContext {
    pub event_handler: SharedEventHandler,
    pub hw_info: SharedHwInfo,
    pub allocator: SharedAllocator,
    pub comp_manager: SharedCompManager,
}

pub struct DisplayBase {
    variant: DisplayVariant,
    display_id: Option<i32>,
    name: String,
    ctx: DisplayContext,
    registration: Option<CompRegistration>,
    state: DisplayState,
}

impl DisplayBase {
    pub fn new(variant: DisplayVariant, display_id: Option<i32>, ctx: DisplayContext) -> Self {
        let name = match display_id {
            Some(id) => format!("{}-{}", variant, id),
            None => variant.to_string(),
        };
        Self {
            variant,
            display_id,
            name,
            ctx,
            registration: None,
            state: DisplayState::Off,
        }
    }

    pub fn variant(&self) -> DisplayVariant {
        self.variant
    }

    pub fn display_id(&self) -> Option<i32> {
        self.display_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn context(&self) -> &DisplayContext {
        &self.ctx
    }

    pub fn is_initialized(&self) -> bool {
        self.registration.is_some()
    }

    /// Resolves the hardware entry this display drives.
    ///
    /// With a bound id the entry must exist in a fresh status query; without
    /// one the primary entry of this kind wins, then the lowest id.
    pub fn resolve_hw_display(&mut self, require_connected: bool) -> DisplayResult<HwDisplayInfo> {
        let displays = self.ctx.hw_info.get_displays_status()?;

        let entry = match self.display_id {
            Some(id) => {
                let entry = displays.get(&id).cloned().ok_or_else(|| {
                    DisplayError::Hardware(format!("display {} is not reported by hardware", id))
                })?;
                if entry.display_type != self.variant {
                    return Err(DisplayError::Hardware(format!(
                        "display {} is {} hardware, not {}",
                        id, entry.display_type, self.variant
                    )));
                }
                entry
            }
            None => {
                let mut candidates = displays
                    .values()
                    .filter(|info| info.display_type == self.variant)
                    .filter(|info| !require_connected || info.is_connected);
                let first = candidates.next().cloned();
                displays
                    .values()
                    .find(|info| {
                        info.display_type == self.variant
                            && info.is_primary
                            && (!require_connected || info.is_connected)
                    })
                    .cloned()
                    .or(first)
                    .ok_or_else(|| {
                        DisplayError::Hardware(format!("no {} display reported", self.variant))
                    })?
            }
        };

        if require_connected && !entry.is_connected {
            return Err(DisplayError::Hardware(format!(
                "display {} ({}) is not connected",
                entry.display_id, entry.name
            )));
        }

        if self.display_id.is_none() {
            self.display_id = Some(entry.display_id);
            self.name = format!("{}-{}", self.variant, entry.display_id);
        }
        Ok(entry)
    }

    /// Claims composition resources. Called last in every kind's `init()`.
    pub fn register(&mut self) -> DisplayResult<()> {
        if self.registration.is_some() {
            return Err(DisplayError::Parameters);
        }
        let registration = self
            .ctx
            .comp_manager
            .register_display(self.variant, self.display_id)?;
        self.registration = Some(registration);
        info!("Display {}: initialized", self.name);
        Ok(())
    }

    pub fn unregister(&mut self) {
        if let Some(registration) = self.registration.take() {
            self.ctx.comp_manager.unregister_display(registration);
            debug!("Display {}: released composition resources", self.name);
        }
    }

    pub fn set_state(&mut self, state: DisplayState) -> DisplayResult<()> {
        if !self.is_initialized() {
            return Err(DisplayError::NotInitialized);
        }
        if self.state == state {
            return Ok(());
        }
        debug!("Display {}: {:?} -> {:?}", self.name, self.state, state);
        self.state = state;
        self.ctx
            .event_handler
            .state_changed(self.variant, self.display_id, state);
        if state == DisplayState::On {
            self.ctx.event_handler.refresh(self.variant, self.display_id);
        }
        Ok(())
    }

    pub fn deinit(&mut self) -> DisplayResult<()> {
        if !self.is_initialized() {
            return Err(DisplayError::NotInitialized);
        }
        // Teardown runs under the owner's lock; the handler is not called
        // back from here.
        self.state = DisplayState::Off;
        self.unregister();
        info!("Display {}: deinitialized", self.name);
        Ok(())
    }
}

impl Drop for DisplayBase {
    fn drop(&mut self) {
        if self.registration.is_some() {
            warn!("Display {}: dropped without deinit", self.name);
            self.unregister();
        }
    }
}
