// src/display/drivers/builtin.rs
//! Panel wired into the device.

use crate::display::base::{DisplayBase, DisplayContext};
use crate::display::driver::{DisplayInterface, DisplayState};
use crate::error::DisplayResult;
use crate::types::DisplayVariant;
use log::info;

pub struct DisplayBuiltIn {
    base: DisplayBase,
    is_primary: bool,
}

impl DisplayBuiltIn {
    pub fn new(display_id: Option<i32>, ctx: DisplayContext) -> Self {
        Self {
            base: DisplayBase::new(DisplayVariant::BuiltIn, display_id, ctx),
            is_primary: false,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }
}

impl DisplayInterface for DisplayBuiltIn {
    fn variant(&self) -> DisplayVariant {
        DisplayVariant::BuiltIn
    }

    fn display_id(&self) -> Option<i32> {
        self.base.display_id()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn state(&self) -> DisplayState {
        self.base.state()
    }

    fn set_display_state(&mut self, state: DisplayState) -> DisplayResult<()> {
        self.base.set_state(state)
    }

    fn init(&mut self) -> DisplayResult<()> {
        let entry = self.base.resolve_hw_display(true)?;
        self.base.register()?;
        self.is_primary = entry.is_primary;
        if self.is_primary {
            info!("DisplayBuiltIn: {} is the primary panel", entry.name);
        }
        Ok(())
    }

    fn deinit(&mut self) -> DisplayResult<()> {
        self.base.deinit()
    }
}
