// src/display/drivers/pluggable.rs
//! External panel behind a pluggable connector.

use crate::display::base::{DisplayBase, DisplayContext};
use crate::display::driver::{DisplayInterface, DisplayState};
use crate::error::DisplayResult;
use crate::types::DisplayVariant;

pub struct DisplayPluggable {
    base: DisplayBase,
    connector: String,
}

impl DisplayPluggable {
    pub fn new(display_id: Option<i32>, ctx: DisplayContext) -> Self {
        Self {
            base: DisplayBase::new(DisplayVariant::Pluggable, display_id, ctx),
            connector: String::new(),
        }
    }

    /// Connector name reported by hardware, empty before `init()`.
    pub fn connector(&self) -> &str {
        &self.connector
    }
}

impl DisplayInterface for DisplayPluggable {
    fn variant(&self) -> DisplayVariant {
        DisplayVariant::Pluggable
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
        // A sink that went away since the last topology refresh fails here.
        let entry = self.base.resolve_hw_display(true)?;
        self.base.register()?;
        self.connector = entry.name;
        Ok(())
    }

    fn deinit(&mut self) -> DisplayResult<()> {
        self.base.deinit()?;
        self.connector.clear();
        Ok(())
    }
}
