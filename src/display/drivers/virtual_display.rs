// src/display/drivers/virtual_display.rs
//! Off-screen display composed into a writeback buffer.

use crate::display::base::{DisplayBase, DisplayContext};
use crate::display::driver::{DisplayInterface, DisplayState};
use crate::error::DisplayResult;
use crate::services::AllocatedBuffer;
use crate::types::DisplayVariant;
use log::debug;

pub const DEFAULT_VIRTUAL_WIDTH: u32 = 640;
pub const DEFAULT_VIRTUAL_HEIGHT: u32 = 480;
const BYTES_PER_PIXEL: usize = 4;

pub struct DisplayVirtual {
    base: DisplayBase,
    width: u32,
    height: u32,
    writeback: Option<AllocatedBuffer>,
}

impl DisplayVirtual {
    pub fn new(display_id: Option<i32>, ctx: DisplayContext) -> Self {
        Self {
            base: DisplayBase::new(DisplayVariant::Virtual, display_id, ctx),
            width: DEFAULT_VIRTUAL_WIDTH,
            height: DEFAULT_VIRTUAL_HEIGHT,
            writeback: None,
        }
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn release_writeback(&mut self) {
        if let Some(buffer) = self.writeback.take() {
            debug!("DisplayVirtual: freeing writeback buffer {}", buffer.id);
            self.base.context().allocator.free(buffer);
        }
    }
}

impl DisplayInterface for DisplayVirtual {
    fn variant(&self) -> DisplayVariant {
        DisplayVariant::Virtual
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
        // Unbound virtual displays have no hardware entry to check.
        if self.base.display_id().is_some() {
            self.base.resolve_hw_display(false)?;
        }

        let size = self.width as usize * self.height as usize * BYTES_PER_PIXEL;
        let buffer = self.base.context().allocator.allocate(size)?;
        self.writeback = Some(buffer);

        if let Err(e) = self.base.register() {
            self.release_writeback();
            return Err(e);
        }
        Ok(())
    }

    fn deinit(&mut self) -> DisplayResult<()> {
        self.base.deinit()?;
        self.release_writeback();
        Ok(())
    }
}

impl Drop for DisplayVirtual {
    fn drop(&mut self) {
        self.release_writeback();
    }
}
