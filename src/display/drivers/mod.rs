// src/display/drivers/mod.rs
//! Concrete display kinds and the single place one is chosen.

pub mod builtin;
pub mod pluggable;
pub mod virtual_display;

pub use builtin::DisplayBuiltIn;
pub use pluggable::DisplayPluggable;
pub use virtual_display::DisplayVirtual;

use crate::display::base::DisplayContext;
use crate::display::driver::DisplayHandle;
use crate::types::DisplayVariant;

/// Builds the display object for `variant`. No hardware is touched until
/// the returned object's `init()` runs.
pub fn construct(variant: DisplayVariant, display_id: Option<i32>, ctx: DisplayContext) -> DisplayHandle {
    match variant {
        DisplayVariant::BuiltIn => Box::new(DisplayBuiltIn::new(display_id, ctx)),
        DisplayVariant::Pluggable => Box::new(DisplayPluggable::new(display_id, ctx)),
        DisplayVariant::Virtual => Box::new(DisplayVirtual::new(display_id, ctx)),
    }
}
