// src/display/mod.rs
//! Per-display objects created by the display core.
//!
//! - DisplayInterface: capability set handed to callers
//! - DisplayBase: state and resource handling shared by every kind
//! - drivers: the three concrete kinds and `construct`, the only place a kind is chosen

pub mod base;
pub mod driver;
pub mod drivers;


pub use base::{DisplayBase, DisplayContext};
pub use driver::{
    DisplayEventHandler, DisplayHandle, DisplayInterface, DisplayState, SharedEventHandler,
};
pub use drivers::{construct, DisplayBuiltIn, DisplayPluggable, DisplayVirtual};
