// src/os/mod.rs
//! Process-level OS policy.

pub mod signal;
