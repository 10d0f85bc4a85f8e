//! Audio subsystem.
//!
//! Vestigial in this workspace — no mixer or device backend is wired up.

pub fn init() {}
