//! Save-game persistence.
//!
//! Vestigial in this workspace — no save format or storage backend is
//! wired up.
