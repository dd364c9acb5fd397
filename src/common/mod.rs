//! Shared helpers for the component installers.

pub mod fs;
