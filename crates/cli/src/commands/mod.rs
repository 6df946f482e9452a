//! CLI command helpers.

pub mod show;
