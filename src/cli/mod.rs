//! CLI command handlers

pub mod commands;

pub use commands::{dates, export, fill, import, placeholders};
