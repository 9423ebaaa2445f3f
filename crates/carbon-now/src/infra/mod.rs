//! Infrastructure adapters for the browser, clipboard, config, and the carbon service.

pub mod browser;
pub mod carbon;
pub mod clipboard;
pub mod config;
pub mod language;
