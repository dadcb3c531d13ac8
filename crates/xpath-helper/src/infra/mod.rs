//! Infrastructure adapters for configuration, logging, and the headless host document.

pub mod config;
pub mod dom;
pub mod logging;
