//! Serializable views handed to the panel shell.

pub mod results;
pub mod tooltip;
