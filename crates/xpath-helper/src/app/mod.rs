//! Application layer: locator inference, live queries, and the picker.

pub mod debounce;
pub mod decorations;
pub mod evaluator;
pub mod generator;
pub mod inspector;
pub mod oracle;
pub mod picker;
pub mod query;
