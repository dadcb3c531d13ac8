//! Core types shared by the locator engine and its host document.

pub mod document;
pub mod errors;
pub mod model;
