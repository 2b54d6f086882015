//! Application services: theme lookup, Markdown rendering and PDF coordination.

pub mod error;
pub mod pdf;
pub mod render;
pub mod themes;
