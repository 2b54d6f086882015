//! Markdown to printable HTML/PDF service.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
