//! PDF render coordinator: admission control around a shared headless browser.

mod admission;
mod document;
mod engine;
mod service;
mod types;

pub use admission::{AdmissionGate, AdmissionPermit, AdmissionSnapshot, QueueFull};
pub use document::build_print_document;
pub use engine::{BrowserEngine, BrowserError, BrowserPage, PrintSettings};
pub use service::{PdfService, PdfServiceConfig};
pub use types::{JobState, PdfError, PdfRequest, TimeoutPhase};
