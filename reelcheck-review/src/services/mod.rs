//! Service layer
//!
//! Request-scoped services built by the HTTP handlers (or directly by callers
//! embedding the crate). Each owns a pool handle and, where it mutates, an
//! identity gate.

pub mod annotation;
pub mod listing;
pub mod orchestrator;

pub use annotation::AnnotationService;
pub use listing::ListingService;
pub use orchestrator::{outcome_message, SubmissionOrchestrator, SubmitRequest};
