//! Structured logging for LabelGuard.
//!
//! Console plus rolling NDJSON file output, secret redaction, and analysis audit events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{AnalysisEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
