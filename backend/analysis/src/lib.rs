//! Compliance analysis pipeline.
//!
//! Request building, reply interpretation, and scoring are pure functions;
//! [`AnalysisPipeline`] wires them around one call to a [`VisionModel`](labelguard_core::VisionModel).

pub mod extract;
pub mod interpreter;
pub mod pipeline;
pub mod prompt;
pub mod score;

pub use extract::extract_json_payload;
pub use interpreter::interpret;
pub use pipeline::{AnalysisPipeline, PipelineOptions};
pub use prompt::{build_instruction, build_request, DEFAULT_MIME_TYPE};
pub use score::{classify_failure, compliance_score};
