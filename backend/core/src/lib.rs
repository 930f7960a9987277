pub mod error;
pub mod rules;
pub mod traits;
pub mod types;

pub use error::{AnalysisError, ErrorCategory};
pub use rules::{canonical_rules, COMPLIANCE_RULES, RULE_COUNT};
pub use traits::{ModelPart, ModelReply, ModelRequest, VisionModel};
pub use types::{AnalysisRequest, ComplianceCheck, ComplianceResult};
