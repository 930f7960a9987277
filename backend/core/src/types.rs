use serde::{Deserialize, Serialize};

/// Verdict for a single compliance rule, as reported by the vision model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub rule: String,
    pub passed: bool,
    pub details: String,
}

/// Structured compliance report for one product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub extracted_text: String,
    pub compliances: Vec<ComplianceCheck>,
    /// Percentage of canonical rules passed, 0-100.
    pub compliance_score: u8,
}

/// One product image submitted for analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub image: Vec<u8>,
    pub mime_type: String,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
}

impl AnalysisRequest {
    pub fn new(image: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            mime_type: mime_type.into(),
            product_name: None,
            product_description: None,
        }
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn with_product_description(mut self, description: impl Into<String>) -> Self {
        self.product_description = Some(description.into());
        self
    }
}
