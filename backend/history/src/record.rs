use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use labelguard_core::ComplianceResult;

/// Minimum score for a product to count as passed.
pub const PASSING_SCORE: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Passed,
    Failed,
}

impl HistoryStatus {
    pub fn for_score(score: u8) -> Self {
        if score >= PASSING_SCORE {
            HistoryStatus::Passed
        } else {
            HistoryStatus::Failed
        }
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryStatus::Passed => write!(f, "passed"),
            HistoryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One completed analysis, as kept in the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub product_name: String,
    pub compliance_score: u8,
    pub date: DateTime<Utc>,
    pub status: HistoryStatus,
}

impl HistoryRecord {
    /// Record a pipeline result. Score and status always come from the result itself.
    pub fn from_result(product_name: impl Into<String>, result: &ComplianceResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_name: product_name.into(),
            compliance_score: result.compliance_score,
            date: Utc::now(),
            status: HistoryStatus::for_score(result.compliance_score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u8) -> ComplianceResult {
        ComplianceResult {
            extracted_text: String::new(),
            compliances: Vec::new(),
            compliance_score: score,
        }
    }

    #[test]
    fn test_status_threshold() {
        assert_eq!(HistoryStatus::for_score(59), HistoryStatus::Failed);
        assert_eq!(HistoryStatus::for_score(60), HistoryStatus::Passed);
        assert_eq!(HistoryStatus::for_score(100), HistoryStatus::Passed);
    }

    #[test]
    fn test_record_uses_pipeline_score() {
        let record = HistoryRecord::from_result("Oat Milk", &result(70));
        assert_eq!(record.compliance_score, 70);
        assert_eq!(record.status, HistoryStatus::Passed);
        assert!(!record.id.is_nil());
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(HistoryRecord::from_result("Tea", &result(20))).unwrap();
        assert_eq!(json["productName"], "Tea");
        assert_eq!(json["complianceScore"], 20);
        assert_eq!(json["status"], "failed");
    }
}
