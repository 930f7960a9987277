use serde::Serialize;

use crate::record::{HistoryRecord, HistoryStatus, PASSING_SCORE};

/// How many of the newest scores the trend series keeps.
const TREND_LEN: usize = 10;

/// Count of records whose score falls in `[min, max)` (the last bucket includes 100).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBucket {
    pub range: String,
    pub count: usize,
}

/// Aggregate view over the history log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_products: usize,
    pub average_score: u8,
    pub passed_products: usize,
    pub failed_products: usize,
    pub pass_rate: u8,
    /// Failing records, lowest score first.
    pub at_risk: Vec<HistoryRecord>,
    pub score_distribution: Vec<ScoreBucket>,
    /// Latest scores, newest first.
    pub recent_scores: Vec<u8>,
}

impl AnalyticsSummary {
    /// Summarize records given in insertion order.
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        let total = records.len();
        let passed = records
            .iter()
            .filter(|r| r.status == HistoryStatus::Passed)
            .count();

        let score_sum: usize = records.iter().map(|r| r.compliance_score as usize).sum();

        let mut at_risk: Vec<HistoryRecord> = records
            .iter()
            .filter(|r| r.compliance_score < PASSING_SCORE)
            .cloned()
            .collect();
        at_risk.sort_by_key(|r| r.compliance_score);

        let score_distribution = (0..5)
            .map(|i| {
                let min = i * 20;
                let max = min + 20;
                let count = records
                    .iter()
                    .filter(|r| {
                        let s = r.compliance_score as usize;
                        s >= min && (s < max || (i == 4 && s <= 100))
                    })
                    .count();
                ScoreBucket {
                    range: format!("{}-{}", min, max),
                    count,
                }
            })
            .collect();

        let recent_scores = records
            .iter()
            .rev()
            .take(TREND_LEN)
            .map(|r| r.compliance_score)
            .collect();

        Self {
            total_products: total,
            average_score: rounded_ratio(score_sum, total, 1),
            passed_products: passed,
            failed_products: total - passed,
            pass_rate: rounded_ratio(passed, total, 100),
            at_risk,
            score_distribution,
            recent_scores,
        }
    }
}

/// `round(scale * num / den)` with half rounding up; zero when `den` is zero.
fn rounded_ratio(num: usize, den: usize, scale: usize) -> u8 {
    if den == 0 {
        return 0;
    }
    ((2 * scale * num + den) / (2 * den)) as u8
}
