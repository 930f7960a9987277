pub mod analytics;
pub mod record;
pub mod store;

pub use analytics::{AnalyticsSummary, ScoreBucket};
pub use record::{HistoryRecord, HistoryStatus, PASSING_SCORE};
pub use store::HistoryStore;
