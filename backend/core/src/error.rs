use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-distinguishable failure category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InvalidInput,
    NotConfigured,
    RateLimited,
    Unauthorized,
    ParseError,
    Unknown,
    Cancelled,
}

impl ErrorCategory {
    /// HTTP status a transport layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCategory::InvalidInput => 400,
            ErrorCategory::Unauthorized => 401,
            ErrorCategory::RateLimited => 429,
            ErrorCategory::NotConfigured | ErrorCategory::ParseError | ErrorCategory::Unknown => 500,
            ErrorCategory::Cancelled => 503,
        }
    }

    /// Whether resubmitting the same request may succeed.
    /// `NotConfigured` and `Unauthorized` need reconfiguration instead.
    pub fn retryable(self) -> bool {
        matches!(
            self,
            ErrorCategory::RateLimited | ErrorCategory::ParseError | ErrorCategory::Unknown
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::InvalidInput => "invalid_input",
            ErrorCategory::NotConfigured => "not_configured",
            ErrorCategory::RateLimited => "rate_limited",
            ErrorCategory::Unauthorized => "unauthorized",
            ErrorCategory::ParseError => "parse_error",
            ErrorCategory::Unknown => "unknown",
            ErrorCategory::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Failure of one compliance analysis request.
///
/// `Display` carries the diagnostic detail for logs; [`AnalysisError::user_message`]
/// is what end users see.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("vision model credentials are not configured")]
    NotConfigured,

    #[error("vision model rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("vision model rejected credentials: {0}")]
    Unauthorized(String),

    #[error("failed to parse model reply: {0}")]
    Parse(String),

    #[error("vision model call failed: {0}")]
    Upstream(String),

    #[error("analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalysisError::InvalidInput(_) => ErrorCategory::InvalidInput,
            AnalysisError::NotConfigured => ErrorCategory::NotConfigured,
            AnalysisError::RateLimited(_) => ErrorCategory::RateLimited,
            AnalysisError::Unauthorized(_) => ErrorCategory::Unauthorized,
            AnalysisError::Parse(_) => ErrorCategory::ParseError,
            AnalysisError::Upstream(_) => ErrorCategory::Unknown,
            AnalysisError::Cancelled => ErrorCategory::Cancelled,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::InvalidInput(reason) => reason.clone(),
            AnalysisError::NotConfigured => "Vision model API key not configured".to_string(),
            AnalysisError::RateLimited(_) => {
                "API rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            AnalysisError::Unauthorized(_) => {
                "Invalid or missing vision model API key. Please check your configuration."
                    .to_string()
            }
            AnalysisError::Parse(_) => {
                "Failed to parse compliance analysis. Please try again.".to_string()
            }
            AnalysisError::Upstream(_) => {
                "Failed to analyze image. Please try with a different image.".to_string()
            }
            AnalysisError::Cancelled => "Analysis was cancelled.".to_string(),
        }
    }

    /// Build the error for a classified upstream failure.
    pub fn from_category(category: ErrorCategory, message: impl Into<String>) -> Self {
        let message = message.into();
        match category {
            ErrorCategory::InvalidInput => AnalysisError::InvalidInput(message),
            ErrorCategory::NotConfigured => AnalysisError::NotConfigured,
            ErrorCategory::RateLimited => AnalysisError::RateLimited(message),
            ErrorCategory::Unauthorized => AnalysisError::Unauthorized(message),
            ErrorCategory::ParseError => AnalysisError::Parse(message),
            ErrorCategory::Unknown => AnalysisError::Upstream(message),
            ErrorCategory::Cancelled => AnalysisError::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCategory::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCategory::Unauthorized.http_status(), 401);
        assert_eq!(ErrorCategory::RateLimited.http_status(), 429);
        assert_eq!(ErrorCategory::NotConfigured.http_status(), 500);
        assert_eq!(ErrorCategory::ParseError.http_status(), 500);
    }

    #[test]
    fn test_retry_hints() {
        assert!(ErrorCategory::RateLimited.retryable());
        assert!(ErrorCategory::Unknown.retryable());
        assert!(!ErrorCategory::NotConfigured.retryable());
        assert!(!ErrorCategory::Unauthorized.retryable());
    }

    #[test]
    fn test_from_category_round_trips_category() {
        for category in [
            ErrorCategory::RateLimited,
            ErrorCategory::Unauthorized,
            ErrorCategory::Unknown,
            ErrorCategory::ParseError,
        ] {
            assert_eq!(AnalysisError::from_category(category, "boom").category(), category);
        }
    }

    #[test]
    fn test_category_display_matches_serde() {
        let json = serde_json::to_value(ErrorCategory::RateLimited).unwrap();
        assert_eq!(json, ErrorCategory::RateLimited.to_string());
    }
}
