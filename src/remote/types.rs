//! Remote API types
//!
//! DTOs for data service communication.

use serde::Deserialize;

/// Error body returned by the data service
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ApiErrorResponse {
    /// One-line description for logs and error values
    pub fn describe(&self) -> String {
        let mut text = self.message.clone();
        if let Some(code) = &self.code {
            text = format!("{} [{}]", text, code);
        }
        if let Some(details) = &self.details {
            text = format!("{} ({})", text, details);
        }
        text
    }
}

/// Parse the total from a `Content-Range` header (`0-9/42` or `*/42`)
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range_total("0-9/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-9/*"), None);
    }

    #[test]
    fn test_describe_error() {
        let err: ApiErrorResponse = serde_json::from_str(
            r#"{"message":"relation does not exist","code":"42P01","details":null,"hint":null}"#,
        )
        .unwrap();
        assert_eq!(err.describe(), "relation does not exist [42P01]");
    }
}
