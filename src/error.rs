use thiserror::Error;

use crate::providers::LlmError;

/// Errors that can occur while clipping a recipe
#[derive(Error, Debug)]
pub enum ClipError {
    /// Caller input was malformed (missing or unusable URL)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The recipe page could not be fetched
    #[error("Failed to fetch URL: {0}")]
    UpstreamFetch(String),

    /// No extraction strategy produced a complete recipe
    #[error("No recipe could be extracted from this webpage")]
    NotFound,

    /// The model answered but none of the JSON recovery strategies could read it
    #[error("Failed to parse AI response: {message}")]
    AiResponse {
        message: String,
        /// Text surrounding the parse failure, for operators
        excerpt: String,
    },

    /// The model could not be invoked
    #[error("AI request failed: {0}")]
    Llm(#[from] LlmError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    Builder(String),
}

impl ClipError {
    /// HTTP status the error is surfaced as.
    pub fn status_code(&self) -> u16 {
        match self {
            ClipError::Validation(_) => 400,
            ClipError::NotFound => 404,
            ClipError::UpstreamFetch(_)
            | ClipError::AiResponse { .. }
            | ClipError::Llm(_)
            | ClipError::Config(_)
            | ClipError::Builder(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ClipError::Validation("url is required".into()).status_code(), 400);
        assert_eq!(ClipError::NotFound.status_code(), 404);
        assert_eq!(ClipError::UpstreamFetch("HTTP 503".into()).status_code(), 500);
        assert_eq!(
            ClipError::AiResponse {
                message: "expected value".into(),
                excerpt: String::new(),
            }
            .status_code(),
            500
        );
        assert_eq!(
            ClipError::Llm(LlmError::RequestFailed("timeout".into())).status_code(),
            500
        );
    }
}
