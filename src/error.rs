//! Error taxonomy for the search pipeline.

use thiserror::Error;

/// Failures surfaced by the search pipeline.
///
/// Every stage returns a typed result and the caller short-circuits on the
/// first failure; the HTTP layer converts the error into the public envelope
/// with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad or unknown request parameter.
    #[error("{0}")]
    Validation(String),

    /// Search clause cannot be translated into an engine query.
    #[error("{0}")]
    QueryBuild(String),

    /// Zero matches or nothing to aggregate.
    #[error("{0}")]
    NotFound(String),

    /// Engine transport failure (timeout, connection refused).
    #[error(transparent)]
    Engine(#[from] elasticsearch::Error),

    /// Engine answered with a non-success status or an unusable body.
    #[error("engine response error: {0}")]
    EngineResponse(String),
}

impl ApiError {
    /// Machine-readable code reported in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) | ApiError::QueryBuild(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Engine(_) | ApiError::EngineResponse(_) => "SERVER_ERROR",
        }
    }

    /// HTTP status for the error envelope.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Validation(_) | ApiError::QueryBuild(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Engine(_) | ApiError::EngineResponse(_) => 500,
        }
    }

    /// Message safe to echo to the caller.
    ///
    /// Engine detail is logged server-side, never served.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Engine(_) | ApiError::EngineResponse(_) => {
                "Check your request and try again".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let err = ApiError::Validation("skip must be a non-negative integer".to_string());
        assert_eq!(err.code(), "BAD_REQUEST");
        assert_eq!(err.status(), 400);

        let err = ApiError::NotFound("No matches found!".to_string());
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.status(), 404);

        let err = ApiError::EngineResponse("shard failure".to_string());
        assert_eq!(err.code(), "SERVER_ERROR");
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_engine_detail_not_echoed() {
        let err = ApiError::EngineResponse("internal shard exception at node-3".to_string());
        assert_eq!(err.public_message(), "Check your request and try again");
        // The detail stays available for logging.
        assert!(err.to_string().contains("node-3"));
    }
}
