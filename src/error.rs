use serde::Serialize;
use thiserror::Error;

/// Errors produced by the catalog engine.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("catalog service error (status {status}): {message}")]
    Service { status: u16, message: String },

    #[error("invalid catalog response: {0}")]
    InvalidResponse(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// User-presentable category of a failed page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Network,
    Server,
    InvalidResponse,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Network => "network",
            FailureReason::Server => "server",
            FailureReason::InvalidResponse => "invalid_response",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CatalogError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CatalogError::InvalidArgument(msg.into())
    }

    /// Recoverable fetch failures map to a reason; contract violations do not.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            CatalogError::Network(_) => Some(FailureReason::Network),
            CatalogError::Service { .. } => Some(FailureReason::Server),
            CatalogError::InvalidResponse(_) => Some(FailureReason::InvalidResponse),
            CatalogError::InvalidArgument(_) | CatalogError::NotFound(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failures_carry_a_reason() {
        assert_eq!(
            CatalogError::Network("refused".into()).failure_reason(),
            Some(FailureReason::Network)
        );
        assert_eq!(
            CatalogError::Service {
                status: 503,
                message: "down".into()
            }
            .failure_reason(),
            Some(FailureReason::Server)
        );
        assert_eq!(
            CatalogError::InvalidResponse("eof".into()).failure_reason(),
            Some(FailureReason::InvalidResponse)
        );
    }

    #[test]
    fn contract_violations_have_no_reason() {
        assert_eq!(CatalogError::invalid("page 0").failure_reason(), None);
        assert_eq!(CatalogError::NotFound("x".into()).failure_reason(), None);
    }

    #[test]
    fn reason_labels_are_stable() {
        assert_eq!(FailureReason::Network.to_string(), "network");
        assert_eq!(FailureReason::Server.as_str(), "server");
        assert_eq!(
            serde_json::to_value(FailureReason::InvalidResponse).unwrap(),
            serde_json::json!("invalid_response")
        );
    }
}
