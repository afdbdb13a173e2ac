use reqwest::StatusCode;
use thiserror::Error;

/// Why a single HTTP exchange did not produce a usable answer.
#[derive(Debug, Error)]
pub enum Failure {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid endpoint URL: {0}")]
    Url(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// A read (detail or recommendations) failed.
    #[error("fetch failed: {0}")]
    FetchFailed(#[source] Failure),
    /// A like/attend toggle failed.
    #[error("mutation failed: {0}")]
    MutationFailed(#[source] Failure),
}

impl ApiError {
    pub fn failure(&self) -> &Failure {
        match self {
            ApiError::FetchFailed(f) | ApiError::MutationFailed(f) => f,
        }
    }

    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self.failure() {
            Failure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed_for_rejections() {
        let err = ApiError::MutationFailed(Failure::Status {
            status: StatusCode::FORBIDDEN,
            body: "nope".into(),
        });
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(err.to_string(), "mutation failed: unexpected status 403 Forbidden: nope");

        let err = ApiError::FetchFailed(Failure::Transport("connection refused".into()));
        assert_eq!(err.status(), None);
    }
}
