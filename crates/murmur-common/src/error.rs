use thiserror::Error;

/// Failure taxonomy for transcript sources.
///
/// Only `Auth` is fatal to a running pipeline. Everything else is contained
/// within a single poll cycle: the cycle is skipped and the overlap contract
/// of the source makes the next poll re-deliver anything that was missed.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The bot API rejected the credential. Stops the pipeline.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Network-level failure (connect, timeout, non-auth HTTP error).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Whether this error should terminate the pipeline.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Auth(_))
    }

    /// Short kind tag for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Auth(_)      => "auth",
            SourceError::Transport(_) => "transport",
            SourceError::Malformed(_) => "malformed",
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return SourceError::Malformed(err.to_string());
        }
        match err.status() {
            Some(status)
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN =>
            {
                SourceError::Auth(format!("HTTP {status}"))
            }
            _ => SourceError::Transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_is_fatal() {
        assert!(SourceError::Auth("401".into()).is_fatal());
        assert!(!SourceError::Transport("timeout".into()).is_fatal());
        assert!(!SourceError::Malformed("bad json".into()).is_fatal());
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(SourceError::Auth("x".into()).kind(), "auth");
        assert_eq!(SourceError::Transport("x".into()).kind(), "transport");
        assert_eq!(SourceError::Malformed("x".into()).kind(), "malformed");
    }
}
