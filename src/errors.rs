use reqwest::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    RateLimited,
    Server,
    Client,
}

impl RejectionKind {
    pub fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            RejectionKind::RateLimited
        } else if status.is_server_error() {
            RejectionKind::Server
        } else {
            RejectionKind::Client
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::RateLimited => "rate_limited",
            RejectionKind::Server => "server_error",
            RejectionKind::Client => "client_error",
        }
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("credential error: {0}")]
    Credential(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{what} rejected ({status}, {kind}): {body}")]
    Rejection {
        what: String,
        status: u16,
        kind: RejectionKind,
        body: String,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn rejection(what: impl Into<String>, status: StatusCode, body: String) -> Self {
        SyncError::Rejection {
            what: what.into(),
            status: status.as_u16(),
            kind: RejectionKind::from_status(status),
            body,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Credential(_) => "credential",
            SyncError::Transport(_) => "transport",
            SyncError::Rejection { kind, .. } => kind.as_str(),
            SyncError::Decode(_) => "decode",
            SyncError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert_eq!(
            RejectionKind::from_status(StatusCode::TOO_MANY_REQUESTS),
            RejectionKind::RateLimited
        );
        assert_eq!(
            RejectionKind::from_status(StatusCode::BAD_GATEWAY),
            RejectionKind::Server
        );
        assert_eq!(
            RejectionKind::from_status(StatusCode::NOT_FOUND),
            RejectionKind::Client
        );
    }

    #[test]
    fn test_rejection_message_carries_status() {
        let err = SyncError::rejection("create ticket", StatusCode::SERVICE_UNAVAILABLE, "down".into());
        assert_eq!(err.kind(), "server_error");
        assert_eq!(
            err.to_string(),
            "create ticket rejected (503, server_error): down"
        );
    }
}
