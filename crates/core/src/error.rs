use thiserror::Error;

/// Failure of a call to one of the remote application endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    /// The endpoint answered with `success: false`
    #[error("Request rejected: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the failure happened below the business layer
    /// (network, TLS, unreadable body)
    #[must_use]
    pub fn is_transport(&self) -> bool {
        !matches!(self, ApiError::Rejected(_))
    }
}

/// Validation failure of the public application form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please fill in the required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Loan amount must be a positive number")]
    InvalidAmount,

    #[error("Loan term must be a positive number of months")]
    InvalidTerm,
}

/// Failure of the session flag storage
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session store is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),

    #[error("Invalid session id: {0}")]
    InvalidId(#[from] uuid::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message() {
        let err = ApiError::Rejected(Some("Invalid status".to_string()));
        assert_eq!(err.to_string(), "Request rejected: Invalid status");
        assert!(!err.is_transport());

        let err = ApiError::Rejected(None);
        assert_eq!(err.to_string(), "Request rejected: no reason given");
    }

    #[test]
    fn test_decode_is_transport_class() {
        let err: ApiError = serde_json::from_str::<serde_json::Value>("<html>")
            .unwrap_err()
            .into();
        assert!(err.is_transport());
    }
}
