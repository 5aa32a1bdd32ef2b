pub mod auth;
pub mod firestore;
pub mod keyring;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("unexpected response shape: {0}")]
    Malformed(String),
    #[error("sign-in failed: {0}")]
    Auth(String),
}

impl StoreError {
    /// An expired or revoked bearer token. The session can be renewed and
    /// the request tried again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == reqwest::StatusCode::UNAUTHORIZED)
    }
}

/// An established identity: the stable id stamped into `createdBy` and shown
/// in the footer, plus the bearer token used for store requests. Bearer
/// tokens expire after about an hour; the refresh token renews the session
/// without another full sign-in.
#[derive(Debug, Clone)]
pub struct Session {
    pub uid: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_401_counts_as_unauthorized() {
        let expired = StoreError::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        let forbidden = StoreError::Status {
            status: reqwest::StatusCode::FORBIDDEN,
            body: String::new(),
        };
        assert!(expired.is_unauthorized());
        assert!(!forbidden.is_unauthorized());
        assert!(!StoreError::Malformed("x".to_string()).is_unauthorized());
        assert!(!StoreError::Auth("x".to_string()).is_unauthorized());
    }
}
