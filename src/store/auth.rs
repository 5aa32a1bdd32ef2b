use serde_json::{Value, json};

use super::{Session, StoreError, keyring};
use crate::config::AppConfig;

const IDENTITY_BASE: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_BASE: &str = "https://securetoken.googleapis.com/v1";

/// Establish an identity for this session, exactly once per app start.
///
/// A custom token stored in the keyring takes precedence; without one (or
/// when it is rejected) the session falls back to anonymous sign-up. The
/// caller decides how to degrade on failure; this never blocks the UI.
pub async fn ensure_identity(config: &AppConfig) -> Result<Session, StoreError> {
    let http = reqwest::Client::builder().build()?;

    match keyring::load_auth_token(&config.project_id).await {
        Ok(Some(token)) => {
            match sign_in_with_custom_token(&http, &config.api_key, &token).await {
                Ok(session) => return Ok(session),
                Err(e) => {
                    log::warn!("Custom token sign-in failed, trying anonymous: {}", e);
                }
            }
        }
        Ok(None) => {}
        Err(e) => log::warn!("Keyring unavailable, trying anonymous sign-in: {}", e),
    }

    sign_in_anonymously(&http, &config.api_key).await
}

/// Renew an expired session. The refresh token is tried first; when it is
/// missing or rejected the identity is re-established from scratch, which
/// may change the uid.
pub async fn renew_identity(config: &AppConfig, previous: &Session) -> Result<Session, StoreError> {
    if let Some(refresh_token) = &previous.refresh_token {
        let http = reqwest::Client::builder().build()?;
        match refresh_session(&http, &config.api_key, refresh_token, &previous.uid).await {
            Ok(session) => return Ok(session),
            Err(e) => log::warn!("Token refresh failed, signing in from scratch: {}", e),
        }
    }
    ensure_identity(config).await
}

async fn sign_in_anonymously(
    http: &reqwest::Client,
    api_key: &str,
) -> Result<Session, StoreError> {
    let url = format!("{}/accounts:signUp?key={}", IDENTITY_BASE, api_key);
    let resp = http
        .post(&url)
        .json(&json!({ "returnSecureToken": true }))
        .send()
        .await?;
    session_from_response(resp).await
}

async fn sign_in_with_custom_token(
    http: &reqwest::Client,
    api_key: &str,
    token: &str,
) -> Result<Session, StoreError> {
    let url = format!(
        "{}/accounts:signInWithCustomToken?key={}",
        IDENTITY_BASE, api_key
    );
    let resp = http
        .post(&url)
        .json(&json!({ "token": token, "returnSecureToken": true }))
        .send()
        .await?;
    session_from_response(resp).await
}

async fn refresh_session(
    http: &reqwest::Client,
    api_key: &str,
    refresh_token: &str,
    previous_uid: &str,
) -> Result<Session, StoreError> {
    let url = format!("{}/token?key={}", SECURE_TOKEN_BASE, api_key);
    let resp = http
        .post(&url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(StoreError::Auth(format!("{}: {}", status, text)));
    }
    let body: Value =
        serde_json::from_str(&text).map_err(|e| StoreError::Malformed(e.to_string()))?;
    session_from_refresh(&body, previous_uid)
}

async fn session_from_response(resp: reqwest::Response) -> Result<Session, StoreError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(StoreError::Auth(format!("{}: {}", status, text)));
    }

    let body: Value =
        serde_json::from_str(&text).map_err(|e| StoreError::Malformed(e.to_string()))?;
    session_from_json(&body)
}

fn session_from_json(body: &Value) -> Result<Session, StoreError> {
    let id_token = body
        .get("idToken")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Malformed("sign-in response without idToken".to_string()))?
        .to_string();

    let refresh_token = body
        .get("refreshToken")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    // Custom-token responses carry no localId; a locally generated id still
    // gives the session a stable identity string.
    let uid = match body.get("localId").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let generated = uuid::Uuid::new_v4().to_string();
            log::debug!("Provider yielded no uid, generated {}", generated);
            generated
        }
    };

    Ok(Session {
        uid,
        id_token,
        refresh_token,
    })
}

/// The secure-token endpoint answers in snake_case and may omit the user
/// id; the uid from the expiring session carries over so `createdBy` stays
/// stable across renewals.
fn session_from_refresh(body: &Value, previous_uid: &str) -> Result<Session, StoreError> {
    let id_token = body
        .get("id_token")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Malformed("refresh response without id_token".to_string()))?
        .to_string();

    let refresh_token = body
        .get("refresh_token")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let uid = match body.get("user_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => previous_uid.to_string(),
    };

    Ok(Session {
        uid,
        id_token,
        refresh_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_response_keeps_the_refresh_token() {
        let body = json!({
            "idToken": "tok-1",
            "refreshToken": "refresh-1",
            "localId": "user-1"
        });
        let session = session_from_json(&body).unwrap();
        assert_eq!(session.uid, "user-1");
        assert_eq!(session.id_token, "tok-1");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[test]
    fn sign_in_without_id_token_is_rejected() {
        let body = json!({ "localId": "user-1" });
        assert!(session_from_json(&body).is_err());
    }

    #[test]
    fn missing_local_id_still_yields_a_uid() {
        let body = json!({ "idToken": "tok-1" });
        let session = session_from_json(&body).unwrap();
        assert!(!session.uid.is_empty());
        assert_eq!(session.refresh_token, None);
    }

    #[test]
    fn refresh_response_parses_snake_case() {
        let body = json!({
            "id_token": "tok-2",
            "refresh_token": "refresh-2",
            "user_id": "user-1"
        });
        let session = session_from_refresh(&body, "user-old").unwrap();
        assert_eq!(session.uid, "user-1");
        assert_eq!(session.id_token, "tok-2");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-2"));
    }

    #[test]
    fn refresh_without_user_id_keeps_the_previous_uid() {
        let body = json!({ "id_token": "tok-2" });
        let session = session_from_refresh(&body, "user-old").unwrap();
        assert_eq!(session.uid, "user-old");
    }

    #[test]
    fn refresh_without_id_token_is_rejected() {
        let body = json!({ "refresh_token": "refresh-2" });
        assert!(session_from_refresh(&body, "user-old").is_err());
    }
}
