use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::GoogleCreds;

const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Refresh this long before the token actually expires
const EXPIRY_SLACK_SECS: i64 = 60;

/// Service-account access tokens via the signed-JWT grant: sign an RS256
/// assertion with the account's private key, exchange it at the token
/// endpoint, cache the result until shortly before expiry.
pub struct TokenProvider {
    http: Client,
    creds: GoogleCreds,
    cached: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Error)]
pub enum GoogleAuthError {
    #[error("Service-account private key is not a usable RSA PEM: {0}")]
    InvalidKey(String),
    #[error("Failed to sign the token assertion: {0}")]
    Sign(String),
    #[error("Token exchange failed ({0}): {1}")]
    Exchange(u16, String),
    #[error("Token endpoint transport failure: {0}")]
    Transport(String),
}

impl TokenProvider {
    pub fn new(http: Client, creds: GoogleCreds) -> Self {
        Self {
            http,
            creds,
            cached: Mutex::new(None),
        }
    }

    pub async fn token(&self) -> Result<String, GoogleAuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Utc::now() + Duration::seconds(EXPIRY_SLACK_SECS) < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let now = Utc::now();
        let claims = Claims {
            iss: &self.creds.client_email,
            scope: SCOPES,
            aud: &self.creds.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.creds.private_key.as_bytes())
            .map_err(|err| GoogleAuthError::InvalidKey(err.to_string()))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|err| GoogleAuthError::Sign(err.to_string()))?;

        let response = self
            .http
            .post(&self.creds.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|err| GoogleAuthError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GoogleAuthError::Exchange(status.as_u16(), body));
        }
        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|err| GoogleAuthError::Transport(err.to_string()))?;

        debug!(
            "Obtained Google access token for {} (expires in {}s)",
            self.creds.client_email, payload.expires_in
        );
        let access_token = payload.access_token.clone();
        *cached = Some(CachedToken {
            access_token: payload.access_token,
            expires_at: now + Duration::seconds(payload.expires_in),
        });
        Ok(access_token)
    }
}
