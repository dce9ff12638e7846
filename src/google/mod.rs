//! Google API plumbing: token I/O, refresh, and retrying HTTP.
//!
//! Tokens are read from `~/.mailtrace/google/token.json` in the JSON format
//! google-auth tooling writes, so a token minted by any standard OAuth flow
//! works as-is. There is no interactive consent flow here — point the tool
//! at an existing token and it will keep it fresh via the refresh token.
//!
//! Modules:
//! - calendar: Google Calendar API v3
//! - gmail: Gmail API v1

pub mod calendar;
pub mod gmail;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoogleApiError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token expired or revoked")]
    AuthExpired,
    #[error("Token not found at {0}")]
    TokenNotFound(PathBuf),
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Token type — compatible with google-auth's Credentials.to_json() format
// ============================================================================

/// OAuth2 token payload. Both `token` and `access_token` are accepted on
/// read for compatibility with different writers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleToken {
    #[serde(alias = "access_token")]
    pub token: String,
    /// Long-lived refresh token used to mint new access tokens.
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Token expiry time (ISO 8601).
    #[serde(default)]
    pub expiry: Option<String>,
    /// Authenticated account email.
    #[serde(default, alias = "email")]
    pub account: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

// ============================================================================
// Retry
// ============================================================================

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

fn retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn retry_delay(
    attempt: u32,
    policy: &RetryPolicy,
    retry_after: Option<&reqwest::header::HeaderValue>,
) -> Duration {
    if let Some(value) = retry_after.and_then(|v| v.to_str().ok()) {
        if let Ok(secs) = value.parse::<u64>() {
            return Duration::from_secs(secs.min(30));
        }
    }
    let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
    let base = policy
        .initial_backoff_ms
        .saturating_mul(exponent)
        .min(policy.max_backoff_ms);
    Duration::from_millis(base)
}

/// Send a request, retrying rate limits, server errors, and transport
/// failures with capped exponential backoff. Honors Retry-After.
pub fn send_with_retry(
    request: reqwest::blocking::RequestBuilder,
    policy: &RetryPolicy,
) -> Result<reqwest::blocking::Response, GoogleApiError> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        let Some(cloned) = request.try_clone() else {
            return request.send().map_err(GoogleApiError::Http);
        };

        match cloned.send() {
            Ok(response) => {
                let status = response.status();
                if retryable_status(status) && attempt < attempts {
                    let delay = retry_delay(
                        attempt,
                        policy,
                        response.headers().get(reqwest::header::RETRY_AFTER),
                    );
                    log::warn!(
                        "google api retry {}/{} after status {} (sleep {:?})",
                        attempt,
                        attempts,
                        status,
                        delay
                    );
                    std::thread::sleep(delay);
                    continue;
                }
                return Ok(response);
            }
            Err(err) => {
                if (err.is_timeout() || err.is_connect()) && attempt < attempts {
                    let delay = retry_delay(attempt, policy, None);
                    log::warn!(
                        "google api retry {}/{} after transport error: {} (sleep {:?})",
                        attempt,
                        attempts,
                        err,
                        delay
                    );
                    std::thread::sleep(delay);
                    continue;
                }
                return Err(GoogleApiError::Http(err));
            }
        }
    }

    Err(GoogleApiError::RefreshFailed(
        "request exhausted retries".to_string(),
    ))
}

// ============================================================================
// Token I/O
// ============================================================================

/// Default token file path: `~/.mailtrace/google/token.json`.
pub fn token_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".mailtrace")
        .join("google")
        .join("token.json")
}

pub fn load_token_from(path: &Path) -> Result<GoogleToken, GoogleApiError> {
    if !path.exists() {
        return Err(GoogleApiError::TokenNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_token(path: &Path, token: &GoogleToken) -> Result<(), GoogleApiError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(token)?)?;
    Ok(())
}

/// Check if a token is expired based on its expiry field. A missing or
/// unparseable expiry is treated as expired so a refresh is attempted.
pub fn is_token_expired(token: &GoogleToken) -> bool {
    match &token.expiry {
        None => true,
        Some(expiry_str) => {
            match chrono::DateTime::parse_from_rfc3339(&expiry_str.replace('Z', "+00:00"))
                .or_else(|_| chrono::DateTime::parse_from_rfc3339(expiry_str))
            {
                Ok(expiry) => {
                    // Within 60 seconds of expiry counts as expired.
                    let now = chrono::Utc::now();
                    expiry <= now + chrono::Duration::seconds(60)
                }
                Err(_) => true,
            }
        }
    }
}

/// Refresh the access token and persist the result back to `path`.
pub fn refresh_access_token(
    path: &Path,
    token: &GoogleToken,
) -> Result<GoogleToken, GoogleApiError> {
    let refresh_token = token
        .refresh_token
        .as_deref()
        .ok_or(GoogleApiError::AuthExpired)?;

    let mut form = vec![
        ("client_id", token.client_id.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];
    if let Some(secret) = token.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let client = reqwest::blocking::Client::new();
    let resp = client.post(&token.token_uri).form(&form).send()?;
    let status = resp.status();
    let body_text = resp.text().unwrap_or_default();
    if !status.is_success() {
        return Err(map_refresh_error(status.as_u16(), &body_text));
    }

    let body: serde_json::Value = serde_json::from_str(&body_text)?;
    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| GoogleApiError::RefreshFailed("no access_token in response".to_string()))?;
    let expires_in = body["expires_in"].as_u64().unwrap_or(3600);
    let expiry = chrono::Utc::now() + chrono::Duration::seconds(expires_in as i64);

    let mut new_token = token.clone();
    new_token.token = access_token.to_string();
    new_token.expiry = Some(expiry.to_rfc3339());
    save_token(path, &new_token)?;

    Ok(new_token)
}

fn map_refresh_error(status: u16, body: &str) -> GoogleApiError {
    let lowered = body.to_lowercase();
    if (status == 400 || status == 401)
        && (lowered.contains("invalid_grant") || lowered.contains("token has been expired"))
    {
        return GoogleApiError::AuthExpired;
    }
    GoogleApiError::RefreshFailed(format!("HTTP {}: {}", status, body))
}

/// Get a valid access token from the default path, refreshing if expired.
/// Main entry point for the CLI.
pub fn get_valid_access_token() -> Result<String, GoogleApiError> {
    let path = token_path();
    let token = load_token_from(&path)?;
    if is_token_expired(&token) {
        Ok(refresh_access_token(&path, &token)?.token)
    } else {
        Ok(token.token)
    }
}

// ============================================================================
// Tests
// ============================================================================
