//! Gmail API v1 message search.
//!
//! Implements the resolver's `MessageSearch` capability: lists messages
//! matching a Gmail query, fetches each in full (headers + MIME body), and
//! groups results into threads. Individual message fetch failures are
//! skipped — one bad message should not sink a phase.

use std::collections::HashMap;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::search::{MailMessage, MailThread, MessageSearch, SearchError};

use super::{send_with_retry, GoogleApiError, RetryPolicy};

const LIST_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";

// ============================================================================
// API response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageStub {
    id: String,
    #[serde(default)]
    thread_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDetail {
    /// Epoch milliseconds as a string.
    #[serde(default)]
    internal_date: Option<String>,
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Payload {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: Option<PayloadBody>,
    #[serde(default)]
    parts: Vec<Payload>,
}

#[derive(Debug, Deserialize)]
struct Header {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayloadBody {
    #[serde(default)]
    data: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Gmail-backed message search.
pub struct GmailClient {
    access_token: String,
    policy: RetryPolicy,
}

impl GmailClient {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            policy: RetryPolicy::default(),
        }
    }

    /// List message stubs for a query, walking pages until `offset + limit`
    /// stubs are seen (Gmail has no native offset).
    fn list_stubs(
        &self,
        client: &reqwest::blocking::Client,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<MessageStub>, GoogleApiError> {
        let mut stubs: Vec<MessageStub> = Vec::new();
        let mut page_token: Option<String> = None;

        while stubs.len() < offset + limit {
            let mut params = vec![
                ("q", query.to_string()),
                ("maxResults", "100".to_string()),
            ];
            if let Some(ref token) = page_token {
                params.push(("pageToken", token.clone()));
            }

            let resp = send_with_retry(
                client.get(LIST_URL).bearer_auth(&self.access_token).query(&params),
                &self.policy,
            )?;
            let status = resp.status();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(GoogleApiError::AuthExpired);
            }
            if !status.is_success() {
                return Err(GoogleApiError::ApiError {
                    status: status.as_u16(),
                    message: resp.text().unwrap_or_default(),
                });
            }

            let list: MessageListResponse = resp.json()?;
            if list.messages.is_empty() {
                break;
            }
            stubs.extend(list.messages);
            page_token = list.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(stubs.into_iter().skip(offset).take(limit).collect())
    }

    /// Fetch one message in full and normalize it.
    fn fetch_message(
        &self,
        client: &reqwest::blocking::Client,
        message_id: &str,
    ) -> Result<MailMessage, GoogleApiError> {
        let url = format!("{LIST_URL}/{message_id}");
        let resp = send_with_retry(
            client
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&[("format", "full")]),
            &self.policy,
        )?;
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GoogleApiError::AuthExpired);
        }
        if !status.is_success() {
            return Err(GoogleApiError::ApiError {
                status: status.as_u16(),
                message: resp.text().unwrap_or_default(),
            });
        }

        let detail: MessageDetail = resp.json()?;
        Ok(normalize_message(&detail))
    }
}

impl MessageSearch for GmailClient {
    fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<MailThread>, SearchError> {
        let client = reqwest::blocking::Client::new();
        let stubs = self.list_stubs(&client, query, offset, limit)?;

        let mut threads: Vec<MailThread> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for stub in &stubs {
            match self.fetch_message(&client, &stub.id) {
                Ok(message) => {
                    let key = if stub.thread_id.is_empty() {
                        stub.id.clone()
                    } else {
                        stub.thread_id.clone()
                    };
                    let slot = *index.entry(key).or_insert_with(|| {
                        threads.push(MailThread::default());
                        threads.len() - 1
                    });
                    threads[slot].messages.push(message);
                }
                Err(e) => {
                    log::debug!("skipping message {}: {}", stub.id, e);
                    continue;
                }
            }
        }
        Ok(threads)
    }
}

// ============================================================================
// Normalization
// ============================================================================

fn normalize_message(detail: &MessageDetail) -> MailMessage {
    let headers = detail
        .payload
        .as_ref()
        .map(|p| &p.headers[..])
        .unwrap_or(&[]);
    let get_header = |name: &str| -> String {
        headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
            .unwrap_or_default()
    };

    let date = detail
        .internal_date
        .as_deref()
        .and_then(|ms| ms.parse::<i64>().ok())
        .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let plain = detail
        .payload
        .as_ref()
        .and_then(|p| extract_body_text(p, "text/plain"));
    let html = detail
        .payload
        .as_ref()
        .and_then(|p| extract_body_text(p, "text/html"));

    MailMessage {
        from: get_header("From"),
        to: get_header("To"),
        cc: get_header("Cc"),
        bcc: get_header("Bcc"),
        date,
        plain_body: plain,
        html_body: html,
    }
}

/// Recursively walk MIME parts to find body data for the target MIME type.
fn extract_body_text(payload: &Payload, target_mime: &str) -> Option<String> {
    if payload.mime_type == target_mime {
        if let Some(ref body) = payload.body {
            if let Some(ref data) = body.data {
                return decode_url_safe_base64(data);
            }
        }
    }
    for part in &payload.parts {
        if let Some(text) = extract_body_text(part, target_mime) {
            return Some(text);
        }
    }
    None
}

/// Decode URL-safe base64 (no padding) as used by the Gmail API.
fn decode_url_safe_base64(data: &str) -> Option<String> {
    match base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(data) {
        Ok(bytes) => String::from_utf8(bytes).ok(),
        Err(_) => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
