//! Google Calendar API v3 guest-list search.
//!
//! Implements the resolver's `CalendarSearch` capability over the primary
//! calendar. Cancelled events and resource rooms are filtered out before
//! the resolver sees the guest list.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;

use crate::search::{CalendarEvent, CalendarSearch, EventGuest, SearchError};

use super::{send_with_retry, GoogleApiError, RetryPolicy};

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

// ============================================================================
// API response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<EventRaw>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRaw {
    start: Option<EventDateTime>,
    #[serde(default)]
    attendees: Vec<AttendeeRaw>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttendeeRaw {
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    resource: Option<bool>,
}

// ============================================================================
// Client
// ============================================================================

/// Calendar-backed guest-list search.
pub struct CalendarClient {
    access_token: String,
    policy: RetryPolicy,
}

impl CalendarClient {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            policy: RetryPolicy::default(),
        }
    }

    fn fetch_page(
        &self,
        client: &reqwest::blocking::Client,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> Result<EventListResponse, GoogleApiError> {
        let mut params = vec![
            ("timeMin", start.to_rfc3339()),
            ("timeMax", end.to_rfc3339()),
            ("singleEvents", "true".to_string()),
            ("maxResults", "250".to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let resp = send_with_retry(
            client
                .get(EVENTS_URL)
                .bearer_auth(&self.access_token)
                .query(&params),
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
        Ok(resp.json()?)
    }
}

impl CalendarSearch for CalendarClient {
    fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, SearchError> {
        let client = reqwest::blocking::Client::new();
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let list = self.fetch_page(&client, start, end, page_token.as_deref())?;
            for raw in list.items {
                if let Some(event) = normalize_event(raw) {
                    events.push(event);
                }
            }
            page_token = list.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        log::debug!("calendar search returned {} event(s)", events.len());
        Ok(events)
    }
}

// ============================================================================
// Normalization
// ============================================================================

fn normalize_event(raw: EventRaw) -> Option<CalendarEvent> {
    if raw.status.as_deref() == Some("cancelled") {
        return None;
    }
    let start = raw.start.as_ref().and_then(parse_event_start)?;
    let guests = raw
        .attendees
        .into_iter()
        .filter(|a| !a.resource.unwrap_or(false) && !a.email.is_empty())
        .map(|a| EventGuest {
            email: a.email,
            display_name: a.display_name.unwrap_or_default(),
        })
        .collect();
    Some(CalendarEvent { start, guests })
}

/// Timed events carry `dateTime`; all-day events carry `date` only, which
/// is pinned to UTC midnight.
fn parse_event_start(start: &EventDateTime) -> Option<DateTime<Utc>> {
    if let Some(ref dt) = start.date_time {
        return DateTime::parse_from_rfc3339(dt)
            .ok()
            .map(|d| d.with_timezone(&Utc));
    }
    if let Some(ref d) = start.date {
        return NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .ok()
            .and_then(|nd| nd.and_hms_opt(0, 0, 0))
            .map(|ndt| Utc.from_utc_datetime(&ndt));
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_list_deserialization() {
        let json = r#"{
            "items": [
                {
                    "status": "confirmed",
                    "start": {"dateTime": "2026-02-17T14:00:00Z"},
                    "attendees": [
                        {"email": "jane@acme.com", "displayName": "Jane Smith", "responseStatus": "accepted"},
                        {"email": "room-4a@resource.calendar.google.com", "resource": true}
                    ]
                }
            ],
            "nextPageToken": "page2"
        }"#;
        let resp: EventListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.items.len(), 1);
        assert_eq!(resp.next_page_token.as_deref(), Some("page2"));

        let event = normalize_event(resp.items.into_iter().next().unwrap()).unwrap();
        // The resource room is filtered out of the guest list.
        assert_eq!(event.guests.len(), 1);
        assert_eq!(event.guests[0].email, "jane@acme.com");
        assert_eq!(event.guests[0].display_name, "Jane Smith");
    }

    #[test]
    fn test_cancelled_event_filtered() {
        let json = r#"{
            "status": "cancelled",
            "start": {"dateTime": "2026-02-17T14:00:00Z"},
            "attendees": [{"email": "jane@acme.com"}]
        }"#;
        let raw: EventRaw = serde_json::from_str(json).unwrap();
        assert!(normalize_event(raw).is_none());
    }

    #[test]
    fn test_all_day_event_start() {
        let json = r#"{"start": {"date": "2026-02-17"}, "attendees": []}"#;
        let raw: EventRaw = serde_json::from_str(json).unwrap();
        let event = normalize_event(raw).unwrap();
        assert_eq!(event.start.to_rfc3339(), "2026-02-17T00:00:00+00:00");
        assert!(event.guests.is_empty());
    }

    #[test]
    fn test_event_without_start_is_dropped() {
        let json = r#"{"attendees": [{"email": "jane@acme.com"}]}"#;
        let raw: EventRaw = serde_json::from_str(json).unwrap();
        assert!(normalize_event(raw).is_none());
    }

    #[test]
    fn test_timed_start_respects_offset() {
        let start = EventDateTime {
            date_time: Some("2026-02-17T14:00:00-05:00".to_string()),
            date: None,
        };
        let parsed = parse_event_start(&start).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-02-17T19:00:00+00:00");
    }

    #[test]
    fn test_nameless_attendee_kept_with_empty_display() {
        let json = r#"{
            "start": {"dateTime": "2026-02-17T14:00:00Z"},
            "attendees": [{"email": "jsmith@acme.com"}]
        }"#;
        let raw: EventRaw = serde_json::from_str(json).unwrap();
        let event = normalize_event(raw).unwrap();
        assert_eq!(event.guests[0].display_name, "");
    }
}
