//! External search collaborators.
//!
//! The resolver consumes mail and calendar search as opaque capabilities —
//! it builds query strings and consumes normalized threads/events, and never
//! sees provider wire formats. Concrete providers live in `google`; tests
//! use the in-memory fixture at the bottom of this module.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query failed: {0}")]
    Query(String),
    #[error(transparent)]
    Api(#[from] crate::google::GoogleApiError),
}

/// A mail thread: an ordered list of messages.
#[derive(Debug, Clone, Default)]
pub struct MailThread {
    pub messages: Vec<MailMessage>,
}

/// One mail message with the headers and body text the resolver consumes.
///
/// Header fields hold the raw header string (possibly several comma-joined
/// mailboxes); splitting is the resolver's job.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub cc: String,
    pub bcc: String,
    pub date: DateTime<Utc>,
    pub plain_body: Option<String>,
    pub html_body: Option<String>,
}

impl MailMessage {
    /// Body text: the plain part when present, else HTML stripped to text.
    pub fn text(&self) -> Option<String> {
        if let Some(ref plain) = self.plain_body {
            if !plain.trim().is_empty() {
                return Some(plain.clone());
            }
        }
        let html = self.html_body.as_ref()?;
        html2text::from_read(html.as_bytes(), 80).ok()
    }
}

/// Mail search capability. Each resolver phase issues one query.
pub trait MessageSearch {
    fn search(&self, query: &str, offset: usize, limit: usize)
        -> Result<Vec<MailThread>, SearchError>;
}

/// One calendar guest entry.
#[derive(Debug, Clone)]
pub struct EventGuest {
    pub email: String,
    pub display_name: String,
}

/// A calendar event with its guest list.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub start: DateTime<Utc>,
    pub guests: Vec<EventGuest>,
}

/// Calendar guest-list search capability.
pub trait CalendarSearch {
    fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, SearchError>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! In-memory providers for resolver tests. Mail results are routed by
    //! the query's leading channel operator; every query is recorded so
    //! tests can assert what was (or was not) searched.

    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    pub struct FixtureSearch {
        pub mail: HashMap<String, Vec<MailThread>>,
        pub events: Vec<CalendarEvent>,
        pub queries: RefCell<Vec<String>>,
        pub fail_mail: bool,
        pub fail_calendar: bool,
    }

    impl FixtureSearch {
        /// Register threads returned for a channel ("from", "to", "cc",
        /// "bcc") or for body queries ("body").
        pub fn with_channel(mut self, channel: &str, threads: Vec<MailThread>) -> Self {
            self.mail.insert(channel.to_string(), threads);
            self
        }

        pub fn with_events(mut self, events: Vec<CalendarEvent>) -> Self {
            self.events = events;
            self
        }

        pub fn query_count(&self) -> usize {
            self.queries.borrow().len()
        }

        fn channel_of(query: &str) -> &'static str {
            for (op, key) in [("from:", "from"), ("to:", "to"), ("cc:", "cc"), ("bcc:", "bcc")] {
                if query.starts_with(op) {
                    return key;
                }
            }
            "body"
        }
    }

    impl MessageSearch for FixtureSearch {
        fn search(
            &self,
            query: &str,
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<MailThread>, SearchError> {
            self.queries.borrow_mut().push(query.to_string());
            if self.fail_mail {
                return Err(SearchError::Query("fixture mail failure".to_string()));
            }
            Ok(self
                .mail
                .get(Self::channel_of(query))
                .cloned()
                .unwrap_or_default())
        }
    }

    impl CalendarSearch for FixtureSearch {
        fn events_between(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>, SearchError> {
            self.queries.borrow_mut().push("calendar".to_string());
            if self.fail_calendar {
                return Err(SearchError::Query("fixture calendar failure".to_string()));
            }
            Ok(self.events.clone())
        }
    }

    /// Build a message whose four header channels are filled as given.
    pub fn message(
        from: &str,
        to: &str,
        cc: &str,
        bcc: &str,
        date: DateTime<Utc>,
    ) -> MailMessage {
        MailMessage {
            from: from.to_string(),
            to: to.to_string(),
            cc: cc.to_string(),
            bcc: bcc.to_string(),
            date,
            plain_body: None,
            html_body: None,
        }
    }

    /// Wrap messages into single-thread results.
    pub fn thread(messages: Vec<MailMessage>) -> Vec<MailThread> {
        vec![MailThread { messages }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prefers_plain_body() {
        let msg = MailMessage {
            from: String::new(),
            to: String::new(),
            cc: String::new(),
            bcc: String::new(),
            date: Utc::now(),
            plain_body: Some("plain text".to_string()),
            html_body: Some("<p>html text</p>".to_string()),
        };
        assert_eq!(msg.text().as_deref(), Some("plain text"));
    }

    #[test]
    fn test_text_falls_back_to_stripped_html() {
        let msg = MailMessage {
            from: String::new(),
            to: String::new(),
            cc: String::new(),
            bcc: String::new(),
            date: Utc::now(),
            plain_body: Some("   ".to_string()),
            html_body: Some("<html><body><p>hello from jane@acme.com</p></body></html>".to_string()),
        };
        let text = msg.text().unwrap_or_default();
        assert!(text.contains("jane@acme.com"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_text_none_when_no_body() {
        let msg = MailMessage {
            from: String::new(),
            to: String::new(),
            cc: String::new(),
            bcc: String::new(),
            date: Utc::now(),
            plain_body: None,
            html_body: None,
        };
        assert!(msg.text().is_none());
    }
}
