//! mailtrace — resolve display names to email addresses by searching the
//! account owner's mailbox headers, calendar guest lists, and message
//! bodies.
//!
//! The cascade runs fixed-priority phases (From, To, Cc, Bcc headers, then
//! calendar guests, then message bodies) and stops at the first phase that
//! yields an accepted candidate. Candidates are scored by name-pattern
//! matches against the address plus recency and channel bonuses; the winner
//! carries a High/Medium/Low confidence label, and per-row outcomes persist
//! in SQLite so re-runs resume where they left off.

pub mod address;
pub mod config;
pub mod driver;
pub mod error;
pub mod google;
pub mod ratelimit;
pub mod resolver;
pub mod search;
pub mod store;
