//! # Timeline Assembly
//!
//! Groups a chat's messages into day sections for rendering. Grouping is
//! derived, ephemeral state: sections are recomputed whenever the message
//! list or the label clock changes, and never reorder messages.
//!
//! A section is a contiguous run of messages sharing the same local
//! calendar day. Concatenating all sections in order reproduces the
//! original list exactly.

use std::ops::Range;

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};

use crate::service::Message;

/// A contiguous run of messages on one local calendar day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaySection {
    pub day: NaiveDate,
    /// Display header ("Today", "Yesterday", weekday, or full date).
    pub label: String,
    /// Index range into the message slice this section was derived from.
    pub range: Range<usize>,
}

impl DaySection {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// The local calendar day a message belongs to.
fn local_day(message: &Message) -> NaiveDate {
    message.created_at.with_timezone(&Local).date_naive()
}

/// Partition `messages` into day sections, preserving order.
///
/// `today` is passed in (rather than read from the clock) so headers stay
/// consistent within one render pass and so tests can pin the reference day.
pub fn group_by_day(messages: &[Message], today: NaiveDate) -> Vec<DaySection> {
    let mut sections: Vec<DaySection> = Vec::new();

    for (i, message) in messages.iter().enumerate() {
        let day = local_day(message);
        match sections.last_mut() {
            Some(section) if section.day == day => section.range.end = i + 1,
            _ => sections.push(DaySection {
                day,
                label: day_label(day, today),
                range: i..i + 1,
            }),
        }
    }

    sections
}

/// Header label for a day relative to `today`.
///
/// "Today", "Yesterday", the weekday name within the last week, the month
/// and day within the same year, and the full date otherwise. Future days
/// (clock skew) fall through to the full date.
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    let age = today.signed_duration_since(day).num_days();
    match age {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => day.format("%A").to_string(),
        _ if age > 6 && day.year() == today.year() => day.format("%B %-d").to_string(),
        _ => day.format("%B %-d, %Y").to_string(),
    }
}

/// Clock label for one message ("3:45 PM"), in local time.
pub fn time_label(created_at: DateTime<Utc>) -> String {
    created_at
        .with_timezone(&Local)
        .format("%-I:%M %p")
        .to_string()
}

/// Today's local calendar date. The event loop re-reads this on every
/// label tick so headers roll over at midnight without a restart.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
