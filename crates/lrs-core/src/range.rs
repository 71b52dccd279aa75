//! Temporal range filters for user-scoped event queries.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::Error;

/// The literal bound format: `yyyy-MM-dd hh:mm`, a 12-hour clock with no
/// AM/PM marker. The format is an external contract and is ambiguous for
/// afternoon times; hours are read literally (00-23 accepted), which matches
/// how the original lenient parser resolved them.
const BOUND_FORMAT: &str = "%Y-%m-%d %H:%M";

const PARSE_ERROR: &str =
    "Not able to parse the date, it has to be in the following format: `yyyy-MM-dd hh:mm`";

/// A time window over event timestamps. Both bounds are strict (exclusive);
/// no inclusive variant is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRange {
    /// Exclusive lower bound: only events strictly after this instant match.
    pub after: Option<DateTime<Utc>>,
    /// Exclusive upper bound: only events strictly before this instant match.
    pub before: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Parses optional `from`/`to` bound strings into a filter.
    ///
    /// Blank strings mean "unbounded" on that side. A non-blank bound that
    /// does not parse fails with [`Error::BadRequest`] before any query runs.
    /// Parsed bounds are interpreted as UTC instants.
    pub fn parse(from: &str, to: &str) -> Result<Self, Error> {
        Ok(Self {
            after: parse_bound(from)?,
            before: parse_bound(to)?,
        })
    }

    /// Returns true when no bound was supplied on either side.
    pub const fn is_unbounded(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }

    /// Strict containment check: bounds themselves are excluded.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.after.is_none_or(|bound| instant > bound)
            && self.before.is_none_or(|bound| instant < bound)
    }
}

fn parse_bound(value: &str) -> Result<Option<DateTime<Utc>>, Error> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(value, BOUND_FORMAT)
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| Error::BadRequest(PARSE_ERROR.to_string()))
}
