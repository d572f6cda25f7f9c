use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const ROLLING_DEADLINE: &str = "Rolling Deadline";
pub const NOT_SPECIFIED: &str = "Not specified";

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const ROLLING_WORDS: &[&str] = &["rolling", "ongoing", "continuous", "open", "throughout"];

/// Formats seen on Indian government sites, tried in order. The first one
/// producing a real calendar date wins, so `01/02/2025` reads day-first and
/// `15/08/24` is taken as year 24 by the four-digit pattern.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d/%m/%y",
    "%d-%m-%y",
];

/// Broader set used only for ordering raw (unnormalized) dates.
const LOOSE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a, %d %b %Y",
    "%A, %B %d, %Y",
];

const LOOSE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Outcome of reading a free-text date cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateResult {
    Iso(NaiveDate),
    Rolling,
    /// Could not be parsed; holds the whitespace-cleaned text.
    Raw(String),
    Missing,
}

/// Normalize a free-text date. Never fails: unparseable text comes back as
/// [`DateResult::Raw`].
pub fn normalize(raw: &str) -> DateResult {
    let collapsed = WHITESPACE_RE.replace_all(raw, " ");
    let cleaned = collapsed.trim();
    if cleaned.is_empty() {
        return DateResult::Missing;
    }

    let lower = cleaned.to_lowercase();
    if ROLLING_WORDS.iter().any(|w| lower.contains(w)) {
        return DateResult::Rolling;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
        .map(DateResult::Iso)
        .unwrap_or_else(|| DateResult::Raw(cleaned.to_string()))
}

/// Normalize an optional cell; an absent cell is [`DateResult::Missing`].
pub fn normalize_cell(cell: Option<&str>) -> DateResult {
    cell.map_or(DateResult::Missing, normalize)
}

impl DateResult {
    /// The calendar date used for deadline ordering, if any.
    ///
    /// Raw text gets a second, more lenient parse; the sentinels never have one.
    pub fn deadline(&self) -> Option<NaiveDate> {
        match self {
            DateResult::Iso(date) => Some(*date),
            DateResult::Raw(text) => parse_loose(text),
            DateResult::Rolling | DateResult::Missing => None,
        }
    }

    /// Reads back the `Display` form. The sentinel strings win, so a raw
    /// cell that literally says "Not specified" or "Rolling Deadline" comes
    /// back as the sentinel.
    pub fn from_rendered(s: &str) -> Self {
        match s {
            "" | NOT_SPECIFIED => DateResult::Missing,
            ROLLING_DEADLINE => DateResult::Rolling,
            other => match NaiveDate::parse_from_str(other, "%Y-%m-%d") {
                Ok(date) => DateResult::Iso(date),
                Err(_) => DateResult::Raw(other.to_string()),
            },
        }
    }

    pub fn is_iso(&self) -> bool {
        matches!(self, DateResult::Iso(_))
    }
}

/// Generic date parse for sorting: RFC 3339, RFC 2822, ISO date-times and a
/// handful of slash and month-name shapes.
pub fn parse_loose(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    if let Some(dt) = LOOSE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt.date());
    }
    LOOSE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

impl fmt::Display for DateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateResult::Iso(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            DateResult::Rolling => f.write_str(ROLLING_DEADLINE),
            DateResult::Raw(text) => f.write_str(text),
            DateResult::Missing => f.write_str(NOT_SPECIFIED),
        }
    }
}

/// Reads back the rendered form (as stored or serialized).
impl FromStr for DateResult {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DateResult::from_rendered(s))
    }
}

impl Serialize for DateResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(DateResult::from_rendered(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso(y: i32, m: u32, d: u32) -> DateResult {
        DateResult::Iso(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn day_first_slash() {
        assert_eq!(normalize("15/08/2024"), iso(2024, 8, 15));
        assert_eq!(normalize("15/08/2024").to_string(), "2024-08-15");
    }

    #[test]
    fn rolling_words() {
        assert_eq!(normalize("ongoing"), DateResult::Rolling);
        assert_eq!(normalize("Rolling basis"), DateResult::Rolling);
        assert_eq!(normalize("Open throughout the year"), DateResult::Rolling);
        assert_eq!(normalize("CONTINUOUS"), DateResult::Rolling);
    }

    #[test]
    fn empty_is_missing() {
        assert_eq!(normalize(""), DateResult::Missing);
        assert_eq!(normalize("   \t "), DateResult::Missing);
        assert_eq!(normalize_cell(None), DateResult::Missing);
    }

    #[test]
    fn unparseable_is_raw() {
        assert_eq!(normalize("next Tuesday"), DateResult::Raw("next Tuesday".into()));
        assert_eq!(normalize("  to be   announced "), DateResult::Raw("to be announced".into()));
    }

    #[test]
    fn other_shapes() {
        assert_eq!(normalize("31-03-2025"), iso(2025, 3, 31));
        assert_eq!(normalize("2025-03-31"), iso(2025, 3, 31));
        assert_eq!(normalize("31 Mar 2025"), iso(2025, 3, 31));
        assert_eq!(normalize("31 March 2025"), iso(2025, 3, 31));
        assert_eq!(normalize("March 31, 2025"), iso(2025, 3, 31));
        assert_eq!(normalize("12/31/2025"), iso(2025, 12, 31));
    }

    #[test]
    fn ambiguous_reads_day_first() {
        assert_eq!(normalize("01/02/2025"), iso(2025, 2, 1));
    }

    #[test]
    fn two_digit_year_taken_literally() {
        assert_eq!(normalize("15/08/24"), iso(24, 8, 15));
        assert_eq!(normalize("15/08/24").to_string(), "0024-08-15");
        assert_eq!(normalize("15-08-24"), iso(24, 8, 15));
        assert_eq!(normalize("15-08-24").to_string(), "0024-08-15");
    }

    #[test]
    fn impossible_date_falls_through() {
        assert_eq!(normalize("31/02/2025"), DateResult::Raw("31/02/2025".into()));
    }

    #[test]
    fn trailing_text_is_not_a_date() {
        assert!(matches!(normalize("31/03/2025 (5 PM)"), DateResult::Raw(_)));
    }

    #[test]
    fn rendered_form_reads_back() {
        for value in [
            iso(2025, 1, 1),
            DateResult::Rolling,
            DateResult::Missing,
            DateResult::Raw("next Tuesday".into()),
        ] {
            let parsed: DateResult = value.to_string().parse().unwrap();
            assert_eq!(parsed, value);
        }
    }

    #[test]
    fn sentinel_text_reads_back_as_sentinel() {
        let raw = normalize("Not specified");
        assert_eq!(raw, DateResult::Raw("Not specified".into()));
        assert_eq!(DateResult::from_rendered(&raw.to_string()), DateResult::Missing);
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&vec![iso(2025, 3, 31), DateResult::Missing]).unwrap();
        assert_eq!(json, r#"["2025-03-31","Not specified"]"#);
        let back: Vec<DateResult> = serde_json::from_str(r#"["Rolling Deadline"]"#).unwrap();
        assert_eq!(back, vec![DateResult::Rolling]);
    }

    #[test]
    fn deadline_for_sorting() {
        assert_eq!(iso(2025, 3, 31).deadline(), NaiveDate::from_ymd_opt(2025, 3, 31));
        assert_eq!(DateResult::Rolling.deadline(), None);
        assert_eq!(DateResult::Missing.deadline(), None);
        assert_eq!(
            DateResult::Raw("2025-04-01T10:00:00Z".into()).deadline(),
            NaiveDate::from_ymd_opt(2025, 4, 1)
        );
        assert_eq!(
            DateResult::Raw("April 1 2025".into()).deadline(),
            NaiveDate::from_ymd_opt(2025, 4, 1)
        );
        assert_eq!(DateResult::Raw("next Tuesday".into()).deadline(), None);
    }
}
