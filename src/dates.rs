//! Natural-language date phrases as they appear in athlete info boxes.
//!
//! Accepts `June 15, 1950`, `15 June 1950`, `June 1950`, `1950` and ISO `1950-06-15`. Month names
//! may be full or abbreviated. When the day or month is missing the parser fills in a fixed
//! default (April 21 unless configured otherwise), so `1950` becomes 1950-04-21.

use chrono::NaiveDate;
use thiserror::Error;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const IGNORED_WORDS: &[&str] = &["c.", "ca.", "circa", "about", "on", "the", "of"];

/// A date phrase could not be turned into a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    /// No four-digit year in the phrase.
    #[error("no year in `{0}`")]
    MissingYear(String),
    /// A token was neither a month, a day nor a year.
    #[error("unrecognised token `{token}` in `{phrase}`")]
    UnknownToken {
        /// Full phrase.
        phrase: String,
        /// Offending token.
        token: String,
    },
    /// A day was given without a month.
    #[error("day without month in `{0}`")]
    DayWithoutMonth(String),
    /// The components do not form a real date (e.g. February 30).
    #[error("`{0}` is not a calendar date")]
    OutOfRange(String),
}

/// Date phrase parser with a fixed policy for partial dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParser {
    default_month: u32,
    default_day: u32,
}

impl DateParser {
    /// Parser filling missing components with `default_month` / `default_day`.
    pub fn new(default_month: u32, default_day: u32) -> Self {
        Self {
            default_month,
            default_day,
        }
    }

    /// Parses `phrase` into a date.
    pub fn parse(&self, phrase: &str) -> Result<NaiveDate, DateParseError> {
        let trimmed = phrase.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(date);
        }

        let mut year = None;
        let mut month = None;
        let mut day = None;
        for raw in trimmed.split(|c: char| c.is_whitespace() || c == ',') {
            let token = raw.trim().to_ascii_lowercase();
            if token.is_empty() || IGNORED_WORDS.contains(&token.as_str()) {
                continue;
            }
            if let Some(number) = numeric_token(&token) {
                if token.len() == 4 && year.is_none() {
                    year = Some(number as i32);
                    continue;
                }
                if (1..=31).contains(&number) && day.is_none() {
                    day = Some(number);
                    continue;
                }
            } else if let Some(found) = month_number(&token) {
                if month.is_none() {
                    month = Some(found);
                    continue;
                }
            }
            return Err(DateParseError::UnknownToken {
                phrase: trimmed.to_string(),
                token: raw.to_string(),
            });
        }

        let year = year.ok_or_else(|| DateParseError::MissingYear(trimmed.to_string()))?;
        if day.is_some() && month.is_none() {
            return Err(DateParseError::DayWithoutMonth(trimmed.to_string()));
        }
        NaiveDate::from_ymd_opt(
            year,
            month.unwrap_or(self.default_month),
            day.unwrap_or(self.default_day),
        )
        .ok_or_else(|| DateParseError::OutOfRange(trimmed.to_string()))
    }
}

impl Default for DateParser {
    /// April 21 fills missing components.
    fn default() -> Self {
        Self::new(4, 21)
    }
}

/// `15`, `15th`, `1st` → number. Four-digit tokens are returned as-is for the year check.
fn numeric_token(token: &str) -> Option<u32> {
    let digits = token
        .strip_suffix("st")
        .or_else(|| token.strip_suffix("nd"))
        .or_else(|| token.strip_suffix("rd"))
        .or_else(|| token.strip_suffix("th"))
        .unwrap_or(token);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Full or three-letter (optionally dotted) month name → 1-based month.
fn month_number(token: &str) -> Option<u32> {
    let name = token.trim_end_matches('.');
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|month| *month == name || (name.len() <= 4 && month.starts_with(name)))
        .map(|index| index as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_shapes() {
        let parser = DateParser::default();
        assert_eq!(parser.parse("June 15, 1950").unwrap(), date(1950, 6, 15));
        assert_eq!(parser.parse("15 June 1950").unwrap(), date(1950, 6, 15));
        assert_eq!(parser.parse("Sept. 3 1921").unwrap(), date(1921, 9, 3));
        assert_eq!(parser.parse("1950-06-15").unwrap(), date(1950, 6, 15));
        assert_eq!(parser.parse("March 1st, 1902").unwrap(), date(1902, 3, 1));
    }

    #[test]
    fn partial_dates_use_default_day() {
        let parser = DateParser::default();
        assert_eq!(parser.parse("1950").unwrap(), date(1950, 4, 21));
        assert_eq!(parser.parse("June 1950").unwrap(), date(1950, 6, 21));
        assert_eq!(parser.parse("c. 1890").unwrap(), date(1890, 4, 21));
    }

    #[test]
    fn rejects_nonsense() {
        let parser = DateParser::default();
        assert!(matches!(
            parser.parse("sometime"),
            Err(DateParseError::UnknownToken { .. })
        ));
        assert!(matches!(
            parser.parse("June 15"),
            Err(DateParseError::MissingYear(_))
        ));
        assert!(matches!(
            parser.parse("February 30, 1950"),
            Err(DateParseError::OutOfRange(_))
        ));
        assert!(matches!(
            parser.parse("15 1950"),
            Err(DateParseError::DayWithoutMonth(_))
        ));
    }
}
