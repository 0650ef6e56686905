//! Human-readable order numbers.
//!
//! Format: one prefix letter, the order date as `YYMMDD`, then a daily
//! sequence zero-padded to at least four digits:
//!
//! ```text
//! O2403150001   first registered-user order on 2024-03-15
//! G2403150012   twelfth guest order on 2024-03-15
//! ```
//!
//! Sequences restart at `0001` each day and per prefix. Past `9999` the
//! sequence simply grows a digit.

use core::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Minimum number of digits in the sequence part.
const SEQUENCE_WIDTH: usize = 4;

/// Length of the prefix letter plus the `YYMMDD` date.
const DAY_PREFIX_LEN: usize = 7;

/// Errors from [`OrderNumber::parse`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// Unknown prefix letter.
    #[error("order number must start with 'O' or 'G'")]
    InvalidPrefix,
    /// Too short or contains non-digits after the prefix.
    #[error("order number must be a prefix letter followed by at least 10 digits")]
    Malformed,
    /// The `YYMMDD` part is not a calendar date.
    #[error("order number contains an invalid date")]
    InvalidDate,
    /// Sequence numbers start at 1.
    #[error("order number sequence must be at least 1")]
    ZeroSequence,
}

/// Which kind of order a number belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Placed by a logged-in user (`O` prefix).
    Registered,
    /// Placed through guest checkout (`G` prefix).
    Guest,
}

impl OrderKind {
    /// Prefix letter for this kind.
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Registered => 'O',
            Self::Guest => 'G',
        }
    }

    const fn from_prefix(c: char) -> Option<Self> {
        match c {
            'O' => Some(Self::Registered),
            'G' => Some(Self::Guest),
            _ => None,
        }
    }
}

/// A parsed order number.
///
/// Ordering compares kind, then date, then sequence, so the maximum of a set
/// of same-day numbers is the one issued last.
///
/// ```
/// use chrono::NaiveDate;
/// use fitsphere_core::{OrderKind, OrderNumber};
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let first = OrderNumber::next_for_day(OrderKind::Guest, day, None);
/// assert_eq!(first.to_string(), "G2403150001");
///
/// let second = OrderNumber::next_for_day(OrderKind::Guest, day, Some(&first));
/// assert_eq!(second.to_string(), "G2403150002");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderNumber {
    kind: OrderKind,
    date: NaiveDate,
    sequence: u32,
}

impl OrderNumber {
    /// Build an order number from its parts.
    ///
    /// # Errors
    ///
    /// Returns `OrderNumberError::ZeroSequence` if `sequence` is 0.
    pub const fn new(
        kind: OrderKind,
        date: NaiveDate,
        sequence: u32,
    ) -> Result<Self, OrderNumberError> {
        if sequence == 0 {
            return Err(OrderNumberError::ZeroSequence);
        }
        Ok(Self {
            kind,
            date,
            sequence,
        })
    }

    /// The number that follows `last` on `date`.
    ///
    /// Returns sequence 1 when there is no previous number, or when `last`
    /// belongs to another day or kind.
    #[must_use]
    pub fn next_for_day(kind: OrderKind, date: NaiveDate, last: Option<&Self>) -> Self {
        let sequence = last
            .filter(|n| n.kind == kind && n.date == date)
            .map_or(1, |n| n.sequence.saturating_add(1));

        Self {
            kind,
            date,
            sequence,
        }
    }

    /// The `O240315` / `G240315` prefix shared by every number of that day.
    #[must_use]
    pub fn day_prefix(kind: OrderKind, date: NaiveDate) -> String {
        format!(
            "{}{:02}{:02}{:02}",
            kind.prefix(),
            date.year().rem_euclid(100),
            date.month(),
            date.day()
        )
    }

    /// Parse an order number such as `O2403150001`.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is unknown, the remainder is not all
    /// digits, the date is invalid, or the sequence is zero.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let mut chars = s.chars();
        let kind = chars
            .next()
            .and_then(OrderKind::from_prefix)
            .ok_or(OrderNumberError::InvalidPrefix)?;

        let digits = chars.as_str();
        if digits.len() < DAY_PREFIX_LEN - 1 + SEQUENCE_WIDTH
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(OrderNumberError::Malformed);
        }

        let (date_part, sequence_part) = digits.split_at(DAY_PREFIX_LEN - 1);
        let field = |range: core::ops::Range<usize>| -> Result<u32, OrderNumberError> {
            date_part
                .get(range)
                .and_then(|v| v.parse().ok())
                .ok_or(OrderNumberError::Malformed)
        };

        let year = 2000 + i32::try_from(field(0..2)?).map_err(|_| OrderNumberError::Malformed)?;
        let date = NaiveDate::from_ymd_opt(year, field(2..4)?, field(4..6)?)
            .ok_or(OrderNumberError::InvalidDate)?;

        let sequence: u32 = sequence_part
            .parse()
            .map_err(|_| OrderNumberError::Malformed)?;

        Self::new(kind, date, sequence)
    }

    /// Registered or guest order.
    #[must_use]
    pub const fn kind(&self) -> OrderKind {
        self.kind
    }

    /// Day the number was issued for.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Position within the day, starting at 1.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            Self::day_prefix(self.kind, self.date),
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for OrderNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_of_day_is_0001() {
        let n = OrderNumber::next_for_day(OrderKind::Registered, day(2025, 1, 9), None);
        assert_eq!(n.to_string(), "O2501090001");
    }

    #[test]
    fn test_next_increments_max() {
        let last = OrderNumber::parse("O2501090041").unwrap();
        let n = OrderNumber::next_for_day(OrderKind::Registered, day(2025, 1, 9), Some(&last));
        assert_eq!(n.to_string(), "O2501090042");
    }

    #[test]
    fn test_next_restarts_on_new_day() {
        let yesterday = OrderNumber::parse("G2501080999").unwrap();
        let n = OrderNumber::next_for_day(OrderKind::Guest, day(2025, 1, 9), Some(&yesterday));
        assert_eq!(n.sequence(), 1);
    }

    #[test]
    fn test_next_ignores_other_kind() {
        let registered = OrderNumber::parse("O2501090007").unwrap();
        let n = OrderNumber::next_for_day(OrderKind::Guest, day(2025, 1, 9), Some(&registered));
        assert_eq!(n.to_string(), "G2501090001");
    }

    #[test]
    fn test_sequence_widens_past_9999() {
        let last = OrderNumber::parse("O2501099999").unwrap();
        let n = OrderNumber::next_for_day(OrderKind::Registered, day(2025, 1, 9), Some(&last));
        assert_eq!(n.to_string(), "O25010910000");
        assert_eq!(OrderNumber::parse("O25010910000").unwrap(), n);
    }

    #[test]
    fn test_parse_parts() {
        let n = OrderNumber::parse("G2412310003").unwrap();
        assert_eq!(n.kind(), OrderKind::Guest);
        assert_eq!(n.date(), day(2024, 12, 31));
        assert_eq!(n.sequence(), 3);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            OrderNumber::parse("X2412310003"),
            Err(OrderNumberError::InvalidPrefix)
        );
        assert_eq!(OrderNumber::parse(""), Err(OrderNumberError::InvalidPrefix));
        assert_eq!(
            OrderNumber::parse("O241231003"),
            Err(OrderNumberError::Malformed)
        );
        assert_eq!(
            OrderNumber::parse("O24123100a3"),
            Err(OrderNumberError::Malformed)
        );
        assert_eq!(
            OrderNumber::parse("O2402300001"),
            Err(OrderNumberError::InvalidDate)
        );
        assert_eq!(
            OrderNumber::parse("O2412310000"),
            Err(OrderNumberError::ZeroSequence)
        );
    }

    #[test]
    fn test_day_prefix() {
        assert_eq!(
            OrderNumber::day_prefix(OrderKind::Registered, day(2030, 7, 4)),
            "O300704"
        );
    }

    #[test]
    fn test_ordering_picks_latest() {
        let numbers = ["O2501090002", "O2501090010", "O2501090009"]
            .map(|s| OrderNumber::parse(s).unwrap());
        let max = numbers.iter().max().unwrap();
        assert_eq!(max.sequence(), 10);
    }

    #[test]
    fn test_serde_as_string() {
        let n = OrderNumber::parse("G2501090005").unwrap();
        assert_eq!(serde_json::to_string(&n).unwrap(), "\"G2501090005\"");
        let back: OrderNumber = serde_json::from_str("\"G2501090005\"").unwrap();
        assert_eq!(back, n);
    }
}
