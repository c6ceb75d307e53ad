// 📅 Calendar Utilities - pagination driver for the portal collector
//
// Three pure generators:
// 1. Date range:      every day between two bounds, clamped to today
// 2. Month boundary:  first and last day of a (year, month)
// 3. Year-month list: every (year, month) between two months
//
// "Today" is always an explicit parameter in the `_at` variants; the plain
// variants read the local clock once and delegate.

use crate::error::{CalendarError, CalendarResult};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;

/// Rendering used for every date handed to the portal and stored in `Date` columns
pub const DATE_FORMAT: &str = "%Y/%m/%d";

const DATE_LAYOUTS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d", "%Y.%m.%d", "%m/%d/%Y"];

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y/%m/%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

// ============================================================================
// DATE STRING
// ============================================================================

/// A calendar date rendered as `YYYY/MM/DD`
///
/// Only constructible from a valid `NaiveDate`, so the text is always
/// zero-padded with a four-digit year.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateString {
    text: String,
    date: NaiveDate,
}

impl DateString {
    pub fn from_date(date: NaiveDate) -> Self {
        DateString {
            text: date.format(DATE_FORMAT).to_string(),
            date,
        }
    }

    /// Parse any accepted layout and re-render it canonically
    pub fn parse(text: &str) -> CalendarResult<Self> {
        parse_date(text).map(DateString::from_date)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl fmt::Display for DateString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for DateString {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl PartialEq<str> for DateString {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for DateString {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl Serialize for DateString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

// ============================================================================
// DATE BOUND
// ============================================================================

/// A range endpoint: either an already-structured date or text to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateBound {
    Date(NaiveDate),
    Text(String),
}

impl DateBound {
    pub fn resolve(&self) -> CalendarResult<NaiveDate> {
        match self {
            DateBound::Date(date) => Ok(*date),
            DateBound::Text(text) => parse_date(text),
        }
    }
}

impl From<NaiveDate> for DateBound {
    fn from(date: NaiveDate) -> Self {
        DateBound::Date(date)
    }
}

impl From<&str> for DateBound {
    fn from(text: &str) -> Self {
        DateBound::Text(text.to_string())
    }
}

impl From<String> for DateBound {
    fn from(text: String) -> Self {
        DateBound::Text(text)
    }
}

impl From<&DateString> for DateBound {
    fn from(date: &DateString) -> Self {
        DateBound::Date(date.date())
    }
}

impl From<DateString> for DateBound {
    fn from(date: DateString) -> Self {
        DateBound::Date(date.date())
    }
}

/// Parse a date string in any accepted layout; a trailing time is dropped
pub fn parse_date(text: &str) -> CalendarResult<NaiveDate> {
    let trimmed = text.trim();

    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, layout) {
            return Ok(date);
        }
    }

    for layout in DATETIME_LAYOUTS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Ok(datetime.date());
        }
    }

    if let Some(date) = parse_compact(trimmed) {
        return Ok(date);
    }

    Err(CalendarError::Format(text.to_string()))
}

/// `YYYYMMDD`, split by position since `%Y` would swallow the whole run
fn parse_compact(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = text[0..4].parse().ok()?;
    let month = text[4..6].parse().ok()?;
    let day = text[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Current local date, the implicit reference of the non-`_at` functions
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// DATE RANGE GENERATOR
// ============================================================================

/// Every day from `start` to `end` inclusive, with `end` clamped to today
pub fn generate_date_range(
    start: impl Into<DateBound>,
    end: impl Into<DateBound>,
) -> CalendarResult<Vec<DateString>> {
    generate_date_range_at(start, end, today())
}

/// Same as [`generate_date_range`] with an explicit reference date
pub fn generate_date_range_at(
    start: impl Into<DateBound>,
    end: impl Into<DateBound>,
    today: NaiveDate,
) -> CalendarResult<Vec<DateString>> {
    let start = start.into().resolve()?;
    let end = end.into().resolve()?.min(today);

    Ok(start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(DateString::from_date)
        .collect())
}

// ============================================================================
// MONTH BOUNDARY RESOLVER
// ============================================================================

/// First and last day of a month as `YYYY/MM/DD`
pub fn resolve_month_boundary(year: i32, month: u32) -> CalendarResult<(DateString, DateString)> {
    let (first, last) = month_bounds(year, month)?;
    Ok((DateString::from_date(first), DateString::from_date(last)))
}

fn month_bounds(year: i32, month: u32) -> CalendarResult<(NaiveDate, NaiveDate)> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::InvalidMonth(month));
    }

    let out_of_range = || CalendarError::OutOfRange { year, month };

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(out_of_range)?;
    let last = next_first.pred_opt().ok_or_else(out_of_range)?;

    Ok((first, last))
}

// ============================================================================
// YEAR-MONTH SEQUENCER
// ============================================================================

/// A (year, month) pair with the month guaranteed to be in 1..=12
///
/// Field order makes the derived `Ord` compare year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> CalendarResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth(month));
        }
        Ok(YearMonth { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following month, rolling December into January of the next year;
    /// `None` past December of `i32::MAX`
    pub fn succ(&self) -> Option<Self> {
        if self.month == 12 {
            Some(YearMonth {
                year: self.year.checked_add(1)?,
                month: 1,
            })
        } else {
            Some(YearMonth {
                year: self.year,
                month: self.month + 1,
            })
        }
    }

    /// Query window for this month
    pub fn boundary(&self) -> CalendarResult<(DateString, DateString)> {
        resolve_month_boundary(self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<YearMonth> for (i32, u32) {
    fn from(ym: YearMonth) -> Self {
        (ym.year, ym.month)
    }
}

/// Every month from the start to the end inclusive
///
/// Missing end components default independently to today's year / month.
pub fn sequence_year_months(
    start_year: i32,
    start_month: u32,
    end_year: Option<i32>,
    end_month: Option<u32>,
) -> CalendarResult<Vec<YearMonth>> {
    sequence_year_months_at(start_year, start_month, end_year, end_month, today())
}

/// Same as [`sequence_year_months`] with an explicit reference date
pub fn sequence_year_months_at(
    start_year: i32,
    start_month: u32,
    end_year: Option<i32>,
    end_month: Option<u32>,
    today: NaiveDate,
) -> CalendarResult<Vec<YearMonth>> {
    let start = YearMonth::new(start_year, start_month)?;
    let end = YearMonth::new(
        end_year.unwrap_or_else(|| today.year()),
        end_month.unwrap_or_else(|| today.month()),
    )?;

    let mut months = Vec::new();
    let mut current = Some(start);
    while let Some(month) = current.filter(|m| *m <= end) {
        months.push(month);
        current = month.succ();
    }

    Ok(months)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn as_pairs(months: &[YearMonth]) -> Vec<(i32, u32)> {
        months.iter().map(|m| (*m).into()).collect()
    }

    #[test]
    fn test_month_boundary_leap_february() {
        let (first, last) = resolve_month_boundary(2024, 2).unwrap();
        assert_eq!(first, "2024/02/01");
        assert_eq!(last, "2024/02/29");

        let (_, last) = resolve_month_boundary(2023, 2).unwrap();
        assert_eq!(last, "2023/02/28");
    }

    #[test]
    fn test_month_boundary_december_rollover() {
        let (first, last) = resolve_month_boundary(2023, 12).unwrap();
        assert_eq!(first, "2023/12/01");
        assert_eq!(last, "2023/12/31");
    }

    #[test]
    fn test_month_boundary_last_day_precedes_next_month() {
        for year in [1999, 2000, 2023, 2024, 2100] {
            for month in 1..=12 {
                let (first, last) = resolve_month_boundary(year, month).unwrap();
                assert_eq!(first.date().day(), 1);

                let next = YearMonth::new(year, month).unwrap().succ().unwrap();
                let (next_first, _) = next.boundary().unwrap();
                assert_eq!(last.date().succ_opt().unwrap(), next_first.date());
            }
        }
    }

    #[test]
    fn test_month_boundary_rejects_invalid_month() {
        assert_eq!(
            resolve_month_boundary(2024, 0),
            Err(CalendarError::InvalidMonth(0))
        );
        assert_eq!(
            resolve_month_boundary(2024, 13),
            Err(CalendarError::InvalidMonth(13))
        );
    }

    #[test]
    fn test_date_range_inclusive_bounds() {
        let today = ymd(2024, 6, 1);
        let range = generate_date_range_at("2023/10/30", "2023/11/02", today).unwrap();
        let texts: Vec<&str> = range.iter().map(|d| d.as_str()).collect();
        assert_eq!(
            texts,
            vec!["2023/10/30", "2023/10/31", "2023/11/01", "2023/11/02"]
        );
    }

    #[test]
    fn test_date_range_single_day() {
        let today = ymd(2024, 6, 1);
        let day = ymd(2024, 2, 29);
        let range = generate_date_range_at(day, day, today).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range[0], "2024/02/29");

        // Today itself is not in the future
        let range = generate_date_range_at(today, today, today).unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_date_range_start_after_end_is_empty() {
        let today = ymd(2024, 6, 1);
        let range = generate_date_range_at("2024/03/05", "2024/03/01", today).unwrap();
        assert!(range.is_empty());
    }

    #[test]
    fn test_date_range_clamps_future_end() {
        let today = ymd(2024, 6, 3);
        let range = generate_date_range_at("2024/06/01", "2024/06/30", today).unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range.last().unwrap(), &"2024/06/03");

        // Start in the future as well: nothing left after clamping
        let range = generate_date_range_at("2024/07/01", "2024/07/05", today).unwrap();
        assert!(range.is_empty());
    }

    #[test]
    fn test_date_range_mixed_bound_kinds() {
        let today = ymd(2024, 6, 1);
        let range = generate_date_range_at(ymd(2024, 1, 30), "2024-02-01", today).unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range[2], "2024/02/01");
    }

    #[test]
    fn test_date_range_format_error() {
        let today = ymd(2024, 6, 1);
        let err = generate_date_range_at("yesterday", "2024/01/01", today).unwrap_err();
        assert_eq!(err, CalendarError::Format("yesterday".to_string()));

        let err = generate_date_range_at("2024/01/01", "2024/02/30", today).unwrap_err();
        assert!(matches!(err, CalendarError::Format(_)));
    }

    #[test]
    fn test_parse_date_layouts() {
        let expected = ymd(2023, 11, 5);
        for text in [
            "2023/11/05",
            "2023-11-05",
            "2023.11.05",
            "11/05/2023",
            " 2023/11/05 ",
            "2023/11/05 14:30",
            "2023-11-05 14:30:00",
            "20231105",
            " 20231105 ",
        ] {
            assert_eq!(parse_date(text).unwrap(), expected, "layout: {text}");
        }
    }

    #[test]
    fn test_parse_date_compact_rejects_bad_digits() {
        for text in ["20231305", "20230230", "2023115", "2023110a", "202311050"] {
            assert_eq!(
                parse_date(text),
                Err(CalendarError::Format(text.to_string())),
                "text: {text}"
            );
        }
    }

    #[test]
    fn test_year_months_across_year_end() {
        let today = ymd(2024, 6, 1);
        let months = sequence_year_months_at(2023, 11, Some(2024), Some(2), today).unwrap();
        assert_eq!(
            as_pairs(&months),
            vec![(2023, 11), (2023, 12), (2024, 1), (2024, 2)]
        );
    }

    #[test]
    fn test_year_months_defaults_to_today() {
        let today = ymd(2024, 2, 17);
        let months = sequence_year_months_at(2023, 12, None, None, today).unwrap();
        assert_eq!(as_pairs(&months), vec![(2023, 12), (2024, 1), (2024, 2)]);

        // Each end component defaults independently
        let months = sequence_year_months_at(2024, 1, None, Some(4), today).unwrap();
        assert_eq!(months.len(), 4);
        let months = sequence_year_months_at(2023, 12, Some(2023), None, today).unwrap();
        assert!(months.is_empty());
    }

    #[test]
    fn test_year_months_start_after_end_is_empty() {
        let today = ymd(2024, 6, 1);
        let months = sequence_year_months_at(2024, 5, Some(2024), Some(4), today).unwrap();
        assert!(months.is_empty());
    }

    #[test]
    fn test_year_months_rejects_invalid_months() {
        let today = ymd(2024, 6, 1);
        assert_eq!(
            sequence_year_months_at(2023, 13, Some(2024), Some(2), today),
            Err(CalendarError::InvalidMonth(13))
        );
        assert_eq!(
            sequence_year_months_at(2023, 1, Some(2024), Some(0), today),
            Err(CalendarError::InvalidMonth(0))
        );
    }

    #[test]
    fn test_year_month_display_and_succ() {
        let ym = YearMonth::new(2023, 12).unwrap();
        assert_eq!(ym.to_string(), "2023-12");
        assert_eq!(ym.succ(), Some(YearMonth::new(2024, 1).unwrap()));
        assert_eq!(YearMonth::new(i32::MAX, 12).unwrap().succ(), None);
        assert_eq!(YearMonth::from_date(ymd(2024, 7, 9)).to_string(), "2024-07");
    }

    #[test]
    fn test_year_months_stop_at_last_representable_year() {
        let today = ymd(2024, 6, 1);
        let months =
            sequence_year_months_at(i32::MAX, 12, Some(i32::MAX), Some(12), today).unwrap();
        assert_eq!(as_pairs(&months), vec![(i32::MAX, 12)]);

        let months =
            sequence_year_months_at(i32::MAX, 11, Some(i32::MAX), Some(12), today).unwrap();
        assert_eq!(as_pairs(&months), vec![(i32::MAX, 11), (i32::MAX, 12)]);
    }
}
