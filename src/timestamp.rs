use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::error::{ReportError, Result};

// Optional weekday, a date in one of four layouts, optional time of day with
// an optional meridiem, optional zone designator.
static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)
        ^(?:(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+)?
        (?:
            (?P<iso>\d{4}-\d{1,2}-\d{1,2}|\d{4}/\d{1,2}/\d{1,2})
          | (?P<us_month>\d{1,2})/(?P<us_day>\d{1,2})/(?P<us_year>\d{4})
          | (?P<name_month>[a-z]{3,9})\.?\s+(?P<name_day>\d{1,2})(?:st|nd|rd|th)?,?\s+(?P<name_year>\d{4})
          | (?P<day_first>\d{1,2})(?:st|nd|rd|th)?\s+(?P<month_second>[a-z]{3,9})\.?,?\s+(?P<year_last>\d{4})
        )
        (?:(?:[T\s]+|,\s*)(?P<time>\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?)(?:\s*(?P<meridiem>am|pm))?)?
        (?:\s*(?P<zone>Z|[+-]\d{2}(?::?\d{2})?|[a-z][a-z0-9_+\-]*(?:/[a-z0-9_+\-]+)*))?$",
    )
    .expect("timestamp pattern is valid")
});

const TIME_FORMATS: [&str; 3] = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

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

/// Where a wall-clock value lives: a fixed offset or a tz database zone.
#[derive(Debug, Clone, Copy)]
enum Zone {
    Fixed(FixedOffset),
    Named(Tz),
}

/// Parses a date/time string, keeping the offset it was written in.
///
/// Accepted dates are `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY` (month
/// first), `Sep 1 2013`, `September 1, 2013` and `1 Sep 2013`, optionally
/// led by a weekday. The time of day may carry `AM`/`PM`. Zones are `Z`,
/// numeric offsets, or any tz database name matched case-insensitively
/// (`Europe/Berlin`, `UTC`, `CET`, `EST`). Abbreviations without a tz
/// database entry (`PST`, `BST`, `IST`) are rejected as ambiguous.
/// Values without a zone are taken to be UTC already. A wall-clock time
/// repeated by a DST change resolves to its earlier instant.
pub fn parse_zoned(raw: &str) -> Result<DateTime<FixedOffset>> {
    let value = raw.trim();

    let Some(caps) = TIMESTAMP_PATTERN.captures(value) else {
        return DateTime::parse_from_rfc2822(value)
            .map_err(|_| date_error(raw, "unrecognized date/time format"));
    };

    let date = date_from_captures(&caps).ok_or_else(|| date_error(raw, "invalid calendar date"))?;
    let time = match caps.name("time") {
        Some(m) => parse_time(m.as_str(), caps.name("meridiem").map(|m| m.as_str()))
            .ok_or_else(|| date_error(raw, "invalid time of day"))?,
        None => NaiveTime::MIN,
    };
    let zone = match caps.name("zone") {
        Some(m) => resolve_zone(m.as_str())
            .ok_or_else(|| date_error(raw, &format!("unknown time zone '{}'", m.as_str())))?,
        None => Zone::Fixed(utc_offset()),
    };

    localize(zone, date.and_time(time))
        .ok_or_else(|| date_error(raw, "local time does not exist in that zone"))
}

/// Parses a date/time string and normalizes it to UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    parse_zoned(raw).map(convert_timezone)
}

pub fn convert_timezone(value: DateTime<FixedOffset>) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

fn date_from_captures(caps: &Captures) -> Option<NaiveDate> {
    if let Some(iso) = caps.name("iso") {
        return NaiveDate::parse_from_str(iso.as_str(), "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(iso.as_str(), "%Y/%m/%d"))
            .ok();
    }

    let number = |name: &str| caps.name(name)?.as_str().parse::<u32>().ok();
    let (year, month, day) = if caps.name("us_year").is_some() {
        (number("us_year")?, number("us_month")?, number("us_day")?)
    } else if let Some(name) = caps.name("name_month") {
        (number("name_year")?, month_number(name.as_str())?, number("name_day")?)
    } else {
        let name = caps.name("month_second")?;
        (number("year_last")?, month_number(name.as_str())?, number("day_first")?)
    };

    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

/// Month number for an English month name or any prefix of at least three
/// letters (`Sep`, `Sept`, `September`).
fn month_number(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|month| month.starts_with(&name))
        .map(|index| index as u32 + 1)
}

fn parse_time(value: &str, meridiem: Option<&str>) -> Option<NaiveTime> {
    let time = TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())?;

    let Some(meridiem) = meridiem else {
        return Some(time);
    };
    let hour = time.hour();
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match (meridiem.eq_ignore_ascii_case("pm"), hour) {
        (false, 12) => 0,
        (true, 12) => 12,
        (true, h) => h + 12,
        (false, h) => h,
    };
    time.with_hour(hour)
}

fn resolve_zone(zone: &str) -> Option<Zone> {
    if zone.eq_ignore_ascii_case("Z") {
        return Some(Zone::Fixed(utc_offset()));
    }
    if zone.starts_with(['+', '-']) {
        return parse_offset(zone).map(Zone::Fixed);
    }
    Tz::from_str_insensitive(zone).ok().map(Zone::Named)
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let digits: String = zone[1..].chars().filter(|c| *c != ':').collect();
    let hours: i32 = digits.get(0..2)?.parse().ok()?;
    let minutes: i32 = match digits.get(2..4) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    if minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn localize(zone: Zone, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match zone {
        Zone::Fixed(offset) => offset.from_local_datetime(&local).earliest(),
        Zone::Named(tz) => tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.fixed_offset()),
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn date_error(value: &str, reason: &str) -> ReportError {
    ReportError::DateParse {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
