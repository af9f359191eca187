//! Time conversion: strict ISO-8601 parsing, zone-qualified local times and
//! instant comparison for date-valued expectations.

use crate::context::TestContext;
use crate::value::{self, Value};
use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_TIMEZONE: &str = "Asia/Jerusalem";

static ISO_8601: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})(?:-(\d{2}))?(?:[T ](\d{2})(?::(\d{2})(?::(\d{2})(?:[.,](\d{1,9}))?)?)?\s*(Z|[+-]\d{2}(?::?\d{2})?)?)?$",
    )
    .expect("valid ISO-8601 regex")
});

static ZONED_LOCAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(local|UTC|[A-Za-z_]+(?:/[A-Za-z0-9_+\-]+)+)\]\s+(.*)$")
        .expect("valid zoned-date regex")
});

static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}):(\d{2})$").expect("valid HH:mm regex"));

/// ISO-8601 text before a zone is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedIso {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl ParsedIso {
    /// Instant when offset-less text is read as UTC.
    pub fn to_utc(self) -> DateTime<Utc> {
        match self.offset {
            Some(offset) => offset_instant(self.local, offset),
            None => Utc.from_utc_datetime(&self.local),
        }
    }

    /// Instant when offset-less text is wall-clock time in `zone`.
    pub fn in_zone(self, zone: Tz) -> Option<DateTime<Utc>> {
        match self.offset {
            Some(offset) => Some(offset_instant(self.local, offset)),
            None => localize(zone, self.local),
        }
    }
}

fn offset_instant(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&(local - shift))
}

fn localize(zone: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(instant) => Some(instant.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

/// Strict ISO-8601 (extended format, at least `YYYY-MM`).
pub fn parse_iso_8601(text: &str) -> Option<ParsedIso> {
    let captures = ISO_8601.captures(text.trim())?;
    let number = |index: usize| -> Option<u32> {
        captures.get(index).map(|found| found.as_str().parse().ok()).unwrap_or(Some(0))
    };

    let year: i32 = captures.get(1)?.as_str().parse().ok()?;
    let month = number(2)?;
    let day = captures
        .get(3)
        .map_or(Some(1), |found| found.as_str().parse().ok())?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let nanos = match captures.get(7) {
        Some(fraction) => {
            let digits = fraction.as_str();
            let scale = 10u32.pow(9 - digits.len() as u32);
            digits.parse::<u32>().ok()? * scale
        }
        None => 0,
    };
    let time = NaiveTime::from_hms_nano_opt(number(4)?, number(5)?, number(6)?, nanos)?;

    let offset = match captures.get(8).map(|found| found.as_str()) {
        None => None,
        Some("Z") => Some(FixedOffset::east_opt(0)?),
        Some(raw) => Some(parse_offset(raw)?),
    };

    Some(ParsedIso {
        local: date.and_time(time),
        offset,
    })
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let sign = if raw.starts_with('-') { -1 } else { 1 };
    let digits: String = raw[1..].chars().filter(char::is_ascii_digit).collect();
    let hours: i32 = digits.get(0..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4).map_or(Some(0), |part| part.parse().ok())?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// `YYYYMMDD` integer dates, read as UTC midnight.
pub fn parse_integer_date(text: &str) -> Option<DateTime<Utc>> {
    if text.len() != 8 || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::parse_from_str(text, "%Y%m%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// Split `[Zone/Name] local text` into zone and text.
pub fn split_zoned(text: &str) -> Option<(&str, &str)> {
    let captures = ZONED_LOCAL.captures(text)?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

pub fn is_zoned_local(text: &str) -> bool {
    ZONED_LOCAL.is_match(text)
}

pub fn zone(name: &str) -> Option<Tz> {
    match name.parse::<Tz>() {
        Ok(zone) => Some(zone),
        Err(error) => {
            tracing::warn!(zone = name, "unknown time-zone: {error}");
            None
        }
    }
}

/// Date coercion: zone-qualified text uses its zone (`local` meaning the
/// context zone); plain ISO text without an offset is UTC.
pub fn coerce_date(text: &str, context: Option<&TestContext>) -> Option<DateTime<Utc>> {
    if let Some((zone_name, local_text)) = split_zoned(text) {
        let zone_name = match zone_name {
            "local" => context.map_or(DEFAULT_TIMEZONE, TestContext::timezone_name),
            other => other,
        };
        let tz = zone(zone_name)?;
        return parse_local(local_text, tz, context);
    }

    parse_iso_8601(text).map(ParsedIso::to_utc)
}

fn parse_local(text: &str, tz: Tz, context: Option<&TestContext>) -> Option<DateTime<Utc>> {
    if let Some(captures) = CLOCK_TIME.captures(text.trim()) {
        let hour = captures.get(1)?.as_str().parse().ok()?;
        let minute = captures.get(2)?.as_str().parse().ok()?;
        let today = context
            .map_or_else(Utc::now, TestContext::now)
            .with_timezone(&tz)
            .date_naive();
        return localize(tz, today.and_time(NaiveTime::from_hms_opt(hour, minute, 0)?));
    }

    parse_iso_8601(text)?.in_zone(tz)
}

/// Tri-state answer to "is this a date?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    /// An explicit date value.
    Instant(DateTime<Utc>),
    /// A string that parses as strict ISO-8601.
    IsoText(DateTime<Utc>),
    NotADate,
}

impl DateKind {
    pub fn instant(self) -> Option<DateTime<Utc>> {
        match self {
            DateKind::Instant(instant) | DateKind::IsoText(instant) => Some(instant),
            DateKind::NotADate => None,
        }
    }
}

pub fn classify_date(value: &Value) -> DateKind {
    match value {
        Value::Date(instant) => DateKind::Instant(*instant),
        Value::String(text) => parse_iso_8601(text)
            .map_or(DateKind::NotADate, |parsed| DateKind::IsoText(parsed.to_utc())),
        _ => DateKind::NotADate,
    }
}

/// Convert wall-clock text to an instant. UTC when `is_utc` or the text ends
/// with `Z`; otherwise the context timezone. `HH:mm` means today.
pub fn parse_time(context: &TestContext, text: &str, is_utc: bool) -> Option<DateTime<Utc>> {
    let tz = if is_utc || text.ends_with('Z') {
        Tz::UTC
    } else {
        zone(context.timezone_name())?
    };

    let instant = parse_local(text, tz, Some(context))?;
    tracing::trace!(input = text, zone = %tz, instant = %instant, "parsed time");
    Some(instant)
}

/// Absolute instant of an actual value: dates as-is, numbers as epoch
/// milliseconds, strings through [`parse_time`].
pub fn instant_of(context: &TestContext, actual: &Value) -> Option<DateTime<Utc>> {
    match actual {
        Value::Date(instant) => Some(*instant),
        Value::Number(millis) if millis.is_finite() => {
            DateTime::<Utc>::from_timestamp_millis(*millis as i64)
        }
        Value::String(text) => parse_time(context, text, false),
        _ => None,
    }
}

/// Compare an expected instant with an actual value. `Err` carries the
/// explanation to report.
pub fn times_equal(
    context: &TestContext,
    expected: DateTime<Utc>,
    actual: Option<&Value>,
    key: &str,
    explanation: &str,
) -> Result<(), String> {
    let Some(actual) = actual.filter(|value| value.is_truthy()) else {
        return Err(if explanation.is_empty() {
            format!("expected time at property \"{key}\"!")
        } else {
            explanation.to_owned()
        });
    };

    match instant_of(context, actual) {
        Some(instant) if instant == expected => Ok(()),
        Some(_) => Err(explanation.to_owned()),
        None => Err(format!(
            "{explanation} (could not read {} as a time, expected {})",
            actual,
            value::format_date(&expected)
        )),
    }
}

/// Local wall-clock time as an `HHmm` integer in the context timezone.
pub fn to_local_time_int(context: &TestContext, instant: DateTime<Utc>) -> Option<u32> {
    let tz = zone(context.timezone_name())?;
    let local = instant.with_timezone(&tz);
    Some(local.hour() * 100 + local.minute())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().expect("valid instant")
    }

    #[test]
    fn iso_without_offset_is_utc() {
        let parsed = parse_iso_8601("2017-01-01T10:00").expect("iso");
        assert_eq!(parsed.to_utc(), utc(2017, 1, 1, 10, 0));
        assert_eq!(
            parse_iso_8601("2017-01-01 10:00:00.250+02:00").expect("iso").to_utc(),
            utc(2017, 1, 1, 8, 0) + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn rejects_non_iso_text() {
        assert!(parse_iso_8601("hello").is_none());
        assert!(parse_iso_8601("2017").is_none());
        assert!(parse_iso_8601("2017-13-01").is_none());
        assert!(parse_iso_8601("01/02/2017").is_none());
    }

    #[test]
    fn zoned_local_time_uses_named_zone() {
        let instant = coerce_date("[Asia/Jerusalem] 2017-01-01 10:00", None).expect("zoned date");
        assert_eq!(instant, utc(2017, 1, 1, 8, 0));
    }

    #[test]
    fn local_marker_uses_context_zone() {
        let context = TestContext::with_timezone("America/New_York");
        let instant = coerce_date("[local] 2017-01-01 10:00", Some(&context)).expect("local date");
        assert_eq!(instant, utc(2017, 1, 1, 15, 0));
    }

    #[test]
    fn integer_dates_are_strict() {
        assert_eq!(parse_integer_date("20170102"), Some(utc(2017, 1, 2, 0, 0)));
        assert_eq!(parse_integer_date("20171302"), None);
        assert_eq!(parse_integer_date("2017010"), None);
    }

    #[test]
    fn parse_time_defaults_to_jerusalem() {
        let context = TestContext::new();
        assert_eq!(
            parse_time(&context, "2017-06-01T12:00", false),
            Some(utc(2017, 6, 1, 9, 0))
        );
        assert_eq!(
            parse_time(&context, "2017-06-01T12:00Z", false),
            Some(utc(2017, 6, 1, 12, 0))
        );
    }

    #[test]
    fn clock_time_uses_fake_today() {
        let mut context = TestContext::with_timezone("UTC");
        context.set_time(utc(2019, 2, 3, 23, 0));
        assert_eq!(parse_time(&context, "07:30", true), Some(utc(2019, 2, 3, 7, 30)));
    }

    #[test]
    fn classify_date_is_tri_state() {
        let instant = utc(2020, 1, 1, 0, 0);
        assert_eq!(classify_date(&Value::Date(instant)), DateKind::Instant(instant));
        assert_eq!(
            classify_date(&Value::from("2020-01-01")),
            DateKind::IsoText(instant)
        );
        assert_eq!(classify_date(&Value::from("soon")), DateKind::NotADate);
    }

    #[test]
    fn times_equal_explains_missing_actual() {
        let context = TestContext::new();
        let expected = utc(2020, 1, 1, 0, 0);
        assert_eq!(
            times_equal(&context, expected, None, "createdAt", ""),
            Err("expected time at property \"createdAt\"!".to_owned())
        );
        assert!(
            times_equal(
                &context,
                expected,
                Some(&Value::from("2020-01-01T00:00:00Z")),
                "createdAt",
                "x"
            )
            .is_ok()
        );
    }

    #[test]
    fn local_time_int_reads_context_zone() {
        let context = TestContext::with_timezone("Asia/Jerusalem");
        assert_eq!(to_local_time_int(&context, utc(2017, 1, 1, 8, 5)), Some(1005));
    }
}
