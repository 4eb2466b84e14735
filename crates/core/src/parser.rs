use anyhow::{anyhow, Context, Result};
use chrono::{prelude::*, Duration};
use once_cell::sync::Lazy;
use regex::Regex;

/// Hour of day assigned to deadlines given as a bare date.
const DEFAULT_DEADLINE_HOUR: u32 = 9;

static HOURS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<value>\d+(?:\.\d+)?|\.\d+)\s*(?P<unit>h|hr|hrs|hours?|m|min|mins|minutes?)?$")
        .expect("valid regex")
});

static RELATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+(?P<value>\d+)(?P<unit>[dw])$").expect("valid regex"));

/// Parse a study-time estimate into hours. Accepts `1.5`, `2h`, `90m`, `45 min`.
pub fn parse_study_hours(spec: &str) -> Result<f64> {
    let lower = spec.trim().to_ascii_lowercase();
    let caps = HOURS_RE
        .captures(&lower)
        .ok_or_else(|| anyhow!("Unrecognized study time '{}'. Try 1.5, 2h or 90m", spec.trim()))?;
    let value: f64 = caps["value"]
        .parse()
        .with_context(|| format!("Invalid number in study time '{}'", spec.trim()))?;
    let hours = match caps.name("unit").map(|unit| unit.as_str()) {
        Some(unit) if unit.starts_with('m') => value / 60.0,
        _ => value,
    };
    Ok(hours)
}

/// Resolve a deadline specification against an explicit `now`.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD`, `today`, `tomorrow`, `+Nd`,
/// `+Nw` and weekday names. Date-only forms land at 09:00 in `now`'s zone.
pub fn parse_deadline<Tz: TimeZone>(spec: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Deadline cannot be empty"));
    }

    let lower = trimmed.to_ascii_lowercase();
    let today = now.date_naive();

    match lower.as_str() {
        "today" => return at_default_hour(today, now),
        "tomorrow" => return at_default_hour(today + Duration::days(1), now),
        _ => {}
    }

    if lower.starts_with('+') {
        return parse_relative_spec(&lower, now);
    }

    if let Some(weekday) = parse_weekday(&lower) {
        let mut days_ahead = (weekday.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
        if days_ahead == 0 {
            days_ahead = 7;
        }
        return at_default_hour(today + Duration::days(days_ahead), now);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return at_default_hour(date, now);
    }

    Err(anyhow!(
        "Unrecognized deadline '{}'. Try YYYY-MM-DD, today, tomorrow, +3d, mon",
        trimmed
    ))
}

fn at_default_hour<Tz: TimeZone>(date: NaiveDate, now: &DateTime<Tz>) -> Result<DateTime<Utc>> {
    let naive = date
        .and_hms_opt(DEFAULT_DEADLINE_HOUR, 0, 0)
        .ok_or_else(|| anyhow!("Invalid time of day for {}", date))?;
    now.timezone()
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Could not resolve local time for {}", date))
}

fn parse_relative_spec<Tz: TimeZone>(spec: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>> {
    let caps = RELATIVE_RE.captures(spec).ok_or_else(|| {
        anyhow!(
            "Unsupported relative deadline '{}'. Use +Nd or +Nw.",
            spec
        )
    })?;
    let value: i64 = caps["value"]
        .parse()
        .with_context(|| format!("Relative deadline '{}' is out of range", spec))?;
    let days = match &caps["unit"] {
        "w" => value.checked_mul(7),
        _ => Some(value),
    };
    let date = days
        .and_then(Duration::try_days)
        .and_then(|offset| now.date_naive().checked_add_signed(offset))
        .ok_or_else(|| anyhow!("Relative deadline '{}' is out of range", spec))?;
    at_default_hour(date, now)
}

fn parse_weekday(label: &str) -> Option<Weekday> {
    match label {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
