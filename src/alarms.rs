// ABOUTME: Next-occurrence scheduler for device alarms
// ABOUTME: Pure local-time arithmetic over raw alarm JSON; knows nothing about the network
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Alarms come off the devices as minutes-from-midnight offsets plus day
//! tokens (`ONCE` or uppercase weekday names). The scheduler turns them into
//! concrete local timestamps strictly in the future, one per day token per
//! enabled alarm.

use chrono::{Datelike, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, warn};

/// Minutes-from-midnight offsets outside one day are junk and skipped.
const MINUTES_PER_DAY: i64 = 24 * 60;

/// Next local occurrence of every enabled alarm, sorted ascending.
///
/// `alarms` is the raw device-alarm list, `timezone` an IANA name such as
/// `Europe/Berlin`. Returns `None` when the list is empty or not a list, the
/// timezone is absent or unknown, or no alarm yields an occurrence. Timestamps
/// are ISO-8601 local strings without an offset suffix.
#[must_use]
pub fn next_occurrences(alarms: &Value, timezone: Option<&str>) -> Option<Vec<String>> {
    let entries = alarms.as_array()?;
    if entries.is_empty() {
        return None;
    }
    let tz_name = timezone?;
    let Ok(tz) = tz_name.parse::<Tz>() else {
        warn!("Unknown timezone {tz_name} - skipping alarm scheduling");
        return None;
    };
    let now = Utc::now().with_timezone(&tz).naive_local();
    next_occurrences_after(alarms, now)
}

/// Same computation against an explicit local "now".
///
/// This is the deterministic core of [`next_occurrences`]; the wrapper only
/// derives "now" from the wall clock and a timezone.
#[must_use]
pub fn next_occurrences_after(alarms: &Value, now: NaiveDateTime) -> Option<Vec<String>> {
    let entries = alarms.as_array()?;
    let mut occurrences = Vec::new();
    for alarm in entries {
        if alarm.get("alarmMode").and_then(Value::as_str) != Some("ON") {
            continue;
        }
        let Some(minutes) = alarm.get("alarmTime").and_then(Value::as_i64) else {
            debug!("Skipping alarm without a usable alarmTime");
            continue;
        };
        if !(0..MINUTES_PER_DAY).contains(&minutes) {
            debug!("Skipping alarm with out-of-range alarmTime {minutes}");
            continue;
        }
        let Some(days) = alarm.get("alarmDays").and_then(Value::as_array) else {
            debug!("Skipping alarm without alarmDays");
            continue;
        };
        for day in days {
            let Some(token) = day.as_str() else {
                continue;
            };
            if let Some(occurrence) = occurrence_for(token, minutes, now) {
                occurrences.push(occurrence.format("%Y-%m-%dT%H:%M:%S").to_string());
            }
        }
    }
    if occurrences.is_empty() {
        return None;
    }
    occurrences.sort_unstable();
    Some(occurrences)
}

/// Next occurrence of one day token, or `None` for unknown tokens.
fn occurrence_for(token: &str, minutes: i64, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let midnight = now.date().and_hms_opt(0, 0, 0)?;
    let at_offset = midnight + Duration::minutes(minutes);

    if token == "ONCE" {
        // Today if still ahead, otherwise tomorrow.
        if at_offset > now {
            return Some(at_offset);
        }
        return Some(at_offset + Duration::days(1));
    }

    let Some(target) = day_number(token) else {
        warn!("Skipping unknown alarm day token {token}");
        return None;
    };
    let today = i64::from(now.date().weekday().number_from_monday());
    let mut delta = (target - today).rem_euclid(7);
    if delta == 0 && at_offset <= now {
        // Today's slot already passed; same weekday next week.
        delta = 7;
    }
    Some(at_offset + Duration::days(delta))
}

/// Weekday tokens as ISO weekday numbers (Monday = 1 .. Sunday = 7).
fn day_number(token: &str) -> Option<i64> {
    match token {
        "MONDAY" => Some(1),
        "TUESDAY" => Some(2),
        "WEDNESDAY" => Some(3),
        "THURSDAY" => Some(4),
        "FRIDAY" => Some(5),
        "SATURDAY" => Some(6),
        "SUNDAY" => Some(7),
        _ => None,
    }
}
