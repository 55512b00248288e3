// ABOUTME: Tests for the device-alarm scheduler
// ABOUTME: Pins a fixed local "now" and checks occurrence dates, rollover, and ordering
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{NaiveDate, NaiveDateTime};
use garmin_connect::alarms::{next_occurrences, next_occurrences_after};
use serde_json::json;

/// Monday, 2023-06-05, 08:00 local.
fn monday_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 6, 5)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

#[test]
fn test_once_alarm_already_passed_rolls_to_tomorrow() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmTime": 420, "alarmDays": ["ONCE"]}
    ]);
    let occurrences = next_occurrences_after(&alarms, monday_morning()).unwrap();
    assert_eq!(occurrences, vec!["2023-06-06T07:00:00".to_owned()]);
}

#[test]
fn test_once_alarm_still_ahead_fires_today() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmTime": 540, "alarmDays": ["ONCE"]}
    ]);
    let occurrences = next_occurrences_after(&alarms, monday_morning()).unwrap();
    assert_eq!(occurrences, vec!["2023-06-05T09:00:00".to_owned()]);
}

#[test]
fn test_once_alarm_exactly_now_is_not_today() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmTime": 480, "alarmDays": ["ONCE"]}
    ]);
    let occurrences = next_occurrences_after(&alarms, monday_morning()).unwrap();
    assert_eq!(occurrences, vec!["2023-06-06T08:00:00".to_owned()]);
}

#[test]
fn test_weekday_alarm_passed_today_waits_a_week() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmTime": 360, "alarmDays": ["MONDAY"]}
    ]);
    let occurrences = next_occurrences_after(&alarms, monday_morning()).unwrap();
    assert_eq!(occurrences, vec!["2023-06-12T06:00:00".to_owned()]);
}

#[test]
fn test_weekday_alarm_later_today_fires_today() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmTime": 540, "alarmDays": ["MONDAY"]}
    ]);
    let occurrences = next_occurrences_after(&alarms, monday_morning()).unwrap();
    assert_eq!(occurrences, vec!["2023-06-05T09:00:00".to_owned()]);
}

#[test]
fn test_other_weekdays_land_on_their_next_date() {
    let tuesday = json!([
        {"alarmMode": "ON", "alarmTime": 420, "alarmDays": ["TUESDAY"]}
    ]);
    assert_eq!(
        next_occurrences_after(&tuesday, monday_morning()).unwrap(),
        vec!["2023-06-06T07:00:00".to_owned()]
    );

    let sunday = json!([
        {"alarmMode": "ON", "alarmTime": 480, "alarmDays": ["SUNDAY"]}
    ]);
    assert_eq!(
        next_occurrences_after(&sunday, monday_morning()).unwrap(),
        vec!["2023-06-11T08:00:00".to_owned()]
    );
}

#[test]
fn test_occurrences_are_sorted_regardless_of_input_order() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmTime": 420, "alarmDays": ["SATURDAY"]},
        {"alarmMode": "ON", "alarmTime": 540, "alarmDays": ["ONCE"]},
        {"alarmMode": "ON", "alarmTime": 360, "alarmDays": ["WEDNESDAY"]},
    ]);
    let occurrences = next_occurrences_after(&alarms, monday_morning()).unwrap();
    assert_eq!(
        occurrences,
        vec![
            "2023-06-05T09:00:00".to_owned(),
            "2023-06-07T06:00:00".to_owned(),
            "2023-06-10T07:00:00".to_owned(),
        ]
    );
}

#[test]
fn test_one_alarm_with_two_days_yields_two_occurrences() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmTime": 390, "alarmDays": ["MONDAY", "TUESDAY"]}
    ]);
    let occurrences = next_occurrences_after(&alarms, monday_morning()).unwrap();
    assert_eq!(
        occurrences,
        vec![
            "2023-06-06T06:30:00".to_owned(),
            "2023-06-12T06:30:00".to_owned(),
        ]
    );
}

#[test]
fn test_disabled_alarms_are_ignored() {
    let alarms = json!([
        {"alarmMode": "OFF", "alarmTime": 420, "alarmDays": ["ONCE"]},
        {"alarmTime": 420, "alarmDays": ["ONCE"]},
    ]);
    assert!(next_occurrences_after(&alarms, monday_morning()).is_none());
}

#[test]
fn test_unknown_day_tokens_are_skipped_not_fatal() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmTime": 420, "alarmDays": ["SOMEDAY", "TUESDAY"]}
    ]);
    let occurrences = next_occurrences_after(&alarms, monday_morning()).unwrap();
    assert_eq!(occurrences, vec!["2023-06-06T07:00:00".to_owned()]);
}

#[test]
fn test_malformed_alarm_entries_are_skipped() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmDays": ["ONCE"]},
        {"alarmMode": "ON", "alarmTime": 1441, "alarmDays": ["ONCE"]},
        {"alarmMode": "ON", "alarmTime": -5, "alarmDays": ["ONCE"]},
        {"alarmMode": "ON", "alarmTime": 420},
    ]);
    assert!(next_occurrences_after(&alarms, monday_morning()).is_none());
}

#[test]
fn test_empty_or_non_list_input_schedules_nothing() {
    assert!(next_occurrences_after(&json!([]), monday_morning()).is_none());
    assert!(next_occurrences_after(&json!({}), monday_morning()).is_none());
    assert!(next_occurrences_after(&json!(null), monday_morning()).is_none());
}

#[test]
fn test_wall_clock_wrapper_rejects_bad_or_missing_timezones() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmTime": 420, "alarmDays": ["ONCE"]}
    ]);
    assert!(next_occurrences(&alarms, Some("Atlantis/Lost")).is_none());
    assert!(next_occurrences(&alarms, None).is_none());
}

#[test]
fn test_wall_clock_wrapper_produces_a_future_once_occurrence() {
    let alarms = json!([
        {"alarmMode": "ON", "alarmTime": 425, "alarmDays": ["ONCE"]}
    ]);
    let occurrences = next_occurrences(&alarms, Some("Europe/Berlin")).unwrap();
    assert_eq!(occurrences.len(), 1);
    assert!(occurrences[0].ends_with("T07:05:00"));
}
