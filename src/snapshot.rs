// ABOUTME: Aggregation engine assembling the flat daily wellness snapshot
// ABOUTME: Sequential fan-out over every sub-resource with per-source failure isolation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! One call to [`GarminClient::build_snapshot`] fans out to every
//! sub-resource fetcher, strictly one after another, and folds the results
//! into a single flat mapping. A failing source is logged and dropped from
//! the snapshot; only credential failures abort the run. Flat merges follow a
//! fixed precedence so colliding keys resolve the same way every time.

use crate::alarms;
use crate::client::GarminClient;
use crate::constants::gamification::LEVEL_THRESHOLDS;
use crate::constants::windows::{
    ACTIVITY_LOOKAHEAD_DAYS, ACTIVITY_LOOKBACK_DAYS, BLOOD_PRESSURE_DAYS, STEP_HISTORY_DAYS,
};
use crate::errors::GarminResult;
use chrono::{Duration, NaiveDate};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Flat daily snapshot assembled from every sub-resource.
pub type Snapshot = Map<String, Value>;

impl GarminClient {
    /// Build the aggregated wellness snapshot for one calendar date.
    ///
    /// Fetches every sub-resource sequentially, applies the midnight fallback
    /// to the daily summary, computes the derived fields (weekly step
    /// statistics, gamification level, latest blood pressure, sleep score,
    /// next alarms), and merges everything into one flat mapping. Individual
    /// upstream failures cost only their own group; the snapshot is always
    /// best-effort.
    ///
    /// `timezone` is the IANA zone used for alarm scheduling; without it the
    /// `nextAlarm` key is omitted.
    ///
    /// # Errors
    ///
    /// Only [`crate::GarminError::Auth`], when no usable credential exists
    /// before or after a refresh. Per-source API failures never surface here.
    pub async fn build_snapshot(
        &self,
        target_date: NaiveDate,
        timezone: Option<&str>,
    ) -> GarminResult<Snapshot> {
        debug!("Building wellness snapshot for {target_date}");

        let summary = self.summary_with_midnight_fallback(target_date).await?;

        let body_composition = isolate(
            "body composition",
            self.body_composition(target_date, target_date).await,
        )?;

        let step_start = target_date - Duration::days(STEP_HISTORY_DAYS);
        let step_end = target_date - Duration::days(1);
        let steps = isolate("daily steps", self.daily_steps(step_start, step_end).await)?;

        let activity_start = target_date - Duration::days(ACTIVITY_LOOKBACK_DAYS);
        let activity_end = target_date + Duration::days(ACTIVITY_LOOKAHEAD_DAYS);
        let activities = isolate(
            "activities",
            self.activities_by_date(activity_start, activity_end).await,
        )?;
        let last_activity = self.enrich_last_activity(activities.as_ref()).await?;

        let workouts = isolate("workouts", self.recent_workouts().await)?;
        let sleep = isolate("sleep", self.sleep_data(target_date).await)?;
        let stress = isolate("stress", self.stress_data(target_date).await)?;
        let hrv = isolate("hrv", self.hrv_data(target_date).await)?;
        let body_battery = isolate(
            "body battery",
            self.body_battery(target_date, target_date).await,
        )?;
        let hydration = isolate("hydration", self.hydration(target_date).await)?;
        let respiration = isolate("respiration", self.respiration(target_date).await)?;
        let spo2 = isolate("spo2", self.spo2(target_date).await)?;

        let readiness = isolate(
            "training readiness",
            self.morning_training_readiness(target_date).await,
        )?;
        let training_status = isolate("training status", self.training_status(target_date).await)?;
        let endurance_score = isolate("endurance score", self.endurance_score(target_date).await)?;
        let hill_score = isolate("hill score", self.hill_score(target_date).await)?;
        let fitness_age = isolate("fitness age", self.fitness_age(target_date).await)?;
        let lactate_threshold = isolate("lactate threshold", self.lactate_threshold().await)?;

        let goals = isolate("goals", self.goals().await)?;
        let badges = isolate("badges", self.earned_badges().await)?;
        let menstrual = isolate("menstrual data", self.menstrual_data(target_date).await)?;

        // Gear needs the numeric profile id; a failing profile fetch drops
        // the gear groups, not the run.
        let profile_id = isolate("profile id", self.profile_id().await)?;
        let gear = match profile_id {
            Some(id) => isolate("gear", self.gear(id).await)?,
            None => None,
        };
        let gear_stats = match gear.as_ref().and_then(Value::as_array) {
            Some(items) => isolate("gear stats", self.collect_gear_stats(items).await)?,
            None => None,
        };
        let gear_defaults = match profile_id {
            Some(id) => isolate("gear defaults", self.gear_defaults(id).await)?,
            None => None,
        };

        let bp_start = target_date - Duration::days(BLOOD_PRESSURE_DAYS);
        let blood_pressure = isolate(
            "blood pressure",
            self.blood_pressure(bp_start, target_date).await,
        )?;

        let device_alarms = isolate("device alarms", self.device_alarms().await)?;
        let next_alarm = device_alarms
            .as_ref()
            .and_then(|alarm_list| alarms::next_occurrences(alarm_list, timezone));

        let mut snapshot = Snapshot::new();

        // Flat merges in fixed precedence order: later groups overwrite
        // colliding keys from earlier ones.
        let blood_pressure_fields = blood_pressure.as_ref().and_then(latest_blood_pressure);
        let groups: [(&str, Option<&Value>); 9] = [
            ("summary", summary.as_ref()),
            (
                "bodyComposition",
                body_composition
                    .as_ref()
                    .and_then(|body| body.get("totalAverage")),
            ),
            ("stress", stress.as_ref()),
            ("bodyBattery", body_battery.as_ref().and_then(first_entry)),
            ("hydration", hydration.as_ref()),
            ("fitnessAge", fitness_age.as_ref()),
            ("respiration", respiration.as_ref()),
            ("spo2", spo2.as_ref()),
            ("bloodPressure", blood_pressure_fields.as_ref()),
        ];
        merge_groups(&mut snapshot, &groups);

        if let Some(stats) = steps.as_ref().and_then(step_statistics) {
            snapshot.insert("yesterdaySteps".to_owned(), stats.yesterday_steps);
            snapshot.insert("yesterdayDistance".to_owned(), stats.yesterday_distance);
            snapshot.insert("weeklyStepAvg".to_owned(), Value::from(stats.weekly_step_avg));
            snapshot.insert(
                "weeklyDistanceAvg".to_owned(),
                Value::from(stats.weekly_distance_avg),
            );
        }

        if let Some((points, level)) = badges.as_ref().and_then(gamification_totals) {
            snapshot.insert("userPoints".to_owned(), Value::from(points));
            snapshot.insert("userLevel".to_owned(), Value::from(level));
        }

        let sleep_score = sleep.as_ref().and_then(extract_sleep_score);
        let hrv_status = hrv.as_ref().and_then(|value| value.get("hrvSummary")).cloned();

        // Non-mergeable groups keep their own keys; a failed source
        // contributes nothing at all.
        insert_group(&mut snapshot, "lastActivities", activities);
        insert_group(&mut snapshot, "lastActivity", last_activity);
        insert_group(&mut snapshot, "workouts", workouts);
        insert_group(&mut snapshot, "sleepData", sleep);
        insert_group(&mut snapshot, "sleepScore", sleep_score);
        insert_group(&mut snapshot, "hrvStatus", hrv_status);
        insert_group(&mut snapshot, "trainingReadiness", readiness);
        insert_group(&mut snapshot, "trainingStatus", training_status);
        insert_group(&mut snapshot, "enduranceScore", endurance_score);
        insert_group(&mut snapshot, "hillScore", hill_score);
        insert_group(&mut snapshot, "lactateThreshold", lactate_threshold);
        insert_group(&mut snapshot, "goals", goals);
        insert_group(&mut snapshot, "badges", badges);
        insert_group(&mut snapshot, "menstrualData", menstrual);
        insert_group(&mut snapshot, "gear", gear);
        insert_group(&mut snapshot, "gearStats", gear_stats);
        insert_group(&mut snapshot, "gearDefaults", gear_defaults);
        if let Some(next_alarm) = next_alarm {
            snapshot.insert("nextAlarm".to_owned(), json!(next_alarm));
        }

        debug!("Snapshot for {target_date} holds {} keys", snapshot.len());
        Ok(snapshot)
    }

    /// Daily summary with the midnight fallback applied.
    ///
    /// Right after local midnight the upstream summary for the new day often
    /// exists but is unpopulated (no `dailyStepGoal`). In that case
    /// yesterday's summary is fetched and, when it is populated, fully
    /// replaces the unpopulated one.
    async fn summary_with_midnight_fallback(
        &self,
        target_date: NaiveDate,
    ) -> GarminResult<Option<Value>> {
        let today = isolate("user summary", self.user_summary(target_date).await)?;
        if has_step_goal(today.as_ref()) {
            return Ok(today);
        }
        debug!("Daily summary for {target_date} not populated - trying previous day");
        let yesterday = isolate(
            "user summary fallback",
            self.user_summary(target_date - Duration::days(1)).await,
        )?;
        if has_step_goal(yesterday.as_ref()) {
            return Ok(yesterday);
        }
        Ok(today)
    }

    /// Most recent activity with its polyline folded in when available.
    ///
    /// A failing detail fetch is tolerated; the activity is then kept without
    /// a `polyline` key.
    async fn enrich_last_activity(
        &self,
        activities: Option<&Value>,
    ) -> GarminResult<Option<Value>> {
        let Some(first) = activities
            .and_then(Value::as_array)
            .and_then(|entries| entries.first())
        else {
            return Ok(None);
        };
        let mut activity = first.clone();

        if is_truthy(activity.get("hasPolyline")) {
            if let Some(id) = activity.get("activityId").and_then(Value::as_i64) {
                let details = isolate("activity details", self.activity_details(id).await)?;
                let polyline = details.as_ref().and_then(extract_polyline);
                if let (Some(polyline), Some(fields)) = (polyline, activity.as_object_mut()) {
                    fields.insert("polyline".to_owned(), polyline);
                }
            }
        }
        Ok(Some(activity))
    }

    /// Usage statistics for every gear item carrying a uuid.
    async fn collect_gear_stats(&self, items: &[Value]) -> GarminResult<Value> {
        let mut stats = Vec::new();
        for item in items {
            let Some(uuid) = item.get("uuid").and_then(Value::as_str) else {
                continue;
            };
            stats.push(self.gear_stats(uuid).await?);
        }
        Ok(Value::Array(stats))
    }
}

/// Per-source isolation: API failures become an absent source, credential
/// failures abort the whole run.
fn isolate<T>(source: &str, result: GarminResult<T>) -> GarminResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_auth() => Err(err),
        Err(err) => {
            warn!("Skipping {source}: {err}");
            Ok(None)
        }
    }
}

/// Shallow-merge each group's object fields into the snapshot, in order.
fn merge_groups(snapshot: &mut Snapshot, groups: &[(&str, Option<&Value>)]) {
    for (name, value) in groups.iter().copied() {
        let Some(fields) = value.and_then(Value::as_object) else {
            debug!("No {name} fields to merge");
            continue;
        };
        for (key, field) in fields {
            snapshot.insert(key.clone(), field.clone());
        }
    }
}

fn insert_group(snapshot: &mut Snapshot, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        snapshot.insert(key.to_owned(), value);
    }
}

/// Whether a summary payload is populated enough to stand on its own.
fn has_step_goal(summary: Option<&Value>) -> bool {
    summary
        .and_then(|value| value.get("dailyStepGoal"))
        .is_some_and(|goal| !goal.is_null())
}

fn first_entry(value: &Value) -> Option<&Value> {
    value.as_array().and_then(|entries| entries.first())
}

fn is_truthy(value: Option<&Value>) -> bool {
    value.is_some_and(|value| match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(entries) => !entries.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    })
}

struct StepStats {
    yesterday_steps: Value,
    yesterday_distance: Value,
    weekly_step_avg: i64,
    weekly_distance_avg: i64,
}

/// Weekly step statistics over the per-day records, last record = yesterday.
fn step_statistics(records: &Value) -> Option<StepStats> {
    let records = records.as_array()?;
    let last = records.last()?;
    let count = records.len() as f64;
    let step_sum: f64 = records
        .iter()
        .filter_map(|record| record.get("totalSteps").and_then(Value::as_f64))
        .sum();
    let distance_sum: f64 = records
        .iter()
        .filter_map(|record| record.get("totalDistance").and_then(Value::as_f64))
        .sum();
    Some(StepStats {
        yesterday_steps: last.get("totalSteps").cloned().unwrap_or(Value::Null),
        yesterday_distance: last.get("totalDistance").cloned().unwrap_or(Value::Null),
        weekly_step_avg: (step_sum / count).round() as i64,
        weekly_distance_avg: (distance_sum / count).round() as i64,
    })
}

/// Point total and level over the earned-badge list.
///
/// Badge points count once per time the badge was earned; a missing earned
/// count means once.
fn gamification_totals(badges: &Value) -> Option<(u64, u64)> {
    let badges = badges.as_array()?;
    let points: u64 = badges
        .iter()
        .map(|badge| {
            let points = badge.get("badgePoints").and_then(Value::as_u64).unwrap_or(0);
            let earned = badge
                .get("badgeEarnedNumber")
                .and_then(Value::as_u64)
                .unwrap_or(1);
            points.saturating_mul(earned)
        })
        .sum();
    Some((points, level_for_points(points)))
}

/// Highest level whose threshold does not exceed the point total.
fn level_for_points(points: u64) -> u64 {
    LEVEL_THRESHOLDS
        .iter()
        .enumerate()
        .rev()
        .find(|(_, threshold)| **threshold <= points)
        .map_or(0, |(level, _)| level as u64)
}

/// Derived flat fields for the most recent blood-pressure measurement.
///
/// Flattens all measurement summaries and picks the entry with the greatest
/// local-timestamp string. The string compare is long-standing client
/// behavior and kept as-is.
fn latest_blood_pressure(range: &Value) -> Option<Value> {
    let summaries = range.get("measurementSummaries")?.as_array()?;
    let (timestamp, measurement) = summaries
        .iter()
        .filter_map(|summary| summary.get("measurements").and_then(Value::as_array))
        .flatten()
        .filter_map(|measurement| {
            measurement
                .get("measurementTimestampLocal")
                .and_then(Value::as_str)
                .map(|timestamp| (timestamp, measurement))
        })
        .max_by(|(a, _), (b, _)| a.cmp(b))?;

    let mut fields = Map::new();
    fields.insert(
        "bloodPressureSystolic".to_owned(),
        measurement.get("systolic").cloned().unwrap_or(Value::Null),
    );
    fields.insert(
        "bloodPressureDiastolic".to_owned(),
        measurement.get("diastolic").cloned().unwrap_or(Value::Null),
    );
    fields.insert(
        "bloodPressurePulse".to_owned(),
        measurement.get("pulse").cloned().unwrap_or(Value::Null),
    );
    fields.insert(
        "bloodPressureTimestamp".to_owned(),
        Value::String(timestamp.to_owned()),
    );
    Some(Value::Object(fields))
}

/// Simplified polyline from an activity detail payload: the coordinate pairs
/// only, entries missing either coordinate dropped.
fn extract_polyline(details: &Value) -> Option<Value> {
    let points = details.get("geoPolylineDTO")?.get("polyline")?.as_array()?;
    let pairs: Vec<Value> = points
        .iter()
        .filter_map(|point| {
            let lat = point.get("lat")?;
            let lon = point.get("lon")?;
            if lat.is_null() || lon.is_null() {
                return None;
            }
            Some(json!({"lat": lat, "lon": lon}))
        })
        .collect();
    Some(Value::Array(pairs))
}

/// Overall sleep score nested deep in the sleep payload.
fn extract_sleep_score(sleep: &Value) -> Option<Value> {
    let score = sleep
        .get("dailySleepDTO")?
        .get("sleepScores")?
        .get("overall")?
        .get("value")?;
    if score.is_null() {
        return None;
    }
    Some(score.clone())
}
