// ABOUTME: Sub-resource fetchers, one thin method per Garmin Connect endpoint
// ABOUTME: Each returns dynamic JSON normalized so absence is an empty value, not an error
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Every method here builds one URL/parameter set and delegates to the
//! request executor. Payload shapes are upstream-defined and loosely
//! specified, so everything stays [`serde_json::Value`]; endpoints documented
//! to return a list normalize `null`/`{}` bodies (including the executor's
//! 204/404 result) to `[]`.

use crate::client::GarminClient;
use crate::constants::endpoints;
use crate::constants::params::{
    ACTIVITY_PAGE_SIZE, GOALS_PAGE_LIMIT, GOALS_PAGE_START, GOALS_STATUS,
    NON_SLEEP_BUFFER_MINUTES, WORKOUT_PAGE_SIZE,
};
use crate::errors::GarminResult;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

impl GarminClient {
    /// Daily summary (steps, goals, calories, resting heart rate) for one date.
    ///
    /// # Errors
    ///
    /// [`crate::GarminError::Auth`] without a usable credential,
    /// [`crate::GarminError::Api`] when the upstream call fails.
    pub async fn user_summary(&self, date: NaiveDate) -> GarminResult<Value> {
        let display_name = self.display_name().await?;
        let path = format!("{}/{display_name}", endpoints::USER_SUMMARY);
        let params = [("calendarDate", date.to_string())];
        Ok(as_mapping(self.api_get(&path, &params).await?))
    }

    /// Weight and body-composition aggregates over a date range.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn body_composition(&self, start: NaiveDate, end: NaiveDate) -> GarminResult<Value> {
        let params = [("startDate", start.to_string()), ("endDate", end.to_string())];
        Ok(as_mapping(self.api_get(endpoints::BODY_COMPOSITION, &params).await?))
    }

    /// Per-day step records for a date range, one entry per day.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn daily_steps(&self, start: NaiveDate, end: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{start}/{end}", endpoints::DAILY_STEPS);
        Ok(as_list(self.api_get(&path, &[]).await?))
    }

    /// Recent activities, most recent first.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn activities(&self, start: u32, limit: u32) -> GarminResult<Value> {
        let params = [("start", start.to_string()), ("limit", limit.to_string())];
        Ok(as_list(self.api_get(endpoints::ACTIVITIES, &params).await?))
    }

    /// Activities whose local start date falls inside `[start, end]`.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn activities_by_date(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> GarminResult<Value> {
        let params = [
            ("startDate", start.to_string()),
            ("endDate", end.to_string()),
            ("start", "0".to_owned()),
            ("limit", ACTIVITY_PAGE_SIZE.to_string()),
        ];
        Ok(as_list(self.api_get(endpoints::ACTIVITIES, &params).await?))
    }

    /// Full detail record of one activity, GPS polyline included.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn activity_details(&self, activity_id: i64) -> GarminResult<Value> {
        let path = format!("{}/{activity_id}/details", endpoints::ACTIVITY);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// Catalogue of activity types known to the platform.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn activity_types(&self) -> GarminResult<Value> {
        Ok(as_list(self.api_get(endpoints::ACTIVITY_TYPES, &[]).await?))
    }

    /// Sleep detail for one night, with a buffer so wake phases at the edges
    /// are kept.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn sleep_data(&self, date: NaiveDate) -> GarminResult<Value> {
        let display_name = self.display_name().await?;
        let path = format!("{}/{display_name}", endpoints::SLEEP_DATA);
        let params = [
            ("date", date.to_string()),
            ("nonSleepBufferMinutes", NON_SLEEP_BUFFER_MINUTES.to_owned()),
        ];
        Ok(as_mapping(self.api_get(&path, &params).await?))
    }

    /// Stress detail for one day.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn stress_data(&self, date: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{date}", endpoints::DAILY_STRESS);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// Heart-rate-variability summary and readings for one day.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn hrv_data(&self, date: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{date}", endpoints::HRV);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// Body-battery daily reports for a date range.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn body_battery(&self, start: NaiveDate, end: NaiveDate) -> GarminResult<Value> {
        let params = [("startDate", start.to_string()), ("endDate", end.to_string())];
        Ok(as_list(self.api_get(endpoints::BODY_BATTERY, &params).await?))
    }

    /// Hydration log for one day.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn hydration(&self, date: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{date}", endpoints::HYDRATION);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// Respiration readings for one day.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn respiration(&self, date: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{date}", endpoints::RESPIRATION);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// Pulse-ox readings for one day.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn spo2(&self, date: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{date}", endpoints::SPO2);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// Training-readiness entries recorded for one day (may be several).
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn training_readiness(&self, date: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{date}", endpoints::TRAINING_READINESS);
        Ok(as_list(self.api_get(&path, &[]).await?))
    }

    /// First training-readiness entry of the day, i.e. the morning reading.
    ///
    /// There is no dedicated upstream endpoint for this; it is the head of
    /// [`GarminClient::training_readiness`].
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn morning_training_readiness(&self, date: NaiveDate) -> GarminResult<Value> {
        let readiness = self.training_readiness(date).await?;
        let first = readiness
            .as_array()
            .and_then(|entries| entries.first())
            .cloned();
        Ok(first.unwrap_or_else(empty_mapping))
    }

    /// Aggregated training status for one day.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn training_status(&self, date: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{date}", endpoints::TRAINING_STATUS);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// Endurance score as of one day.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn endurance_score(&self, date: NaiveDate) -> GarminResult<Value> {
        let params = [("calendarDate", date.to_string())];
        Ok(as_mapping(self.api_get(endpoints::ENDURANCE_SCORE, &params).await?))
    }

    /// Hill score as of one day.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn hill_score(&self, date: NaiveDate) -> GarminResult<Value> {
        let params = [("calendarDate", date.to_string())];
        Ok(as_mapping(self.api_get(endpoints::HILL_SCORE, &params).await?))
    }

    /// Fitness age as of one day.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn fitness_age(&self, date: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{date}", endpoints::FITNESS_AGE);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// Latest biometric readings; the lactate-threshold fields live here.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn lactate_threshold(&self) -> GarminResult<Value> {
        Ok(as_mapping(self.api_get(endpoints::LATEST_BIOMETRICS, &[]).await?))
    }

    /// Devices registered to the account.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn devices(&self) -> GarminResult<Value> {
        Ok(as_list(self.api_get(endpoints::DEVICES, &[]).await?))
    }

    /// Settings of one device, alarm list included.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn device_settings(&self, device_id: i64) -> GarminResult<Value> {
        let path = format!("{}/{device_id}", endpoints::DEVICE_SETTINGS);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// All alarms configured on any registered device, concatenated.
    ///
    /// Walks every device's settings sequentially; a device entry without an
    /// id is skipped, a failing settings fetch fails the whole operation.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn device_alarms(&self) -> GarminResult<Value> {
        let devices = self.devices().await?;
        let mut alarms = Vec::new();
        for device in devices.as_array().into_iter().flatten() {
            let Some(device_id) = device.get("deviceId").and_then(Value::as_i64) else {
                debug!("Skipping device entry without deviceId");
                continue;
            };
            let settings = self.device_settings(device_id).await?;
            if let Some(device_alarms) = settings.get("alarms").and_then(Value::as_array) {
                alarms.extend(device_alarms.iter().cloned());
            }
        }
        Ok(Value::Array(alarms))
    }

    /// Active goals of the user.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn goals(&self) -> GarminResult<Value> {
        let params = [
            ("status", GOALS_STATUS.to_owned()),
            ("start", GOALS_PAGE_START.to_owned()),
            ("limit", GOALS_PAGE_LIMIT.to_owned()),
        ];
        Ok(as_list(self.api_get(endpoints::GOALS, &params).await?))
    }

    /// Badges the user has earned.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn earned_badges(&self) -> GarminResult<Value> {
        Ok(as_list(self.api_get(endpoints::EARNED_BADGES, &[]).await?))
    }

    /// Gear registered to a profile.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn gear(&self, profile_id: i64) -> GarminResult<Value> {
        let params = [("userProfilePk", profile_id.to_string())];
        Ok(as_list(self.api_get(endpoints::GEAR, &params).await?))
    }

    /// Usage statistics of one gear item.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn gear_stats(&self, gear_uuid: &str) -> GarminResult<Value> {
        let path = format!("{}/{gear_uuid}", endpoints::GEAR_STATS);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// Default gear per activity type for a profile.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn gear_defaults(&self, profile_id: i64) -> GarminResult<Value> {
        let path = format!("{}/{profile_id}/activityTypes", endpoints::GEAR_USER);
        Ok(as_list(self.api_get(&path, &[]).await?))
    }

    /// Blood-pressure measurement summaries over a date range.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn blood_pressure(&self, start: NaiveDate, end: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{start}/{end}", endpoints::BLOOD_PRESSURE);
        let params = [("includeAll", "true".to_owned())];
        Ok(as_mapping(self.api_get(&path, &params).await?))
    }

    /// Menstrual-cycle day view for one date.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn menstrual_data(&self, date: NaiveDate) -> GarminResult<Value> {
        let path = format!("{}/{date}", endpoints::MENSTRUAL_DAYVIEW);
        Ok(as_mapping(self.api_get(&path, &[]).await?))
    }

    /// Saved workouts, paginated.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn workouts(&self, start: u32, limit: u32) -> GarminResult<Value> {
        let params = [("start", start.to_string()), ("limit", limit.to_string())];
        Ok(as_list(self.api_get(endpoints::WORKOUTS, &params).await?))
    }

    /// Saved workouts with the default page size.
    ///
    /// # Errors
    ///
    /// Standard executor failures ([`crate::GarminError`]).
    pub async fn recent_workouts(&self) -> GarminResult<Value> {
        self.workouts(0, WORKOUT_PAGE_SIZE).await
    }
}

/// Object endpoints: a `null` body becomes `{}`.
fn as_mapping(value: Value) -> Value {
    if value.is_null() {
        empty_mapping()
    } else {
        value
    }
}

/// List endpoints: `null` and `{}` bodies become `[]`.
fn as_list(value: Value) -> Value {
    match value {
        Value::Null => Value::Array(Vec::new()),
        Value::Object(map) if map.is_empty() => Value::Array(Vec::new()),
        other => other,
    }
}

fn empty_mapping() -> Value {
    Value::Object(serde_json::Map::new())
}
