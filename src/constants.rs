// ABOUTME: Central constants for the Garmin Connect client
// ABOUTME: API origins, endpoint paths, fixed headers, retry tuning, and derived-field tables
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! All magic values live here so the client, fetchers, and aggregation engine
//! share one table. Endpoint paths are relative to the API origin and joined
//! without further encoding.

/// API origins and region handling
pub mod api {
    /// Production Garmin Connect API origin.
    pub const BASE_URL: &str = "https://connectapi.garmin.com";

    /// Domain segment used by global accounts.
    pub const GLOBAL_DOMAIN: &str = "garmin.com";

    /// Domain segment substituted for mainland-China accounts.
    pub const CHINA_DOMAIN: &str = "garmin.cn";
}

/// Fixed identification headers sent with every request
pub mod headers {
    /// User-Agent the Connect API expects (mobile app identity).
    pub const USER_AGENT: &str = "GCM-iOS-5.7.2.1";

    /// Accept header sent with every request.
    pub const ACCEPT: &str = "application/json";
}

/// Endpoint paths under the API origin
pub mod endpoints {
    /// Social profile of the signed-in user (display name, profile id).
    pub const USER_PROFILE: &str = "/userprofile-service/socialProfile";

    /// Daily user summary; takes `/{displayName}?calendarDate=`.
    pub const USER_SUMMARY: &str = "/usersummary-service/usersummary/daily";

    /// Weight and body composition over a date range.
    pub const BODY_COMPOSITION: &str = "/weight-service/weight/dateRange";

    /// Per-day step records; takes `/{start}/{end}`.
    pub const DAILY_STEPS: &str = "/usersummary-service/stats/steps/daily";

    /// Activity search (most recent first).
    pub const ACTIVITIES: &str = "/activitylist-service/activities/search/activities";

    /// Single-activity resources; takes `/{activityId}/details`.
    pub const ACTIVITY: &str = "/activity-service/activity";

    /// Catalogue of known activity types.
    pub const ACTIVITY_TYPES: &str = "/activity-service/activity/activityTypes";

    /// Daily sleep data; takes `/{displayName}?date=`.
    pub const SLEEP_DATA: &str = "/wellness-service/wellness/dailySleepData";

    /// Daily stress detail; takes `/{date}`.
    pub const DAILY_STRESS: &str = "/wellness-service/wellness/dailyStress";

    /// Heart-rate variability; takes `/{date}`.
    pub const HRV: &str = "/hrv-service/hrv";

    /// Body battery daily reports over a date range.
    pub const BODY_BATTERY: &str = "/wellness-service/wellness/bodyBattery/reports/daily";

    /// Hydration log; takes `/{date}`.
    pub const HYDRATION: &str = "/usersummary-service/usersummary/hydration/allData";

    /// Daily respiration; takes `/{date}`.
    pub const RESPIRATION: &str = "/wellness-service/wellness/daily/respiration";

    /// Daily pulse-ox; takes `/{date}`.
    pub const SPO2: &str = "/wellness-service/wellness/daily/spo2";

    /// Training readiness entries; takes `/{date}`.
    pub const TRAINING_READINESS: &str = "/metrics-service/metrics/trainingreadiness";

    /// Aggregated training status; takes `/{date}`.
    pub const TRAINING_STATUS: &str = "/metrics-service/metrics/trainingstatus/aggregated";

    /// Endurance score; takes `?calendarDate=`.
    pub const ENDURANCE_SCORE: &str = "/metrics-service/metrics/endurancescore";

    /// Hill score; takes `?calendarDate=`.
    pub const HILL_SCORE: &str = "/metrics-service/metrics/hillscore";

    /// Fitness age; takes `/{date}`.
    pub const FITNESS_AGE: &str = "/fitnessage-service/fitnessage";

    /// Latest biometrics (carries the lactate-threshold fields).
    pub const LATEST_BIOMETRICS: &str = "/biometric-service/biometric/latestBiometrics";

    /// Registered devices of the account.
    pub const DEVICES: &str = "/device-service/deviceregistration/devices";

    /// Per-device settings (alarm lists live here); takes `/{deviceId}`.
    pub const DEVICE_SETTINGS: &str = "/device-service/deviceservice/device-info/settings";

    /// Goal list; filtered by `?status=`.
    pub const GOALS: &str = "/goal-service/goal/goals";

    /// Badges earned by the user.
    pub const EARNED_BADGES: &str = "/badge-service/badge/earned";

    /// Gear registered to a profile; takes `?userProfilePk=`.
    pub const GEAR: &str = "/gear-service/gear/filterGear";

    /// Usage statistics for one gear item; takes `/{gearUuid}`.
    pub const GEAR_STATS: &str = "/gear-service/gear/stats";

    /// Per-user gear resources; takes `/{profileId}/activityTypes`.
    pub const GEAR_USER: &str = "/gear-service/gear/user";

    /// Blood-pressure measurements; takes `/{start}/{end}?includeAll=true`.
    pub const BLOOD_PRESSURE: &str = "/bloodpressure-service/bloodpressure/range";

    /// Menstrual-cycle day view; takes `/{date}`.
    pub const MENSTRUAL_DAYVIEW: &str = "/periodichealth-service/menstrualcycle/dayview";

    /// Saved workouts, paginated with `?start=&limit=`.
    pub const WORKOUTS: &str = "/workout-service/workouts";
}

/// Fixed query parameter values
pub mod params {
    /// Buffer passed to the sleep endpoint so wake phases at the edges are kept.
    pub const NON_SLEEP_BUFFER_MINUTES: &str = "60";

    /// Goal status filter used by the aggregation engine.
    pub const GOALS_STATUS: &str = "active";

    /// First page index of the goal list.
    pub const GOALS_PAGE_START: &str = "1";

    /// Page size of the goal list.
    pub const GOALS_PAGE_LIMIT: &str = "30";

    /// Page size for activity searches.
    pub const ACTIVITY_PAGE_SIZE: u32 = 20;

    /// Page size for the workout list.
    pub const WORKOUT_PAGE_SIZE: u32 = 100;
}

/// Request executor retry tuning
pub mod retry {
    /// Maximum transparent retries after a 429 or 5xx response.
    pub const MAX_RETRIES: u32 = 3;

    /// First backoff delay; doubles on each subsequent retry (1 s, 2 s, 4 s).
    pub const INITIAL_BACKOFF_MS: u64 = 1000;
}

/// HTTP client tuning
pub mod http {
    /// Total per-request timeout.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Connection establishment timeout.
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Date windows used by the aggregation engine
pub mod windows {
    /// Days before the target date feeding weekly step statistics.
    pub const STEP_HISTORY_DAYS: i64 = 7;

    /// Days before the target date scanned for the most recent activity.
    pub const ACTIVITY_LOOKBACK_DAYS: i64 = 7;

    /// Days after the target date included in the activity scan, so
    /// just-synced activities with a future local date still show up.
    pub const ACTIVITY_LOOKAHEAD_DAYS: i64 = 1;

    /// Days of history scanned for the latest blood-pressure reading.
    pub const BLOOD_PRESSURE_DAYS: i64 = 30;
}

/// Gamification tables
pub mod gamification {
    /// Cumulative point thresholds for user levels 0 through 10. The level is
    /// the highest index whose threshold does not exceed the point total.
    pub const LEVEL_THRESHOLDS: [u64; 11] = [
        0, 100, 500, 1000, 2500, 5000, 10_000, 25_000, 50_000, 100_000, 250_000,
    ];
}
