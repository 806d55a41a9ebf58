//! Session window resolution.
//!
//! Maps wall-clock time to the session period and greeting. One boundary
//! policy is used everywhere:
//!
//! | hours    | period  | greeting  |
//! |----------|---------|-----------|
//! | 05–11    | morning | morning   |
//! | 11–14    | morning | midday    |
//! | 14–17    | evening | afternoon |
//! | 17–23    | evening | evening   |
//! | 23–05    | evening | night     |

use super::model::{SessionLimits, SessionType};
use chrono::{DateTime, Duration, Local, NaiveDate, Timelike};

/// Hour at which the morning window opens.
pub const MORNING_START_HOUR: u32 = 5;
/// Hour at which the evening window opens.
pub const EVENING_START_HOUR: u32 = 14;

const MIDDAY_START_HOUR: u32 = 11;
const AFTERNOON_START_HOUR: u32 = 14;
const EVENING_GREETING_HOUR: u32 = 17;
const NIGHT_START_HOUR: u32 = 23;

/// Finer-grained part of the day, used only for greeting text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    Morning,
    Midday,
    Afternoon,
    Evening,
    Night,
}

impl DayPart {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            h if (MORNING_START_HOUR..MIDDAY_START_HOUR).contains(&h) => Self::Morning,
            h if (MIDDAY_START_HOUR..AFTERNOON_START_HOUR).contains(&h) => Self::Midday,
            h if (AFTERNOON_START_HOUR..EVENING_GREETING_HOUR).contains(&h) => Self::Afternoon,
            h if (EVENING_GREETING_HOUR..NIGHT_START_HOUR).contains(&h) => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn period(self) -> SessionType {
        match self {
            Self::Morning | Self::Midday => SessionType::Morning,
            Self::Afternoon | Self::Evening | Self::Night => SessionType::Evening,
        }
    }
}

/// Result of resolving a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWindow {
    pub period: SessionType,
    pub greeting: String,
    /// False during the night band; a session is only offered, not started.
    pub auto_start: bool,
}

/// Returns the session period for a local hour (0–23).
pub fn period_for_hour(hour: u32) -> SessionType {
    DayPart::from_hour(hour).period()
}

/// Resolves the period, greeting and auto-start flag for a local hour.
pub fn resolve(hour: u32, user_name: Option<&str>) -> SessionWindow {
    let part = DayPart::from_hour(hour);
    SessionWindow {
        period: part.period(),
        greeting: greeting_for(part, user_name),
        auto_start: part != DayPart::Night,
    }
}

/// Resolves the window for a local timestamp.
pub fn resolve_at(now: DateTime<Local>, user_name: Option<&str>) -> SessionWindow {
    resolve(now.hour(), user_name)
}

fn greeting_for(part: DayPart, user_name: Option<&str>) -> String {
    let name = user_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| format!(", {}", n))
        .unwrap_or_default();

    match part {
        DayPart::Morning => format!(
            "Good morning{}. Let's set a gentle intention for the day ahead. How are you feeling as you wake up?",
            name
        ),
        DayPart::Midday => format!(
            "Hello{}. Let's pause in the middle of your day. What's on your mind right now?",
            name
        ),
        DayPart::Afternoon => format!(
            "Good afternoon{}. Let's take a breath together. How has your day been unfolding?",
            name
        ),
        DayPart::Evening => format!(
            "Good evening{}. Let's slow down and look back on your day. What stood out to you?",
            name
        ),
        DayPart::Night => format!(
            "Hi{}. It's late, so let's keep this gentle. What's keeping you up tonight?",
            name
        ),
    }
}

/// Computes when the user may next start a session.
///
/// Returns `now` if the current period has not been completed today.
/// Otherwise returns the earliest window opening after `now` whose period is
/// still open on that date.
pub fn next_session_start(now: DateTime<Local>, limits: &SessionLimits) -> DateTime<Local> {
    let today = now.date_naive();
    let current = period_for_hour(now.hour());
    if !limits.completed_on(current, today) {
        return now;
    }

    let windows = [
        (SessionType::Morning, MORNING_START_HOUR),
        (SessionType::Evening, EVENING_START_HOUR),
    ];

    for date in [today, today + Duration::days(1)] {
        for (period, hour) in windows {
            let Some(start) = window_start(date, hour) else {
                continue;
            };
            if start > now && !limits.completed_on(period, date) {
                return start;
            }
        }
    }

    now + Duration::days(1)
}

fn window_start(date: NaiveDate, hour: u32) -> Option<DateTime<Local>> {
    date.and_hms_opt(hour, 0, 0)?
        .and_local_timezone(Local)
        .earliest()
}
