use std::collections::HashSet;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::time::{TimeOfDay, TimeParseError};

pub const DAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_no: Option<String>,
    pub specialty: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorWithAvailability {
    #[serde(flatten)]
    pub doctor: Doctor,
    #[serde(default)]
    pub availability: Vec<AvailabilityWindow>,
}

/// A weekly recurring window; `day_of_week` is 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

impl AvailabilityWindow {
    pub fn start(&self) -> TimeOfDay {
        TimeOfDay::from(self.start_time)
    }

    pub fn end(&self) -> TimeOfDay {
        TimeOfDay::from(self.end_time)
    }

    pub fn day_name(&self) -> &'static str {
        usize::try_from(self.day_of_week)
            .ok()
            .and_then(|day| DAY_NAMES.get(day))
            .copied()
            .unwrap_or("Unknown")
    }
}

// One row per weekday as submitted by the availability form. A day without
// both times is left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailabilityInput {
    pub day_of_week: i32,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyAvailabilityRequest {
    pub days: Vec<DayAvailabilityInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayAvailability {
    pub day_of_week: i32,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub is_available: bool,
}

impl WeeklyAvailabilityRequest {
    /// Parses the submitted week, dropping days that lack a start or end time.
    pub fn validate(&self) -> Result<Vec<DayAvailability>, DoctorError> {
        let mut seen = HashSet::new();
        let mut days = Vec::with_capacity(self.days.len());

        for input in &self.days {
            if !(0..=6).contains(&input.day_of_week) {
                return Err(DoctorError::InvalidDayOfWeek(input.day_of_week));
            }
            if !seen.insert(input.day_of_week) {
                return Err(DoctorError::DuplicateDay(input.day_of_week));
            }

            let (start, end) = match (non_blank(&input.start_time), non_blank(&input.end_time)) {
                (Some(start), Some(end)) => (TimeOfDay::parse(start)?, TimeOfDay::parse(end)?),
                _ => continue,
            };

            if start >= end {
                return Err(DoctorError::InvalidTimeRange(input.day_of_week));
            }

            days.push(DayAvailability {
                day_of_week: input.day_of_week,
                start,
                end,
                is_available: input.is_available,
            });
        }

        Ok(days)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Day of week must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidDayOfWeek(i32),

    #[error("Day {0} appears more than once")]
    DuplicateDay(i32),

    #[error(transparent)]
    InvalidTime(#[from] TimeParseError),

    #[error("Start time must be before end time for day {0}")]
    InvalidTimeRange(i32),

    #[error("Not authorized to manage this doctor's availability")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn day(day_of_week: i32, start: Option<&str>, end: Option<&str>, is_available: bool) -> DayAvailabilityInput {
        DayAvailabilityInput {
            day_of_week,
            start_time: start.map(str::to_string),
            end_time: end.map(str::to_string),
            is_available,
        }
    }

    #[test]
    fn skips_days_without_both_times() {
        let request = WeeklyAvailabilityRequest {
            days: vec![
                day(0, None, None, false),
                day(1, Some("09:00"), Some("17:00"), true),
                day(2, Some("09:00"), Some(" "), true),
            ],
        };

        let days = request.validate().unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day_of_week, 1);
        assert_eq!(days[0].start, TimeOfDay::from_hm(9, 0).unwrap());
        assert!(days[0].is_available);
    }

    #[test]
    fn rejects_inverted_range_and_bad_days() {
        let inverted = WeeklyAvailabilityRequest { days: vec![day(3, Some("17:00"), Some("09:00"), true)] };
        assert_eq!(inverted.validate().unwrap_err(), DoctorError::InvalidTimeRange(3));

        let empty = WeeklyAvailabilityRequest { days: vec![day(3, Some("09:00"), Some("09:00"), true)] };
        assert_eq!(empty.validate().unwrap_err(), DoctorError::InvalidTimeRange(3));

        let out_of_range = WeeklyAvailabilityRequest { days: vec![day(7, Some("09:00"), Some("10:00"), true)] };
        assert_eq!(out_of_range.validate().unwrap_err(), DoctorError::InvalidDayOfWeek(7));

        let duplicate = WeeklyAvailabilityRequest {
            days: vec![day(1, None, None, true), day(1, Some("09:00"), Some("10:00"), true)],
        };
        assert_eq!(duplicate.validate().unwrap_err(), DoctorError::DuplicateDay(1));

        let malformed = WeeklyAvailabilityRequest { days: vec![day(1, Some("9am"), Some("10:00"), true)] };
        assert_matches!(malformed.validate(), Err(DoctorError::InvalidTime(_)));
    }

    #[test]
    fn window_exposes_minutes_and_day_name() {
        let window = AvailabilityWindow {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            is_available: true,
        };

        assert_eq!(window.start().minutes(), 540);
        assert_eq!(window.end().minutes(), 1020);
        assert_eq!(window.day_name(), "Monday");
    }
}
