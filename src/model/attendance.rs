use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use utoipa::ToSchema;

/// One row per employee per civil day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": "EMP-007",
        "full_name": "Juan Dela Cruz",
        "date": "2024-06-01",
        "status": "present",
        "time_in": "08:05:00",
        "time_out": "17:05:30",
        "working_hours": 9.01
    })
)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-007")]
    pub employee_id: String,

    #[schema(example = "Juan Dela Cruz")]
    pub full_name: String,

    #[schema(example = "2024-06-01", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "present")]
    pub status: AttendanceStatus,

    #[schema(example = "08:05:00", value_type = String, nullable = true)]
    pub time_in: Option<NaiveTime>,

    #[schema(example = "17:05:30", value_type = String, nullable = true)]
    pub time_out: Option<NaiveTime>,

    #[schema(example = 9.01, nullable = true)]
    pub working_hours: Option<f64>,
}

/// Presentation-facing status; the day transitions never consult it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString, ToSchema,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Pending,
    Present,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    NotStarted,
    TimedIn,
    Complete,
}

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("already timed in today")]
    AlreadyTimedIn,

    #[error("already timed out today")]
    AlreadyTimedOut,

    #[error("no time-in recorded yet today")]
    NotYetTimedIn,

    #[error("attendance record not found")]
    RecordNotFound,

    #[error("attendance store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

impl AttendanceRecord {
    pub fn day_state(&self) -> DayState {
        match (self.time_in, self.time_out) {
            (None, _) => DayState::NotStarted,
            (Some(_), None) => DayState::TimedIn,
            (Some(_), Some(_)) => DayState::Complete,
        }
    }

    /// Sets `time_in` once; a second attempt is rejected and the record
    /// is left untouched.
    pub fn record_time_in(&mut self, observed: NaiveTime) -> Result<(), AttendanceError> {
        if self.time_in.is_some() {
            return Err(AttendanceError::AlreadyTimedIn);
        }
        self.time_in = Some(observed);
        self.status = AttendanceStatus::Present;
        Ok(())
    }

    /// Sets `time_out` and the derived `working_hours` together; a reader
    /// must never observe one without the other. Returns the hours.
    pub fn record_time_out(&mut self, observed: NaiveTime) -> Result<f64, AttendanceError> {
        let time_in = self.time_in.ok_or(AttendanceError::NotYetTimedIn)?;
        if self.time_out.is_some() {
            return Err(AttendanceError::AlreadyTimedOut);
        }
        let hours = worked_hours(time_in, observed);
        self.time_out = Some(observed);
        self.working_hours = Some(hours);
        Ok(hours)
    }
}

/// Elapsed hours between two wall-clock times of the same civil day,
/// clamped at zero (clock anomalies) and rounded to 2 decimals,
/// half away from zero.
pub fn worked_hours(time_in: NaiveTime, time_out: NaiveTime) -> f64 {
    let elapsed = (time_out - time_in).num_seconds().max(0);
    let hours = elapsed as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        s.parse().unwrap()
    }

    fn fresh_record() -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            employee_id: "EMP-007".into(),
            full_name: "Juan Dela Cruz".into(),
            date: "2024-06-01".parse().unwrap(),
            status: AttendanceStatus::Pending,
            time_in: None,
            time_out: None,
            working_hours: None,
        }
    }

    #[test]
    fn worked_hours_rounds_to_two_decimals() {
        // 9h 30s = 9.0083... -> 9.01
        assert_eq!(worked_hours(t("08:05:00"), t("17:05:30")), 9.01);
        assert_eq!(worked_hours(t("09:00:00"), t("17:00:00")), 8.0);
        // 15 minutes = 0.25 exactly
        assert_eq!(worked_hours(t("09:00:00"), t("09:15:00")), 0.25);
    }

    #[test]
    fn worked_hours_clamps_negative_elapsed_to_zero() {
        assert_eq!(worked_hours(t("09:00:00"), t("08:59:00")), 0.0);
    }

    #[test]
    fn time_in_flips_status_to_present() {
        let mut rec = fresh_record();
        rec.record_time_in(t("08:05:00")).unwrap();
        assert_eq!(rec.time_in, Some(t("08:05:00")));
        assert_eq!(rec.status, AttendanceStatus::Present);
        assert_eq!(rec.day_state(), DayState::TimedIn);
    }

    #[test]
    fn second_time_in_is_rejected_and_leaves_first_intact() {
        let mut rec = fresh_record();
        rec.record_time_in(t("08:05:00")).unwrap();
        let err = rec.record_time_in(t("08:30:00")).unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyTimedIn));
        assert_eq!(rec.time_in, Some(t("08:05:00")));
    }

    #[test]
    fn time_out_before_time_in_is_rejected() {
        let mut rec = fresh_record();
        let err = rec.record_time_out(t("17:00:00")).unwrap_err();
        assert!(matches!(err, AttendanceError::NotYetTimedIn));
        assert_eq!(rec.time_in, None);
        assert_eq!(rec.time_out, None);
        assert_eq!(rec.working_hours, None);
    }

    #[test]
    fn time_out_sets_hours_together_with_time() {
        let mut rec = fresh_record();
        rec.record_time_in(t("08:05:00")).unwrap();
        rec.record_time_out(t("17:05:30")).unwrap();
        assert_eq!(rec.time_out, Some(t("17:05:30")));
        assert_eq!(rec.working_hours, Some(9.01));
        assert_eq!(rec.day_state(), DayState::Complete);
    }

    #[test]
    fn second_time_out_is_rejected_and_keeps_first_values() {
        let mut rec = fresh_record();
        rec.record_time_in(t("08:00:00")).unwrap();
        rec.record_time_out(t("17:00:00")).unwrap();
        let err = rec.record_time_out(t("18:00:00")).unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyTimedOut));
        assert_eq!(rec.time_out, Some(t("17:00:00")));
        assert_eq!(rec.working_hours, Some(9.0));
    }

    #[test]
    fn cross_midnight_time_out_clamps_to_zero_hours() {
        let mut rec = fresh_record();
        rec.record_time_in(t("09:00:00")).unwrap();
        rec.record_time_out(t("08:59:00")).unwrap();
        assert_eq!(rec.working_hours, Some(0.0));
    }
}
