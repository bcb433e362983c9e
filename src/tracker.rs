use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::model::attendance::{AttendanceError, AttendanceRecord};
use crate::store::{AttendanceStore, InsertOutcome};

/// Mediates the two permitted transitions of a day's attendance record.
///
/// The store is the source of truth: every operation re-reads the row
/// before acting, and nothing is cached across calls. Preconditions are
/// checked on the fetched row before any write, so a rejected attempt
/// never touches the store; the store-side updates are additionally
/// guarded so a lost race cannot overwrite an earlier punch.
pub struct AttendanceDayTracker<S> {
    store: S,
}

impl<S: AttendanceStore> AttendanceDayTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create-or-fetch for the (employee, day) pair. Safe to call any
    /// number of times; a create racing another caller falls back to
    /// fetching the row the winner made.
    pub async fn ensure_day(
        &self,
        employee_id: &str,
        full_name: &str,
        date: NaiveDate,
    ) -> Result<AttendanceRecord, AttendanceError> {
        if let Some(record) = self.store.find_day(employee_id, date).await? {
            return Ok(record);
        }

        match self.store.insert_day(employee_id, full_name, date).await? {
            InsertOutcome::Created => {}
            InsertOutcome::AlreadyExists => {
                debug!(employee_id, %date, "day row created concurrently, fetching existing");
            }
        }

        self.store
            .find_day(employee_id, date)
            .await?
            .ok_or(AttendanceError::RecordNotFound)
    }

    /// Records the one-shot time-in for the day.
    pub async fn record_time_in(
        &self,
        employee_id: &str,
        date: NaiveDate,
        observed: NaiveTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let mut record = self
            .store
            .find_day(employee_id, date)
            .await?
            .ok_or(AttendanceError::RecordNotFound)?;

        record.record_time_in(observed)?;

        let affected = self
            .store
            .set_time_in(record.id, observed, record.status)
            .await?;
        if affected == 0 {
            // lost a race with a concurrent time-in; the stored value wins
            return Err(AttendanceError::AlreadyTimedIn);
        }

        Ok(record)
    }

    /// Records the one-shot time-out and the derived working hours.
    pub async fn record_time_out(
        &self,
        employee_id: &str,
        date: NaiveDate,
        observed: NaiveTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let mut record = self
            .store
            .find_day(employee_id, date)
            .await?
            .ok_or(AttendanceError::RecordNotFound)?;

        let working_hours = record.record_time_out(observed)?;

        let affected = self
            .store
            .set_time_out(record.id, observed, working_hours)
            .await?;
        if affected == 0 {
            return Err(AttendanceError::AlreadyTimedOut);
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use crate::store::MockAttendanceStore;
    use mockall::Sequence;

    fn t(s: &str) -> NaiveTime {
        s.parse().unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn pending_record() -> AttendanceRecord {
        AttendanceRecord {
            id: 42,
            employee_id: "EMP-007".into(),
            full_name: "Juan Dela Cruz".into(),
            date: d("2024-06-01"),
            status: AttendanceStatus::Pending,
            time_in: None,
            time_out: None,
            working_hours: None,
        }
    }

    #[tokio::test]
    async fn ensure_day_returns_existing_row_without_inserting() {
        let mut store = MockAttendanceStore::new();
        store
            .expect_find_day()
            .times(1)
            .returning(|_, _| Ok(Some(pending_record())));
        store.expect_insert_day().times(0);

        let tracker = AttendanceDayTracker::new(store);
        let record = tracker
            .ensure_day("EMP-007", "Juan Dela Cruz", d("2024-06-01"))
            .await
            .unwrap();

        assert_eq!(record.id, 42);
        assert_eq!(record.status, AttendanceStatus::Pending);
        assert_eq!(record.time_in, None);
        assert_eq!(record.time_out, None);
    }

    #[tokio::test]
    async fn ensure_day_creates_missing_row_then_reads_it_back() {
        let mut store = MockAttendanceStore::new();
        let mut seq = Sequence::new();
        store
            .expect_find_day()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(None));
        store
            .expect_insert_day()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|employee_id, full_name, date| {
                employee_id == "EMP-007"
                    && full_name == "Juan Dela Cruz"
                    && *date == d("2024-06-01")
            })
            .returning(|_, _, _| Ok(InsertOutcome::Created));
        store
            .expect_find_day()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Some(pending_record())));

        let tracker = AttendanceDayTracker::new(store);
        let record = tracker
            .ensure_day("EMP-007", "Juan Dela Cruz", d("2024-06-01"))
            .await
            .unwrap();

        assert_eq!(record.id, 42);
    }

    #[tokio::test]
    async fn ensure_day_treats_duplicate_create_as_fetch() {
        let mut store = MockAttendanceStore::new();
        let mut seq = Sequence::new();
        store
            .expect_find_day()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(None));
        store
            .expect_insert_day()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(InsertOutcome::AlreadyExists));
        store
            .expect_find_day()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Some(pending_record())));

        let tracker = AttendanceDayTracker::new(store);
        let record = tracker
            .ensure_day("EMP-007", "Juan Dela Cruz", d("2024-06-01"))
            .await
            .unwrap();

        assert_eq!(record.id, 42);
    }

    #[tokio::test]
    async fn time_in_persists_observed_time_and_present_status() {
        let mut store = MockAttendanceStore::new();
        store
            .expect_find_day()
            .returning(|_, _| Ok(Some(pending_record())));
        store
            .expect_set_time_in()
            .times(1)
            .withf(|id, observed, status| {
                *id == 42 && *observed == t("08:05:00") && *status == AttendanceStatus::Present
            })
            .returning(|_, _, _| Ok(1));

        let tracker = AttendanceDayTracker::new(store);
        let record = tracker
            .record_time_in("EMP-007", d("2024-06-01"), t("08:05:00"))
            .await
            .unwrap();

        assert_eq!(record.time_in, Some(t("08:05:00")));
        assert_eq!(record.status, AttendanceStatus::Present);
    }

    #[tokio::test]
    async fn second_time_in_is_rejected_before_touching_the_store() {
        let mut store = MockAttendanceStore::new();
        store.expect_find_day().returning(|_, _| {
            let mut rec = pending_record();
            rec.record_time_in(t("08:05:00")).unwrap();
            Ok(Some(rec))
        });
        store.expect_set_time_in().times(0);

        let tracker = AttendanceDayTracker::new(store);
        let err = tracker
            .record_time_in("EMP-007", d("2024-06-01"), t("09:00:00"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttendanceError::AlreadyTimedIn));
    }

    #[tokio::test]
    async fn time_in_lost_race_reports_already_timed_in() {
        let mut store = MockAttendanceStore::new();
        store
            .expect_find_day()
            .returning(|_, _| Ok(Some(pending_record())));
        store.expect_set_time_in().returning(|_, _, _| Ok(0));

        let tracker = AttendanceDayTracker::new(store);
        let err = tracker
            .record_time_in("EMP-007", d("2024-06-01"), t("08:05:00"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttendanceError::AlreadyTimedIn));
    }

    #[tokio::test]
    async fn time_out_writes_time_and_hours_together() {
        let mut store = MockAttendanceStore::new();
        store.expect_find_day().returning(|_, _| {
            let mut rec = pending_record();
            rec.record_time_in(t("08:05:00")).unwrap();
            Ok(Some(rec))
        });
        store
            .expect_set_time_out()
            .times(1)
            .withf(|id, observed, hours| {
                *id == 42 && *observed == t("17:05:30") && *hours == 9.01
            })
            .returning(|_, _, _| Ok(1));

        let tracker = AttendanceDayTracker::new(store);
        let record = tracker
            .record_time_out("EMP-007", d("2024-06-01"), t("17:05:30"))
            .await
            .unwrap();

        assert_eq!(record.time_out, Some(t("17:05:30")));
        assert_eq!(record.working_hours, Some(9.01));
    }

    #[tokio::test]
    async fn time_out_without_time_in_is_rejected_before_touching_the_store() {
        let mut store = MockAttendanceStore::new();
        store
            .expect_find_day()
            .returning(|_, _| Ok(Some(pending_record())));
        store.expect_set_time_out().times(0);

        let tracker = AttendanceDayTracker::new(store);
        let err = tracker
            .record_time_out("EMP-007", d("2024-06-01"), t("17:00:00"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttendanceError::NotYetTimedIn));
    }

    #[tokio::test]
    async fn time_out_on_missing_record_is_not_auto_recovered() {
        let mut store = MockAttendanceStore::new();
        store.expect_find_day().returning(|_, _| Ok(None));
        store.expect_set_time_out().times(0);

        let tracker = AttendanceDayTracker::new(store);
        let err = tracker
            .record_time_out("EMP-007", d("2024-06-01"), t("17:00:00"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttendanceError::RecordNotFound));
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_unavailable() {
        let mut store = MockAttendanceStore::new();
        store
            .expect_find_day()
            .returning(|_, _| Err(sqlx::Error::PoolTimedOut));

        let tracker = AttendanceDayTracker::new(store);
        let err = tracker
            .record_time_in("EMP-007", d("2024-06-01"), t("08:05:00"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttendanceError::StoreUnavailable(_)));
    }
}
