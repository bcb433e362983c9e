use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::MySqlPool;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

const SELECT_COLUMNS: &str =
    "id, employee_id, full_name, date, status, time_in, time_out, working_hours";

/// Outcome of a day-row insert. The attendance table carries
/// `UNIQUE (employee_id, date)`, so a second create for the same pair
/// reports `AlreadyExists` instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    AlreadyExists,
}

/// Persistence seam for the day tracker. Only the four operations the
/// tracker needs live here; reporting queries stay with their handlers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error>;

    async fn insert_day(
        &self,
        employee_id: &str,
        full_name: &str,
        date: NaiveDate,
    ) -> Result<InsertOutcome, sqlx::Error>;

    /// Guarded update: fires only while `time_in` is still NULL.
    /// Returns the number of affected rows.
    async fn set_time_in(
        &self,
        id: u64,
        observed: NaiveTime,
        status: AttendanceStatus,
    ) -> Result<u64, sqlx::Error>;

    /// Guarded update: writes `time_out` and `working_hours` in one
    /// statement, only while `time_out` is still NULL.
    async fn set_time_out(
        &self,
        id: u64,
        observed: NaiveTime,
        working_hours: f64,
    ) -> Result<u64, sqlx::Error>;
}

#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn find_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE employee_id = ? AND date = ?",
            SELECT_COLUMNS
        );
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert_day(
        &self,
        employee_id: &str,
        full_name: &str,
        date: NaiveDate,
    ) -> Result<InsertOutcome, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO attendance (employee_id, full_name, date, status) VALUES (?, ?, ?, ?)",
        )
        .bind(employee_id)
        .bind(full_name)
        .bind(date)
        .bind(AttendanceStatus::Pending)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Created),
            Err(e) => {
                // Unique-key violation: somebody else created today's row first
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code().as_deref() == Some("23000") {
                        return Ok(InsertOutcome::AlreadyExists);
                    }
                }
                Err(e)
            }
        }
    }

    async fn set_time_in(
        &self,
        id: u64,
        observed: NaiveTime,
        status: AttendanceStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET time_in = ?, status = ?
            WHERE id = ?
            AND time_in IS NULL
            "#,
        )
        .bind(observed)
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn set_time_out(
        &self,
        id: u64,
        observed: NaiveTime,
        working_hours: f64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET time_out = ?, working_hours = ?
            WHERE id = ?
            AND time_in IS NOT NULL
            AND time_out IS NULL
            "#,
        )
        .bind(observed)
        .bind(working_hours)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
