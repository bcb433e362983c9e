use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::attendance::{AttendanceError, AttendanceRecord};
use crate::store::MySqlAttendanceStore;
use crate::tracker::AttendanceDayTracker;
use crate::utils::time;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    /// Filter by employee code (forced to their own for employee users)
    pub employee_id: Option<String>,
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SummaryQuery {
    /// Calendar month, YYYY-MM
    #[param(example = "2024-06")]
    pub month: String,
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    employee_id: String,
    full_name: String,
    days_present: i64,
    late_count: i64,
    total_hours: f64,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "employee_id": "EMP-007",
    "full_name": "Juan Dela Cruz",
    "days_present": 20,
    "late_count": 2,
    "absences": 1,
    "total_hours": 168.5
}))]
pub struct MonthlySummaryRow {
    pub employee_id: String,
    pub full_name: String,
    pub days_present: i64,
    pub late_count: i64,
    pub absences: i64,
    pub total_hours: f64,
}

fn day_tracker(pool: &MySqlPool) -> AttendanceDayTracker<MySqlAttendanceStore> {
    AttendanceDayTracker::new(MySqlAttendanceStore::new(pool.clone()))
}

/// Maps tracker outcomes the caller must surface to the UI.
fn tracker_error_response(err: AttendanceError) -> HttpResponse {
    match err {
        AttendanceError::AlreadyTimedIn => HttpResponse::BadRequest().json(json!({
            "message": "Already timed in today"
        })),
        AttendanceError::AlreadyTimedOut => HttpResponse::BadRequest().json(json!({
            "message": "Already timed out today"
        })),
        AttendanceError::NotYetTimedIn => HttpResponse::BadRequest().json(json!({
            "message": "Please time in first"
        })),
        AttendanceError::RecordNotFound => HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })),
        AttendanceError::StoreUnavailable(e) => {
            error!(error = %e, "Attendance store unavailable");
            HttpResponse::ServiceUnavailable().json(json!({
                "message": "Attendance store unavailable, please retry"
            }))
        }
    }
}

/// Resolves the caller's employee code and display name.
async fn employee_profile(
    pool: &MySqlPool,
    auth: &AuthUser,
) -> actix_web::Result<(String, String)> {
    let employee_id = auth
        .employee_id
        .clone()
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let name = sqlx::query_scalar::<_, String>("SELECT name FROM employees WHERE employee_id = ?")
        .bind(&employee_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, "Failed to fetch employee profile");
            ErrorInternalServerError("Internal Server Error")
        })?
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    Ok((employee_id, name))
}

/// Ensure-day endpoint: create-or-fetch today's record
#[utoipa::path(
    post,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's attendance record", body = AttendanceRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Store unavailable, safe to retry")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn ensure_today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, full_name) = employee_profile(pool.get_ref(), &auth).await?;
    let today = time::today_local(&config.time_zone);

    match day_tracker(pool.get_ref())
        .ensure_day(&employee_id, &full_name, today)
        .await
    {
        Ok(record) => Ok(HttpResponse::Ok().json(record)),
        Err(err) => Ok(tracker_error_response(err)),
    }
}

/// Time-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/time-in",
    responses(
        (status = 200, description = "Time-in recorded", body = AttendanceRecord),
        (status = 400, description = "Already timed in today", body = Object, example = json!({
            "message": "Already timed in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Store unavailable, safe to retry")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn time_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, full_name) = employee_profile(pool.get_ref(), &auth).await?;
    let tz = &config.time_zone;
    let today = time::today_local(tz);
    let observed = time::wall_clock(tz);

    let tracker = day_tracker(pool.get_ref());

    // First punch of the day also creates the day row
    if let Err(err) = tracker.ensure_day(&employee_id, &full_name, today).await {
        return Ok(tracker_error_response(err));
    }

    match tracker.record_time_in(&employee_id, today, observed).await {
        Ok(record) => Ok(HttpResponse::Ok().json(record)),
        Err(err) => Ok(tracker_error_response(err)),
    }
}

/// Time-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/time-out",
    responses(
        (status = 200, description = "Time-out recorded", body = AttendanceRecord),
        (status = 400, description = "Invalid transition", body = Object, example = json!({
            "message": "Please time in first"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No attendance record for today"),
        (status = 503, description = "Store unavailable, safe to retry")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn time_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, _) = employee_profile(pool.get_ref(), &auth).await?;
    let tz = &config.time_zone;
    let today = time::today_local(tz);
    let observed = time::wall_clock(tz);

    match day_tracker(pool.get_ref())
        .record_time_out(&employee_id, today, observed)
        .await
    {
        Ok(record) => Ok(HttpResponse::Ok().json(record)),
        Err(err) => Ok(tracker_error_response(err)),
    }
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance records", body = AttendanceListResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    // Employees only ever see their own records
    let employee_filter = if auth.is_employee() {
        Some(
            auth.employee_id
                .clone()
                .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?,
        )
    } else {
        query.employee_id.clone()
    };

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(employee_id) = &employee_filter {
        conditions.push("employee_id = ?");
        bindings.push(employee_id.clone());
    }

    if let Some(from) = query.from {
        conditions.push("date >= ?");
        bindings.push(from.to_string());
    }

    if let Some(to) = query.to {
        conditions.push("date <= ?");
        bindings.push(to.to_string());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM attendance {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting attendance records");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count attendance records");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT id, employee_id, full_name, date, status, time_in, time_out, working_hours \
         FROM attendance {} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, bindings = ?bindings, page, per_page, offset, "Fetching attendance records");

    let mut data_query = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let records = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch attendance records");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: records,
        page,
        per_page,
        total,
    }))
}

/// Monthly per-employee aggregate
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Per-employee monthly summary", body = [MonthlySummaryRow]),
        (status = 400, description = "Bad month format"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn monthly_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let Some((first_day, last_day)) = month_bounds(&query.month) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "month must be YYYY-MM"
        })));
    };

    // Dates in the month that carry any attendance at all; an employee
    // without a row on such a date counts as absent.
    let attended_days = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT date) FROM attendance WHERE date BETWEEN ? AND ?",
    )
    .bind(first_day)
    .bind(last_day)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count attendance days");
        ErrorInternalServerError("Database error")
    })?;

    let rows = sqlx::query_as::<_, SummaryRow>(
        r#"
        SELECT employee_id,
               full_name,
               COUNT(time_in) AS days_present,
               CAST(COALESCE(SUM(time_in > ?), 0) AS SIGNED) AS late_count,
               ROUND(COALESCE(SUM(working_hours), 0), 2) AS total_hours
        FROM attendance
        WHERE date BETWEEN ? AND ?
        GROUP BY employee_id, full_name
        ORDER BY employee_id
        "#,
    )
    .bind(config.work_start)
    .bind(first_day)
    .bind(last_day)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, month = %query.month, "Failed to aggregate monthly summary");
        ErrorInternalServerError("Database error")
    })?;

    let summary: Vec<MonthlySummaryRow> = rows
        .into_iter()
        .map(|r| MonthlySummaryRow {
            absences: (attended_days - r.days_present).max(0),
            employee_id: r.employee_id,
            full_name: r.full_name,
            days_present: r.days_present,
            late_count: r.late_count,
            total_hours: r.total_hours,
        })
        .collect();

    Ok(HttpResponse::Ok().json(summary))
}

/// First and last day of a YYYY-MM month.
fn month_bounds(month: &str) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").ok()?;
    let last = first
        .checked_add_months(Months::new(1))?
        .checked_sub_days(Days::new(1))?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_spans_whole_month() {
        let (first, last) = month_bounds("2024-06").unwrap();
        assert_eq!(first, "2024-06-01".parse::<NaiveDate>().unwrap());
        assert_eq!(last, "2024-06-30".parse::<NaiveDate>().unwrap());
    }

    #[test]
    fn month_bounds_handles_leap_february() {
        let (_, last) = month_bounds("2024-02").unwrap();
        assert_eq!(last, "2024-02-29".parse::<NaiveDate>().unwrap());
    }

    #[test]
    fn month_bounds_rejects_garbage() {
        assert!(month_bounds("junk").is_none());
        assert!(month_bounds("2024-13").is_none());
    }
}
