use crate::{auth::auth::AuthUser, config::Config, utils::time};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "employees": 12,
    "present": 9,
    "late": 2,
    "absent": 3
}))]
pub struct DashboardStats {
    /// Active employees on record
    pub employees: i64,
    /// Timed in today
    pub present: i64,
    /// Timed in after the configured work start today
    pub late: i64,
    /// Active employees with no time-in today
    pub absent: i64,
}

/// Today's headline numbers for the console landing page
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Today's attendance stats", body = DashboardStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let today = time::today_local(&config.time_zone);

    let employees = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM employees WHERE status = 'Active'",
    )
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    let present = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance WHERE date = ? AND time_in IS NOT NULL",
    )
    .bind(today)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count present employees");
        ErrorInternalServerError("Database error")
    })?;

    let late = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance WHERE date = ? AND time_in > ?",
    )
    .bind(today)
    .bind(config.work_start)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count late employees");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(DashboardStats {
        employees,
        present,
        late,
        absent: (employees - present).max(0),
    }))
}
