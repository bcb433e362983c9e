use crate::api::account::{AccountCreated, CreateAccount};
use crate::api::attendance::{
    AttendanceListResponse, AttendanceQuery, MonthlySummaryRow, SummaryQuery,
};
use crate::api::dashboard::DashboardStats;
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery, PhotoPayload};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timeclock API",
        version = "1.0.0",
        description = r#"
## Small-business attendance system

This API backs the admin console and the employee self-service portal of
a small-business attendance system.

### 🔹 Key Features
- **Employee Management**
  - Create, update, list, and view employee profiles with photos
- **Attendance Tracking**
  - One-shot daily time-in / time-out with derived working hours
- **Reporting**
  - Date-range attendance logs and per-employee monthly summaries
- **Account Provisioning**
  - Admin-created console/portal logins with one-time passwords

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Attendance punches act on the authenticated employee's own record;
management endpoints require the **admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::ensure_today,
        crate::api::attendance::time_in,
        crate::api::attendance::time_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::monthly_summary,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::get_employee_photo,
        crate::api::employee::set_employee_photo,

        crate::api::account::create_account,

        crate::api::dashboard::stats
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            AttendanceQuery,
            AttendanceListResponse,
            SummaryQuery,
            MonthlySummaryRow,
            CreateEmployee,
            Employee,
            EmployeeQuery,
            EmployeeListResponse,
            PhotoPayload,
            CreateAccount,
            AccountCreated,
            DashboardStats
        )
    ),
    tags(
        (name = "Attendance", description = "Daily time-in/time-out and reporting APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Account", description = "Login provisioning APIs"),
        (name = "Dashboard", description = "Console landing page stats"),
    )
)]
pub struct ApiDoc;
