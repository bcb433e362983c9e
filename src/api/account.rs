use crate::{
    auth::auth::AuthUser,
    auth::password::hash_password,
    model::role::Role,
    utils::usernames,
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct CreateAccount {
    #[schema(example = "EMP-007")]
    pub employee_id: String,
    #[schema(example = "Juan Dela Cruz")]
    pub full_name: String,
    #[schema(example = "juan@company.com", format = "email")]
    pub username: String,
    /// `admin` gets the console, `employee` the self-service portal
    #[schema(example = "employee")]
    pub position: String,
}

#[derive(Serialize, ToSchema)]
pub struct AccountCreated {
    #[schema(example = "User account created")]
    pub message: String,
    /// Handed to the employee out of band; they change it on first login
    pub one_time_password: String,
}

/// Provision a console/portal login
#[utoipa::path(
    post,
    path = "/api/accounts",
    request_body = CreateAccount,
    responses(
        (status = 201, description = "Account created", body = AccountCreated),
        (status = 400, description = "Missing or invalid fields", body = Object, example = json!({
            "message": "All fields are required"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Username already exists", body = Object, example = json!({
            "message": "Username already exists"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Account"
)]
pub async fn create_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAccount>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let username = payload.username.trim();

    if username.is_empty()
        || payload.employee_id.trim().is_empty()
        || payload.full_name.trim().is_empty()
        || payload.position.trim().is_empty()
    {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "All fields are required"
        })));
    }

    let role = match Role::from_name(payload.position.trim()) {
        Some(role) => role,
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Invalid position. Allowed: admin, employee"
            })));
        }
    };

    if !usernames::is_available(username, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Username already exists"
        })));
    }

    let one_time_password = generate_one_time_password();
    let hashed = hash_password(&one_time_password);

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password, full_name, role_id, employee_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(username.to_lowercase())
    .bind(&hashed)
    .bind(payload.full_name.trim())
    .bind(role as u8)
    .bind(payload.employee_id.trim())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            // keep the availability layers in step with the table
            usernames::mark_taken(username).await;

            Ok(HttpResponse::Created().json(AccountCreated {
                message: "User account created".to_string(),
                one_time_password,
            }))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Username already exists"
                    })));
                }
            }

            error!(error = %e, "Failed to create user account");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to create user account"
            })))
        }
    }
}

fn generate_one_time_password() -> String {
    let raw = Uuid::new_v4().to_simple().to_string();
    raw[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_time_password_is_twelve_hex_chars() {
        let otp = generate_one_time_password();
        assert_eq!(otp.len(), 12);
        assert!(otp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn one_time_passwords_are_not_repeated() {
        assert_ne!(generate_one_time_password(), generate_one_time_password());
    }
}
