use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "EMP-007",
        "name": "Juan Dela Cruz",
        "mobile_phone": "+639171234567",
        "date_of_birth": "1990-05-14",
        "status": "Active",
        "face_embedding": null,
        "fingerprint_id": null
    })
)]
pub struct Employee {
    #[schema(example = "EMP-007")]
    pub employee_id: String,

    #[schema(example = "Juan Dela Cruz")]
    pub name: String,

    #[schema(example = "+639171234567", nullable = true)]
    pub mobile_phone: Option<String>,

    #[schema(
        example = "1990-05-14",
        value_type = String,
        format = "date",
        nullable = true
    )]
    pub date_of_birth: Option<NaiveDate>,

    #[schema(example = "Active")]
    pub status: String,

    /// Reserved for the biometric capture device
    #[schema(nullable = true)]
    pub face_embedding: Option<String>,

    #[schema(nullable = true)]
    pub fingerprint_id: Option<String>,
}
