use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "nip": "198701012010011001",
        "full_name": "Budi Santoso",
        "email": "budi.santoso@instansi.go.id",
        "phone": "+628121234567",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "198701012010011001")]
    pub nip: String,

    #[schema(example = "Budi Santoso")]
    pub full_name: String,

    #[schema(example = "budi.santoso@instansi.go.id")]
    pub email: String,

    #[schema(example = "+628121234567", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "active")]
    pub status: String,
}
