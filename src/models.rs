use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ManualLoginReq {
    #[schema(example = "PROF-4821")]
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct BarcodeLoginReq {
    #[schema(example = "PROF-4821")]
    pub barcode: String,
}

#[derive(FromRow)]
pub struct ProfessorSql {
    pub id: u64, // 👈 matches BIGINT UNSIGNED
    pub name: String,
    pub unique_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub professor_id: u64,
    /// The access code the professor logged in with
    pub sub: String,
    pub name: String,
    pub exp: usize,
    pub jti: String,
}
