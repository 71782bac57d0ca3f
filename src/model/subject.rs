use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Subject {
    #[schema(example = 4)]
    pub subject_id: u64,
    #[schema(example = "Data Structures")]
    pub subject_name: String,
}
