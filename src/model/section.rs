use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Section {
    #[schema(example = 2)]
    pub section_id: u64,
    #[schema(example = "BSCS 2-A")]
    pub section_name: String,
}
