use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct FiscalYear {
    pub id: u64,
    /// Calendar year the fiscal year starts in; this is the value clients
    /// send back as the `fiscalYear` parameter.
    #[schema(example = 2024)]
    pub year_value: u16,
    #[schema(example = "AY 2024-2025")]
    pub year_name: String,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Semester {
    pub id: u64,
    #[schema(example = "First Semester")]
    pub semester_name: String,
    #[schema(example = "2024-08-05", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
}
