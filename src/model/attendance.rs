use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Joined view returned by the ingestion read-back: one row per stored
/// attendance record with the student name and optional status annotation.
/// Status/remarks stay `null` in JSON when no annotation exists; the client
/// renders the absence as "N/A".
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceTableRow {
    #[schema(example = 17)]
    pub student_id: u64,
    #[schema(example = 3)]
    pub schedule_id: u64,
    #[schema(example = "2021-00123")]
    pub student_number: Option<String>,
    #[schema(example = "2024-03-10", format = "date", value_type = String)]
    pub attendance_date: Option<String>,
    #[schema(example = "08:02")]
    pub time_in: Option<String>,
    #[schema(example = "09:28")]
    pub time_out: Option<String>,
    #[schema(example = "Dela Cruz, Juan")]
    pub student_name: Option<String>,
    #[schema(example = "Present", nullable = true)]
    pub status: Option<String>,
    #[schema(nullable = true)]
    pub remarks: Option<String>,
}

/// Row shape for `/api/attendance`: the six display fields of the
/// subject/section attendance table.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceView {
    pub student_number: Option<String>,
    pub student_name: String,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub status: Option<String>,
    pub remarks: Option<String>,
}

/// Roster row for `/api/students`: attendance times are pre-formatted
/// 12-hour strings with "N/A" substituted for missing values.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct StudentRosterRow {
    pub student_number: Option<String>,
    pub student_name: String,
    pub attendance_date: Option<String>,
    pub time_in: String,
    pub time_out: String,
    pub barcode: Option<String>,
}
