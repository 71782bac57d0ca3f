use serde::Serialize;
use utoipa::ToSchema;

/// One cell of the professor's weekly timetable. The time-slot label is
/// derived from `time_slots.time_start`/`time_end` (`HH:MM - HH:MM`).
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct WeeklyScheduleEntry {
    #[schema(example = "Monday")]
    pub day_name: String,
    #[schema(example = "08:00 - 09:30")]
    pub time_slot: String,
    pub subject_name: String,
    pub section_name: String,
}

/// Dated occurrences of a weekday's classes inside one fiscal year.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct DailyScheduleEntry {
    #[schema(example = "08:00 - 09:30")]
    pub time_slot: String,
    #[schema(example = "2024-03-11", format = "date", value_type = String)]
    pub schedule_date: Option<String>,
    pub subject_name: String,
    pub section_name: String,
}
