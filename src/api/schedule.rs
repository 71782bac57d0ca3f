use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthProfessor,
    context::RequestContext,
    error::ApiError,
    model::schedule::{DailyScheduleEntry, WeeklyScheduleEntry},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct InsertTimeSlotReq {
    #[serde(rename = "startTime")]
    #[schema(example = "08:00")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    #[schema(example = "09:30")]
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    #[serde(rename = "fiscalYear")]
    pub fiscal_year: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Parse a time-of-day in either 24-hour (`HH:MM`) or 12-hour
/// (`HH:MM AM/PM`) display form.
fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%I:%M %p"))
        .ok()
}

/// Minutes since midnight, converting any 12-hour display value back to
/// 24-hour form first.
fn minutes_since_midnight(value: &str) -> Option<u32> {
    let value = value.trim();
    let (clock, period) = match value.split_once(' ') {
        Some((clock, period)) => (clock, Some(period)),
        None => (value, None),
    };

    let (hour, minute) = clock.split_once(':')?;
    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;

    if minute > 59 {
        return None;
    }

    match period.map(|p| p.trim().to_ascii_uppercase()) {
        Some(p) if p == "PM" => {
            if hour == 0 || hour > 12 {
                return None;
            }
            if hour != 12 {
                hour += 12;
            }
        }
        Some(p) if p == "AM" => {
            if hour == 0 || hour > 12 {
                return None;
            }
            if hour == 12 {
                hour = 0;
            }
        }
        Some(_) => return None,
        None => {}
    }

    if hour > 23 {
        return None;
    }

    Some(hour * 60 + minute)
}

fn is_valid_time_range(start: &str, end: &str) -> bool {
    matches!(
        (parse_time_of_day(start), parse_time_of_day(end)),
        (Some(s), Some(e)) if s < e
    )
}

fn is_sequential_order(start: &str, end: &str) -> bool {
    matches!(
        (minutes_since_midnight(start), minutes_since_midnight(end)),
        (Some(s), Some(e)) if s < e
    )
}

/// Insert a new time slot after validating the range twice: once on parsed
/// time-of-day values and once on minutes-since-midnight.
#[utoipa::path(
    post,
    path = "/insert-time-slot",
    request_body = InsertTimeSlotReq,
    responses(
        (status = 200, description = "Time slot inserted", body = Object, example = json!({
            "message": "Time slot inserted successfully",
            "startTime": "08:00",
            "endTime": "09:30"
        })),
        (status = 400, description = "Invalid or non-sequential time range"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn insert_time_slot(
    pool: web::Data<MySqlPool>,
    body: web::Json<InsertTimeSlotReq>,
) -> Result<HttpResponse, ApiError> {
    let start = body.start_time.trim();
    let end = body.end_time.trim();

    if !is_valid_time_range(start, end) {
        debug!(start, end, "Rejected time slot: start must precede end");
        return Err(ApiError::validation(
            "Invalid time range: Start time must be earlier than End time.",
        ));
    }

    if !is_sequential_order(start, end) {
        debug!(start, end, "Rejected time slot: not in sequential order");
        return Err(ApiError::validation("Time slots must be in sequential order."));
    }

    // Both checks passed, so these parses cannot fail.
    let time_start = parse_time_of_day(start).unwrap();
    let time_end = parse_time_of_day(end).unwrap();

    sqlx::query("INSERT INTO time_slots (time_start, time_end) VALUES (?, ?)")
        .bind(time_start)
        .bind(time_end)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::store("Error inserting time slot."))?;

    info!(start, end, "Time slot inserted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Time slot inserted successfully",
        "startTime": start,
        "endTime": end,
    })))
}

/// The professor's weekly timetable, plus the dated entries for the selected
/// date's weekday when a date is given.
#[utoipa::path(
    get,
    path = "/api/schedule",
    params(
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024"),
        ("date", Query, description = "Optional anchor date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Weekly and daily schedule", body = Object, example = json!({
            "success": true,
            "weekly": [],
            "daily": [],
            "subjects": ["Data Structures"]
        })),
        (status = 400, description = "Fiscal year missing or invalid"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn schedule_view(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<ScheduleQuery>,
) -> Result<HttpResponse, ApiError> {
    let fiscal_year = query
        .fiscal_year
        .as_deref()
        .ok_or_else(|| ApiError::validation("Fiscal year not selected."))?;
    let ctx = RequestContext::resolve(pool.get_ref(), &auth, fiscal_year, None).await?;

    let weekly = sqlx::query_as::<_, WeeklyScheduleEntry>(
        r#"
        SELECT
            d.day_name,
            CONCAT(TIME_FORMAT(ts.time_start, '%H:%i'), ' - ', TIME_FORMAT(ts.time_end, '%H:%i')) AS time_slot,
            sub.subject_name,
            sec.section_name
        FROM schedules sch
        JOIN days d ON sch.day_id = d.id
        JOIN subjects sub ON sch.subject_id = sub.id
        JOIN sections sec ON sch.section_id = sec.id
        JOIN time_slots ts ON sch.time_slot_id = ts.id
        WHERE sch.professor_id = ? AND sch.fiscal_year_id = ?
        ORDER BY ts.time_start, d.id
        "#,
    )
    .bind(ctx.professor_id)
    .bind(ctx.fiscal_year_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching schedule"))?;

    let daily = match query.date {
        None => Vec::new(),
        Some(date) => {
            let day_name = date.format("%A").to_string();

            sqlx::query_as::<_, DailyScheduleEntry>(
                r#"
                SELECT
                    CONCAT(TIME_FORMAT(ts.time_start, '%H:%i'), ' - ', TIME_FORMAT(ts.time_end, '%H:%i')) AS time_slot,
                    DATE_FORMAT(sch.schedule_date, '%Y-%m-%d') AS schedule_date,
                    sub.subject_name,
                    sec.section_name
                FROM schedules sch
                JOIN days d ON sch.day_id = d.id
                JOIN subjects sub ON sch.subject_id = sub.id
                JOIN sections sec ON sch.section_id = sec.id
                JOIN time_slots ts ON sch.time_slot_id = ts.id
                JOIN fiscal_years fy ON sch.fiscal_year_id = fy.id
                WHERE d.day_name = ?
                    AND sch.professor_id = ?
                    AND fy.id = ?
                    AND sch.schedule_date BETWEEN fy.year_start AND fy.year_end
                ORDER BY sch.schedule_date
                "#,
            )
            .bind(day_name)
            .bind(ctx.professor_id)
            .bind(ctx.fiscal_year_id)
            .fetch_all(pool.get_ref())
            .await
            .map_err(ApiError::store("Error fetching schedule"))?
        }
    };

    let subjects: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT sub.subject_name
        FROM schedules sch
        JOIN subjects sub ON sch.subject_id = sub.id
        WHERE sch.professor_id = ? AND sch.fiscal_year_id = ?
        "#,
    )
    .bind(ctx.professor_id)
    .bind(ctx.fiscal_year_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching schedule"))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "weekly": weekly,
        "daily": daily,
        "subjects": subjects,
    })))
}

/// Apply edits made in the schedule grid. The body maps a schedule id to the
/// changed columns; only `subject_name` and `section_name` are editable, and
/// each change updates the owning table joined through the schedule row.
#[utoipa::path(
    post,
    path = "/save-schedule-changes",
    responses(
        (status = 200, description = "Changes applied", body = Object, example = json!({
            "success": true
        })),
        (status = 500, description = "Error updating database")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn save_schedule_changes(
    pool: web::Data<MySqlPool>,
    body: web::Json<HashMap<u64, HashMap<String, String>>>,
) -> Result<HttpResponse, ApiError> {
    if body.is_empty() {
        return Ok(HttpResponse::Ok().json(json!({
            "success": false,
            "message": "No changes received",
        })));
    }

    for (schedule_id, changes) in body.iter() {
        for (column, value) in changes {
            let sql = match column.as_str() {
                "subject_name" => {
                    r#"
                    UPDATE subjects sub
                    JOIN schedules sch ON sch.subject_id = sub.id
                    SET sub.subject_name = ?
                    WHERE sch.id = ?
                    "#
                }
                "section_name" => {
                    r#"
                    UPDATE sections sec
                    JOIN schedules sch ON sch.section_id = sec.id
                    SET sec.section_name = ?
                    WHERE sch.id = ?
                    "#
                }
                // Unknown columns are skipped, not errors.
                other => {
                    debug!(column = other, "Skipping unknown schedule column");
                    continue;
                }
            };

            if let Err(e) = sqlx::query(sql)
                .bind(value)
                .bind(*schedule_id)
                .execute(pool.get_ref())
                .await
            {
                error!(error = %e, schedule_id = *schedule_id, column = %column, "Schedule update failed");
                return Err(ApiError::Store("Error updating database".to_string()));
            }
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_slot_is_accepted() {
        assert!(is_valid_time_range("08:00", "09:00"));
        assert!(is_sequential_order("08:00", "09:00"));
    }

    #[test]
    fn reversed_slot_is_rejected() {
        assert!(!is_valid_time_range("09:00", "08:00"));
        assert!(!is_sequential_order("09:00", "08:00"));
    }

    #[test]
    fn equal_times_are_rejected() {
        assert!(!is_valid_time_range("08:00", "08:00"));
        assert!(!is_sequential_order("08:00", "08:00"));
    }

    #[test]
    fn twelve_hour_values_convert_to_minutes() {
        assert_eq!(minutes_since_midnight("12:30 PM"), Some(750));
        assert_eq!(minutes_since_midnight("12:15 AM"), Some(15));
        assert_eq!(minutes_since_midnight("01:05 PM"), Some(785));
        assert_eq!(minutes_since_midnight("08:00"), Some(480));
    }

    #[test]
    fn malformed_times_are_rejected() {
        assert_eq!(minutes_since_midnight("25:00"), None);
        assert_eq!(minutes_since_midnight("08:61"), None);
        assert_eq!(minutes_since_midnight("13:00 PM"), None);
        assert_eq!(minutes_since_midnight("eight"), None);
        assert!(!is_valid_time_range("notatime", "09:00"));
    }

    #[test]
    fn twelve_hour_range_crossing_noon_is_sequential() {
        assert!(is_sequential_order("11:30 AM", "01:00 PM"));
        assert!(is_valid_time_range("11:30 AM", "01:00 PM"));
    }
}
