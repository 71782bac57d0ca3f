use std::io::Write;
use std::path::{Path, PathBuf};

use actix_multipart::{Field, Multipart};
use actix_web::web;
use chrono::{NaiveDate, NaiveTime};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{config::Config, error::ApiError, model::attendance::AttendanceTableRow};

/// One raw CSV row, exactly as uploaded. Echoed back verbatim inside
/// `invalidRows` so the client can show which line was rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RawCsvRow {
    pub student_id: Option<String>,
    pub schedule_id: Option<String>,
    pub student_number: Option<String>,
    pub attendance_date: Option<String>,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
}

/// A validated row, ready for the upsert statement.
#[derive(Debug, Serialize, ToSchema)]
pub struct NewAttendanceRecord {
    pub student_id: u64,
    pub schedule_id: u64,
    pub student_number: Option<String>,
    #[schema(example = "2024-03-10", format = "date", value_type = String)]
    pub attendance_date: Option<NaiveDate>,
    #[schema(example = "08:02:00", value_type = String)]
    pub time_in: Option<NaiveTime>,
    #[schema(example = "09:28:00", value_type = String)]
    pub time_out: Option<NaiveTime>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvalidRow {
    pub row: RawCsvRow,
    pub error: String,
}

struct IngestOutcome {
    inserted: Vec<NewAttendanceRecord>,
    invalid: Vec<InvalidRow>,
}

/// Upload an attendance CSV and reconcile it against the store.
///
/// Rows missing `student_id` or `schedule_id` are collected into
/// `invalidRows`; valid rows are upserted one atomic statement each, and the
/// response carries the full joined view for display.
#[utoipa::path(
    post,
    path = "/upload-attendance",
    responses(
        (status = 200, description = "Reconciliation report", body = Object, example = json!({
            "success": true,
            "message": "File processed successfully!",
            "insertedRows": [],
            "tableData": [],
            "invalidRows": []
        })),
        (status = 400, description = "Missing file or wrong content type"),
        (status = 500, description = "File processing failed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn upload_attendance(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<actix_web::HttpResponse, ApiError> {
    let path = spool_upload(payload, &config.upload_dir).await?;

    let outcome = process_rows(pool.get_ref(), &path).await;

    // The spooled file is deleted whether or not parsing succeeded.
    if let Err(e) = std::fs::remove_file(&path) {
        warn!(error = %e, path = %path.display(), "Failed to delete uploaded file");
    } else {
        debug!(path = %path.display(), "Uploaded file deleted");
    }

    let outcome = outcome?;

    // Read-back runs strictly after the batch's writes have settled.
    let table_data = fetch_table_data(pool.get_ref()).await?;

    info!(
        inserted = outcome.inserted.len(),
        invalid = outcome.invalid.len(),
        "Attendance CSV processed"
    );

    Ok(actix_web::HttpResponse::Ok().json(json!({
        "success": true,
        "message": "File processed successfully!",
        "insertedRows": outcome.inserted,
        "tableData": table_data,
        "invalidRows": outcome.invalid,
    })))
}

/// Streams the `csvFile` multipart field to a uniquely named file under the
/// upload directory and returns its path.
async fn spool_upload(mut payload: Multipart, upload_dir: &str) -> Result<PathBuf, ApiError> {
    std::fs::create_dir_all(upload_dir)
        .map_err(ApiError::store("File processing failed."))?;

    let mut saved: Option<PathBuf> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(ApiError::store("File processing failed."))?
    {
        if field.name() != "csvFile" {
            continue;
        }

        // Only allow CSV files
        if let Some(mime) = field.content_type() {
            if mime.essence_str() != "text/csv" {
                return Err(ApiError::validation("Only CSV files are allowed"));
            }
        }

        let path = Path::new(upload_dir).join(format!("{}.csv", Uuid::new_v4()));

        if let Err(e) = write_field(&mut field, &path).await {
            // A half-written spool file is useless; drop it with the request.
            let _ = std::fs::remove_file(&path);
            return Err(e);
        }

        saved = Some(path);
        break;
    }

    saved.ok_or_else(|| ApiError::validation("No file uploaded"))
}

async fn write_field(field: &mut Field, path: &Path) -> Result<(), ApiError> {
    let mut file = {
        let path = path.to_path_buf();
        web::block(move || std::fs::File::create(path))
            .await
            .map_err(ApiError::store("File processing failed."))?
            .map_err(ApiError::store("File processing failed."))?
    };

    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(ApiError::store("File processing failed."))?
    {
        file = web::block(move || file.write_all(&chunk).map(|_| file))
            .await
            .map_err(ApiError::store("File processing failed."))?
            .map_err(ApiError::store("File processing failed."))?;
    }

    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<RawCsvRow>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    rdr.deserialize().collect()
}

async fn process_rows(pool: &MySqlPool, path: &Path) -> Result<IngestOutcome, ApiError> {
    let rows = {
        let path = path.to_path_buf();
        web::block(move || read_rows(&path))
            .await
            .map_err(ApiError::store("File processing failed."))?
            .map_err(ApiError::store("File processing failed."))?
    };

    let mut inserted = Vec::new();
    let mut invalid = Vec::new();

    for raw in rows {
        match validate_row(&raw) {
            Err(reason) => invalid.push(InvalidRow {
                row: raw,
                error: reason,
            }),
            Ok(record) => match upsert_record(pool, &record).await {
                Ok(()) => inserted.push(record),
                Err(e) => {
                    error!(
                        error = %e,
                        student_id = record.student_id,
                        schedule_id = record.schedule_id,
                        "Row upsert failed"
                    );
                    invalid.push(InvalidRow {
                        row: raw,
                        error: "Database error".to_string(),
                    });
                }
            },
        }
    }

    Ok(IngestOutcome { inserted, invalid })
}

/// Per-row validation. The required identifiers must be present, non-empty
/// and numeric; dates and times must parse when given.
fn validate_row(raw: &RawCsvRow) -> Result<NewAttendanceRecord, String> {
    let student_id = raw.student_id.as_deref().unwrap_or("").trim();
    let schedule_id = raw.schedule_id.as_deref().unwrap_or("").trim();

    if student_id.is_empty() || schedule_id.is_empty() {
        return Err(format!(
            "Missing required fields: student_id={}, schedule_id={}",
            student_id, schedule_id
        ));
    }

    let student_id: u64 = student_id
        .parse()
        .map_err(|_| format!("student_id is not numeric: {}", student_id))?;
    let schedule_id: u64 = schedule_id
        .parse()
        .map_err(|_| format!("schedule_id is not numeric: {}", schedule_id))?;

    let attendance_date = match raw.attendance_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(v) => Some(
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| format!("attendance_date is not a valid date: {}", v))?,
        ),
    };

    let time_in = parse_optional_time(raw.time_in.as_deref(), "time_in")?;
    let time_out = parse_optional_time(raw.time_out.as_deref(), "time_out")?;

    Ok(NewAttendanceRecord {
        student_id,
        schedule_id,
        student_number: raw
            .student_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        attendance_date,
        time_in,
        time_out,
    })
}

fn parse_optional_time(value: Option<&str>, field: &str) -> Result<Option<NaiveTime>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => NaiveTime::parse_from_str(v, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(v, "%H:%M"))
            .map(Some)
            .map_err(|_| format!("{} is not a valid time: {}", field, v)),
    }
}

/// Insert-or-update in a single atomic statement; a unique key over
/// (student_id, schedule_id, attendance_date) turns re-uploads into updates
/// of time_in/time_out instead of duplicates.
async fn upsert_record(pool: &MySqlPool, record: &NewAttendanceRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO student_attendance
            (student_id, schedule_id, student_number, attendance_date, time_in, time_out)
        VALUES (?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            time_in = VALUES(time_in),
            time_out = VALUES(time_out)
        "#,
    )
    .bind(record.student_id)
    .bind(record.schedule_id)
    .bind(&record.student_number)
    .bind(record.attendance_date)
    .bind(record.time_in)
    .bind(record.time_out)
    .execute(pool)
    .await
    .map(|_| ())
}

async fn fetch_table_data(pool: &MySqlPool) -> Result<Vec<AttendanceTableRow>, ApiError> {
    sqlx::query_as::<_, AttendanceTableRow>(
        r#"
        SELECT
            sa.student_id,
            sa.schedule_id,
            sa.student_number,
            DATE_FORMAT(sa.attendance_date, '%Y-%m-%d') AS attendance_date,
            TIME_FORMAT(sa.time_in, '%H:%i') AS time_in,
            TIME_FORMAT(sa.time_out, '%H:%i') AS time_out,
            s.student_name,
            ast.status,
            ast.remarks
        FROM student_attendance sa
        LEFT JOIN students s ON sa.student_id = s.id
        LEFT JOIN attendance_status ast ON sa.id = ast.student_attendance_id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(ApiError::store("Error fetching uploaded data."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(student_id: &str, schedule_id: &str) -> RawCsvRow {
        RawCsvRow {
            student_id: Some(student_id.to_string()),
            schedule_id: Some(schedule_id.to_string()),
            ..RawCsvRow::default()
        }
    }

    #[test]
    fn row_without_student_id_is_invalid() {
        let row = RawCsvRow {
            schedule_id: Some("3".into()),
            ..RawCsvRow::default()
        };
        let err = validate_row(&row).unwrap_err();
        assert!(err.contains("Missing required fields"));
    }

    #[test]
    fn row_with_empty_schedule_id_is_invalid() {
        let err = validate_row(&raw("17", "")).unwrap_err();
        assert!(err.contains("Missing required fields"));
    }

    #[test]
    fn non_numeric_identifier_is_invalid() {
        let err = validate_row(&raw("abc", "3")).unwrap_err();
        assert!(err.contains("not numeric"));
    }

    #[test]
    fn full_row_parses_dates_and_times() {
        let row = RawCsvRow {
            student_id: Some("17".into()),
            schedule_id: Some("3".into()),
            student_number: Some("2021-00123".into()),
            attendance_date: Some("2024-03-10".into()),
            time_in: Some("08:02".into()),
            time_out: Some("09:28:30".into()),
        };

        let record = validate_row(&row).unwrap();
        assert_eq!(record.student_id, 17);
        assert_eq!(record.schedule_id, 3);
        assert_eq!(
            record.attendance_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
        );
        assert_eq!(
            record.time_in,
            Some(NaiveTime::from_hms_opt(8, 2, 0).unwrap())
        );
        assert_eq!(
            record.time_out,
            Some(NaiveTime::from_hms_opt(9, 28, 30).unwrap())
        );
    }

    #[test]
    fn malformed_date_is_invalid() {
        let mut row = raw("17", "3");
        row.attendance_date = Some("10/03/2024".into());
        let err = validate_row(&row).unwrap_err();
        assert!(err.contains("attendance_date"));
    }

    #[test]
    fn blank_optional_fields_become_null() {
        let mut row = raw("17", "3");
        row.student_number = Some("".into());
        row.time_in = Some("".into());
        let record = validate_row(&row).unwrap();
        assert_eq!(record.student_number, None);
        assert_eq!(record.time_in, None);
    }
}
