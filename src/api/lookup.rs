use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthProfessor,
    context::RequestContext,
    error::ApiError,
    model::{
        attendance::{AttendanceView, StudentRosterRow},
        fiscal_year::{FiscalYear, Semester},
        section::Section,
        subject::Subject,
    },
};

#[derive(Debug, Deserialize)]
pub struct FiscalYearQuery {
    #[serde(rename = "fiscalYear")]
    pub fiscal_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SectionsQuery {
    pub subject: Option<u64>,
    #[serde(rename = "fiscalYear")]
    pub fiscal_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    pub section: Option<String>,
    #[serde(rename = "fiscalYear")]
    pub fiscal_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub subject: Option<u64>,
    pub section: Option<u64>,
    #[serde(rename = "fiscalYear")]
    pub fiscal_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StudentsQuery {
    pub subject: Option<String>,
    pub section: Option<String>,
    pub session: Option<String>,
    #[serde(rename = "fiscalYear")]
    pub fiscal_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BarcodeQuery {
    pub barcode: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct SessionSlot {
    #[schema(example = "08:00 - 09:30")]
    pub time_slot: String,
}

fn required<T>(value: Option<T>, message: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::validation(message))
}

/// Subjects the professor teaches in a fiscal year
#[utoipa::path(
    get,
    path = "/api/subjects",
    params(
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024")
    ),
    responses(
        (status = 200, description = "Subject list", body = [Subject]),
        (status = 400, description = "Fiscal year missing or invalid"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lookup"
)]
pub async fn subjects(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<FiscalYearQuery>,
) -> Result<HttpResponse, ApiError> {
    let fiscal_year = required(
        query.fiscal_year.as_deref(),
        "Fiscal year not selected.",
    )?;
    let ctx = RequestContext::resolve(pool.get_ref(), &auth, fiscal_year, None).await?;

    let rows = sqlx::query_as::<_, Subject>(
        r#"
        SELECT DISTINCT s.id AS subject_id, s.subject_name
        FROM subjects s
        JOIN schedules sch ON sch.subject_id = s.id
        WHERE sch.professor_id = ? AND sch.fiscal_year_id = ?
        "#,
    )
    .bind(ctx.professor_id)
    .bind(ctx.fiscal_year_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching subjects"))?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Sections of a subject within a fiscal year
#[utoipa::path(
    get,
    path = "/api/sections",
    params(
        ("subject", Query, description = "Subject id"),
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024")
    ),
    responses(
        (status = 200, description = "Section list", body = [Section]),
        (status = 400, description = "Missing parameters"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lookup"
)]
pub async fn sections(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<SectionsQuery>,
) -> Result<HttpResponse, ApiError> {
    let subject_id = required(query.subject, "Subject not selected.")?;
    let fiscal_year = required(
        query.fiscal_year.as_deref(),
        "Fiscal year not selected.",
    )?;
    let ctx = RequestContext::resolve(pool.get_ref(), &auth, fiscal_year, None).await?;

    let rows = sqlx::query_as::<_, Section>(
        r#"
        SELECT DISTINCT sec.id AS section_id, sec.section_name
        FROM sections sec
        JOIN schedules sch ON sch.section_id = sec.id
        WHERE sch.subject_id = ? AND sch.fiscal_year_id = ? AND sch.professor_id = ?
        "#,
    )
    .bind(subject_id)
    .bind(ctx.fiscal_year_id)
    .bind(ctx.professor_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching sections"))?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Class sessions (time-slot labels) of a section within a fiscal year
#[utoipa::path(
    get,
    path = "/api/sessions",
    params(
        ("section", Query, description = "Section name"),
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024")
    ),
    responses(
        (status = 200, description = "Time-slot labels", body = [SessionSlot]),
        (status = 400, description = "Missing parameters"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lookup"
)]
pub async fn sessions(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<SessionsQuery>,
) -> Result<HttpResponse, ApiError> {
    let section = required(query.section.as_deref(), "Section not selected.")?;
    let fiscal_year = required(
        query.fiscal_year.as_deref(),
        "Fiscal year not selected.",
    )?;
    let ctx = RequestContext::resolve(pool.get_ref(), &auth, fiscal_year, None).await?;

    let rows = sqlx::query_as::<_, SessionSlot>(
        r#"
        SELECT DISTINCT
            CONCAT(TIME_FORMAT(ts.time_start, '%H:%i'), ' - ', TIME_FORMAT(ts.time_end, '%H:%i')) AS time_slot
        FROM time_slots ts
        JOIN schedules sch ON sch.time_slot_id = ts.id
        JOIN sections sec ON sch.section_id = sec.id
        WHERE sec.section_name = ? AND sch.fiscal_year_id = ?
        "#,
    )
    .bind(section)
    .bind(ctx.fiscal_year_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching sessions"))?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Attendance table for a subject/section within a fiscal year
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        ("subject", Query, description = "Subject id"),
        ("section", Query, description = "Section id"),
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024")
    ),
    responses(
        (status = 200, description = "Attendance rows", body = [AttendanceView]),
        (status = 400, description = "Missing parameters"),
        (status = 404, description = "No attendance records found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lookup"
)]
pub async fn attendance(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let subject_id = required(query.subject, "Missing parameters")?;
    let section_id = required(query.section, "Missing parameters")?;
    let fiscal_year = required(query.fiscal_year.as_deref(), "Missing parameters")?;
    let ctx = RequestContext::resolve(pool.get_ref(), &auth, fiscal_year, None).await?;

    let rows = sqlx::query_as::<_, AttendanceView>(
        r#"
        SELECT DISTINCT
            sa.student_number,
            st.student_name,
            TIME_FORMAT(sa.time_in, '%H:%i') AS time_in,
            TIME_FORMAT(sa.time_out, '%H:%i') AS time_out,
            ast.status,
            ast.remarks
        FROM student_attendance sa
        JOIN students st ON sa.student_id = st.id
        JOIN schedules sch ON sa.schedule_id = sch.id
        LEFT JOIN attendance_status ast ON sa.id = ast.student_attendance_id
        WHERE sch.subject_id = ?
            AND sch.section_id = ?
            AND sch.fiscal_year_id = ?
            AND sch.professor_id = ?
        ORDER BY sa.attendance_date, sa.student_number
        "#,
    )
    .bind(subject_id)
    .bind(section_id)
    .bind(ctx.fiscal_year_id)
    .bind(ctx.professor_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching attendance"))?;

    // Empty result is a 404 here, not an empty 200 array.
    if rows.is_empty() {
        return Err(ApiError::not_found("No attendance records found"));
    }

    Ok(HttpResponse::Ok().json(rows))
}

/// Student roster for a subject/section/session within a fiscal year
#[utoipa::path(
    get,
    path = "/api/students",
    params(
        ("subject", Query, description = "Subject name"),
        ("section", Query, description = "Section name"),
        ("session", Query, description = "Time-slot label, e.g. 08:00 - 09:30"),
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024")
    ),
    responses(
        (status = 200, description = "Roster rows", body = [StudentRosterRow]),
        (status = 400, description = "Missing parameters"),
        (status = 404, description = "No students found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lookup"
)]
pub async fn students(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<StudentsQuery>,
) -> Result<HttpResponse, ApiError> {
    let subject = required(
        query.subject.as_deref(),
        "Subject, Section, Session, and Fiscal Year are required",
    )?;
    let section = required(
        query.section.as_deref(),
        "Subject, Section, Session, and Fiscal Year are required",
    )?;
    let session = required(
        query.session.as_deref(),
        "Subject, Section, Session, and Fiscal Year are required",
    )?;
    let fiscal_year = required(
        query.fiscal_year.as_deref(),
        "Subject, Section, Session, and Fiscal Year are required",
    )?;
    let ctx = RequestContext::resolve(pool.get_ref(), &auth, fiscal_year, None).await?;

    let rows = sqlx::query_as::<_, StudentRosterRow>(
        r#"
        SELECT
            sa.student_number,
            st.student_name,
            DATE_FORMAT(sa.attendance_date, '%Y-%m-%d') AS attendance_date,
            CASE
                WHEN sa.time_in IS NULL THEN 'N/A'
                ELSE TIME_FORMAT(sa.time_in, '%h:%i %p')
            END AS time_in,
            CASE
                WHEN sa.time_out IS NULL THEN 'N/A'
                ELSE TIME_FORMAT(sa.time_out, '%h:%i %p')
            END AS time_out,
            st.unique_code AS barcode
        FROM students st
        JOIN student_attendance sa ON st.id = sa.student_id
        JOIN schedules sch ON sa.schedule_id = sch.id
        JOIN sections sec ON sch.section_id = sec.id
        JOIN subjects sub ON sch.subject_id = sub.id
        JOIN time_slots ts ON sch.time_slot_id = ts.id
        WHERE sub.subject_name = ?
            AND sec.section_name = ?
            AND CONCAT(TIME_FORMAT(ts.time_start, '%H:%i'), ' - ', TIME_FORMAT(ts.time_end, '%H:%i')) = ?
            AND sch.fiscal_year_id = ?
        "#,
    )
    .bind(subject)
    .bind(section)
    .bind(session)
    .bind(ctx.fiscal_year_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching students"))?;

    if rows.is_empty() {
        return Err(ApiError::not_found("No students found"));
    }

    Ok(HttpResponse::Ok().json(rows))
}

/// Student number lookup by barcode
#[utoipa::path(
    get,
    path = "/api/student-number",
    params(
        ("barcode", Query, description = "Student barcode payload")
    ),
    responses(
        (status = 200, description = "Student number", body = Object, example = json!({
            "studentNumber": "2021-00123"
        })),
        (status = 400, description = "Barcode is required"),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lookup"
)]
pub async fn student_number(
    pool: web::Data<MySqlPool>,
    query: web::Query<BarcodeQuery>,
) -> Result<HttpResponse, ApiError> {
    let barcode = required(query.barcode.as_deref(), "Barcode is required")?;

    let student_number: Option<String> = sqlx::query_scalar(
        "SELECT student_number FROM students WHERE unique_code = ?",
    )
    .bind(barcode)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ApiError::store("Database query failed"))?;

    match student_number {
        Some(number) => Ok(HttpResponse::Ok().json(json!({ "studentNumber": number }))),
        None => Err(ApiError::not_found("Student not found")),
    }
}

/// All fiscal years known to the store
#[utoipa::path(
    get,
    path = "/api/fiscal-years",
    responses(
        (status = 200, description = "Fiscal years", body = Object, example = json!({
            "success": true,
            "fiscalYears": [{"id": 1, "year_value": 2024, "year_name": "AY 2024-2025"}]
        })),
        (status = 404, description = "No fiscal years found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lookup"
)]
pub async fn fiscal_years(pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, FiscalYear>(
        "SELECT id, year_value, year_name FROM fiscal_years",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching fiscal years"))?;

    if rows.is_empty() {
        return Err(ApiError::not_found("No fiscal years found."));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "fiscalYears": rows,
    })))
}

/// Semesters belonging to a fiscal year
#[utoipa::path(
    get,
    path = "/api/semesters",
    params(
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024")
    ),
    responses(
        (status = 200, description = "Semesters", body = Object, example = json!({
            "success": true,
            "semesters": [{"id": 1, "semester_name": "First Semester", "start_date": "2024-08-05"}]
        })),
        (status = 400, description = "Invalid fiscal year"),
        (status = 404, description = "No semesters found for this fiscal year"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lookup"
)]
pub async fn semesters(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<FiscalYearQuery>,
) -> Result<HttpResponse, ApiError> {
    let fiscal_year = required(
        query.fiscal_year.as_deref(),
        "No fiscal year provided.",
    )?;
    let ctx = RequestContext::resolve(pool.get_ref(), &auth, fiscal_year, None).await?;

    let rows = sqlx::query_as::<_, Semester>(
        "SELECT id, semester_name, start_date FROM semesters WHERE fiscal_year_id = ?",
    )
    .bind(ctx.fiscal_year_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching semesters"))?;

    if rows.is_empty() {
        return Err(ApiError::not_found("No semesters found for this fiscal year."));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "semesters": rows,
    })))
}
