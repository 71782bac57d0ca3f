use std::str::FromStr;

use actix_web::{
    HttpResponse, web,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
};
use chrono::{Datelike, Duration, NaiveDate};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportFormat {
    Csv,
    Pdf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportRange {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportQuery {
    pub format: String,
    pub range: String,
    #[schema(example = "2024-03-10", format = "date", value_type = String)]
    pub date: NaiveDate,
}

/// One exported attendance record. Status/remarks come back as literal
/// "N/A" when no annotation row exists, matching the rendered report.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct ReportRow {
    pub student_id: u64,
    pub schedule_id: u64,
    pub student_number: Option<String>,
    pub attendance_date: Option<String>,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub student_name: Option<String>,
    pub status: String,
    pub remarks: String,
}

/// Resolves a report range to a concrete inclusive date window.
pub fn resolve_window(range: ReportRange, date: NaiveDate) -> (NaiveDate, NaiveDate) {
    match range {
        ReportRange::Day => (date, date),
        ReportRange::Week => (date, date + Duration::days(6)),
        ReportRange::Month => {
            // Day 1 of the current month always exists; the month's last day
            // is the day before the first of the next month.
            let start = date.with_day(1).unwrap();
            let end = if date.month() == 12 {
                NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap()
            } else {
                NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
                    .unwrap()
                    .pred_opt()
                    .unwrap()
            };
            (start, end)
        }
        ReportRange::Year => (
            NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap(),
        ),
    }
}

/// Export attendance for a date window as CSV or PDF.
#[utoipa::path(
    get,
    path = "/download-attendance",
    params(
        ("format", Query, description = "csv or pdf"),
        ("range", Query, description = "day, week, month or year"),
        ("date", Query, description = "Anchor date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "File attachment named attendance-<range>-<date>.<ext>"),
        (status = 400, description = "Invalid format or range", body = Object, example = json!({
            "success": false,
            "message": "Invalid format."
        })),
        (status = 500, description = "Error downloading data")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn download_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, ApiError> {
    // Both selectors are checked before any query runs.
    let format = ReportFormat::from_str(&query.format)
        .map_err(|_| ApiError::validation("Invalid format."))?;
    let range = ReportRange::from_str(&query.range)
        .map_err(|_| ApiError::validation("Invalid range."))?;

    let (date_start, date_end) = resolve_window(range, query.date);

    tracing::debug!(%date_start, %date_end, %range, "Resolved report window");

    let rows = fetch_report_rows(pool.get_ref(), date_start, date_end).await?;

    let filename = format!("attendance-{}-{}.{}", range, query.date, format);
    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
    };

    match format {
        ReportFormat::Csv => {
            let body = render_csv(&rows)?;
            Ok(HttpResponse::Ok()
                .content_type("text/csv")
                .insert_header(disposition)
                .body(body))
        }
        ReportFormat::Pdf => {
            let body = render_pdf(&rows)?;
            Ok(HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header(disposition)
                .body(body))
        }
    }
}

async fn fetch_report_rows(
    pool: &MySqlPool,
    date_start: NaiveDate,
    date_end: NaiveDate,
) -> Result<Vec<ReportRow>, ApiError> {
    sqlx::query_as::<_, ReportRow>(
        r#"
        SELECT
            sa.student_id,
            sa.schedule_id,
            sa.student_number,
            DATE_FORMAT(sa.attendance_date, '%Y-%m-%d') AS attendance_date,
            TIME_FORMAT(sa.time_in, '%H:%i') AS time_in,
            TIME_FORMAT(sa.time_out, '%H:%i') AS time_out,
            s.student_name,
            IFNULL(ast.status, 'N/A') AS status,
            IFNULL(ast.remarks, 'N/A') AS remarks
        FROM student_attendance sa
        LEFT JOIN students s ON sa.student_id = s.id
        LEFT JOIN attendance_status ast ON sa.id = ast.student_attendance_id
        WHERE DATE(sa.attendance_date) BETWEEN ? AND ?
        "#,
    )
    .bind(date_start)
    .bind(date_end)
    .fetch_all(pool)
    .await
    .map_err(ApiError::store("Error downloading data."))
}

fn render_csv(rows: &[ReportRow]) -> Result<Vec<u8>, ApiError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    for row in rows {
        wtr.serialize(row)
            .map_err(ApiError::store("Error downloading data."))?;
    }

    wtr.into_inner()
        .map_err(ApiError::store("Error downloading data."))
}

fn render_pdf(rows: &[ReportRow]) -> Result<Vec<u8>, ApiError> {
    // A4 portrait, one text line per record, 6mm leading.
    let (doc, page, layer) = PdfDocument::new("Attendance Report", Mm(210.0), Mm(297.0), "report");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(ApiError::store("Error downloading data."))?;

    let mut current = doc.get_page(page).get_layer(layer);
    current.use_text("Attendance Report", 16.0, Mm(78.0), Mm(282.0), &font);

    let mut y = 270.0;
    current.use_text(
        "Student Number  |  Name  |  Time In  |  Time Out  |  Status  |  Remarks",
        10.0,
        Mm(10.0),
        Mm(y),
        &font,
    );
    y -= 6.0;

    for row in rows {
        if y < 15.0 {
            let (next_page, next_layer) = doc.add_page(Mm(210.0), Mm(297.0), "report");
            current = doc.get_page(next_page).get_layer(next_layer);
            y = 282.0;
        }

        let line = format!(
            "{}  |  {}  |  {}  |  {}  |  {}  |  {}",
            row.student_number.as_deref().unwrap_or("N/A"),
            row.student_name.as_deref().unwrap_or("N/A"),
            row.time_in.as_deref().unwrap_or("N/A"),
            row.time_out.as_deref().unwrap_or("N/A"),
            row.status,
            row.remarks,
        );
        current.use_text(line, 10.0, Mm(10.0), Mm(y), &font);
        y -= 6.0;
    }

    doc.save_to_bytes()
        .map_err(ApiError::store("Error downloading data."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_window_is_the_date_itself() {
        let (start, end) = resolve_window(ReportRange::Day, date(2024, 3, 10));
        assert_eq!(start, date(2024, 3, 10));
        assert_eq!(end, date(2024, 3, 10));
    }

    #[test]
    fn week_window_spans_seven_days() {
        let (start, end) = resolve_window(ReportRange::Week, date(2024, 3, 10));
        assert_eq!(start, date(2024, 3, 10));
        assert_eq!(end, date(2024, 3, 16));
    }

    #[test]
    fn month_window_covers_whole_month() {
        let (start, end) = resolve_window(ReportRange::Month, date(2024, 3, 15));
        assert_eq!(start, date(2024, 3, 1));
        assert_eq!(end, date(2024, 3, 31));
    }

    #[test]
    fn month_window_handles_leap_february() {
        let (start, end) = resolve_window(ReportRange::Month, date(2024, 2, 15));
        assert_eq!(start, date(2024, 2, 1));
        assert_eq!(end, date(2024, 2, 29));
    }

    #[test]
    fn month_window_handles_december() {
        let (_, end) = resolve_window(ReportRange::Month, date(2024, 12, 5));
        assert_eq!(end, date(2024, 12, 31));
    }

    #[test]
    fn year_window_covers_whole_year() {
        let (start, end) = resolve_window(ReportRange::Year, date(2024, 6, 1));
        assert_eq!(start, date(2024, 1, 1));
        assert_eq!(end, date(2024, 12, 31));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(ReportFormat::from_str("xml").is_err());
        assert_eq!(ReportFormat::from_str("csv").unwrap(), ReportFormat::Csv);
        assert_eq!(ReportFormat::from_str("PDF").unwrap(), ReportFormat::Pdf);
    }

    #[test]
    fn range_names_render_lowercase() {
        assert_eq!(ReportRange::Week.to_string(), "week");
        assert_eq!(ReportFormat::Pdf.to_string(), "pdf");
    }

    fn sample_row() -> ReportRow {
        ReportRow {
            student_id: 17,
            schedule_id: 3,
            student_number: Some("2021-00123".into()),
            attendance_date: Some("2024-03-10".into()),
            time_in: Some("08:02".into()),
            time_out: Some("09:28".into()),
            student_name: Some("Dela Cruz, Juan".into()),
            status: "Present".into(),
            remarks: "N/A".into(),
        }
    }

    #[test]
    fn csv_output_has_header_and_rows() {
        let body = render_csv(&[sample_row()]).unwrap();
        let text = String::from_utf8(body).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "student_id,schedule_id,student_number,attendance_date,time_in,time_out,student_name,status,remarks"
        );
        assert!(lines.next().unwrap().starts_with("17,3,2021-00123"));
    }

    #[test]
    fn pdf_output_is_a_pdf_document() {
        let body = render_pdf(&[sample_row()]).unwrap();
        assert!(body.starts_with(b"%PDF"));
    }
}
