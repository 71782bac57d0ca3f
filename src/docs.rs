use crate::api::ingest::{InvalidRow, NewAttendanceRecord, RawCsvRow};
use crate::api::lookup::SessionSlot;
use crate::api::manage::CreateNameReq;
use crate::api::report::ReportRow;
use crate::api::schedule::InsertTimeSlotReq;
use crate::model::attendance::{AttendanceTableRow, AttendanceView, StudentRosterRow};
use crate::model::fiscal_year::{FiscalYear, Semester};
use crate::model::schedule::{DailyScheduleEntry, WeeklyScheduleEntry};
use crate::model::section::Section;
use crate::model::subject::Subject;
use crate::models::{BarcodeLoginReq, ManualLoginReq};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Class Attendance System API",
        version = "1.0.0",
        description = r#"
## Class Attendance Tracking System

This API powers a **class attendance** system for professors.

### 🔹 Key Features
- **Login**
  - Manual access-code login and barcode-scanner login
- **Attendance Ingestion**
  - Upload attendance CSVs with per-row validation and upsert semantics
- **Reports**
  - Export attendance as CSV or PDF over day/week/month/year windows
- **Navigation**
  - Subjects, sections, sessions, rosters and schedules scoped by fiscal year

### 🔐 Security
All data endpoints are protected using **JWT Bearer authentication**
issued at login.

### 📦 Response Format
- JSON-based RESTful responses
- File attachments for report downloads

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::manual_login,
        crate::auth::handlers::barcode_login,
        crate::auth::handlers::logout,

        crate::api::ingest::upload_attendance,
        crate::api::report::download_attendance,

        crate::api::lookup::subjects,
        crate::api::lookup::sections,
        crate::api::lookup::sessions,
        crate::api::lookup::attendance,
        crate::api::lookup::students,
        crate::api::lookup::student_number,
        crate::api::lookup::fiscal_years,
        crate::api::lookup::semesters,

        crate::api::schedule::insert_time_slot,
        crate::api::schedule::schedule_view,
        crate::api::schedule::save_schedule_changes,

        crate::api::manage::list_subjects,
        crate::api::manage::create_subject,
        crate::api::manage::update_subject,
        crate::api::manage::delete_subject,
        crate::api::manage::list_sections,
        crate::api::manage::create_section,
        crate::api::manage::delete_section
    ),
    components(
        schemas(
            ManualLoginReq,
            BarcodeLoginReq,
            RawCsvRow,
            NewAttendanceRecord,
            InvalidRow,
            AttendanceTableRow,
            AttendanceView,
            StudentRosterRow,
            ReportRow,
            Subject,
            Section,
            SessionSlot,
            FiscalYear,
            Semester,
            WeeklyScheduleEntry,
            DailyScheduleEntry,
            InsertTimeSlotReq,
            CreateNameReq
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Professor login APIs"),
        (name = "Attendance", description = "Attendance ingestion and export APIs"),
        (name = "Lookup", description = "Fiscal-year scoped navigation APIs"),
        (name = "Schedule", description = "Timetable and time-slot APIs"),
        (name = "Manage", description = "Subject and section management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
