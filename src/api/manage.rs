use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthProfessor,
    context::RequestContext,
    error::ApiError,
    model::{section::Section, subject::Subject},
    utils::db_utils::{build_update_sql, execute_update},
};

#[derive(Debug, Deserialize)]
pub struct ManageQuery {
    #[serde(rename = "fiscalYear")]
    pub fiscal_year: Option<String>,
    pub semester: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNameReq {
    #[schema(example = "Data Structures")]
    pub name: String,
}

async fn manage_context(
    pool: &MySqlPool,
    auth: &AuthProfessor,
    query: &ManageQuery,
) -> Result<RequestContext, ApiError> {
    let fiscal_year = query
        .fiscal_year
        .as_deref()
        .ok_or_else(|| ApiError::validation("Fiscal year or semester not selected."))?;
    let semester = query
        .semester
        .ok_or_else(|| ApiError::validation("Fiscal year or semester not selected."))?;

    RequestContext::resolve(pool, auth, fiscal_year, Some(semester)).await
}

/// Subjects the professor owns in a fiscal year + semester
#[utoipa::path(
    get,
    path = "/api/manage-subject",
    params(
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024"),
        ("semester", Query, description = "Semester id")
    ),
    responses(
        (status = 200, description = "Subjects", body = Object, example = json!({
            "success": true,
            "subjects": [{"subject_id": 4, "subject_name": "Data Structures"}]
        })),
        (status = 400, description = "Missing scope parameters"),
        (status = 404, description = "No subjects found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manage"
)]
pub async fn list_subjects(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<ManageQuery>,
) -> Result<HttpResponse, ApiError> {
    let ctx = manage_context(pool.get_ref(), &auth, &query).await?;

    let rows = sqlx::query_as::<_, Subject>(
        r#"
        SELECT s.id AS subject_id, s.subject_name
        FROM subjects s
        JOIN fiscal_year_subjects fys ON s.id = fys.subject_id
        WHERE fys.fiscal_year_id = ? AND fys.semester_id = ? AND s.professor_id = ?
        "#,
    )
    .bind(ctx.fiscal_year_id)
    .bind(ctx.semester_id)
    .bind(ctx.professor_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching subjects."))?;

    if rows.is_empty() {
        return Err(ApiError::not_found("No subjects found."));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "subjects": rows,
    })))
}

/// Create a subject and link it to the fiscal year + semester
#[utoipa::path(
    post,
    path = "/api/manage-subject",
    params(
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024"),
        ("semester", Query, description = "Semester id")
    ),
    request_body = CreateNameReq,
    responses(
        (status = 200, description = "Subject added", body = Object, example = json!({
            "success": true,
            "message": "Subject added successfully."
        })),
        (status = 400, description = "Missing name or scope parameters"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manage"
)]
pub async fn create_subject(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<ManageQuery>,
    body: web::Json<CreateNameReq>,
) -> Result<HttpResponse, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Subject name is required."));
    }

    let ctx = manage_context(pool.get_ref(), &auth, &query).await?;

    let result = sqlx::query("INSERT INTO subjects (subject_name, professor_id) VALUES (?, ?)")
        .bind(name)
        .bind(ctx.professor_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::store("Error adding subject."))?;

    let subject_id = result.last_insert_id();

    sqlx::query(
        "INSERT INTO fiscal_year_subjects (fiscal_year_id, semester_id, subject_id) VALUES (?, ?, ?)",
    )
    .bind(ctx.fiscal_year_id)
    .bind(ctx.semester_id)
    .bind(subject_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::store("Error linking subject."))?;

    info!(subject_id, name, "Subject created");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Subject added successfully.",
    })))
}

/// Rename a subject
#[utoipa::path(
    put,
    path = "/api/manage-subject/{id}",
    params(
        ("id", Path, description = "Subject id")
    ),
    responses(
        (status = 200, description = "Subject updated"),
        (status = 400, description = "Empty or unknown columns in payload"),
        (status = 404, description = "Subject not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manage"
)]
pub async fn update_subject(
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<HttpResponse> {
    let subject_id = path.into_inner();

    let update = build_update_sql("subjects", &["subject_name"], &body, "id", subject_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, subject_id, "Failed to update subject");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Subject not found.",
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Subject updated successfully.",
    })))
}

/// Delete a subject and its fiscal-year link
#[utoipa::path(
    delete,
    path = "/api/manage-subject/{id}",
    params(
        ("id", Path, description = "Subject id"),
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024"),
        ("semester", Query, description = "Semester id")
    ),
    responses(
        (status = 200, description = "Subject deleted", body = Object, example = json!({
            "success": true,
            "message": "Subject and its relationships deleted."
        })),
        (status = 400, description = "Missing scope parameters"),
        (status = 404, description = "Subject not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manage"
)]
pub async fn delete_subject(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<ManageQuery>,
) -> Result<HttpResponse, ApiError> {
    let subject_id = path.into_inner();
    let ctx = manage_context(pool.get_ref(), &auth, &query).await?;

    sqlx::query(
        "DELETE FROM fiscal_year_subjects WHERE subject_id = ? AND fiscal_year_id = ? AND semester_id = ?",
    )
    .bind(subject_id)
    .bind(ctx.fiscal_year_id)
    .bind(ctx.semester_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::store("Error deleting subject relationship."))?;

    let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(subject_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::store("Error deleting subject."))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Subject not found."));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Subject and its relationships deleted.",
    })))
}

/// Sections linked to a fiscal year + semester
#[utoipa::path(
    get,
    path = "/api/manage-section",
    params(
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024"),
        ("semester", Query, description = "Semester id")
    ),
    responses(
        (status = 200, description = "Sections", body = Object, example = json!({
            "success": true,
            "sections": [{"section_id": 2, "section_name": "BSCS 2-A"}]
        })),
        (status = 400, description = "Missing scope parameters"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manage"
)]
pub async fn list_sections(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<ManageQuery>,
) -> Result<HttpResponse, ApiError> {
    let ctx = manage_context(pool.get_ref(), &auth, &query).await?;

    let rows = sqlx::query_as::<_, Section>(
        r#"
        SELECT sec.id AS section_id, sec.section_name
        FROM sections sec
        JOIN fiscal_year_sections fys ON sec.id = fys.section_id
        WHERE fys.fiscal_year_id = ? AND fys.semester_id = ?
        "#,
    )
    .bind(ctx.fiscal_year_id)
    .bind(ctx.semester_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::store("Error fetching sections."))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "sections": rows,
    })))
}

/// Create a section and link it to the fiscal year + semester.
///
/// Sections are stored by name only; there is no section→subject column in
/// the schema, the association lives on schedule rows.
#[utoipa::path(
    post,
    path = "/api/manage-section",
    params(
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024"),
        ("semester", Query, description = "Semester id")
    ),
    request_body = CreateNameReq,
    responses(
        (status = 200, description = "Section added", body = Object, example = json!({
            "success": true,
            "message": "Section added successfully."
        })),
        (status = 400, description = "Missing name or scope parameters"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manage"
)]
pub async fn create_section(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    query: web::Query<ManageQuery>,
    body: web::Json<CreateNameReq>,
) -> Result<HttpResponse, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Section name is required."));
    }

    let ctx = manage_context(pool.get_ref(), &auth, &query).await?;

    let result = sqlx::query("INSERT INTO sections (section_name) VALUES (?)")
        .bind(name)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::store("Error adding section."))?;

    let section_id = result.last_insert_id();

    sqlx::query(
        "INSERT INTO fiscal_year_sections (fiscal_year_id, semester_id, section_id) VALUES (?, ?, ?)",
    )
    .bind(ctx.fiscal_year_id)
    .bind(ctx.semester_id)
    .bind(section_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::store("Error linking section."))?;

    info!(section_id, name, "Section created");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Section added successfully.",
    })))
}

/// Delete a section and its fiscal-year link
#[utoipa::path(
    delete,
    path = "/api/manage-section/{id}",
    params(
        ("id", Path, description = "Section id"),
        ("fiscalYear", Query, description = "Fiscal year value, e.g. 2024"),
        ("semester", Query, description = "Semester id")
    ),
    responses(
        (status = 200, description = "Section deleted", body = Object, example = json!({
            "success": true,
            "message": "Section and its relationships deleted."
        })),
        (status = 400, description = "Missing scope parameters"),
        (status = 404, description = "Section not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Manage"
)]
pub async fn delete_section(
    auth: AuthProfessor,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<ManageQuery>,
) -> Result<HttpResponse, ApiError> {
    let section_id = path.into_inner();
    let ctx = manage_context(pool.get_ref(), &auth, &query).await?;

    sqlx::query(
        "DELETE FROM fiscal_year_sections WHERE section_id = ? AND fiscal_year_id = ? AND semester_id = ?",
    )
    .bind(section_id)
    .bind(ctx.fiscal_year_id)
    .bind(ctx.semester_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::store("Error deleting section relationship."))?;

    let result = sqlx::query("DELETE FROM sections WHERE id = ?")
        .bind(section_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::store("Error deleting section."))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Section not found."));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Section and its relationships deleted.",
    })))
}
