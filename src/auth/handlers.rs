use crate::{
    auth::jwt::generate_access_token,
    config::Config,
    models::{BarcodeLoginReq, ManualLoginReq, ProfessorSql},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

use crate::utils::code_cache;
use crate::utils::code_filter;

/// Resolve an access code to a professor, cheapest check first:
/// cuckoo filter (fast negative) → moka cache (fast positive) → database.
pub async fn resolve_professor(
    code: &str,
    pool: &MySqlPool,
) -> Result<Option<(u64, String)>, sqlx::Error> {
    // 1️⃣ Cuckoo filter — fast negative for garbage scans
    if !code_filter::might_exist(code) {
        return Ok(None);
    }

    // 2️⃣ Moka cache — fast positive
    if let Some(hit) = code_cache::lookup(code).await {
        return Ok(Some(hit));
    }

    // 3️⃣ Database fallback
    let professor = sqlx::query_as::<_, ProfessorSql>(
        r#"
        SELECT id, name, unique_code
        FROM professors
        WHERE unique_code = ?
        "#,
    )
    .bind(code.trim())
    .fetch_optional(pool)
    .await?;

    if let Some(p) = &professor {
        code_cache::remember(&p.unique_code, p.id, &p.name).await;
    }

    Ok(professor.map(|p| (p.id, p.name)))
}

fn issue_token(professor_id: u64, code: &str, name: &str, config: &Config) -> String {
    generate_access_token(
        professor_id,
        code.trim().to_string(),
        name.to_string(),
        &config.jwt_secret,
        config.access_token_ttl,
    )
}

/// Manual login with a typed access code
#[utoipa::path(
    post,
    path = "/auth/manual-login",
    request_body = ManualLoginReq,
    responses(
        (status = 200, description = "Login result", body = Object, example = json!({
            "success": true,
            "accessToken": "eyJhbGciOi...",
            "professorName": "Ada Lovelace"
        })),
        (status = 401, description = "Unknown access code"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "manual_login", skip(pool, config, body))]
pub async fn manual_login(
    body: web::Json<ManualLoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Manual login request received");

    let code = body.code.trim();
    if code.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Access code is required."
        }));
    }

    debug!("Resolving access code");

    match resolve_professor(code, pool.get_ref()).await {
        Ok(Some((professor_id, name))) => {
            info!(professor_id, "Login successful");
            let token = issue_token(professor_id, code, &name, config.get_ref());
            HttpResponse::Ok().json(json!({
                "success": true,
                "accessToken": token,
                "professorName": name,
            }))
        }
        Ok(None) => {
            info!("Access code not found, login failed");
            HttpResponse::Unauthorized().json(json!({
                "success": false,
                "message": "Invalid access code! Please try again."
            }))
        }
        Err(e) => {
            error!(error = %e, "Database error during manual login");
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": "Database error"
            }))
        }
    }
}

/// Barcode login with a scanned access code
#[utoipa::path(
    post,
    path = "/auth/barcode-login",
    request_body = BarcodeLoginReq,
    responses(
        (status = 200, description = "Login result", body = Object, example = json!({
            "success": true,
            "accessToken": "eyJhbGciOi...",
            "professorName": "Ada Lovelace"
        })),
        (status = 400, description = "Empty scan"),
        (status = 401, description = "Unknown barcode"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "barcode_login", skip(pool, config, body))]
pub async fn barcode_login(
    body: web::Json<BarcodeLoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let barcode = body.barcode.trim();

    if barcode.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "No barcode scanned. Please scan a barcode."
        }));
    }

    debug!("Resolving scanned barcode");

    match resolve_professor(barcode, pool.get_ref()).await {
        Ok(Some((professor_id, name))) => {
            info!(professor_id, "Barcode login successful");
            let token = issue_token(professor_id, barcode, &name, config.get_ref());
            HttpResponse::Ok().json(json!({
                "success": true,
                "accessToken": token,
                "professorName": name,
            }))
        }
        Ok(None) => HttpResponse::Unauthorized().json(json!({
            "success": false,
            "message": "Invalid barcode! Please try again."
        })),
        Err(e) => {
            error!(error = %e, "Database error during barcode login");
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": "Database error"
            }))
        }
    }
}

/// Logout is stateless: tokens simply expire, the client discards its copy.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logged out")
    ),
    tag = "Auth"
)]
pub async fn logout() -> impl Responder {
    HttpResponse::NoContent().finish()
}
