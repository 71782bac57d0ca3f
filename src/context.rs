use crate::{auth::auth::AuthProfessor, error::ApiError};
use sqlx::MySqlPool;

/// Per-request resolved identity and scope.
///
/// Professor identity comes from the bearer token; fiscal year and semester
/// arrive as explicit request parameters. There is no server-side session.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub professor_id: u64,
    pub fiscal_year_id: u64,
    pub semester_id: Option<u64>,
}

impl RequestContext {
    /// Resolves a fiscal year *value* (e.g. "2024") to its row id through the
    /// `fiscal_years` lookup table.
    pub async fn resolve(
        pool: &MySqlPool,
        auth: &AuthProfessor,
        fiscal_year: &str,
        semester_id: Option<u64>,
    ) -> Result<Self, ApiError> {
        let year_value: u16 = fiscal_year
            .trim()
            .parse()
            .map_err(|_| ApiError::validation("Invalid fiscal year provided."))?;

        let fiscal_year_id: Option<u64> =
            sqlx::query_scalar("SELECT id FROM fiscal_years WHERE year_value = ?")
                .bind(year_value)
                .fetch_optional(pool)
                .await
                .map_err(ApiError::store("Error resolving fiscal year"))?;

        let fiscal_year_id = fiscal_year_id
            .ok_or_else(|| ApiError::validation("Invalid fiscal year provided."))?;

        Ok(Self {
            professor_id: auth.professor_id,
            fiscal_year_id,
            semester_id,
        })
    }
}
