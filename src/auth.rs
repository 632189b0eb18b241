// src/auth.rs
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated caller, resolved from the bearer credential.
///
/// Token issuance lives in the external identity provider; what arrives here
/// is the opaque subject id it handed out. Routes that take this extractor
/// are authenticated-only; open routes simply omit it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

/// Pull the subject id out of an `Authorization` header value.
/// Anything that is not a well-formed bearer credential reads as anonymous.
pub fn bearer_subject(header: Option<&str>) -> Option<Uuid> {
    let value = header?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?;
    Uuid::parse_str(token.trim()).ok()
}

impl FromRequestParts<PgPool> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, pool: &PgPool) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let subject = bearer_subject(header).ok_or(ApiError::AuthenticationRequired)?;

        sqlx::query_as::<_, CurrentUser>("SELECT id, username FROM users WHERE id = $1")
            .bind(subject)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::AuthenticationRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(bearer_subject(None), None);
    }

    #[test]
    fn non_bearer_scheme_is_anonymous() {
        assert_eq!(bearer_subject(Some("Basic dXNlcjpwdw==")), None);
    }

    #[test]
    fn malformed_subject_is_anonymous() {
        assert_eq!(bearer_subject(Some("Bearer not-a-uuid")), None);
    }

    #[test]
    fn well_formed_bearer_resolves() {
        let id = Uuid::new_v4();
        let header = format!("Bearer {id}");
        assert_eq!(bearer_subject(Some(&header)), Some(id));
    }
}
