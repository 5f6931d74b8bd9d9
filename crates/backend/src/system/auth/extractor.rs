use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use chrono::{DateTime, Utc};
use contracts::system::auth::{Session, TokenClaims};

/// Extractor for the acting agent's session, built from JWT claims
/// set by the auth middleware.
/// Usage in handlers: `async fn handler(CurrentSession(session): CurrentSession) -> Response`
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let login_time = DateTime::<Utc>::from_timestamp(claims.iat as i64, 0)
            .unwrap_or_else(Utc::now);

        Ok(CurrentSession(Session {
            agent_id: claims.sub,
            agent_name: claims.name,
            role: claims.role,
            login_time,
        }))
    }
}
