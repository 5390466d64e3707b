use actix_web::http::header;
use actix_web::{web, HttpRequest};
use uuid::Uuid;

use super::blocking;
use crate::domain::identity::Caller;
use crate::domain::ports::Backend;
use crate::errors::AppError;

pub const SESSION_COOKIE: &str = "session_token";

/// Session token from `Authorization: Bearer <uuid>`, falling back to the
/// session cookie. Malformed tokens count as absent.
pub fn session_token(req: &HttpRequest) -> Option<Uuid> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| Uuid::parse_str(token.trim()).ok());

    from_header.or_else(|| {
        req.cookie(SESSION_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value().trim()).ok())
    })
}

/// Resolves the caller behind the request, if any. Anonymous requests yield
/// `None`; each operation decides whether that is acceptable.
pub async fn current_caller<S: Backend>(
    store: &web::Data<S>,
    req: &HttpRequest,
) -> Result<Option<Caller>, AppError> {
    let Some(token) = session_token(req) else {
        return Ok(None);
    };
    let store = store.clone();
    let caller = blocking(move || store.resolve(token)).await?;
    if caller.is_none() {
        log::debug!("Session token did not resolve to a live session");
    }
    Ok(caller)
}
