//! services/api/src/web/middleware.rs
//!
//! Identity middleware for protected routes.
//!
//! Authentication itself is an external collaborator: a gateway verifies
//! the caller and forwards the caller's id in the `x-user-id` header. This
//! middleware only extracts that id; role checks belong to the workflow
//! core, which answers `Forbidden` per operation.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use peer_review_core::domain::EntityId;

/// The authenticated caller's id, inserted into request extensions.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub EntityId);

/// Middleware that requires a parseable `x-user-id` header.
///
/// If present, inserts the caller's `Identity` into request extensions for
/// handlers to use. If missing or malformed, returns 401 Unauthorized.
pub async fn require_identity(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<EntityId>().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(Identity(user_id));

    Ok(next.run(req).await)
}
