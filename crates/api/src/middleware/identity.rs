//! Requester identity extractors.
//!
//! The chat transport in front of this server has already authenticated the
//! user; it forwards the opaque identity in the `x-requester-id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use reelq_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the requester identity.
pub const REQUESTER_HEADER: &str = "x-requester-id";

/// Identity of the caller, taken from [`REQUESTER_HEADER`].
///
/// ```ignore
/// async fn my_handler(requester: Requester) -> AppResult<Json<()>> {
///     tracing::info!(requester_id = %requester.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Requester {
    /// Opaque identity assigned by the transport.
    pub id: String,
    /// Whether the identity is in the configured admin set.
    pub is_admin: bool,
}

impl FromRequestParts<AppState> for Requester {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(REQUESTER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(format!(
                    "Missing {REQUESTER_HEADER} header"
                )))
            })?;

        Ok(Requester {
            id: id.to_string(),
            is_admin: state.admin.is_admin(id),
        })
    }
}

/// Requires an admin identity. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub Requester);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let requester = Requester::from_request_parts(parts, state).await?;
        if !requester.is_admin {
            tracing::info!(requester_id = %requester.id, "Admin route refused");
            return Err(AppError::Core(CoreError::Forbidden(
                reelq_core::messages::MSG_NOT_ADMIN.into(),
            )));
        }
        Ok(RequireAdmin(requester))
    }
}
