//! Caller identity extractors.
//!
//! The gateway in front of the API authenticates users and forwards the
//! account id in the `x-user-id` header. The role is always looked up in the
//! account directory, never taken from the request.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use domain::Caller;
use store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated account id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller when the header is present, `None` for anonymous requests.
#[derive(Debug, Clone, Copy)]
pub struct MaybeCaller(pub Option<Caller>);

/// A caller that must be known. Rejects with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Caller);

impl<S> FromRequestParts<Arc<AppState<S>>> for MaybeCaller
where
    S: Store + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(MaybeCaller(None));
        };

        let id = value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or_else(|| ApiError::Unauthorized(format!("Invalid {USER_ID_HEADER} header")))?;

        let caller = state
            .accounts
            .resolve_caller(UserId::new(id))
            .await?
            .ok_or_else(|| ApiError::Unauthorized(format!("Unknown user {id}")))?;
        Ok(MaybeCaller(Some(caller)))
    }
}

impl<S> FromRequestParts<Arc<AppState<S>>> for Authenticated
where
    S: Store + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        match MaybeCaller::from_request_parts(parts, state).await? {
            MaybeCaller(Some(caller)) => Ok(Authenticated(caller)),
            MaybeCaller(None) => Err(ApiError::Unauthorized(
                "Authentication required".to_string(),
            )),
        }
    }
}
