//! Caller identity taken from request headers.
//!
//! Authentication happens upstream; this layer trusts the gateway to set
//! `x-user-id` and, for operators, `x-user-role: admin`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
const ADMIN_ROLE: &str = "admin";

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: UserId,
    pub is_privileged: bool,
}

impl Caller {
    /// Fails with `Forbidden` unless the caller is privileged.
    pub fn require_privileged(&self) -> Result<(), ApiError> {
        if self.is_privileged {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "User {} is not an administrator",
                self.user_id
            )))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated(format!("Missing {USER_ID_HEADER} header")))?
            .to_str()
            .map_err(|_| ApiError::Unauthenticated(format!("Unreadable {USER_ID_HEADER} header")))?;
        let user_id = raw
            .parse::<UserId>()
            .map_err(|e| ApiError::Unauthenticated(format!("Invalid {USER_ID_HEADER}: {e}")))?;

        let is_privileged = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|role| role.to_str().ok())
            .is_some_and(|role| role.eq_ignore_ascii_case(ADMIN_ROLE));

        Ok(Self {
            user_id,
            is_privileged,
        })
    }
}
