//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reservation::{CancellationError, CapacityError, ErrorKind, ReservationError};
use seat_store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Every engine error carries an [`ErrorKind`]; the kind picks the status
/// and its stable code goes into the body so clients can tell "sold out"
/// apart from "event already started" without parsing messages.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// No usable caller identity on the request.
    Unauthenticated(String),
    /// Caller is known but not allowed to do this.
    Forbidden(String),
    /// Reservation rejected by the engine.
    Reservation(ReservationError),
    /// Cancellation rejected by the engine.
    Cancellation(CancellationError),
    /// Capacity change rejected by the engine.
    Capacity(CapacityError),
    /// Store failure outside an engine operation.
    Store(StoreError),
}

impl ApiError {
    /// Returns the HTTP status and stable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorKind::NotFound.as_str()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorKind::InvalidInput.as_str()),
            ApiError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, ErrorKind::Unauthorized.as_str()),
            ApiError::Reservation(err) => kind_response(err.kind()),
            ApiError::Cancellation(err) => kind_response(err.kind()),
            ApiError::Capacity(err) => kind_response(err.kind()),
            ApiError::Store(StoreError::Duplicate(_)) => (StatusCode::CONFLICT, "duplicate"),
            ApiError::Store(err) => kind_response(ErrorKind::from(err)),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg) => msg.clone(),
            ApiError::Reservation(err) => err.to_string(),
            ApiError::Cancellation(err) => err.to_string(),
            ApiError::Capacity(err) => err.to_string(),
            ApiError::Store(err) => err.to_string(),
        }
    }
}

fn kind_response(kind: ErrorKind) -> (StatusCode, &'static str) {
    let status = match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState | ErrorKind::InsufficientCapacity => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::LockTimeout | ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::HookFailed | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, kind.as_str())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(error = %message, code, "request failed");
        }

        let body = serde_json::json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        ApiError::Reservation(err)
    }
}

impl From<CancellationError> for ApiError {
    fn from(err: CancellationError) -> Self {
        ApiError::Cancellation(err)
    }
}

impl From<CapacityError> for ApiError {
    fn from(err: CapacityError) -> Self {
        ApiError::Capacity(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use common::{BookingId, EventId, UserId};

    use super::*;

    #[test]
    fn sold_out_and_past_event_share_status_but_not_code() {
        let sold_out = ApiError::from(ReservationError::InsufficientCapacity {
            requested: 3,
            available: 1,
        });
        let past = ApiError::from(ReservationError::EventInPast {
            event_id: EventId::new(),
            event_date: chrono::Utc::now(),
        });

        assert_eq!(
            sold_out.status_and_code(),
            (StatusCode::CONFLICT, "insufficient_capacity")
        );
        assert_eq!(past.status_and_code(), (StatusCode::CONFLICT, "invalid_state"));
    }

    #[test]
    fn not_your_booking_is_forbidden() {
        let err = ApiError::from(CancellationError::Unauthorized {
            booking_id: BookingId::new(),
            user_id: UserId::new(),
        });
        assert_eq!(err.status_and_code(), (StatusCode::FORBIDDEN, "unauthorized"));
    }

    #[test]
    fn retryable_errors_are_service_unavailable() {
        let err = ApiError::from(ReservationError::Store(StoreError::LockTimeout(
            "event row".to_string(),
        )));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "lock_timeout")
        );

        let err = ApiError::from(StoreError::Conflict("serialization".to_string()));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "transient")
        );

        let err = ApiError::from(StoreError::from(sqlx::Error::PoolTimedOut));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "transient")
        );
    }

    #[test]
    fn zero_seats_is_bad_request() {
        let err = ApiError::from(ReservationError::InvalidSeatCount);
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "invalid_input"));
    }

    #[test]
    fn missing_identity_is_unauthenticated() {
        let err = ApiError::Unauthenticated("missing x-user-id".to_string());
        assert_eq!(
            err.status_and_code(),
            (StatusCode::UNAUTHORIZED, "unauthenticated")
        );
    }
}
