//! Booking lookup and cancellation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::BookingId;
use domain::BookingRecord;
use seat_store::SeatStore;
use serde::Serialize;

use super::AppState;
use super::identity::Caller;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub seats_booked: u32,
    pub status: String,
    pub created_at: String,
}

impl From<BookingRecord> for BookingResponse {
    fn from(booking: BookingRecord) -> Self {
        Self {
            id: booking.id.to_string(),
            user_id: booking.user_id.to_string(),
            event_id: booking.event_id.to_string(),
            seats_booked: booking.seats_booked,
            status: booking.status.as_str().to_string(),
            created_at: booking.created_at.to_rfc3339(),
        }
    }
}

/// GET /bookings/{id}: a booking visible to its owner or an administrator.
#[tracing::instrument(skip(state), fields(user_id = %caller.user_id))]
pub async fn get<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state
        .engine
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking {id} not found")))?;

    if !caller.is_privileged && !booking.is_owned_by(caller.user_id) {
        return Err(ApiError::Forbidden(format!(
            "User {} may not view booking {id}",
            caller.user_id
        )));
    }

    Ok(Json(booking.into()))
}

/// POST /bookings/{id}/cancel: cancel a booking and release its seats.
///
/// Repeating the call on a cancelled booking returns it unchanged.
#[tracing::instrument(skip(state), fields(user_id = %caller.user_id))]
pub async fn cancel<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state
        .engine
        .cancel(booking_id, caller.user_id, caller.is_privileged)
        .await?;

    Ok(Json(booking.into()))
}

fn parse_booking_id(id: &str) -> Result<BookingId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
