//! Event inventory endpoints and the reservation trigger.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::EventId;
use domain::EventInventory;
use seat_store::SeatStore;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::bookings::BookingResponse;
use super::identity::Caller;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub total_seats: u32,
    pub event_date: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct AdjustCapacityRequest {
    pub total_seats: u32,
}

#[derive(Deserialize)]
pub struct ReserveRequest {
    /// Signed so that negative counts get the same error as zero.
    pub seat_count: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub total_seats: u32,
    pub seats_available: u32,
    pub booked_seats: u32,
    pub event_date: String,
}

impl From<EventInventory> for EventResponse {
    fn from(event: EventInventory) -> Self {
        Self {
            id: event.id.to_string(),
            booked_seats: event.booked_seats(),
            title: event.title,
            total_seats: event.total_seats,
            seats_available: event.seats_available,
            event_date: event.event_date.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /events: seed a new event. Administrators only.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    caller.require_privileged()?;
    let Json(req) = payload?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let event = EventInventory::new(title, req.total_seats, req.event_date);
    state.engine.create_event(&event).await?;

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// GET /events/{id}: current inventory of an event.
#[tracing::instrument(skip(state))]
pub async fn get<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>, ApiError> {
    let event_id = parse_event_id(&id)?;
    let event = state
        .engine
        .get_event(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event {id} not found")))?;

    Ok(Json(event.into()))
}

/// PUT /events/{id}/capacity: change the total seat count. Administrators only.
#[tracing::instrument(skip(state, payload))]
pub async fn adjust_capacity<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<AdjustCapacityRequest>, JsonRejection>,
) -> Result<Json<EventResponse>, ApiError> {
    caller.require_privileged()?;
    let event_id = parse_event_id(&id)?;
    let Json(req) = payload?;

    let event = state
        .engine
        .adjust_capacity(event_id, req.total_seats)
        .await?;

    Ok(Json(event.into()))
}

/// POST /events/{id}/bookings: reserve seats for the caller.
#[tracing::instrument(skip(state, payload), fields(user_id = %caller.user_id))]
pub async fn reserve<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<ReserveRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let event_id = parse_event_id(&id)?;
    let Json(req) = payload?;
    let seat_count = u32::try_from(req.seat_count)
        .map_err(|_| ApiError::BadRequest(format!("Invalid seat_count: {}", req.seat_count)))?;

    let booking = state
        .engine
        .reserve(caller.user_id, event_id, seat_count)
        .await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

fn parse_event_id(id: &str) -> Result<EventId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
