use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use roam_core::repository::{TripDetail, TripWithCreator};
use roam_core::search::{parse_date_param, TripFilter};
use roam_core::trip::{NewTrip, Trip, TripPatch};
use roam_core::user::UserSummary;

use crate::error::AppError;
use crate::middleware::auth::CustomerClaims;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Raw listing query. Dates arrive as strings so malformed values can
/// be dropped instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct TripQuery {
    pub search: Option<String>,
    pub destination: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

impl From<TripQuery> for TripFilter {
    fn from(q: TripQuery) -> Self {
        TripFilter {
            search: q.search.filter(|s| !s.trim().is_empty()),
            destination: q.destination.filter(|s| !s.trim().is_empty()),
            start_date: parse_date_param(q.start_date.as_deref()),
            end_date: parse_date_param(q.end_date.as_deref()),
        }
    }
}

/// Listing row: creator expanded, travelers left as ids.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripListItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub max_capacity: i32,
    pub current_bookings: i32,
    pub image: String,
    pub creator: UserSummary,
    pub booked_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<TripWithCreator> for TripListItem {
    fn from(row: TripWithCreator) -> Self {
        let trip = row.trip;
        Self {
            id: trip.id,
            title: trip.title,
            description: trip.description,
            destination: trip.destination,
            start_date: trip.start_date,
            end_date: trip.end_date,
            price: trip.price,
            max_capacity: trip.max_capacity,
            current_bookings: trip.current_bookings,
            image: trip.image,
            creator: row.creator,
            booked_by: trip.booked_by,
            created_at: trip.created_at,
        }
    }
}

/// Detail view: creator and travelers both expanded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub max_capacity: i32,
    pub current_bookings: i32,
    pub available_spots: i32,
    pub image: String,
    pub creator: UserSummary,
    pub booked_by: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
}

impl From<TripDetail> for TripDetailResponse {
    fn from(detail: TripDetail) -> Self {
        let trip = detail.trip;
        Self {
            id: trip.id,
            title: trip.title,
            description: trip.description,
            destination: trip.destination,
            start_date: trip.start_date,
            end_date: trip.end_date,
            price: trip.price,
            max_capacity: trip.max_capacity,
            current_bookings: trip.current_bookings,
            available_spots: trip.max_capacity - trip.current_bookings,
            image: trip.image,
            creator: detail.creator,
            booked_by: detail.travelers,
            created_at: trip.created_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /trips
/// List trips, optionally filtered by text search, destination, and a
/// date window.
pub async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<TripQuery>,
) -> Result<Json<Vec<TripListItem>>, AppError> {
    let filter = TripFilter::from(query);
    let rows = state.trips.list(&filter).await?;
    Ok(Json(rows.into_iter().map(TripListItem::from).collect()))
}

/// GET /trips/:id
/// Retrieve a single trip with creator and travelers expanded.
pub async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<TripDetailResponse>, AppError> {
    let detail = state
        .trips
        .find_detail(trip_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("Trip not found".to_string()))?;

    Ok(Json(detail.into()))
}

/// POST /trips
/// Create a trip owned by the authenticated user.
pub async fn create_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(new_trip): Json<NewTrip>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let creator = claims.user_id()?;
    new_trip
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let trip = state.trips.create(creator, new_trip).await?;
    tracing::info!("Trip {} created by {}", trip.id, creator);

    Ok((StatusCode::CREATED, Json(trip)))
}

/// POST /trips/:id/book
/// Take one seat on the trip for the authenticated user.
pub async fn book_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    let user_id = claims.user_id()?;
    let trip = state.trips.book(trip_id, user_id).await?;
    tracing::info!(
        "User {} booked trip {} ({}/{} seats taken)",
        user_id,
        trip_id,
        trip.current_bookings,
        trip.max_capacity
    );
    Ok(Json(trip))
}

/// POST /trips/:id/cancel
/// Give back the authenticated user's seat.
pub async fn cancel_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    let user_id = claims.user_id()?;
    let trip = state.trips.cancel(trip_id, user_id).await?;
    tracing::info!("User {} cancelled booking on trip {}", user_id, trip_id);
    Ok(Json(trip))
}

/// PUT /trips/:id
/// Partially update a trip. Creator only.
pub async fn update_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(trip_id): Path<Uuid>,
    Json(patch): Json<TripPatch>,
) -> Result<Json<Trip>, AppError> {
    let user_id = claims.user_id()?;

    // 1. Verify ownership
    let trip = state
        .trips
        .find_by_id(trip_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("Trip not found".to_string()))?;
    if trip.creator != user_id {
        return Err(AppError::AuthorizationError(
            "Not authorized to update this trip".to_string(),
        ));
    }

    // 2. Apply the patch; the repository revalidates against current
    //    state inside its transaction.
    let updated = state.trips.update(trip_id, &patch).await?;
    Ok(Json(updated))
}

/// DELETE /trips/:id
/// Delete a trip. Creator only.
pub async fn delete_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = claims.user_id()?;

    // 1. Verify ownership
    let trip = state
        .trips
        .find_by_id(trip_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("Trip not found".to_string()))?;
    if trip.creator != user_id {
        return Err(AppError::AuthorizationError(
            "Not authorized to delete this trip".to_string(),
        ));
    }

    state.trips.delete(trip_id).await?;
    tracing::info!("Trip {} deleted by {}", trip_id, user_id);

    Ok(Json(json!({ "message": "Trip deleted successfully" })))
}
