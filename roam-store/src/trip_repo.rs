use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use roam_core::repository::{
    RepoError, RepoResult, TripDetail, TripRepository, TripWithCreator,
};
use roam_core::search::TripFilter;
use roam_core::trip::{BookingError, NewTrip, Trip, TripPatch};
use roam_core::user::UserSummary;

pub struct PostgresTripRepository {
    pool: PgPool,
}

impl PostgresTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    title: String,
    description: String,
    destination: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    price: f64,
    max_capacity: i32,
    current_bookings: i32,
    image: String,
    creator: Uuid,
    booked_by: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Trip {
            id: row.id,
            title: row.title,
            description: row.description,
            destination: row.destination,
            start_date: row.start_date,
            end_date: row.end_date,
            price: row.price,
            max_capacity: row.max_capacity,
            current_bookings: row.current_bookings,
            image: row.image,
            creator: row.creator,
            booked_by: row.booked_by,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TripListRow {
    #[sqlx(flatten)]
    trip: TripRow,
    creator_name: String,
    creator_email: String,
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: Uuid,
    name: String,
    email: String,
}

impl From<SummaryRow> for UserSummary {
    fn from(row: SummaryRow) -> Self {
        UserSummary {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}

const TRIP_COLUMNS: &str = "id, title, description, destination, start_date, end_date, \
     price, max_capacity, current_bookings, image, creator, booked_by, created_at";

/// How many times `book`/`cancel` re-attempt the conditional update
/// when the re-read shows the precondition transiently satisfiable
/// (a concurrent cancel freed a seat between attempt and re-read).
const CONDITIONAL_UPDATE_ATTEMPTS: u32 = 3;

fn storage(err: sqlx::Error) -> RepoError {
    RepoError::Storage(err.to_string())
}

fn like_pattern(raw: &str) -> String {
    // LIKE metacharacters in user input must match literally.
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl TripRepository for PostgresTripRepository {
    async fn list(&self, filter: &TripFilter) -> RepoResult<Vec<TripWithCreator>> {
        let search = filter.search.as_deref().map(like_pattern);
        let destination = filter.destination.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, TripListRow>(
            r#"
            SELECT
                t.id, t.title, t.description, t.destination,
                t.start_date, t.end_date, t.price,
                t.max_capacity, t.current_bookings, t.image,
                t.creator, t.booked_by, t.created_at,
                u.name AS creator_name, u.email AS creator_email
            FROM trips t
            JOIN users u ON u.id = t.creator
            WHERE ($1::text IS NULL OR t.title ILIKE $1 OR t.description ILIKE $1)
              AND ($2::text IS NULL OR t.destination ILIKE $2)
              AND ($3::date IS NULL OR t.end_date >= $3)
              AND ($4::date IS NULL OR t.start_date <= $4)
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(search)
        .bind(destination)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows
            .into_iter()
            .map(|row| TripWithCreator {
                creator: UserSummary {
                    id: row.trip.creator,
                    name: row.creator_name,
                    email: row.creator_email,
                },
                trip: row.trip.into(),
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Trip>> {
        let row = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        Ok(row.map(Trip::from))
    }

    async fn find_detail(&self, id: Uuid) -> RepoResult<Option<TripDetail>> {
        let Some(trip) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let creator = sqlx::query_as::<_, SummaryRow>(
            "SELECT id, name, email FROM users WHERE id = $1",
        )
        .bind(trip.creator)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;

        let travelers = sqlx::query_as::<_, SummaryRow>(
            "SELECT id, name, email FROM users WHERE id = ANY($1)",
        )
        .bind(&trip.booked_by)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        // ANY() does not preserve order; restore booking order.
        let mut by_id: HashMap<Uuid, UserSummary> = travelers
            .into_iter()
            .map(|row| (row.id, row.into()))
            .collect();
        let travelers = trip
            .booked_by
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        Ok(Some(TripDetail {
            creator: creator.into(),
            travelers,
            trip,
        }))
    }

    async fn create(&self, creator: Uuid, new_trip: NewTrip) -> RepoResult<Trip> {
        let trip = new_trip.into_trip(creator);

        sqlx::query(
            r#"
            INSERT INTO trips
                (id, title, description, destination, start_date, end_date,
                 price, max_capacity, current_bookings, image, creator,
                 booked_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(trip.id)
        .bind(&trip.title)
        .bind(&trip.description)
        .bind(&trip.destination)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(trip.price)
        .bind(trip.max_capacity)
        .bind(trip.current_bookings)
        .bind(&trip.image)
        .bind(trip.creator)
        .bind(&trip.booked_by)
        .bind(trip.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(trip)
    }

    async fn update(&self, id: Uuid, patch: &TripPatch) -> RepoResult<Trip> {
        // The capacity check in TripPatch::apply must bind to current
        // state, so the row stays locked until the write commits.
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let row = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;

        let mut trip: Trip = row.ok_or(RepoError::NotFound("Trip"))?.into();
        patch
            .apply(&mut trip)
            .map_err(|e| RepoError::Validation(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE trips
            SET title = $2, description = $3, destination = $4,
                start_date = $5, end_date = $6, price = $7,
                max_capacity = $8, image = $9
            WHERE id = $1
            "#,
        )
        .bind(trip.id)
        .bind(&trip.title)
        .bind(&trip.description)
        .bind(&trip.destination)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(trip.price)
        .bind(trip.max_capacity)
        .bind(&trip.image)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        Ok(trip)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let res = sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if res.rows_affected() < 1 {
            return Err(RepoError::NotFound("Trip"));
        }
        Ok(())
    }

    async fn book(&self, trip_id: Uuid, user_id: Uuid) -> RepoResult<Trip> {
        for _ in 0..CONDITIONAL_UPDATE_ATTEMPTS {
            // The capacity and membership preconditions ride in the
            // WHERE clause, so check and mutation are one statement and
            // two concurrent calls can never both take the last seat.
            let row = sqlx::query_as::<_, TripRow>(&format!(
                r#"
                UPDATE trips
                SET booked_by = array_append(booked_by, $2),
                    current_bookings = current_bookings + 1
                WHERE id = $1
                  AND current_bookings < max_capacity
                  AND NOT ($2 = ANY(booked_by))
                RETURNING {TRIP_COLUMNS}
                "#
            ))
            .bind(trip_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

            if let Some(row) = row {
                return Ok(row.into());
            }

            // The condition did not hold at update time. Re-read to
            // find out why.
            let current = self
                .find_by_id(trip_id)
                .await?
                .ok_or(RepoError::NotFound("Trip"))?;
            if current.booked_by.contains(&user_id) {
                return Err(BookingError::AlreadyBooked.into());
            }
            if current.is_full() {
                return Err(BookingError::TripFull.into());
            }
            // A concurrent cancel freed a seat between the update and
            // the re-read; take another attempt.
        }

        Err(RepoError::Storage(format!(
            "booking for trip {} did not settle after {} attempts",
            trip_id, CONDITIONAL_UPDATE_ATTEMPTS
        )))
    }

    async fn cancel(&self, trip_id: Uuid, user_id: Uuid) -> RepoResult<Trip> {
        for _ in 0..CONDITIONAL_UPDATE_ATTEMPTS {
            let row = sqlx::query_as::<_, TripRow>(&format!(
                r#"
                UPDATE trips
                SET booked_by = array_remove(booked_by, $2),
                    current_bookings = current_bookings - 1
                WHERE id = $1
                  AND $2 = ANY(booked_by)
                RETURNING {TRIP_COLUMNS}
                "#
            ))
            .bind(trip_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

            if let Some(row) = row {
                return Ok(row.into());
            }

            let current = self
                .find_by_id(trip_id)
                .await?
                .ok_or(RepoError::NotFound("Trip"))?;
            if !current.booked_by.contains(&user_id) {
                return Err(BookingError::NotBooked.into());
            }
            // The user's booking landed between the update and the
            // re-read; take another attempt.
        }

        Err(RepoError::Storage(format!(
            "cancellation for trip {} did not settle after {} attempts",
            trip_id, CONDITIONAL_UPDATE_ATTEMPTS
        )))
    }
}
