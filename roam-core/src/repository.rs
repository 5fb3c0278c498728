use async_trait::async_trait;
use uuid::Uuid;

use crate::search::TripFilter;
use crate::trip::{BookingError, NewTrip, Trip, TripPatch};
use crate::user::{User, UserSummary};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error("{0}")]
    Validation(String),
    #[error("{0} already exists")]
    Duplicate(&'static str),
    #[error("storage error: {0}")]
    Storage(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// A listing row with the creator expanded to a summary.
#[derive(Debug, Clone)]
pub struct TripWithCreator {
    pub trip: Trip,
    pub creator: UserSummary,
}

/// A single trip with creator and travelers expanded. `travelers`
/// follows the booking order of `trip.booked_by`.
#[derive(Debug, Clone)]
pub struct TripDetail {
    pub trip: Trip,
    pub creator: UserSummary,
    pub travelers: Vec<UserSummary>,
}

/// Trip data access. `book` and `cancel` must apply their capacity and
/// membership preconditions atomically with the mutation, so that two
/// concurrent calls can never both take the last seat and the counter
/// can never drift from the set.
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn list(&self, filter: &TripFilter) -> RepoResult<Vec<TripWithCreator>>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Trip>>;

    async fn find_detail(&self, id: Uuid) -> RepoResult<Option<TripDetail>>;

    async fn create(&self, creator: Uuid, new_trip: NewTrip) -> RepoResult<Trip>;

    async fn update(&self, id: Uuid, patch: &TripPatch) -> RepoResult<Trip>;

    async fn delete(&self, id: Uuid) -> RepoResult<()>;

    async fn book(&self, trip_id: Uuid, user_id: Uuid) -> RepoResult<Trip>;

    async fn cancel(&self, trip_id: Uuid, user_id: Uuid) -> RepoResult<Trip>;
}

/// User data access.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with [`RepoError::Duplicate`] when the
    /// email is already registered.
    async fn create(&self, user: &User) -> RepoResult<()>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;
}
