use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable trip with a fixed date range, price, and seat capacity.
///
/// `current_bookings` is a denormalized counter that must equal
/// `booked_by.len()` at all times; `book` and `cancel` are the only
/// mutation paths and keep the two in lockstep. `booked_by` retains
/// insertion order and never contains duplicates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
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
    pub creator: Uuid,
    pub booked_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn available_spots(&self) -> i32 {
        self.max_capacity - self.current_bookings
    }

    pub fn is_full(&self) -> bool {
        self.current_bookings >= self.max_capacity
    }

    /// Add `user_id` to the booked-traveler set and bump the counter.
    ///
    /// This is the in-memory statement of the booking predicate; the
    /// Postgres repository applies the same predicate as a single
    /// conditional UPDATE so concurrent requests cannot both take the
    /// last seat.
    pub fn book(&mut self, user_id: Uuid) -> Result<(), BookingError> {
        if self.booked_by.contains(&user_id) {
            return Err(BookingError::AlreadyBooked);
        }
        if self.is_full() {
            return Err(BookingError::TripFull);
        }
        self.booked_by.push(user_id);
        self.current_bookings += 1;
        Ok(())
    }

    /// Remove `user_id` from the booked-traveler set and decrement the
    /// counter.
    pub fn cancel(&mut self, user_id: Uuid) -> Result<(), BookingError> {
        let index = self
            .booked_by
            .iter()
            .position(|id| *id == user_id)
            .ok_or(BookingError::NotBooked)?;
        self.booked_by.remove(index);
        self.current_bookings -= 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Trip is already full")]
    TripFull,
    #[error("You have already booked this trip")]
    AlreadyBooked,
    #[error("You have not booked this trip")]
    NotBooked,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Fields accepted when creating a trip. The creator comes from the
/// authenticated token, never from the body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub title: String,
    pub description: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub max_capacity: i32,
    #[serde(default)]
    pub image: String,
}

impl NewTrip {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError("Title is required".into()));
        }
        if self.destination.trim().is_empty() {
            return Err(ValidationError("Destination is required".into()));
        }
        if self.start_date > self.end_date {
            return Err(ValidationError(
                "Start date must not be after end date".into(),
            ));
        }
        if self.price < 0.0 {
            return Err(ValidationError("Price must not be negative".into()));
        }
        if self.max_capacity < 1 {
            return Err(ValidationError("Capacity must be at least 1".into()));
        }
        Ok(())
    }

    pub fn into_trip(self, creator: Uuid) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            destination: self.destination,
            start_date: self.start_date,
            end_date: self.end_date,
            price: self.price,
            max_capacity: self.max_capacity,
            current_bookings: 0,
            image: self.image,
            creator,
            booked_by: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Partial update for a trip. Absent fields are left untouched; the
/// creator and the booking state cannot be changed through a patch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub max_capacity: Option<i32>,
    pub image: Option<String>,
}

impl TripPatch {
    /// Merge the patch into `trip`, revalidating the merged result.
    /// Capacity may not drop below the seats already booked.
    pub fn apply(&self, trip: &mut Trip) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            trip.title = title.clone();
        }
        if let Some(description) = &self.description {
            trip.description = description.clone();
        }
        if let Some(destination) = &self.destination {
            trip.destination = destination.clone();
        }
        if let Some(start_date) = self.start_date {
            trip.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            trip.end_date = end_date;
        }
        if let Some(price) = self.price {
            trip.price = price;
        }
        if let Some(max_capacity) = self.max_capacity {
            trip.max_capacity = max_capacity;
        }
        if let Some(image) = &self.image {
            trip.image = image.clone();
        }

        if trip.start_date > trip.end_date {
            return Err(ValidationError(
                "Start date must not be after end date".into(),
            ));
        }
        if trip.price < 0.0 {
            return Err(ValidationError("Price must not be negative".into()));
        }
        if trip.max_capacity < 1 {
            return Err(ValidationError("Capacity must be at least 1".into()));
        }
        if trip.max_capacity < trip.current_bookings {
            return Err(ValidationError(format!(
                "Capacity cannot be reduced below the {} seats already booked",
                trip.current_bookings
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trip(max_capacity: i32) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            title: "Desert trek".to_string(),
            description: "Five days in the dunes".to_string(),
            destination: "Jaisalmer".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 10, 10).unwrap(),
            price: 450.0,
            max_capacity,
            current_bookings: 0,
            image: "desert.jpg".to_string(),
            creator: Uuid::new_v4(),
            booked_by: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_booking_lifecycle() {
        let mut trip = sample_trip(2);
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        trip.book(user_a).unwrap();
        assert_eq!(trip.current_bookings, 1);
        assert_eq!(trip.available_spots(), 1);

        trip.book(user_b).unwrap();
        assert!(trip.is_full());
        assert_eq!(trip.booked_by, vec![user_a, user_b]);

        trip.cancel(user_a).unwrap();
        assert_eq!(trip.current_bookings, 1);
        assert_eq!(trip.booked_by, vec![user_b]);
    }

    #[test]
    fn test_counter_tracks_set_size() {
        let mut trip = sample_trip(5);
        let users: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();

        for user in &users {
            trip.book(*user).unwrap();
            assert_eq!(trip.current_bookings as usize, trip.booked_by.len());
        }
        for user in &users {
            trip.cancel(*user).unwrap();
            assert_eq!(trip.current_bookings as usize, trip.booked_by.len());
        }
        assert_eq!(trip.current_bookings, 0);
    }

    #[test]
    fn test_book_when_full_leaves_state_unchanged() {
        let mut trip = sample_trip(1);
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        trip.book(user_a).unwrap();
        let before = trip.clone();

        assert_eq!(trip.book(user_b), Err(BookingError::TripFull));
        assert_eq!(trip.current_bookings, before.current_bookings);
        assert_eq!(trip.booked_by, before.booked_by);
    }

    #[test]
    fn test_duplicate_booking_rejected() {
        let mut trip = sample_trip(3);
        let user = Uuid::new_v4();

        trip.book(user).unwrap();
        assert_eq!(trip.book(user), Err(BookingError::AlreadyBooked));
        assert_eq!(trip.current_bookings, 1);
        assert_eq!(trip.booked_by, vec![user]);
    }

    #[test]
    fn test_cancel_when_not_booked_rejected() {
        let mut trip = sample_trip(3);
        let booked = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        trip.book(booked).unwrap();
        assert_eq!(trip.cancel(stranger), Err(BookingError::NotBooked));
        assert_eq!(trip.current_bookings, 1);
        assert_eq!(trip.booked_by, vec![booked]);
    }

    #[test]
    fn test_book_then_cancel_restores_state() {
        let mut trip = sample_trip(4);
        let resident = Uuid::new_v4();
        trip.book(resident).unwrap();

        let before = trip.clone();
        let user = Uuid::new_v4();
        trip.book(user).unwrap();
        trip.cancel(user).unwrap();

        assert_eq!(trip.current_bookings, before.current_bookings);
        assert_eq!(trip.booked_by, before.booked_by);
    }

    #[test]
    fn test_last_seat_changes_hands() {
        let mut trip = sample_trip(1);
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        trip.book(user_a).unwrap();
        assert_eq!(trip.current_bookings, 1);

        assert_eq!(trip.book(user_b), Err(BookingError::TripFull));

        trip.cancel(user_a).unwrap();
        assert_eq!(trip.current_bookings, 0);

        trip.book(user_b).unwrap();
        assert_eq!(trip.current_bookings, 1);
        assert_eq!(trip.booked_by, vec![user_b]);
    }

    #[test]
    fn test_new_trip_rejects_inverted_dates() {
        let new_trip = NewTrip {
            title: "Backwards".to_string(),
            description: "".to_string(),
            destination: "Goa".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 6, 20).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 10).unwrap(),
            price: 100.0,
            max_capacity: 10,
            image: String::new(),
        };
        assert!(new_trip.validate().is_err());
    }

    #[test]
    fn test_patch_cannot_shrink_capacity_below_bookings() {
        let mut trip = sample_trip(3);
        trip.book(Uuid::new_v4()).unwrap();
        trip.book(Uuid::new_v4()).unwrap();

        let patch = TripPatch {
            max_capacity: Some(1),
            ..TripPatch::default()
        };
        assert!(patch.apply(&mut trip).is_err());

        let patch = TripPatch {
            max_capacity: Some(2),
            title: Some("Renamed".to_string()),
            ..TripPatch::default()
        };
        patch.apply(&mut trip).unwrap();
        assert_eq!(trip.max_capacity, 2);
        assert_eq!(trip.title, "Renamed");
    }
}
