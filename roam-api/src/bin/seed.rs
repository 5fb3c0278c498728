//! Loads a demo data set: one admin account plus a handful of sample
//! trips. Safe to re-run; it skips seeding when trips already exist.

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use chrono::Utc;
use uuid::Uuid;

use roam_core::repository::{TripRepository, UserRepository};
use roam_core::search::TripFilter;
use roam_core::trip::NewTrip;
use roam_core::user::{Address, User};
use roam_store::{DbClient, PostgresTripRepository, PostgresUserRepository};

const ADMIN_EMAIL: &str = "admin@college.edu";
const ADMIN_PASSWORD: &str = "admin123";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid seed date")
}

fn sample_trips() -> Vec<NewTrip> {
    vec![
        NewTrip {
            title: "Desert Safari".to_string(),
            description: "Camel rides and a night under the stars in the Thar desert".to_string(),
            destination: "Jaisalmer".to_string(),
            start_date: date(2026, 11, 10),
            end_date: date(2026, 11, 14),
            price: 450.0,
            max_capacity: 12,
            image: "https://images.example.com/jaisalmer.jpg".to_string(),
        },
        NewTrip {
            title: "Backwater Houseboat Week".to_string(),
            description: "A slow week drifting through the Kerala backwaters".to_string(),
            destination: "Alleppey".to_string(),
            start_date: date(2026, 12, 1),
            end_date: date(2026, 12, 7),
            price: 780.0,
            max_capacity: 8,
            image: "https://images.example.com/alleppey.jpg".to_string(),
        },
        NewTrip {
            title: "Himalayan Base Trek".to_string(),
            description: "Guided trek to the Kedarkantha base with camping gear included"
                .to_string(),
            destination: "Uttarakhand".to_string(),
            start_date: date(2027, 1, 15),
            end_date: date(2027, 1, 21),
            price: 620.0,
            max_capacity: 15,
            image: "https://images.example.com/kedarkantha.jpg".to_string(),
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = roam_store::app_config::Config::load().context("Failed to load config")?;
    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(db.pool.clone()));
    let trips: Arc<dyn TripRepository> = Arc::new(PostgresTripRepository::new(db.pool.clone()));

    // Find or create the admin user that owns the sample trips.
    let admin = match users.find_by_email(ADMIN_EMAIL).await? {
        Some(user) => {
            tracing::info!("Admin user found: {}", user.id);
            user
        }
        None => {
            let user = User {
                id: Uuid::new_v4(),
                name: "College Admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password_hash: bcrypt::hash(ADMIN_PASSWORD, bcrypt::DEFAULT_COST)?,
                phone: "9876543210".to_string(),
                address: Address {
                    street: Some("College Campus".to_string()),
                    city: Some("Jaipur".to_string()),
                    state: Some("Rajasthan".to_string()),
                    country: Some("India".to_string()),
                    zip_code: Some("302001".to_string()),
                },
                created_at: Utc::now(),
            };
            users.create(&user).await?;
            tracing::info!("Admin user created: {}", user.id);
            user
        }
    };

    let existing = trips.list(&TripFilter::default()).await?;
    if !existing.is_empty() {
        tracing::info!("{} trips already present, skipping seed", existing.len());
        return Ok(());
    }

    for new_trip in sample_trips() {
        let trip = trips.create(admin.id, new_trip).await?;
        tracing::info!("Seeded trip {} ({})", trip.title, trip.id);
    }

    tracing::info!("Seeding complete");
    Ok(())
}
