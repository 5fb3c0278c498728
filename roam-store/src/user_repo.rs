use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use roam_core::repository::{RepoError, RepoResult, UserRepository};
use roam_core::user::{Address, User};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    phone: String,
    address: Json<Address>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            phone: row.phone,
            address: row.address.0,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, address, created_at";

fn storage(err: sqlx::Error) -> RepoError {
    RepoError::Storage(err.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> RepoResult<()> {
        let res = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, phone, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(Json(&user.address))
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            // The unique index on lower(email) is the backstop for
            // concurrent registrations racing the handler's pre-check.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RepoError::Duplicate("User"))
            }
            Err(e) => Err(storage(e)),
        }
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        Ok(row.map(User::from))
    }
}
