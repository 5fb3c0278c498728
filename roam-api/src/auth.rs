use axum::{extract::State, Extension, Json};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use roam_core::user::{Address, User};

use crate::error::AppError;
use crate::middleware::auth::CustomerClaims;
use crate::state::{AppState, AuthConfig};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, AppError> {
    let claims = CustomerClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    // 1. Required fields
    let name = req.name.unwrap_or_default();
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AppError::ValidationError(
            "Name, email and password are required".to_string(),
        ));
    }

    // 2. Duplicate check; the unique index on email is the backstop
    //    against a concurrent registration.
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::ValidationError("User already exists".to_string()));
    }

    // 3. Hash credential
    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))?;

    let user = User {
        id: Uuid::new_v4(),
        name,
        email,
        password_hash,
        phone: req.phone.unwrap_or_default(),
        address: req.address.unwrap_or_default(),
        created_at: Utc::now(),
    };
    state.users.create(&user).await?;

    tracing::info!("Registered user {}", user.email);

    let token = issue_token(&state.auth, &user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(AppError::ValidationError(
            "Email and password are required".to_string(),
        ));
    };

    // Unknown email and wrong password are indistinguishable to the
    // caller.
    let Some(user) = state.users.find_by_email(&email).await? else {
        return Err(AppError::ValidationError("Invalid credentials".to_string()));
    };

    let matches = bcrypt::verify(&password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password check failed: {}", e)))?;
    if !matches {
        return Err(AppError::ValidationError("Invalid credentials".to_string()));
    }

    tracing::debug!("Login successful for {}", user.email);

    let token = issue_token(&state.auth, &user)?;
    Ok(Json(AuthResponse { token, user }))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<User>, AppError> {
    let user_id = claims.user_id()?;
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;

    Ok(Json(user))
}
