use std::sync::Arc;

use roam_core::repository::{TripRepository, UserRepository};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub trips: Arc<dyn TripRepository>,
    pub users: Arc<dyn UserRepository>,
    pub auth: AuthConfig,
}
