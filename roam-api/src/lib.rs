use axum::{
    http::Method,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod middleware;
pub mod state;
pub mod trips;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/trips", get(trips::list_trips))
        .route("/trips/{id}", get(trips::get_trip));

    let protected = Router::new()
        .route("/auth/profile", get(auth::profile))
        .route("/trips", post(trips::create_trip))
        .route(
            "/trips/{id}",
            put(trips::update_trip).delete(trips::delete_trip),
        )
        .route("/trips/{id}/book", post(trips::book_trip))
        .route("/trips/{id}/cancel", post(trips::cancel_trip))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::customer_auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
