pub mod auth;
pub mod chirps;
pub mod error;
pub mod middleware;

#[cfg(test)]
mod test_support;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use crate::auth::AppState;
use crate::middleware::require_auth;

/// All HTTP routes. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/chirps", get(chirps::list_chirps).post(chirps::create_chirp))
        .route("/chirps/{chirp_id}", put(chirps::update_chirp).delete(chirps::delete_chirp))
        .route("/chirps/{chirp_id}/edit", get(chirps::edit_chirp))
        .route("/chirps/{chirp_id}/like", post(chirps::like_chirp))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
