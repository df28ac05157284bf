mod extract;
mod handlers;

pub use extract::AuthUser;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthKeys;
use crate::store::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub store: FileStore,
    pub auth: AuthKeys,
}

pub fn create_router(store: FileStore, auth: AuthKeys) -> Router {
    let api = Router::new()
        // Auth
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/signin", post(handlers::signin))
        // Users
        .route("/user/{userId}", patch(handlers::update_user))
        .route("/mentors", get(handlers::list_mentors))
        .route("/mentors/{mentorId}", get(handlers::get_mentor))
        // Sessions
        .route("/sessions", post(handlers::create_session))
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/{sessionId}/accept", patch(handlers::accept_session))
        .route("/sessions/{sessionId}/reject", patch(handlers::reject_session))
        .route("/sessions/{sessionId}/review", post(handlers::review_session))
        .route("/sessions/{sessionId}/review", delete(handlers::delete_session_review))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { store, auth })
}
