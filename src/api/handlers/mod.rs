use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};

use crate::api::{AppState, AuthUser};
use crate::auth;
use crate::models::*;
use crate::store::StoreError;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side for debugging, but clients only
/// see a generic message to avoid leaking internal details.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Map store errors onto HTTP statuses. Rule violations the caller can act
/// on are exposed as-is; store faults are sanitized.
fn store_error(e: StoreError) -> (StatusCode, String) {
    match &e {
        StoreError::DuplicateEmail(_)
        | StoreError::AlreadyReviewed(_)
        | StoreError::InvalidTransition { .. } => {
            tracing::warn!("Validation error: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        StoreError::MentorNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        _ => internal_error(e),
    }
}

fn unprocessable(msg: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::UNPROCESSABLE_ENTITY, msg.into())
}

fn forbidden(msg: &str) -> (StatusCode, String) {
    (StatusCode::FORBIDDEN, msg.to_string())
}

// ============================================================
// Request Validation
// ============================================================

fn require_len(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), (StatusCode, String)> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(unprocessable(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

fn validate_signup(input: &SignupInput) -> Result<(), (StatusCode, String)> {
    require_len("firstName", &input.first_name, 1, 50)?;
    require_len("lastName", &input.last_name, 1, 50)?;
    require_len("password", &input.password, 4, 50)?;
    if !input.email.contains('@') {
        return Err(unprocessable("email must be a valid email"));
    }
    require_len("address", &input.address, 1, 200)?;
    if input.bio.trim().chars().count() < 5 {
        return Err(unprocessable("bio must be at least 5 characters"));
    }
    require_len("occupation", &input.occupation, 1, 50)?;
    require_len("expertise", &input.expertise, 1, 100)?;
    Ok(())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// ============================================================
// Auth
// ============================================================

pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, String)> {
    validate_signup(&input)?;

    let hash = auth::hash_password(&input.password).map_err(internal_error)?;
    let user = state.store.create_user(input, hash).map_err(store_error)?;
    let token = state.auth.mint(user.id).map_err(internal_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "token": token,
        })),
    ))
}

pub async fn signin(
    State(state): State<AppState>,
    Json(input): Json<SigninInput>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let user = state
        .store
        .find_user_by_email(&input.email)
        .filter(|u| auth::verify_password(&input.password, &u.password));

    let Some(user) = user else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Invalid username or password".to_string(),
        ));
    };

    let token = state.auth.mint(user.id).map_err(internal_error)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "data": user.outward_view(),
    })))
}

// ============================================================
// Users
// ============================================================

pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<u64>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if caller.id != user_id && caller.role != Role::Admin {
        return Err(forbidden("Forbidden"));
    }

    state
        .store
        .update_user(user_id, input)
        .map_err(store_error)?
        .map(|user| Json(Value::Object(user.outward_view())))
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("User with id: {user_id} not found"),
        ))
}

pub async fn list_mentors(
    State(state): State<AppState>,
) -> Json<Vec<Map<String, Value>>> {
    Json(
        state
            .store
            .list_mentors()
            .iter()
            .map(Model::outward_view)
            .collect(),
    )
}

pub async fn get_mentor(
    State(state): State<AppState>,
    Path(mentor_id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    state
        .store
        .get_mentor(mentor_id)
        .map(|user| Json(Value::Object(user.outward_view())))
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("Mentor with id: {mentor_id} not found"),
        ))
}

// ============================================================
// Sessions
// ============================================================

pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<CreateSessionInput>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if input.questions.trim().is_empty() {
        return Err(unprocessable("questions must not be empty"));
    }

    let session = state
        .store
        .create_session(&user, input)
        .map_err(store_error)?;

    Ok(Json(Value::Object(session.outward_view())))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<Vec<Map<String, Value>>> {
    let sessions = match user.role {
        Role::User => state.store.sessions_for_mentee(user.id),
        Role::Mentor | Role::Admin => state.store.sessions_for_mentor(user.id),
    };
    Json(sessions.iter().map(Model::outward_view).collect())
}

pub async fn accept_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    decide_session(&state, &user, session_id, SessionStatus::Accepted)
}

pub async fn reject_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    decide_session(&state, &user, session_id, SessionStatus::Rejected)
}

/// Shared accept/reject path. Only the mentor assigned to the session (or
/// an admin) may decide it; the store enforces that a decided session never
/// reverts.
fn decide_session(
    state: &AppState,
    user: &User,
    session_id: u64,
    status: SessionStatus,
) -> Result<Json<Value>, (StatusCode, String)> {
    if user.role == Role::User {
        return Err(forbidden("Mentor only request"));
    }

    let session = state
        .store
        .get_by_id::<Session>(session_id)
        .ok_or_else(|| session_not_found(session_id))?;

    if session.mentor_id != user.id && user.role != Role::Admin {
        return Err(forbidden("Forbidden"));
    }

    state
        .store
        .set_session_status(session_id, status)
        .map_err(store_error)?
        .map(|updated| Json(Value::Object(updated.outward_view())))
        .ok_or_else(|| session_not_found(session_id))
}

fn session_not_found(session_id: u64) -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        format!("Session with id: {session_id} not found"),
    )
}

// ============================================================
// Reviews
// ============================================================

pub async fn review_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<u64>,
    Json(input): Json<ReviewInput>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if !(1..=5).contains(&input.score) {
        return Err(unprocessable("score must be between 1 and 5"));
    }
    if input.remark.trim().is_empty() {
        return Err(unprocessable("remark must not be empty"));
    }

    let session = state
        .store
        .get_by_id::<Session>(session_id)
        .ok_or_else(|| session_not_found(session_id))?;

    // Only the mentee for a given session can review it.
    if session.mentee_id != user.id {
        return Err(forbidden("Forbidden"));
    }

    let review = state
        .store
        .create_review(&session, &user, input)
        .map_err(store_error)?;

    Ok(Json(Value::Object(review.outward_view())))
}

pub async fn delete_session_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let session = state
        .store
        .get_by_id::<Session>(session_id)
        .ok_or_else(|| session_not_found(session_id))?;

    if session.mentee_id != user.id && user.role != Role::Admin {
        return Err(forbidden("Forbidden"));
    }

    let deleted = state
        .store
        .delete_session_review(session_id)
        .map_err(store_error)?;

    if deleted {
        Ok(Json(json!({ "message": "Review successfully deleted" })))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            format!("Review for session {session_id} not found"),
        ))
    }
}
