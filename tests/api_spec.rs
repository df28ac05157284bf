use axum::http::StatusCode;
use axum_test::TestServer;
use mentormesh::api::create_router;
use mentormesh::auth::AuthKeys;
use mentormesh::store::{FileStore, IoPolicy};
use serde_json::{json, Value};

fn setup() -> (TestServer, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(dir.path().join("data_store.json"), IoPolicy::FailClosed)
        .expect("Failed to open store");
    let app = create_router(store, AuthKeys::new(b"test-secret".to_vec()));
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, dir)
}

fn signup_body(email: &str) -> Value {
    json!({
        "firstName": "Test",
        "lastName": "User",
        "email": email,
        "password": "Test123",
        "address": "12, Oshodi road",
        "bio": "Works daily",
        "occupation": "Frontend dev",
        "expertise": "React",
    })
}

/// Sign up a user and return their bearer token. Ids are allocated in
/// signup order, starting at 1.
async fn signup(server: &TestServer, email: &str) -> String {
    let response = server.post("/api/v1/auth/signup").json(&signup_body(email)).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["token"].as_str().expect("Signup should return a token").to_string()
}

async fn promote_to_mentor(server: &TestServer, user_id: u64, token: &str) {
    let response = server
        .patch(&format!("/api/v1/user/{user_id}"))
        .authorization_bearer(token)
        .json(&json!({ "role": "mentor" }))
        .await;
    response.assert_status_ok();
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn signup_returns_201_with_token() {
        let (server, _dir) = setup();

        let response = server
            .post("/api/v1/auth/signup")
            .json(&signup_body("a@b.com"))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["message"], "User created successfully");
        assert!(body["token"].is_string());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let (server, _dir) = setup();
        signup(&server, "a@b.com").await;

        let response = server
            .post("/api/v1/auth/signup")
            .json(&signup_body("a@b.com"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signup_validates_fields() {
        let (server, _dir) = setup();

        let mut body = signup_body("a@b.com");
        body["bio"] = json!("meh");
        let response = server.post("/api/v1/auth/signup").json(&body).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let mut body = signup_body("not-an-email");
        body["email"] = json!("not-an-email");
        let response = server.post("/api/v1/auth/signup").json(&body).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn signin_returns_token_for_valid_credentials() {
        let (server, _dir) = setup();
        signup(&server, "a@b.com").await;

        let response = server
            .post("/api/v1/auth/signin")
            .json(&json!({ "email": "a@b.com", "password": "Test123" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Login successful");
        assert!(body["token"].is_string());
        // The outward view never leaks the credential fields.
        assert!(body["data"].get("password").is_none());
        assert!(body["data"].get("role").is_none());
    }

    #[tokio::test]
    async fn signin_rejects_bad_password() {
        let (server, _dir) = setup();
        signup(&server, "a@b.com").await;

        let response = server
            .post("/api/v1/auth/signin")
            .json(&json!({ "email": "a@b.com", "password": "wrong" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let (server, _dir) = setup();

        let response = server
            .post("/api/v1/sessions")
            .json(&json!({ "mentorId": 1, "questions": "?" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/api/v1/sessions")
            .authorization_bearer("junk-token")
            .json(&json!({ "mentorId": 1, "questions": "?" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}

mod mentors {
    use super::*;

    #[tokio::test]
    async fn lists_only_promoted_users() {
        let (server, _dir) = setup();
        let mentor_token = signup(&server, "mentor@mail.com").await;
        signup(&server, "plain@mail.com").await;
        promote_to_mentor(&server, 1, &mentor_token).await;

        let response = server.get("/api/v1/mentors").await;
        response.assert_status_ok();

        let mentors: Vec<Value> = response.json();
        assert_eq!(mentors.len(), 1);
        assert_eq!(mentors[0]["email"], "mentor@mail.com");
        assert!(mentors[0].get("password").is_none());
    }

    #[tokio::test]
    async fn get_mentor_404s_for_unpromoted_or_missing_users() {
        let (server, _dir) = setup();
        signup(&server, "plain@mail.com").await;

        let response = server.get("/api/v1/mentors/1").await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = server.get("/api/v1/mentors/99").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn users_cannot_update_other_accounts() {
        let (server, _dir) = setup();
        signup(&server, "first@mail.com").await;
        let second_token = signup(&server, "second@mail.com").await;

        let response = server
            .patch("/api/v1/user/1")
            .authorization_bearer(&second_token)
            .json(&json!({ "role": "mentor" }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }
}

mod sessions {
    use super::*;

    #[tokio::test]
    async fn mentee_requests_a_session_with_a_mentor() {
        let (server, _dir) = setup();
        let mentor_token = signup(&server, "mentor@mail.com").await;
        promote_to_mentor(&server, 1, &mentor_token).await;
        let mentee_token = signup(&server, "mentee@mail.com").await;

        let response = server
            .post("/api/v1/sessions")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "mentorId": 1, "questions": "How do I start?" }))
            .await;

        response.assert_status_ok();
        let session: Value = response.json();
        assert_eq!(session["sessionId"], 1);
        assert!(session.get("id").is_none());
        assert_eq!(session["status"], "pending");
        assert_eq!(session["menteeId"], 2);
        assert_eq!(session["menteeEmail"], "mentee@mail.com");
    }

    #[tokio::test]
    async fn requesting_a_session_with_a_non_mentor_404s() {
        let (server, _dir) = setup();
        signup(&server, "plain@mail.com").await;
        let mentee_token = signup(&server, "mentee@mail.com").await;

        let response = server
            .post("/api/v1/sessions")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "mentorId": 1, "questions": "?" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mentor_accepts_a_pending_session() {
        let (server, _dir) = setup();
        let mentor_token = signup(&server, "mentor@mail.com").await;
        promote_to_mentor(&server, 1, &mentor_token).await;
        let mentee_token = signup(&server, "mentee@mail.com").await;

        server
            .post("/api/v1/sessions")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "mentorId": 1, "questions": "?" }))
            .await;

        // A plain user cannot decide a session.
        let response = server
            .patch("/api/v1/sessions/1/accept")
            .authorization_bearer(&mentee_token)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .patch("/api/v1/sessions/1/accept")
            .authorization_bearer(&mentor_token)
            .await;
        response.assert_status_ok();
        let session: Value = response.json();
        assert_eq!(session["status"], "accepted");

        // A decided session never reverts; flipping it is rejected.
        let response = server
            .patch("/api/v1/sessions/1/reject")
            .authorization_bearer(&mentor_token)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deciding_a_missing_session_404s() {
        let (server, _dir) = setup();
        let mentor_token = signup(&server, "mentor@mail.com").await;
        promote_to_mentor(&server, 1, &mentor_token).await;

        let response = server
            .patch("/api/v1/sessions/9999/accept")
            .authorization_bearer(&mentor_token)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_shows_own_side_of_the_match() {
        let (server, _dir) = setup();
        let mentor_token = signup(&server, "mentor@mail.com").await;
        promote_to_mentor(&server, 1, &mentor_token).await;
        let mentee_token = signup(&server, "mentee@mail.com").await;
        let other_token = signup(&server, "other@mail.com").await;

        server
            .post("/api/v1/sessions")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "mentorId": 1, "questions": "?" }))
            .await;

        let response = server
            .get("/api/v1/sessions")
            .authorization_bearer(&mentee_token)
            .await;
        response.assert_status_ok();
        let sessions: Vec<Value> = response.json();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["sessionId"], 1);

        let response = server
            .get("/api/v1/sessions")
            .authorization_bearer(&mentor_token)
            .await;
        let sessions: Vec<Value> = response.json();
        assert_eq!(sessions.len(), 1);

        let response = server
            .get("/api/v1/sessions")
            .authorization_bearer(&other_token)
            .await;
        let sessions: Vec<Value> = response.json();
        assert!(sessions.is_empty());
    }
}

mod reviews {
    use super::*;

    async fn accepted_session(server: &TestServer) -> (String, String) {
        let mentor_token = signup(server, "mentor@mail.com").await;
        promote_to_mentor(server, 1, &mentor_token).await;
        let mentee_token = signup(server, "mentee@mail.com").await;

        server
            .post("/api/v1/sessions")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "mentorId": 1, "questions": "?" }))
            .await;
        server
            .patch("/api/v1/sessions/1/accept")
            .authorization_bearer(&mentor_token)
            .await;

        (mentor_token, mentee_token)
    }

    #[tokio::test]
    async fn mentee_reviews_an_accepted_session() {
        let (server, _dir) = setup();
        let (_, mentee_token) = accepted_session(&server).await;

        let response = server
            .post("/api/v1/sessions/1/review")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "score": 5, "remark": "Great guidance" }))
            .await;

        response.assert_status_ok();
        let review: Value = response.json();
        assert!(review.get("id").is_none());
        assert_eq!(review["sessionId"], 1);
        assert_eq!(review["menteeFullName"], "Test User");
        assert_eq!(review["score"], 5);
    }

    #[tokio::test]
    async fn only_the_sessions_mentee_can_review() {
        let (server, _dir) = setup();
        let (mentor_token, _) = accepted_session(&server).await;

        let response = server
            .post("/api/v1/sessions/1/review")
            .authorization_bearer(&mentor_token)
            .json(&json!({ "score": 5, "remark": "Reviewing myself" }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn a_session_can_be_reviewed_once() {
        let (server, _dir) = setup();
        let (_, mentee_token) = accepted_session(&server).await;

        server
            .post("/api/v1/sessions/1/review")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "score": 5, "remark": "Great" }))
            .await;

        let response = server
            .post("/api/v1/sessions/1/review")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "score": 1, "remark": "Changed my mind" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn review_input_is_validated() {
        let (server, _dir) = setup();
        let (_, mentee_token) = accepted_session(&server).await;

        let response = server
            .post("/api/v1/sessions/1/review")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "score": 6, "remark": "Too good" }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let response = server
            .post("/api/v1/sessions/1/review")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "score": 3, "remark": "  " }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn mentee_deletes_their_review() {
        let (server, _dir) = setup();
        let (_, mentee_token) = accepted_session(&server).await;

        server
            .post("/api/v1/sessions/1/review")
            .authorization_bearer(&mentee_token)
            .json(&json!({ "score": 5, "remark": "Great" }))
            .await;

        let response = server
            .delete("/api/v1/sessions/1/review")
            .authorization_bearer(&mentee_token)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Review successfully deleted");

        let response = server
            .delete("/api/v1/sessions/1/review")
            .authorization_bearer(&mentee_token)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let (server, _dir) = setup();

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}
