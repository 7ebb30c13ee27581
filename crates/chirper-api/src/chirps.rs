use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::error;
use uuid::Uuid;

use chirper_core::{Action, Actor, ChirpError, LikeOutcome};
use chirper_types::api::{ChirpRequest, ChirpResponse, LikeResponse};
use chirper_types::models::Chirp;

use crate::auth::AppState;
use crate::error::ApiError;

const FEED_PATH: &str = "/chirps";

/// GET /chirps: the recent feed, newest first, annotated with what the caller may do.
pub async fn list_chirps(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let service = state.chirps.clone();
    let chirps = blocking(move || service.list_recent(chrono::Utc::now())).await?;

    let body: Vec<ChirpResponse> = chirps
        .into_iter()
        .map(|chirp| respond(&state, &actor, chirp))
        .collect();
    Ok(Json(body))
}

/// POST /chirps: create, then send the client back to the feed.
pub async fn create_chirp(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<ChirpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = state.chirps.clone();
    blocking(move || service.create(&actor, &req.message)).await?;
    Ok(redirect_to_feed())
}

/// GET /chirps/{chirp_id}/edit: the chirp as the owner's edit form needs it.
pub async fn edit_chirp(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp_id = parse_chirp_id(&raw_id)?;
    let service = state.chirps.clone();
    let who = actor.clone();
    let chirp = blocking(move || service.find_for_edit(&who, chirp_id)).await?;
    Ok(Json(respond(&state, &actor, chirp)))
}

/// PUT /chirps/{chirp_id}
pub async fn update_chirp(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<ChirpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp_id = parse_chirp_id(&raw_id)?;
    let service = state.chirps.clone();
    blocking(move || service.edit(&actor, chirp_id, &req.message)).await?;
    Ok(redirect_to_feed())
}

/// DELETE /chirps/{chirp_id}
pub async fn delete_chirp(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp_id = parse_chirp_id(&raw_id)?;
    let service = state.chirps.clone();
    blocking(move || service.delete(&actor, chirp_id)).await?;
    Ok(redirect_to_feed())
}

/// POST /chirps/{chirp_id}/like: liking twice is accepted and changes nothing.
pub async fn like_chirp(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp_id = parse_chirp_id(&raw_id)?;
    let service = state.chirps.clone();
    let outcome = blocking(move || service.like(&actor, chirp_id)).await?;
    Ok(Json(LikeResponse {
        liked: true,
        changed: outcome == LikeOutcome::Liked,
    }))
}

fn respond(state: &AppState, actor: &Actor, chirp: Chirp) -> ChirpResponse {
    let policy = state.chirps.policy();
    let can_edit = policy.allows(Action::Update, actor, &chirp);
    let can_delete = policy.allows(Action::Delete, actor, &chirp);
    ChirpResponse::new(chirp, can_edit, can_delete)
}

/// Any id that is not a UUID cannot name a chirp.
fn parse_chirp_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::UnknownChirp(raw.to_string()))
}

fn redirect_to_feed() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, FEED_PATH)]).into_response()
}

/// Run a store-backed operation off the async runtime.
async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ChirpError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    })?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};
    use serde_json::{Value, json};

    use chirper_core::validation::CHIRP_QUOTA;

    use crate::test_support::{TestApp, call};

    async fn post_chirp(app: &TestApp, token: &str, message: &str) -> (StatusCode, Value) {
        let (status, _, body) =
            call(&app.router, "POST", "/chirps", Some(token), Some(json!({ "message": message }))).await;
        (status, body)
    }

    async fn feed(app: &TestApp, token: &str) -> Vec<Value> {
        let (status, _, body) = call(&app.router, "GET", "/chirps", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().unwrap().clone()
    }

    #[tokio::test]
    async fn create_redirects_to_feed() {
        let app = TestApp::new();
        let (alice_id, alice) = app.user("alice");
        let (_, bob) = app.user("bob");

        let (status, headers, _) = call(
            &app.router,
            "POST",
            "/chirps",
            Some(&alice),
            Some(json!({ "message": "My first chirp!" })),
        )
        .await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/chirps");

        let chirps = feed(&app, &alice).await;
        assert_eq!(chirps.len(), 1);
        assert_eq!(chirps[0]["message"], "My first chirp!");
        assert_eq!(chirps[0]["author"]["id"], alice_id.to_string());
        assert_eq!(chirps[0]["author"]["username"], "alice");
        assert_eq!(chirps[0]["liked"], false);
        assert_eq!(chirps[0]["can_edit"], true);

        let seen_by_bob = feed(&app, &bob).await;
        assert_eq!(seen_by_bob[0]["can_edit"], false);
        assert_eq!(seen_by_bob[0]["can_delete"], false);
    }

    #[tokio::test]
    async fn feed_lists_newest_first() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice");
        for message in ["one", "two", "three"] {
            assert_eq!(post_chirp(&app, &alice, message).await.0, StatusCode::FOUND);
        }

        let messages: Vec<Value> = feed(&app, &alice).await.into_iter().map(|c| c["message"].clone()).collect();
        assert_eq!(messages, vec![json!("three"), json!("two"), json!("one")]);
    }

    #[tokio::test]
    async fn invalid_message_is_unprocessable() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice");

        let (status, body) = post_chirp(&app, &alice, "").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["message"][0], "The message field is required.");

        let (status, body) = post_chirp(&app, &alice, &"x".repeat(256)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["errors"]["message"][0],
            "The message field must not be greater than 255 characters."
        );

        // A body without the field fails the same rule
        let (status, _, body) = call(&app.router, "POST", "/chirps", Some(&alice), Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["message"][0], "The message field is required.");

        assert!(feed(&app, &alice).await.is_empty());
    }

    #[tokio::test]
    async fn quota_is_enforced_per_user() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice");
        let (_, bob) = app.user("bob");

        for i in 0..CHIRP_QUOTA {
            assert_eq!(post_chirp(&app, &alice, &format!("chirp {i}")).await.0, StatusCode::FOUND);
        }

        let (status, body) = post_chirp(&app, &alice, "eleven").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["message"], json!(["You cannot create more than 10 chirps."]));

        let (status, body) = post_chirp(&app, &alice, "").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["message"].as_array().unwrap().len(), 2);

        assert_eq!(post_chirp(&app, &bob, "mine").await.0, StatusCode::FOUND);
    }

    #[tokio::test]
    async fn only_owner_edits() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice");
        let (_, bob) = app.user("bob");
        post_chirp(&app, &alice, "original").await;
        let id = feed(&app, &alice).await[0]["id"].as_str().unwrap().to_string();
        let uri = format!("/chirps/{id}");

        let (status, _, _) = call(&app.router, "PUT", &uri, Some(&bob), Some(json!({ "message": "hijacked" }))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(feed(&app, &alice).await[0]["message"], "original");

        let (status, _, _) = call(&app.router, "PUT", &uri, Some(&alice), Some(json!({ "message": "" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, headers, _) =
            call(&app.router, "PUT", &uri, Some(&alice), Some(json!({ "message": "changed" }))).await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/chirps");

        let chirps = feed(&app, &alice).await;
        assert_eq!(chirps[0]["message"], "changed");
        assert_eq!(chirps[0]["edited"], true);
    }

    #[tokio::test]
    async fn edit_form_is_owner_only() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice");
        let (_, bob) = app.user("bob");
        post_chirp(&app, &alice, "draft").await;
        let id = feed(&app, &alice).await[0]["id"].as_str().unwrap().to_string();
        let uri = format!("/chirps/{id}/edit");

        let (status, _, body) = call(&app.router, "GET", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "draft");

        let (status, _, _) = call(&app.router, "GET", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let missing = format!("/chirps/{}/edit", uuid::Uuid::new_v4());
        let (status, _, _) = call(&app.router, "GET", &missing, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn only_owner_deletes() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice");
        let (_, bob) = app.user("bob");
        post_chirp(&app, &alice, "short-lived").await;
        let id = feed(&app, &alice).await[0]["id"].as_str().unwrap().to_string();
        let uri = format!("/chirps/{id}");

        let (status, _, _) = call(&app.router, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(feed(&app, &alice).await.len(), 1);

        let (status, _, _) = call(&app.router, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::FOUND);
        assert!(feed(&app, &alice).await.is_empty());

        let (status, _, _) = call(&app.router, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn second_like_is_a_no_op() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice");
        let (_, bob) = app.user("bob");
        post_chirp(&app, &alice, "like me").await;
        let id = feed(&app, &alice).await[0]["id"].as_str().unwrap().to_string();
        let uri = format!("/chirps/{id}/like");

        let (status, _, body) = call(&app.router, "POST", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "liked": true, "changed": true }));

        let (status, _, body) = call(&app.router, "POST", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "liked": true, "changed": false }));

        assert_eq!(feed(&app, &alice).await[0]["liked"], true);

        let missing = format!("/chirps/{}/like", uuid::Uuid::new_v4());
        let (status, _, _) = call(&app.router, "POST", &missing, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_uuid_ids_are_not_found() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice");

        for (method, uri, body) in [
            ("GET", "/chirps/42/edit", None),
            ("PUT", "/chirps/42", Some(json!({ "message": "hello" }))),
            ("DELETE", "/chirps/42", None),
            ("POST", "/chirps/42/like", None),
        ] {
            let (status, _, body) = call(&app.router, method, uri, Some(&alice), body).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(body["message"], "Chirp 42 not found.");
        }
    }

    #[tokio::test]
    async fn whitespace_message_is_required() {
        let app = TestApp::new();
        let (_, alice) = app.user("alice");

        let (status, body) = post_chirp(&app, &alice, "   ").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["message"][0], "The message field is required.");

        assert_eq!(post_chirp(&app, &alice, "  hi  ").await.0, StatusCode::FOUND);
        assert_eq!(feed(&app, &alice).await[0]["message"], "hi");
    }
}
