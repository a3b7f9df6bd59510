use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use scavenger_hunt::auth::AuthConfig;
use scavenger_hunt::routes::router;
use scavenger_hunt::state::AppState;
use scavenger_hunt::store::{seed::seed_locations, MemoryStore};
use scavenger_hunt::upload::UploadStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "hunt-test-boundary";

/// A seeded server with auto-registration off and uploads in `upload_dir`
async fn test_app(upload_dir: &std::path::Path) -> Router {
    let state = Arc::new(AppState::new(
        Arc::new(MemoryStore::new()),
        AuthConfig {
            auto_register: false,
            bcrypt_cost: 4,
            ..AuthConfig::default()
        },
        UploadStore::new(upload_dir, 1024 * 1024),
    ));
    state.ensure_admin().await.expect("admin");
    seed_locations(state.store.as_ref()).await.expect("seed");
    router(state)
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestResponse {
    /// `name=value` pair from Set-Cookie, ready to send back
    fn cookie(&self) -> String {
        self.headers
            .get(header::SET_COOKIE)
            .expect("Set-Cookie header")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }
}

async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        body,
    }
}

fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> TestResponse {
    send(app, request(Method::GET, uri, cookie, None)).await
}

async fn post(app: &Router, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
    send(app, request(Method::POST, uri, cookie, Some(body))).await
}

async fn register(app: &Router, username: &str, password: &str) -> String {
    let response = post(
        app,
        "/api/auth/register",
        None,
        json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.cookie()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = post(
        app,
        "/api/auth/login",
        None,
        json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    response.cookie()
}

/// Multipart submission body with optional image part
fn submission_request(
    cookie: Option<&str>,
    location_id: &str,
    answer: &str,
    image: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in [("locationId", location_id), ("answer", answer)] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"image\"; filename=\"proof\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/submissions")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake image data";

#[tokio::test]
async fn test_auth_flow() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    let cookie = register(&app, "alice", "secret").await;

    let me = get(&app, "/api/auth/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "alice");
    assert_eq!(me.body["isAdmin"], false);
    assert!(me.body.get("passwordHash").is_none());

    let duplicate = post(
        &app,
        "/api/auth/register",
        None,
        json!({ "username": "alice", "password": "other" }),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["message"], "Username already exists");

    let wrong = post(
        &app,
        "/api/auth/login",
        None,
        json!({ "username": "alice", "password": "nope" }),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let unknown = post(
        &app,
        "/api/auth/login",
        None,
        json!({ "username": "ghost", "password": "boo" }),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let missing = post(&app, "/api/auth/login", None, json!({ "username": "alice" })).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let second = login(&app, "alice", "secret").await;
    let logout = post(&app, "/api/auth/logout", Some(&second), json!({})).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["message"], "Logged out successfully");
    assert!(logout.cookie().starts_with("hunt_session="));

    let after = get(&app, "/api/auth/me", Some(&second)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    // The first session is unaffected
    assert_eq!(get(&app, "/api/auth/me", Some(&cookie)).await.status, StatusCode::OK);
    assert_eq!(get(&app, "/api/auth/me", None).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_intro_and_locations() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    let intro = get(&app, "/api/intro", None).await;
    assert_eq!(intro.status, StatusCode::OK);
    assert_eq!(intro.body["title"], "Scavenger Hunt Adventure");
    assert_eq!(intro.body["instructions"].as_array().unwrap().len(), 8);

    let locations = get(&app, "/api/locations", None).await;
    assert_eq!(locations.status, StatusCode::OK);
    let locations = locations.body.as_array().unwrap();
    assert_eq!(locations.len(), 8);
    assert_eq!(locations[0]["name"], "Prime Pizza");
    assert!(locations[0]["clues"].as_array().unwrap().len() >= 1);
}

#[tokio::test]
async fn test_game_state_round_trip_and_isolation() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;
    let alice = register(&app, "alice", "pw").await;
    let bob = register(&app, "bob", "pw").await;

    assert_eq!(
        get(&app, "/api/game-state", Some(&alice)).await.status,
        StatusCode::NOT_FOUND
    );

    let state = json!({
        "currentLocationIndex": 2,
        "visibleClueIndices": [0, 1],
        "startTime": 1_700_000_000_000i64,
        "endTime": null,
        "showIntro": false,
        "completedLocations": [0, 1]
    });
    let saved = post(&app, "/api/game-state", Some(&alice), state.clone()).await;
    assert_eq!(saved.status, StatusCode::OK);
    assert_eq!(saved.body["message"], "Game state saved successfully");

    let loaded = get(&app, "/api/game-state", Some(&alice)).await;
    assert_eq!(loaded.status, StatusCode::OK);
    assert_eq!(loaded.body, state);

    // Other users and guests have their own slots
    assert_eq!(
        get(&app, "/api/game-state", Some(&bob)).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        get(&app, "/api/game-state", None).await.status,
        StatusCode::NOT_FOUND
    );

    let guest_state = json!({
        "currentLocationIndex": 0,
        "visibleClueIndices": [0],
        "startTime": null,
        "endTime": null,
        "showIntro": true,
        "completedLocations": []
    });
    post(&app, "/api/game-state", None, guest_state.clone()).await;
    assert_eq!(get(&app, "/api/game-state", None).await.body, guest_state);
    assert_eq!(get(&app, "/api/game-state", Some(&alice)).await.body, state);

    let malformed = post(
        &app,
        "/api/game-state",
        Some(&alice),
        json!({ "currentLocationIndex": "two" }),
    )
    .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert!(malformed.body["message"].is_string());
}

#[tokio::test]
async fn test_server_side_hunt() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;
    let cookie = register(&app, "runner", "pw").await;

    // Nothing happens before the hunt starts
    let early = post(&app, "/api/game/clue", Some(&cookie), json!({})).await;
    assert_eq!(early.status, StatusCode::OK);
    assert_eq!(early.body["result"], "ignored");
    assert_eq!(early.body["phase"], "NOT_STARTED");

    let started = post(&app, "/api/game/start", Some(&cookie), json!({})).await;
    assert_eq!(started.body["result"], "started");
    assert_eq!(started.body["phase"], "IN_PROGRESS");
    assert_eq!(started.body["totalLocations"], 8);

    let clue = post(&app, "/api/game/clue", Some(&cookie), json!({})).await;
    assert_eq!(clue.body["result"], "clue_revealed");
    assert_eq!(clue.body["state"]["visibleClueIndices"], json!([0, 1]));

    let wrong = post(
        &app,
        "/api/game/answer",
        Some(&cookie),
        json!({ "answer": "Taco Bell" }),
    )
    .await;
    assert_eq!(wrong.body["result"], "incorrect");

    let blank = post(&app, "/api/game/answer", Some(&cookie), json!({ "answer": "  " })).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let skipped = post(&app, "/api/game/skip", Some(&cookie), json!({})).await;
    assert_eq!(skipped.body["result"], "skipped");
    assert_eq!(skipped.body["answer"], "Prime Pizza");
    assert_eq!(skipped.body["state"]["currentLocationIndex"], 1);

    let locations = get(&app, "/api/locations", None).await.body;
    let locations = locations.as_array().unwrap();
    let mut last = Value::Null;
    for location in &locations[1..] {
        let answer = location["answer"].as_str().unwrap().to_uppercase();
        last = post(
            &app,
            "/api/game/answer",
            Some(&cookie),
            json!({ "answer": answer }),
        )
        .await
        .body;
        assert_eq!(last["result"], "correct");
    }
    assert_eq!(last["finished"], true);
    assert_eq!(last["phase"], "COMPLETED");
    assert!(last["state"]["endTime"].is_i64());

    // The stored state matches what the engine reported
    let stored = get(&app, "/api/game-state", Some(&cookie)).await;
    assert_eq!(stored.body, last["state"]);

    let restarted = post(&app, "/api/game/restart", Some(&cookie), json!({})).await;
    assert_eq!(restarted.body["result"], "restarted");
    assert_eq!(restarted.body["state"]["currentLocationIndex"], 0);
    assert_eq!(restarted.body["state"]["completedLocations"], json!([]));
}

#[tokio::test]
async fn test_submissions() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;
    let cookie = register(&app, "snapper", "pw").await;

    let anonymous = send(
        &app,
        submission_request(None, "1", "Prime Pizza", Some(("image/png", PNG_BYTES))),
    )
    .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["message"], "Unauthorized: Please log in");

    let right = send(
        &app,
        submission_request(Some(&cookie), "1", "prime pizza", Some(("image/png", PNG_BYTES))),
    )
    .await;
    assert_eq!(right.status, StatusCode::CREATED);
    assert_eq!(right.body["correctAnswer"], true);
    assert_eq!(right.body["reviewed"], false);
    assert!(right.body["adminComment"].is_null());

    let wrong = send(
        &app,
        submission_request(Some(&cookie), "1", "Taco Bell", Some(("image/jpeg", PNG_BYTES))),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::CREATED);
    assert_eq!(wrong.body["correctAnswer"], false);

    let not_image = send(
        &app,
        submission_request(Some(&cookie), "1", "Prime Pizza", Some(("text/plain", b"hello"))),
    )
    .await;
    assert_eq!(not_image.status, StatusCode::BAD_REQUEST);

    let no_image = send(&app, submission_request(Some(&cookie), "1", "Prime Pizza", None)).await;
    assert_eq!(no_image.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_image.body["message"], "Image upload is required");

    let no_location = send(
        &app,
        submission_request(Some(&cookie), "999", "Prime Pizza", Some(("image/png", PNG_BYTES))),
    )
    .await;
    assert_eq!(no_location.status, StatusCode::NOT_FOUND);

    let mine = get(&app, "/api/submissions/my", Some(&cookie)).await;
    assert_eq!(mine.status, StatusCode::OK);
    let mine = mine.body.as_array().unwrap().clone();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0]["id"], wrong.body["id"]);
    assert_eq!(mine[1]["id"], right.body["id"]);

    let other = register(&app, "other", "pw").await;
    let theirs = get(&app, "/api/submissions/my", Some(&other)).await;
    assert_eq!(theirs.body, json!([]));

    // Uploaded photos are served to logged-in users only
    let image_url = right.body["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/uploads/"));
    let image = app
        .clone()
        .oneshot(request(Method::GET, &image_url, Some(&other), None))
        .await
        .unwrap();
    assert_eq!(image.status(), StatusCode::OK);
    let bytes = to_bytes(image.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], PNG_BYTES);

    let hidden = get(&app, &image_url, None).await;
    assert_eq!(hidden.status, StatusCode::UNAUTHORIZED);
    assert_eq!(hidden.body["message"], "Login required to view images");
}

#[tokio::test]
async fn test_admin_review() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;
    let player = register(&app, "player", "pw").await;
    let admin = login(&app, "admin", "admin123").await;

    let submission = send(
        &app,
        submission_request(Some(&player), "2", "Flagship", Some(("image/webp", PNG_BYTES))),
    )
    .await;
    assert_eq!(submission.status, StatusCode::CREATED);
    let id = submission.body["id"].as_u64().unwrap();
    let review_uri = format!("/api/admin/submissions/{}", id);

    // Non-admins and anonymous callers are forbidden
    let forbidden = get(&app, "/api/admin/submissions", Some(&player)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body["message"], "Forbidden: Admin access required");
    assert_eq!(
        get(&app, "/api/admin/submissions", None).await.status,
        StatusCode::FORBIDDEN
    );
    let sneaky = send(
        &app,
        request(
            Method::PUT,
            &review_uri,
            Some(&player),
            Some(json!({ "adminComment": "self-approved", "reviewed": true })),
        ),
    )
    .await;
    assert_eq!(sneaky.status, StatusCode::FORBIDDEN);

    let all = get(&app, "/api/admin/submissions", Some(&admin)).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body.as_array().unwrap().len(), 1);

    let missing_fields = send(
        &app,
        request(
            Method::PUT,
            &review_uri,
            Some(&admin),
            Some(json!({ "adminComment": "Looks good" })),
        ),
    )
    .await;
    assert_eq!(missing_fields.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        missing_fields.body["message"],
        "Admin comment and reviewed status are required"
    );

    let empty_comment = send(
        &app,
        request(
            Method::PUT,
            &review_uri,
            Some(&admin),
            Some(json!({ "adminComment": "   ", "reviewed": true })),
        ),
    )
    .await;
    assert_eq!(empty_comment.status, StatusCode::BAD_REQUEST);

    let reviewed = send(
        &app,
        request(
            Method::PUT,
            &review_uri,
            Some(&admin),
            Some(json!({ "adminComment": "Great shot", "reviewed": true })),
        ),
    )
    .await;
    assert_eq!(reviewed.status, StatusCode::OK);
    assert_eq!(reviewed.body["reviewed"], true);
    assert_eq!(reviewed.body["adminComment"], "Great shot");

    let again = send(
        &app,
        request(
            Method::PUT,
            &review_uri,
            Some(&admin),
            Some(json!({ "adminComment": "Changed my mind", "reviewed": true })),
        ),
    )
    .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let unknown = send(
        &app,
        request(
            Method::PUT,
            "/api/admin/submissions/9999",
            Some(&admin),
            Some(json!({ "adminComment": "Hm", "reviewed": true })),
        ),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    // The player sees the review on their own list
    let mine = get(&app, "/api/submissions/my", Some(&player)).await;
    assert_eq!(mine.body[0]["adminComment"], "Great shot");
}

#[tokio::test]
async fn test_snapshot_export_import() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;
    let player = register(&app, "traveler", "pw").await;
    post(&app, "/api/game/start", Some(&player), json!({})).await;
    let admin = login(&app, "admin", "admin123").await;

    assert_eq!(
        get(&app, "/api/admin/export", Some(&player)).await.status,
        StatusCode::FORBIDDEN
    );

    let export = get(&app, "/api/admin/export", Some(&admin)).await;
    assert_eq!(export.status, StatusCode::OK);
    assert_eq!(export.body["schemaVersion"], 1);
    assert_eq!(export.body["users"].as_array().unwrap().len(), 2);
    assert_eq!(export.body["locations"].as_array().unwrap().len(), 8);
    assert_eq!(export.body["gameStates"].as_array().unwrap().len(), 1);

    // Restore into a fresh server
    let other_dir = tempfile::tempdir().unwrap();
    let fresh = test_app(other_dir.path()).await;
    let fresh_admin = login(&fresh, "admin", "admin123").await;
    let imported = post(&fresh, "/api/admin/import", Some(&fresh_admin), export.body.clone()).await;
    assert_eq!(imported.status, StatusCode::OK);

    let traveler = login(&fresh, "traveler", "pw").await;
    let state = get(&fresh, "/api/game-state", Some(&traveler)).await;
    assert_eq!(state.status, StatusCode::OK);
    assert_eq!(state.body["showIntro"], false);

    let mut broken = export.body.clone();
    broken["schemaVersion"] = json!(99);
    let rejected = post(&fresh, "/api/admin/import", Some(&fresh_admin), broken).await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_submission_id_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;
    let admin = login(&app, "admin", "admin123").await;

    let response = send(
        &app,
        request(
            Method::PUT,
            "/api/admin/submissions/abc",
            Some(&admin),
            Some(json!({ "adminComment": "Nice", "reviewed": true })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid path"));
}

#[tokio::test]
async fn test_oversized_uploads_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;
    let cookie = register(&app, "bigshot", "pw").await;

    // Over the image cap but inside the request body limit
    let just_over = vec![0u8; 1024 * 1024 + 1];
    let response = send(
        &app,
        submission_request(Some(&cookie), "1", "Prime Pizza", Some(("image/png", &just_over))),
    )
    .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.body["message"].is_string());

    // Over the request body limit itself
    let huge = vec![0u8; 3 * 1024 * 1024];
    let response = send(
        &app,
        submission_request(Some(&cookie), "1", "Prime Pizza", Some(("image/png", &huge))),
    )
    .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.body["message"].is_string());

    // Nothing was stored for either attempt
    let mine = get(&app, "/api/submissions/my", Some(&cookie)).await;
    assert_eq!(mine.body, json!([]));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
