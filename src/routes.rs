use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::state::AppState;
use crate::upload::UPLOADS_URL_PREFIX;
use crate::{api, auth};

/// Room for the multipart framing and text fields around the image
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// All API routes plus the session-protected uploads directory.
///
/// Static UI files and outer layers (CORS, tracing) are added by the caller.
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.uploads.max_bytes() + MULTIPART_OVERHEAD_BYTES;

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let game_routes = Router::new()
        .route("/start", post(api::game_start))
        .route("/answer", post(api::game_answer))
        .route("/clue", post(api::game_clue))
        .route("/skip", post(api::game_skip))
        .route("/restart", post(api::game_restart));

    let submission_routes = Router::new()
        .route(
            "/",
            post(api::create_submission).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/my", get(api::my_submissions));

    let admin_routes = Router::new()
        .route("/submissions", get(api::admin_submissions))
        .route("/submissions/{id}", put(api::review_submission))
        .route("/export", get(api::export_state))
        .route("/import", post(api::import_state));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/game", game_routes)
        .nest("/submissions", submission_routes)
        .nest("/admin", admin_routes)
        .route("/intro", get(api::intro))
        .route("/locations", get(api::list_locations))
        .route(
            "/game-state",
            get(api::get_game_state).post(api::save_game_state),
        );

    // Uploaded photos are only visible to logged-in users
    let upload_routes = Router::new()
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(state.uploads.dir()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session_middleware,
        ));

    Router::new()
        .nest("/api", api_routes)
        .merge(upload_routes)
        .with_state(state)
}
