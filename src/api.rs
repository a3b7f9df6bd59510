//! HTTP API endpoints for the hunt, submissions and admin tooling.
//!
//! Auth endpoints live in [`crate::auth`].

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::{AdminUser, AuthUser, MaybeUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::{AppState, HuntAction, HuntReport};
use crate::store::HuntSnapshot;
use crate::types::*;
use crate::upload::ImageUpload;

const INTRO_TITLE: &str = "Scavenger Hunt Adventure";

const INTRO_INSTRUCTIONS: &[&str] = &[
    "Welcome to our interactive scavenger hunt!",
    "You'll receive clues about different locations one at a time.",
    "For each location, try to guess the answer based on the clues.",
    "If you're stuck, you can request more clues.",
    "When you solve a location, take a photo of it (or something related) to prove your answer.",
    "Your progress is saved, so you can continue the hunt anytime.",
    "Complete all locations to finish the hunt!",
    "Admins will review your submissions and provide feedback.",
];

#[derive(Debug, Clone, Serialize)]
pub struct IntroResponse {
    pub title: String,
    pub instructions: Vec<String>,
}

/// GET /api/intro
pub async fn intro() -> Json<IntroResponse> {
    Json(IntroResponse {
        title: INTRO_TITLE.to_string(),
        instructions: INTRO_INSTRUCTIONS.iter().map(|s| s.to_string()).collect(),
    })
}

/// List every location in hunt order.
///
/// GET /api/locations
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Location>>> {
    Ok(Json(state.store.list_locations().await?))
}

/// GET /api/game-state
pub async fn get_game_state(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
) -> ApiResult<Json<GameState>> {
    let key = GameKey::for_user(user.user_id());
    state
        .store
        .get_game_state(&key)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Game state not found".to_string()))
}

/// Store the client's game state as-is for the caller.
///
/// POST /api/game-state
pub async fn save_game_state(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    ApiJson(game_state): ApiJson<GameState>,
) -> ApiResult<Json<Value>> {
    let key = GameKey::for_user(user.user_id());
    state.store.save_game_state(&key, game_state).await?;
    tracing::debug!(owner = %key, "Game state saved");
    Ok(Json(json!({ "message": "Game state saved successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub answer: Option<String>,
}

async fn play(
    state: &AppState,
    user: &MaybeUser,
    action: HuntAction,
) -> ApiResult<Json<HuntReport>> {
    let key = GameKey::for_user(user.user_id());
    Ok(Json(state.play(&key, action).await?))
}

/// POST /api/game/start
pub async fn game_start(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
) -> ApiResult<Json<HuntReport>> {
    play(&state, &user, HuntAction::Start).await
}

/// POST /api/game/answer
pub async fn game_answer(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    ApiJson(body): ApiJson<AnswerRequest>,
) -> ApiResult<Json<HuntReport>> {
    let answer = body
        .answer
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Answer is required".to_string()))?;
    play(&state, &user, HuntAction::Answer(answer)).await
}

/// POST /api/game/clue
pub async fn game_clue(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
) -> ApiResult<Json<HuntReport>> {
    play(&state, &user, HuntAction::Clue).await
}

/// POST /api/game/skip
pub async fn game_skip(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
) -> ApiResult<Json<HuntReport>> {
    play(&state, &user, HuntAction::Skip).await
}

/// POST /api/game/restart
pub async fn game_restart(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
) -> ApiResult<Json<HuntReport>> {
    play(&state, &user, HuntAction::Restart).await
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload is too large".to_string())
    } else {
        ApiError::BadRequest(format!("Invalid upload: {}", err.body_text()))
    }
}

/// Fields pulled from a submission form
#[derive(Debug, Default)]
struct SubmissionForm {
    image: Option<ImageUpload>,
    location_id: Option<String>,
    answer: Option<String>,
}

impl SubmissionForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = SubmissionForm::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("image") => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    form.image = Some(ImageUpload {
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                Some("locationId") => {
                    form.location_id = Some(field.text().await.map_err(multipart_error)?);
                }
                Some("answer") => {
                    form.answer = Some(field.text().await.map_err(multipart_error)?);
                }
                other => tracing::debug!("Ignoring multipart field {:?}", other),
            }
        }
        Ok(form)
    }
}

/// Upload photo proof for a location.
///
/// POST /api/submissions (multipart: `image`, `locationId`, `answer`)
pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Submission>)> {
    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let form = SubmissionForm::read(multipart).await?;

    let image = form
        .image
        .ok_or_else(|| ApiError::BadRequest("Image upload is required".to_string()))?;
    let (location_id, answer) = match (form.location_id, form.answer) {
        (Some(id), Some(answer)) if !id.trim().is_empty() && !answer.trim().is_empty() => {
            (id, answer)
        }
        _ => {
            return Err(ApiError::BadRequest(
                "LocationId and answer are required".to_string(),
            ))
        }
    };
    let location_id: LocationId = location_id
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid locationId".to_string()))?;

    let submission = state
        .submit_proof(user.user_id, location_id, &answer, &image)
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// GET /api/submissions/my
pub async fn my_submissions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Submission>>> {
    Ok(Json(state.store.submissions_for_user(user.user_id).await?))
}

/// GET /api/admin/submissions
pub async fn admin_submissions(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<Submission>>> {
    Ok(Json(state.store.all_submissions().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(default)]
    pub admin_comment: Option<String>,
    #[serde(default)]
    pub reviewed: Option<bool>,
}

/// PUT /api/admin/submissions/{id}
pub async fn review_submission(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    ApiPath(id): ApiPath<SubmissionId>,
    ApiJson(body): ApiJson<ReviewRequest>,
) -> ApiResult<Json<Submission>> {
    let (Some(comment), Some(reviewed)) = (body.admin_comment, body.reviewed) else {
        return Err(ApiError::BadRequest(
            "Admin comment and reviewed status are required".to_string(),
        ));
    };
    let submission = state.review_submission(id, &comment, reviewed).await?;
    tracing::debug!(admin_id = admin.user_id, submission_id = id, "Review stored");
    Ok(Json(submission))
}

/// Export the entire store as JSON.
///
/// GET /api/admin/export
pub async fn export_state(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Json<HuntSnapshot>> {
    Ok(Json(state.store.export_snapshot().await?))
}

/// Import a snapshot.
///
/// POST /api/admin/import
///
/// Replaces all stored data. Existing sessions are kept; sessions whose
/// user no longer exists are dropped the next time `/api/auth/me` sees them.
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    ApiJson(snapshot): ApiJson<HuntSnapshot>,
) -> ApiResult<Json<Value>> {
    state.store.import_snapshot(snapshot).await?;
    tracing::info!(admin_id = admin.user_id, "Snapshot imported");
    Ok(Json(json!({ "message": "State imported successfully" })))
}
