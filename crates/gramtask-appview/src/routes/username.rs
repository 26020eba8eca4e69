use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use instagram_client::ExistenceResult;
use serde::Serialize;

use crate::routes::ErrorResponse;
use crate::state::AppState;

#[derive(Serialize)]
pub struct PicResponse {
    pub url: String,
}

/// Does this username exist? Always answers 200; the verdict is in the body.
pub async fn username_exists(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Json<ExistenceResult> {
    Json(state.instagram.username_exists(&username).await)
}

/// Resolve the profile picture URL. 404 when no strategy can produce one.
pub async fn profile_pic(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Response {
    match state.instagram.profile_pic(&username).await {
        Some(url) => Json(PicResponse { url }).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "not found".to_string(),
            }),
        )
            .into_response(),
    }
}
