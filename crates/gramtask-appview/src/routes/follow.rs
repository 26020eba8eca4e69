use axum::extract::{Query, State};
use axum::Json;
use instagram_client::FollowResult;
use serde::Deserialize;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct VerifyFollowQuery {
    source: String,
    target: String,
}

/// Does `source` follow `target`? Bounded scan of `source`'s followees.
pub async fn verify_follow(
    State(state): State<AppState>,
    Query(params): Query<VerifyFollowQuery>,
) -> Json<FollowResult> {
    Json(
        state
            .instagram
            .verify_follow(&params.source, &params.target)
            .await,
    )
}
