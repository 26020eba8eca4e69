use axum::extract::State;
use axum::Json;
use gramtask_db::settlement::{self, SettlementError};
use instagram_client::normalize_handle;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardRequest {
    pub task_id: Option<String>,
    pub claimant: Option<String>,
    pub target: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_coins: Option<i64>,
}

impl AwardResponse {
    fn refused(reason: &str) -> Self {
        Self {
            ok: false,
            reason: Some(reason.to_string()),
            new_coins: None,
        }
    }

    fn granted(new_coins: i64) -> Self {
        Self {
            ok: true,
            reason: None,
            new_coins: Some(new_coins),
        }
    }
}

/// Verify that the claimant follows the target, then settle the reward.
///
/// `bad_request` covers missing request fields only. Ledger precondition
/// failures come back as `award_failed`; the named reason is logged and the
/// transaction leaves no partial writes, so the caller may retry engine
/// failures safely.
pub async fn verify_and_award(
    State(state): State<AppState>,
    Json(req): Json<AwardRequest>,
) -> Json<AwardResponse> {
    let (Some(task_id), Some(claimant), Some(target)) = (
        req.task_id.filter(|s| !s.trim().is_empty()),
        req.claimant.filter(|s| !s.trim().is_empty()),
        req.target.filter(|s| !s.trim().is_empty()),
    ) else {
        return Json(AwardResponse::refused("bad_request"));
    };

    let follow = state.instagram.verify_follow(&claimant, &target).await;
    if !follow.follows {
        return Json(AwardResponse::refused(follow.reason.as_str()));
    }

    // The ledger keys participants by normalized handle; verification
    // succeeding means the claimant normalizes cleanly.
    let Some(claimant) = normalize_handle(&claimant) else {
        return Json(AwardResponse::refused("bad_request"));
    };

    match settlement::settle_follow(&state.pool, &task_id, &claimant, state.reward_coins).await {
        Ok(outcome) => {
            if outcome.already_settled {
                info!(%task_id, %claimant, "Replayed settlement, balance unchanged");
            } else {
                info!(
                    %task_id,
                    %claimant,
                    new_coins = outcome.new_coins,
                    task_completed = outcome.task_completed,
                    "Reward settled"
                );
            }
            Json(AwardResponse::granted(outcome.new_coins))
        }
        Err(e) => {
            match &e {
                SettlementError::Database(db) => {
                    warn!(%task_id, %claimant, error = %db, "Settlement transaction failed")
                }
                refused => warn!(%task_id, %claimant, reason = %refused, "Settlement refused"),
            }
            Json(AwardResponse::refused("award_failed"))
        }
    }
}
