use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A follow task: `need` confirmed follows close it.
///
/// `done_count` is monotonically non-decreasing and `active` flips
/// true → false exactly once, when `done_count` first reaches `need`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FollowTask {
    pub id: String,
    pub target_username: String,
    pub need: i32,
    pub done_count: i32,
    pub active: bool,
    pub order_id: Option<String>,
}

/// Per-claimant participation state under a task. Created by the
/// participation-start flow; `followed` flips false → true at most once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskParticipant {
    pub task_id: String,
    pub username: String,
    pub followed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// A claimant's account. Coins only ever increase inside settlement.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAccount {
    pub username: String,
    pub coins: i64,
    pub created_at: DateTime<Utc>,
    pub profile_pic_url: Option<String>,
}
