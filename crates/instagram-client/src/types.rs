use serde::{Deserialize, Serialize};

/// Answer to "does this username exist?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistenceResult {
    pub exists: bool,
    pub reason: ExistenceReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceReason {
    Ok,
    NotFound,
    RateLimited,
    Error,
}

impl ExistenceResult {
    pub fn found() -> Self {
        Self {
            exists: true,
            reason: ExistenceReason::Ok,
        }
    }

    pub fn not_found() -> Self {
        Self {
            exists: false,
            reason: ExistenceReason::NotFound,
        }
    }

    pub fn rate_limited() -> Self {
        Self {
            exists: false,
            reason: ExistenceReason::RateLimited,
        }
    }

    pub fn error() -> Self {
        Self {
            exists: false,
            reason: ExistenceReason::Error,
        }
    }

    /// Only authoritative answers are safe to cache; transient failures
    /// must leave the next request free to walk the chain again.
    pub fn is_conclusive(&self) -> bool {
        matches!(self.reason, ExistenceReason::Ok | ExistenceReason::NotFound)
    }
}

/// Answer to "does `source` follow `target`?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowResult {
    pub follows: bool,
    pub reason: FollowReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowReason {
    Ok,
    NotFollowing,
    /// The bounded followee scan hit its limit without a match. Distinct
    /// from `NotFollowing`: the answer is unknown, not negative.
    ScanLimit,
    Invalid,
    LoginFailed,
    Error,
}

impl FollowResult {
    pub fn following() -> Self {
        Self {
            follows: true,
            reason: FollowReason::Ok,
        }
    }

    pub fn not_following(reason: FollowReason) -> Self {
        Self {
            follows: false,
            reason,
        }
    }
}

impl FollowReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotFollowing => "not_following",
            Self::ScanLimit => "scan_limit",
            Self::Invalid => "invalid",
            Self::LoginFailed => "login_failed",
            Self::Error => "error",
        }
    }
}

/// Cache hit/miss counters surfaced on the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}
