use std::env;

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    /// Instagram `sessionid` cookie. Optional: without it every lookup runs
    /// anonymously and follow verification reports `login_failed`.
    pub ig_session_id: Option<String>,
    /// Upper bound on followees scanned per follow verification.
    pub follow_scan_limit: usize,
    /// Coins credited per confirmed follow.
    pub reward_coins: i64,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3002);

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/gramtask".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let ig_session_id = env::var("IG_SESSION_ID").ok().filter(|s| !s.is_empty());

        let follow_scan_limit = env::var("FOLLOW_SCAN_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2000);

        let reward_coins = env::var("REWARD_COINS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Self {
            port,
            database_url,
            cors_origins,
            ig_session_id,
            follow_scan_limit,
            reward_coins,
        }
    }
}
