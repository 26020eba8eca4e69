use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::extract::extract_avatar_url;
use crate::handle::normalize_handle;
use crate::session::{Lookup, ProfileInfo, SessionManager};
use crate::types::{CacheStats, ExistenceResult, FollowReason, FollowResult};
use crate::upstream::{classify_profile_page, UpstreamClient};

const CACHE_TTL_SECS: u64 = 600; // 10 minutes
const CACHE_CAPACITY: u64 = 10_000;

/// Resolver configuration, supplied by the surrounding process.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Instagram `sessionid` cookie; authenticated mode is disabled when absent.
    pub session_id: Option<String>,
    /// Upper bound on followees scanned per verification.
    pub follow_scan_limit: usize,
    /// Override for tests; production uses the 10 minute default.
    pub cache_ttl: Option<Duration>,
}

/// Resolves Instagram account facts through a strategy chain: authenticated
/// session lookups when configured, anonymous page fetches otherwise.
/// Conclusive existence/avatar answers are cached for a bounded TTL.
pub struct InstagramResolver {
    upstream: UpstreamClient,
    sessions: SessionManager,
    follow_scan_limit: usize,
    exists_cache: Cache<String, ExistenceResult>,
    avatar_cache: Cache<String, String>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InstagramResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let ttl = config
            .cache_ttl
            .unwrap_or(Duration::from_secs(CACHE_TTL_SECS));

        let exists_cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        let avatar_cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self {
            upstream: UpstreamClient::new(),
            sessions: SessionManager::new(config.session_id),
            follow_scan_limit: config.follow_scan_limit,
            exists_cache,
            avatar_cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.exists_cache.entry_count() + self.avatar_cache.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Determine whether a username exists.
    ///
    /// Invalid input short-circuits to an error answer without touching the
    /// cache or the upstream.
    pub async fn username_exists(&self, raw: &str) -> ExistenceResult {
        let Some(handle) = normalize_handle(raw) else {
            return ExistenceResult::error();
        };

        if let Some(cached) = self.exists_cache.get(&handle).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let result = self.resolve_existence(&handle).await;
        if result.is_conclusive() {
            self.exists_cache.insert(handle, result.clone()).await;
        }
        result
    }

    async fn resolve_existence(&self, handle: &str) -> ExistenceResult {
        // Strategy 1: authenticated lookup, when the capability is present.
        if let Some(session) = self.sessions.get().await {
            match session.web_profile_info(handle).await {
                Lookup::Found(_) => return ExistenceResult::found(),
                Lookup::Missing => return ExistenceResult::not_found(),
                Lookup::Failed => {
                    debug!(handle, "Authenticated existence lookup failed, falling back");
                }
            }
        }

        // Strategy 2: anonymous profile page fetch.
        match self.upstream.fetch_profile_page(handle).await {
            Ok(page) => classify_profile_page(page.status, &page.body),
            Err(e) => {
                debug!(handle, error = %e, "Anonymous profile fetch failed");
                ExistenceResult::error()
            }
        }
    }

    /// Resolve the avatar URL for a username. `None` when no strategy can
    /// produce one; nothing is fabricated in that case.
    pub async fn profile_pic(&self, raw: &str) -> Option<String> {
        let handle = normalize_handle(raw)?;

        if let Some(cached) = self.avatar_cache.get(&handle).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(cached);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let url = self.resolve_avatar(&handle).await?;
        self.avatar_cache.insert(handle, url.clone()).await;
        Some(url)
    }

    async fn resolve_avatar(&self, handle: &str) -> Option<String> {
        // Strategy 1: authenticated lookup carries the avatar fields directly.
        let auth = match self.sessions.get().await {
            Some(session) => session.web_profile_info(handle).await,
            None => Lookup::Failed,
        };
        if let Some(url) = avatar_from_auth(&auth) {
            return Some(url);
        }

        // Strategy 2: scrape the public page, preferring the hd field.
        match self.upstream.fetch_profile_page(handle).await {
            Ok(page) => extract_avatar_url(&page.body),
            Err(e) => {
                debug!(handle, error = %e, "Anonymous profile fetch failed");
                None
            }
        }
    }

    /// Determine whether `source` follows `target` by scanning `source`'s
    /// followees, bounded by the configured scan limit. Answers are never
    /// cached: a follow can be created or undone at any moment.
    pub async fn verify_follow(&self, source_raw: &str, target_raw: &str) -> FollowResult {
        let (Some(source), Some(target)) =
            (normalize_handle(source_raw), normalize_handle(target_raw))
        else {
            return FollowResult::not_following(FollowReason::Invalid);
        };

        let Some(session) = self.sessions.get().await else {
            return FollowResult::not_following(FollowReason::LoginFailed);
        };

        let source_info = match session.web_profile_info(&source).await {
            Lookup::Found(info) => info,
            Lookup::Missing | Lookup::Failed => {
                debug!(%source, "Could not resolve source account for follow check");
                return FollowResult::not_following(FollowReason::Error);
            }
        };

        let mut scanned = 0usize;
        let mut max_id: Option<String> = None;

        loop {
            let Some(page) = session
                .following_page(&source_info.user_id, max_id.as_deref())
                .await
            else {
                return FollowResult::not_following(FollowReason::Error);
            };

            if page_contains_target(&page.usernames, &target) {
                return FollowResult::following();
            }
            scanned += page.usernames.len();

            match page.next_max_id {
                Some(next) if !page.usernames.is_empty() => {
                    if scanned >= self.follow_scan_limit {
                        // Truncated scan: the answer is unknown, not negative.
                        debug!(%source, %target, scanned, "Follow scan hit its limit");
                        return FollowResult::not_following(FollowReason::ScanLimit);
                    }
                    max_id = Some(next);
                }
                _ => return FollowResult::not_following(FollowReason::NotFollowing),
            }
        }
    }
}

/// Avatar URL carried by an authenticated lookup, if the lookup succeeded
/// and the profile has one. Anything else defers to the anonymous strategy.
fn avatar_from_auth(lookup: &Lookup<ProfileInfo>) -> Option<String> {
    match lookup {
        Lookup::Found(info) => info.best_avatar().map(str::to_string),
        Lookup::Missing | Lookup::Failed => None,
    }
}

/// Match a page of followee usernames against the normalized target.
fn page_contains_target(usernames: &[String], target: &str) -> bool {
    usernames
        .iter()
        .any(|u| normalize_handle(u).as_deref() == Some(target))
}
