use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

const API_BASE: &str = "https://i.instagram.com/api/v1";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// App id Instagram's own web client sends; lookups without it are rejected.
const IG_APP_ID: &str = "936619743392459";

const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 14; Mobile) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Mobile Safari/537.36";

/// Outcome of a single authenticated lookup. The strategy chain branches on
/// this tag: `Missing` is a conclusive negative, `Failed` falls through.
pub enum Lookup<T> {
    Found(T),
    Missing,
    Failed,
}

/// Profile fields read from an authenticated lookup
#[derive(Debug, Clone)]
pub struct ProfileInfo {
    pub user_id: String,
    pub profile_pic_url: Option<String>,
    pub profile_pic_url_hd: Option<String>,
}

impl ProfileInfo {
    /// Preferred avatar URL: high-definition when present.
    pub fn best_avatar(&self) -> Option<&str> {
        self.profile_pic_url_hd
            .as_deref()
            .filter(|u| !u.is_empty())
            .or(self.profile_pic_url.as_deref().filter(|u| !u.is_empty()))
    }
}

/// One page of a followee enumeration
#[derive(Debug)]
pub struct FollowingPage {
    pub usernames: Vec<String>,
    pub next_max_id: Option<String>,
}

#[derive(Deserialize)]
struct WebProfileResponse {
    data: Option<WebProfileData>,
}

#[derive(Deserialize)]
struct WebProfileData {
    user: Option<WebProfileUser>,
}

#[derive(Deserialize)]
struct WebProfileUser {
    id: String,
    profile_pic_url: Option<String>,
    profile_pic_url_hd: Option<String>,
}

#[derive(Deserialize)]
struct FollowingResponse {
    users: Vec<FollowingUser>,
    next_max_id: Option<String>,
}

#[derive(Deserialize)]
struct FollowingUser {
    username: String,
}

/// An authenticated Instagram session (sessionid cookie). Single-attempt
/// semantics per call; the caller's strategy chain handles recovery.
pub struct Session {
    client: Client,
}

impl Session {
    fn new(session_id: &str) -> Option<Self> {
        let mut headers = HeaderMap::new();
        let cookie = HeaderValue::from_str(&format!("sessionid={session_id}")).ok()?;
        headers.insert(COOKIE, cookie);
        headers.insert("X-IG-App-ID", HeaderValue::from_static(IG_APP_ID));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .ok()?;

        Some(Self { client })
    }

    /// Check that the session cookie is still accepted upstream.
    async fn validate(&self) -> bool {
        let url = format!("{API_BASE}/accounts/current_user/");
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "Session validation request failed");
                false
            }
        }
    }

    /// Authenticated profile lookup for a normalized handle.
    pub async fn web_profile_info(&self, handle: &str) -> Lookup<ProfileInfo> {
        let url = format!("{API_BASE}/users/web_profile_info/?username={handle}");

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(handle, error = %e, "Authenticated profile lookup failed");
                return Lookup::Failed;
            }
        };

        match response.status().as_u16() {
            404 => Lookup::Missing,
            s if (200..300).contains(&s) => match response.json::<WebProfileResponse>().await {
                Ok(data) => match data.data.and_then(|d| d.user) {
                    Some(user) => Lookup::Found(ProfileInfo {
                        user_id: user.id,
                        profile_pic_url: user.profile_pic_url,
                        profile_pic_url_hd: user.profile_pic_url_hd,
                    }),
                    // 200 with a null user is how the API spells "no such account"
                    None => Lookup::Missing,
                },
                Err(e) => {
                    debug!(handle, error = %e, "Failed to parse profile response");
                    Lookup::Failed
                }
            },
            s => {
                debug!(handle, status = s, "Authenticated profile lookup rejected");
                Lookup::Failed
            }
        }
    }

    /// Fetch one page of the accounts `user_id` follows. Pages are consumed
    /// forward only via `max_id`; the enumeration cannot be replayed.
    ///
    /// Returns `None` on any transport or parse failure; the verifier treats
    /// that as an enumeration error, not as "no more pages".
    pub async fn following_page(
        &self,
        user_id: &str,
        max_id: Option<&str>,
    ) -> Option<FollowingPage> {
        let mut url = format!("{API_BASE}/friendships/{user_id}/following/?count=200");
        if let Some(max_id) = max_id {
            url.push_str(&format!("&max_id={max_id}"));
        }

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(user_id, error = %e, "Following page request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(user_id, status = %response.status(), "Following page rejected");
            return None;
        }

        match response.json::<FollowingResponse>().await {
            Ok(data) => Some(FollowingPage {
                usernames: data.users.into_iter().map(|u| u.username).collect(),
                next_max_id: data.next_max_id,
            }),
            Err(e) => {
                debug!(user_id, error = %e, "Failed to parse following page");
                None
            }
        }
    }
}

/// Lazily initialized shared session. The session is a single shared
/// credential: under concurrent first use the validation round-trip runs at
/// most once, and absent credentials resolve the capability to `None`.
pub struct SessionManager {
    session_id: Option<String>,
    cell: OnceCell<Option<Arc<Session>>>,
}

impl SessionManager {
    pub fn new(session_id: Option<String>) -> Self {
        Self {
            session_id,
            cell: OnceCell::new(),
        }
    }

    /// Get the shared session, initializing it on first use.
    pub async fn get(&self) -> Option<Arc<Session>> {
        self.cell
            .get_or_init(|| async {
                let session_id = self.session_id.as_deref()?;
                let session = Session::new(session_id)?;
                if session.validate().await {
                    debug!("Authenticated session established");
                    Some(Arc::new(session))
                } else {
                    warn!("Configured session rejected by upstream; authenticated mode disabled");
                    None
                }
            })
            .await
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_avatar_prefers_hd() {
        let info = ProfileInfo {
            user_id: "1".into(),
            profile_pic_url: Some("https://cdn/std.jpg".into()),
            profile_pic_url_hd: Some("https://cdn/hd.jpg".into()),
        };
        assert_eq!(info.best_avatar(), Some("https://cdn/hd.jpg"));
    }

    #[test]
    fn test_best_avatar_falls_back_to_standard() {
        let info = ProfileInfo {
            user_id: "1".into(),
            profile_pic_url: Some("https://cdn/std.jpg".into()),
            profile_pic_url_hd: Some(String::new()),
        };
        assert_eq!(info.best_avatar(), Some("https://cdn/std.jpg"));
    }

    #[tokio::test]
    async fn test_unconfigured_manager_has_no_capability() {
        let manager = SessionManager::new(None);
        assert!(manager.get().await.is_none());
        // Second call resolves from the cell without re-initializing
        assert!(manager.get().await.is_none());
    }
}
