use std::time::Duration;

use reqwest::Client;

use crate::types::ExistenceResult;

const PROFILE_PAGE_BASE: &str = "https://www.instagram.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Mobile UA — the desktop profile page serves a login wall far more often.
const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 14; Mobile) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Mobile Safari/537.36";

/// Phrases Instagram renders on removed or never-created profiles.
const NOT_AVAILABLE_MARKERS: &[&str] = &[
    "Sorry, this page isn't available",
    "Page Not Found",
    "The link you followed may be broken",
];

/// JSON keys that only appear in a rendered profile's embedded data.
const PROFILE_DATA_MARKERS: &[&str] = &["profile_pic_url", "is_private", "edge_followed_by"];

/// A fetched profile page, status and body kept for classification.
pub struct ProfilePage {
    pub status: u16,
    pub body: String,
}

/// Anonymous single-attempt fetches of public profile pages. No retries:
/// a failed attempt falls through to the next strategy in the chain.
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch the public profile page for a normalized handle.
    pub async fn fetch_profile_page(&self, handle: &str) -> Result<ProfilePage, reqwest::Error> {
        let url = format!("{PROFILE_PAGE_BASE}/{handle}/");
        let response = self
            .client
            .get(&url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(ProfilePage { status, body })
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify an anonymously fetched profile page into an existence answer.
///
/// 403/429 means the upstream blocked us, not that the account is missing;
/// that answer is transient and must not be cached.
pub fn classify_profile_page(status: u16, body: &str) -> ExistenceResult {
    match status {
        404 => ExistenceResult::not_found(),
        200 => {
            if NOT_AVAILABLE_MARKERS.iter().any(|m| body.contains(m)) {
                ExistenceResult::not_found()
            } else if PROFILE_DATA_MARKERS.iter().any(|m| body.contains(m)) {
                ExistenceResult::found()
            } else {
                // A 200 without profile data is usually a login wall
                ExistenceResult::error()
            }
        }
        403 | 429 => ExistenceResult::rate_limited(),
        _ => ExistenceResult::error(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExistenceReason;

    #[test]
    fn test_client_builds_with_agent_and_timeout() {
        // Construction must not fall back to a default client
        let _ = UpstreamClient::new();
    }

    #[test]
    fn test_classify_404_is_not_found() {
        let result = classify_profile_page(404, "");
        assert!(!result.exists);
        assert_eq!(result.reason, ExistenceReason::NotFound);
    }

    #[test]
    fn test_classify_200_with_profile_marker_exists() {
        let body = r#"{"graphql":{"user":{"profile_pic_url":"https://x/y.jpg"}}}"#;
        let result = classify_profile_page(200, body);
        assert!(result.exists);
        assert_eq!(result.reason, ExistenceReason::Ok);
    }

    #[test]
    fn test_classify_200_with_not_available_phrase() {
        let body = "<html>Sorry, this page isn't available.</html>";
        let result = classify_profile_page(200, body);
        assert!(!result.exists);
        assert_eq!(result.reason, ExistenceReason::NotFound);
    }

    #[test]
    fn test_classify_rate_limit_statuses() {
        for status in [403, 429] {
            let result = classify_profile_page(status, "");
            assert!(!result.exists);
            assert_eq!(result.reason, ExistenceReason::RateLimited);
        }
    }

    #[test]
    fn test_classify_login_wall_and_server_errors() {
        assert_eq!(
            classify_profile_page(200, "<html>log in to continue</html>").reason,
            ExistenceReason::Error
        );
        assert_eq!(classify_profile_page(500, "").reason, ExistenceReason::Error);
    }

    #[test]
    fn test_conclusive_results_are_cacheable() {
        assert!(classify_profile_page(404, "").is_conclusive());
        assert!(classify_profile_page(200, "profile_pic_url").is_conclusive());
        assert!(!classify_profile_page(429, "").is_conclusive());
        assert!(!classify_profile_page(500, "").is_conclusive());
    }
}
