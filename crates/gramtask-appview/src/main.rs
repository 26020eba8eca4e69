mod config;
mod routes;
mod state;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use config::Config;
use instagram_client::{InstagramResolver, ResolverConfig};
use state::AppState;

/// Create the HTTP router
fn create_router(state: AppState) -> Router {
    Router::new()
        // Service banner + health
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        // Username facts
        .route(
            "/username/{username}/exists",
            get(routes::username::username_exists),
        )
        .route(
            "/username/{username}/profile_pic",
            get(routes::username::profile_pic),
        )
        // Dash-spelled alias kept for older clients
        .route(
            "/username/{username}/profile-pic",
            get(routes::username::profile_pic),
        )
        // Follow verification + settlement
        .route("/verify_follow", get(routes::follow::verify_follow))
        .route("/verify/and_award", post(routes::award::verify_and_award))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gramtask_appview=info".into()),
        )
        .json()
        .init();

    let config = Config::from_env();
    info!(
        port = config.port,
        authenticated = config.ig_session_id.is_some(),
        "Starting gramtask-appview"
    );

    // Connect to database
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    gramtask_db::migrate::migrate(&pool)
        .await
        .expect("Failed to run database migrations");

    let instagram = Arc::new(InstagramResolver::new(ResolverConfig {
        session_id: config.ig_session_id.clone(),
        follow_scan_limit: config.follow_scan_limit,
        cache_ttl: None,
    }));

    let state = AppState::new(pool, instagram, config.reward_coins);

    // CORS
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    let app = create_router(state).layer(cors);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/gramtask_test")
            .expect("lazy pool");
        let instagram = Arc::new(InstagramResolver::new(ResolverConfig {
            session_id: None,
            follow_scan_limit: 100,
            cache_ttl: None,
        }));
        AppState::new(pool, instagram, 10)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].as_u64().is_some());
        assert!(json["cache"]["entries"].as_u64().is_some());
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert!(json["endpoints"]["exists"].is_string());
    }

    #[tokio::test]
    async fn test_exists_rejects_over_length_username_without_upstream() {
        let router = create_router(create_test_state());
        let long = "a".repeat(31);

        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/username/{long}/exists"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["exists"], false);
        assert_eq!(json["reason"], "error");
    }

    #[tokio::test]
    async fn test_verify_follow_missing_params() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/verify_follow")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_verify_follow_invalid_source() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/verify_follow?source=%20&target=someone")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["follows"], false);
        assert_eq!(json["reason"], "invalid");
    }

    #[tokio::test]
    async fn test_and_award_missing_fields_is_bad_request() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/verify/and_award")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"taskId":"t1","claimant":"alice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["reason"], "bad_request");
    }

    #[tokio::test]
    async fn test_and_award_without_session_reports_login_failed() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/verify/and_award")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"taskId":"t1","claimant":"alice","target":"brand"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        // No session capability configured: verification fails before any
        // ledger access, and the ledger's bad_request path is never reached.
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["reason"], "login_failed");
    }
}
