use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dreamwell_core::{AppConfig, Environment};
use dreamwell_llm::LlmClient;
use dreamwell_match::Judge;
use dreamwell_youtube::YouTubeClient;

use super::*;
use crate::middleware::AuthState;

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_owned(),
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("addr"),
        log_level: "info".to_owned(),
        jwt_secret: "test-secret".to_owned(),
        token_ttl_days: 7,
        youtube_api_key: None,
        llm_api_key: None,
        videoai_api_key: None,
        email_api_key: None,
        email_from: "outreach@dreamwell.example".to_owned(),
        download_dir: std::env::temp_dir().join("dreamwell-server-test"),
        db_max_connections: 5,
        db_min_connections: 1,
        db_acquire_timeout_secs: 5,
        client_request_timeout_secs: 5,
        client_max_retries: 0,
        client_retry_backoff_base_secs: 0,
        search_channels_per_keyword: 10,
        search_recent_video_cap: 10,
        search_max_concurrent_candidates: 4,
        search_cache_ttl_hours: 24,
        videoai_poll_interval_secs: 0,
        videoai_poll_max_attempts: 3,
    }
}

fn test_state(pool: sqlx::PgPool) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
        youtube: None,
        judge: Arc::new(Judge::Neutral),
        llm: None,
        videoai: None,
        email: None,
        downloader: Arc::new(dreamwell_deepsearch::YtDlpDownloader::default()),
        http: reqwest::Client::new(),
    }
}

fn app_for(state: AppState) -> axum::Router {
    let auth = AuthState::new("test-secret");
    build_app(state, auth, default_rate_limit_state())
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json parse")
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn authed_json_request(
    method: &str,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

/// Registers a company through the endpoint and returns its access token.
async fn register(app: &axum::Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "email": email,
                "password": "Sup3rSecret",
                "company_name": "Acme Fitness",
                "website": "https://acme.example.com"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["access_token"]
        .as_str()
        .expect("token in response")
        .to_owned()
}

// ---------------------------------------------------------------------------
// Health + auth gating
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_ok_with_database(pool: sqlx::PgPool) {
    let app = app_for(test_state(pool));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn protected_routes_require_a_valid_token(pool: sqlx::PgPool) {
    let app = app_for(test_state(pool));

    let bare = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/profile")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(bare.status(), StatusCode::UNAUTHORIZED);

    let forged = app
        .oneshot(authed_get("/api/auth/profile", "v1.1.99999999999.bogus"))
        .await
        .expect("response");
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Registration / login / profile
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn register_login_and_profile_flow(pool: sqlx::PgPool) {
    let app = app_for(test_state(pool));
    let token = register(&app, "founder@acme.example.com").await;

    // Profile comes back for the registered company.
    let response = app
        .clone()
        .oneshot(authed_get("/api/auth/profile", &token))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "founder@acme.example.com");
    assert_eq!(json["data"]["company_name"], "Acme Fitness");

    // Partial update: add keywords and a market, leave the rest.
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PUT",
            "/api/auth/profile",
            &token,
            serde_json::json!({"keywords": "home fitness, kettlebells", "country_code": "CA"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["keywords"], "home fitness, kettlebells");
    assert_eq!(json["data"]["country_code"], "CA");
    assert_eq!(json["data"]["website"], "https://acme.example.com");

    // Login with the same credentials issues a fresh token.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({"email": "Founder@Acme.example.com", "password": "Sup3rSecret"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // Wrong password is a 401.
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({"email": "founder@acme.example.com", "password": "WrongPass1"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../migrations")]
async fn register_validates_input_and_rejects_duplicates(pool: sqlx::PgPool) {
    let app = app_for(test_state(pool));

    for (body, note) in [
        (
            serde_json::json!({"email": "not-an-email", "password": "Sup3rSecret", "website": "https://a.example.com"}),
            "bad email",
        ),
        (
            serde_json::json!({"email": "a@b.example.com", "password": "short1A", "website": "https://a.example.com"}),
            "short password",
        ),
        (
            serde_json::json!({"email": "a@b.example.com", "password": "alllowercase1", "website": "https://a.example.com"}),
            "no uppercase",
        ),
        (
            serde_json::json!({"email": "a@b.example.com", "password": "Sup3rSecret", "website": "ftp://a.example.com"}),
            "bad website",
        ),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/auth/register", body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{note}");
    }

    register(&app, "dup@acme.example.com").await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "email": "dup@acme.example.com",
                "password": "Sup3rSecret",
                "website": "https://acme.example.com"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Scoring weights
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn scoring_weights_default_then_round_trip(pool: sqlx::PgPool) {
    let app = app_for(test_state(pool));
    let token = register(&app, "weights@acme.example.com").await;

    let response = app
        .clone()
        .oneshot(authed_get("/api/auth/scoring-weights", &token))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["values"], 0.2);
    assert_eq!(json["data"]["views_to_subs"], 0.2);

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/auth/scoring-weights",
            &token,
            serde_json::json!({
                "values": 0.2, "cultural": 0.1, "cpm": 0.2, "rpm": 0.2, "views_to_subs": 0.3
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(authed_get("/api/auth/scoring-weights", &token))
        .await
        .expect("response");
    let json = body_json(response).await;
    assert_eq!(json["data"]["cultural"], 0.1);
    assert_eq!(json["data"]["views_to_subs"], 0.3);
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_extracts_product_details_via_llm(pool: sqlx::PgPool) {
    let llm_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text":
                "{\"name\": \"Iron Kettlebell 24kg\", \"category\": \"fitness equipment\", \
                 \"keywords\": [\"kettlebell workout\", \"home gym\"], \"estimated_profit\": 18.5}"
            }]}}]
        })))
        .mount(&llm_server)
        .await;
    let page_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Kettlebell</html>"))
        .mount(&page_server)
        .await;

    let mut state = test_state(pool);
    state.llm = Some(Arc::new(
        LlmClient::with_base_url(&llm_server.uri(), "key", dreamwell_llm::DEFAULT_MODEL, 5)
            .expect("client"),
    ));
    let app = app_for(state);
    let token = register(&app, "products@acme.example.com").await;

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/auth/products/ingest",
            &token,
            serde_json::json!({"url": format!("{}/kb24", page_server.uri())}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Iron Kettlebell 24kg");
    assert_eq!(json["data"]["category"], "fitness equipment");
    let product_id = json["data"]["id"].as_i64().expect("id");

    // The product shows up in the list and can be edited.
    let response = app
        .clone()
        .oneshot(authed_get("/api/auth/products", &token))
        .await
        .expect("response");
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

    let response = app
        .oneshot(authed_json_request(
            "PUT",
            &format!("/api/auth/products/{product_id}"),
            &token,
            serde_json::json!({"name": "Iron Kettlebell", "is_luxury": true}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Iron Kettlebell");
    assert_eq!(json["data"]["is_luxury"], true);
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_without_llm_key_is_service_unavailable(pool: sqlx::PgPool) {
    let app = app_for(test_state(pool));
    let token = register(&app, "nollm@acme.example.com").await;

    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/auth/products/ingest",
            &token,
            serde_json::json!({"url": "https://shop.example.com/item"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------------------
// Influencer search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn search_influencers_returns_ranked_results(pool: sqlx::PgPool) {
    let yt = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "home gym"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"snippet": {"channelId": "UCa", "title": "Fit With Ana", "description": "home workouts"}}
            ]
        })))
        .mount(&yt)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{
                "id": "UCa",
                "snippet": {"title": "Fit With Ana", "description": "home workouts", "country": "CA"},
                "statistics": {"viewCount": "900000", "subscriberCount": "100000",
                               "hiddenSubscriberCount": false, "videoCount": "90"},
                "contentDetails": {"relatedPlaylists": {"uploads": "UUa"}}
            }]
        })))
        .mount(&yt)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"contentDetails": {"videoId": "va"}}]
        })))
        .mount(&yt)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{
                "id": "va",
                "snippet": {"title": "30 day challenge"},
                "statistics": {"viewCount": "50000", "likeCount": "2500", "commentCount": "300"}
            }]
        })))
        .mount(&yt)
        .await;

    let mut state = test_state(pool);
    state.youtube = Some(Arc::new(
        YouTubeClient::with_base_url(&yt.uri(), "key", 5, 0, 0).expect("client"),
    ));
    let app = app_for(state);
    let token = register(&app, "search@acme.example.com").await;

    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/auth/search-influencers",
            &token,
            serde_json::json!({"keywords": ["home gym"]}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["count"], 1);
    let influencer = &json["data"]["influencers"][0];
    assert_eq!(influencer["channel_id"], "UCa");
    assert_eq!(influencer["subscriber_count"], 100_000);
    assert!(influencer["score"].as_f64().expect("score") > 0.0);
    assert!(json["data"]["averages"]["avg_views"].as_f64().expect("avg") > 0.0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_without_youtube_key_is_service_unavailable(pool: sqlx::PgPool) {
    let app = app_for(test_state(pool));
    let token = register(&app, "noyt@acme.example.com").await;

    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/auth/search-influencers",
            &token,
            serde_json::json!({"keywords": ["home gym"]}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_requires_keywords(pool: sqlx::PgPool) {
    let app = app_for(test_state(pool));
    let token = register(&app, "nokeywords@acme.example.com").await;

    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/auth/search-influencers",
            &token,
            serde_json::json!({"keywords": ["  ", ""]}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Deep search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn deep_search_status_for_unknown_url_is_not_found(pool: sqlx::PgPool) {
    let app = app_for(test_state(pool));
    let token = register(&app, "status@acme.example.com").await;

    let encoded = "https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dnever";
    let response = app
        .oneshot(authed_get(
            &format!("/api/auth/deep-search/status/{encoded}"),
            &token,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "not_found");
}

#[sqlx::test(migrations = "../../migrations")]
async fn deep_search_status_reads_existing_rows(pool: sqlx::PgPool) {
    let url = "https://www.youtube.com/watch?v=abc123xyz00";
    dreamwell_db::claim_analysis(&pool, url, Some("abc123xyz00"), None)
        .await
        .expect("claim")
        .expect("row");

    let app = app_for(test_state(pool));
    let token = register(&app, "status2@acme.example.com").await;

    let encoded = "https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabc123xyz00";
    let response = app
        .clone()
        .oneshot(authed_get(
            &format!("/api/auth/deep-search/status/{encoded}"),
            &token,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["video_id"], "abc123xyz00");

    // History lists the same row.
    let response = app
        .oneshot(authed_get("/api/auth/deep-search/history", &token))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
}

#[sqlx::test(migrations = "../../migrations")]
async fn deep_search_analyze_without_key_is_service_unavailable(pool: sqlx::PgPool) {
    let app = app_for(test_state(pool));
    let token = register(&app, "novideoai@acme.example.com").await;

    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/auth/deep-search/analyze",
            &token,
            serde_json::json!({"video_url": "https://www.youtube.com/watch?v=abc123xyz00"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn sponsor_email_sends_through_the_client(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg-7"})),
        )
        .mount(&server)
        .await;

    let mut state = test_state(pool);
    state.email = Some(Arc::new(
        dreamwell_email::EmailClient::with_base_url(
            &server.uri(),
            "re_key",
            "outreach@dreamwell.example",
            5,
        )
        .expect("client"),
    ));
    let app = app_for(state);
    let token = register(&app, "email@acme.example.com").await;

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/auth/send-sponsor-email",
            &token,
            serde_json::json!({
                "to": "creator@example.com",
                "influencer_name": "Ana",
                "custom_message": "Loved your garage gym series."
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["sent"], true);
    assert_eq!(json["data"]["message_id"], "msg-7");

    // Invalid recipient is a validation error before any network call.
    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/auth/send-sponsor-email",
            &token,
            serde_json::json!({"to": "not-an-email", "influencer_name": "Ana"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
