use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn channel_search_body() -> serde_json::Value {
    serde_json::json!({
        "items": [
            {
                "id": {"kind": "youtube#channel", "channelId": "UCaaa"},
                "snippet": {
                    "channelId": "UCaaa",
                    "title": "Fit With Ana",
                    "description": "Home workouts and gear reviews"
                }
            },
            {
                "id": {"kind": "youtube#channel", "channelId": "UCbbb"},
                "snippet": {
                    "channelId": "UCbbb",
                    "title": "Garage Gym Guy",
                    "description": "Equipment deep dives"
                }
            },
            {
                "id": {"kind": "youtube#channel", "channelId": "UCaaa"},
                "snippet": {
                    "channelId": "UCaaa",
                    "title": "Fit With Ana",
                    "description": "duplicate hit"
                }
            }
        ]
    })
}

fn client_for(server: &MockServer) -> YouTubeClient {
    YouTubeClient::with_base_url(&server.uri(), "test-key", 5, 0, 0).expect("client")
}

#[tokio::test]
async fn search_channels_parses_and_dedupes_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "home gym"))
        .and(query_param("type", "channel"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_search_body()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hits = client
        .search_channels("home gym", 10, Some("CA"), Some("en"))
        .await
        .expect("search");

    assert_eq!(hits.len(), 2, "duplicate channel id collapsed");
    assert_eq!(hits[0].channel_id, "UCaaa");
    assert_eq!(hits[1].title, "Garage Gym Guy");
}

#[tokio::test]
async fn channel_stats_hides_hidden_subscriber_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "id": "UCaaa",
                    "snippet": {"title": "Fit With Ana", "description": "d", "country": "CA"},
                    "statistics": {
                        "viewCount": "1200000",
                        "subscriberCount": "45000",
                        "hiddenSubscriberCount": false,
                        "videoCount": "310"
                    },
                    "contentDetails": {"relatedPlaylists": {"uploads": "UUaaa"}}
                },
                {
                    "id": "UCbbb",
                    "snippet": {"title": "Hidden", "description": ""},
                    "statistics": {
                        "viewCount": "9000",
                        "subscriberCount": "0",
                        "hiddenSubscriberCount": true,
                        "videoCount": "12"
                    }
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stats = client
        .get_channel_stats(&["UCaaa".to_owned(), "UCbbb".to_owned()])
        .await
        .expect("stats");

    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].subscriber_count, Some(45_000));
    assert_eq!(stats[0].uploads_playlist.as_deref(), Some("UUaaa"));
    assert_eq!(stats[0].country.as_deref(), Some("CA"));
    assert_eq!(stats[1].subscriber_count, None, "hidden count is unknown");
    assert!(stats[1].uploads_playlist.is_none());
}

#[tokio::test]
async fn recent_video_ids_come_from_uploads_playlist() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("playlistId", "UUaaa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"contentDetails": {"videoId": "v1"}},
                {"contentDetails": {"videoId": "v2"}},
                {"contentDetails": {}}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ids = client.get_recent_video_ids("UUaaa", 10).await.expect("ids");
    assert_eq!(ids, vec!["v1", "v2"]);
}

#[tokio::test]
async fn video_stats_parse_stringly_counters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "id": "v1",
                    "snippet": {"title": "Best home gym 2026"},
                    "statistics": {"viewCount": "52000", "likeCount": "3100", "commentCount": "240"}
                },
                {
                    "id": "v2",
                    "snippet": {"title": "No stats video"},
                    "statistics": {}
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stats = client
        .get_video_stats(&["v1".to_owned(), "v2".to_owned()])
        .await
        .expect("stats");

    assert_eq!(stats[0].views, 52_000);
    assert_eq!(stats[0].likes, 3_100);
    assert_eq!(stats[1].views, 0, "missing counters default to zero");
}

#[tokio::test]
async fn quota_exhaustion_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_search_body()))
        .mount(&server)
        .await;

    let client = YouTubeClient::with_base_url(&server.uri(), "test-key", 5, 3, 0).expect("client");
    let hits = client
        .search_channels("home gym", 10, None, None)
        .await
        .expect("search succeeds after retries");
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn bad_request_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = YouTubeClient::with_base_url(&server.uri(), "test-key", 5, 3, 0).expect("client");
    let err = client
        .search_channels("home gym", 10, None, None)
        .await
        .expect_err("400 should fail fast");
    assert!(matches!(
        err,
        YouTubeError::UnexpectedStatus { status: 400, .. }
    ));
}
