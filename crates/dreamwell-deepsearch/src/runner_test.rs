use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::downloader::VideoDownloader;

const URL: &str = "https://www.youtube.com/watch?v=abc123xyz00";

/// Downloader that writes a small scratch file and counts invocations.
struct FakeDownloader {
    calls: AtomicU32,
}

impl FakeDownloader {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VideoDownloader for FakeDownloader {
    async fn download(&self, _url: &str, output_dir: &Path) -> Result<PathBuf, DeepSearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| DeepSearchError::Download {
                reason: e.to_string(),
            })?;
        let path = output_dir.join("abc123xyz00.mp4");
        tokio::fs::write(&path, b"fake mp4 bytes")
            .await
            .map_err(|e| DeepSearchError::Download {
                reason: e.to_string(),
            })?;
        Ok(path)
    }
}

/// Downloader whose every call fails.
struct FailingDownloader;

impl VideoDownloader for FailingDownloader {
    async fn download(&self, _url: &str, _output_dir: &Path) -> Result<PathBuf, DeepSearchError> {
        Err(DeepSearchError::Download {
            reason: "simulated network failure".to_owned(),
        })
    }
}

fn options(label: &str) -> RunnerOptions {
    RunnerOptions {
        download_dir: std::env::temp_dir().join(format!("dreamwell-deepsearch-{label}")),
        index_name: "dreamwell_index".to_owned(),
        poll_interval: std::time::Duration::from_millis(0),
        poll_max_attempts: 3,
    }
}

fn request(custom_prompt: Option<&'static str>) -> AnalyzeRequest<'static> {
    AnalyzeRequest {
        video_url: URL,
        channel_id: Some("UCchannel"),
        custom_prompt,
    }
}

/// Mounts the full happy-path video-AI mock: index exists, task completes on
/// the first poll, summary/chapters/analysis all respond.
async fn mount_happy_videoai(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/indexes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"_id": "idx-1", "index_name": "dreamwell_index"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"_id": "task-1"})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/task-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"status": "ready", "video_id": "vid-1"}),
        ))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(body_partial_json(serde_json::json!({"type": "summary"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"summary": "an unboxing and review video"}),
        ))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(body_partial_json(serde_json::json!({"type": "chapter"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "chapters": [{
                "chapter_number": 1,
                "start": 0.0,
                "end": 60.0,
                "chapter_title": "Intro",
                "chapter_summary": "Opening remarks"
            }]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"data": "strong collaboration potential"}),
        ))
        .mount(server)
        .await;
}

fn videoai_for(server: &MockServer) -> VideoAiClient {
    VideoAiClient::with_base_url(&server.uri(), "key", 5).expect("client")
}

#[sqlx::test(migrations = "../../migrations")]
async fn analyze_completes_and_second_call_hits_cache(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mount_happy_videoai(&server).await;
    let videoai = videoai_for(&server);
    let downloader = FakeDownloader::new();
    let opts = options("complete");

    let row = analyze(&pool, &downloader, &videoai, &opts, request(Some("judge it")))
        .await
        .expect("analyze");
    assert_eq!(row.status(), DeepSearchStatus::Completed);
    assert_eq!(row.summary.as_deref(), Some("an unboxing and review video"));
    assert_eq!(row.analysis.as_deref(), Some("strong collaboration potential"));
    assert_eq!(row.videoai_asset_id.as_deref(), Some("vid-1"));
    assert_eq!(row.video_id.as_deref(), Some("abc123xyz00"));
    let chapters = row.chapters.expect("chapters stored");
    assert_eq!(chapters[0]["title"], "Intro");

    // The scratch file is gone after the job.
    assert!(
        !opts.download_dir.join("abc123xyz00.mp4").exists(),
        "downloaded file must be cleaned up"
    );

    // Second call: cached row, no second download or indexing.
    let again = analyze(&pool, &downloader, &videoai, &opts, request(None))
        .await
        .expect("cached analyze");
    assert_eq!(again.id, row.id);
    assert_eq!(again.status(), DeepSearchStatus::Completed);
    assert_eq!(downloader.call_count(), 1, "no duplicate download");
}

#[sqlx::test(migrations = "../../migrations")]
async fn invalid_urls_are_rejected_without_creating_rows(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let videoai = videoai_for(&server);
    let downloader = FakeDownloader::new();
    let opts = options("invalid-url");

    for bad in [
        "https://www.youtube.com/channel/UCabc",
        "https://www.youtube.com/playlist?list=PLx",
        "https://www.youtube.com/@handle",
    ] {
        let err = analyze(
            &pool,
            &downloader,
            &videoai,
            &opts,
            AnalyzeRequest {
                video_url: bad,
                channel_id: None,
                custom_prompt: None,
            },
        )
        .await
        .expect_err("must reject");
        assert!(matches!(err, DeepSearchError::InvalidVideoUrl { .. }));
        assert!(
            dreamwell_db::get_analysis_by_url(&pool, bad)
                .await
                .expect("query")
                .is_none(),
            "validation failures must not create rows"
        );
    }
    assert_eq!(downloader.call_count(), 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn download_failure_is_recorded_not_raised(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let videoai = videoai_for(&server);
    let opts = options("download-failure");

    let row = analyze(&pool, &FailingDownloader, &videoai, &opts, request(None))
        .await
        .expect("failure is a status, not an error");
    assert_eq!(row.status(), DeepSearchStatus::Failed);
    let message = row.error_message.expect("error recorded");
    assert!(message.contains("simulated network failure"), "got: {message}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn indexing_timeout_fails_the_job_and_cleans_up(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"_id": "idx-1", "index_name": "dreamwell_index"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"_id": "task-1"})),
        )
        .mount(&server)
        .await;
    // Never becomes ready; the bounded poll loop must give up.
    Mock::given(method("GET"))
        .and(path("/tasks/task-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"status": "processing", "video_id": null}),
        ))
        .mount(&server)
        .await;

    let videoai = videoai_for(&server);
    let downloader = FakeDownloader::new();
    let opts = options("timeout");

    let row = analyze(&pool, &downloader, &videoai, &opts, request(None))
        .await
        .expect("timeout is a status, not an error");
    assert_eq!(row.status(), DeepSearchStatus::Failed);
    assert!(
        row.error_message.expect("message").contains("timed out"),
        "timeout failure kind surfaced"
    );
    assert!(
        !opts.download_dir.join("abc123xyz00.mp4").exists(),
        "cleanup also runs on the failure path"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn in_flight_rows_block_duplicate_jobs(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let videoai = videoai_for(&server);
    let downloader = FakeDownloader::new();
    let opts = options("in-flight");

    // A concurrent request has already claimed the URL.
    dreamwell_db::claim_analysis(&pool, URL, None, None)
        .await
        .expect("claim")
        .expect("new row");

    let row = analyze(&pool, &downloader, &videoai, &opts, request(None))
        .await
        .expect("analyze");
    assert_eq!(row.status(), DeepSearchStatus::Pending);
    assert_eq!(downloader.call_count(), 0, "no second job started");
}

#[sqlx::test(migrations = "../../migrations")]
async fn retry_reruns_only_failed_rows(pool: sqlx::PgPool) {
    // First attempt fails at download.
    let failing_server = MockServer::start().await;
    let failing_videoai = videoai_for(&failing_server);
    let opts = options("retry");
    let failed = analyze(
        &pool,
        &FailingDownloader,
        &failing_videoai,
        &opts,
        request(None),
    )
    .await
    .expect("failed analyze");
    assert_eq!(failed.status(), DeepSearchStatus::Failed);

    // Plain analyze on a failed row reports it without rerunning the job.
    let downloader = FakeDownloader::new();
    let still_failed = analyze(&pool, &downloader, &failing_videoai, &opts, request(None))
        .await
        .expect("analyze on failed row");
    assert_eq!(still_failed.status(), DeepSearchStatus::Failed);
    assert_eq!(downloader.call_count(), 0, "failed rows need explicit retry");

    // Retry runs the full flow again and completes.
    let server = MockServer::start().await;
    mount_happy_videoai(&server).await;
    let videoai = videoai_for(&server);
    let row = retry(&pool, &downloader, &videoai, &opts, failed.id, None)
        .await
        .expect("retry");
    assert_eq!(row.status(), DeepSearchStatus::Completed);
    assert!(row.error_message.is_none(), "old failure cleared");
    assert_eq!(downloader.call_count(), 1);

    // A completed row is not retryable.
    let err = retry(&pool, &downloader, &videoai, &opts, failed.id, None)
        .await
        .expect_err("completed rows must not retry");
    assert!(matches!(
        err,
        DeepSearchError::Db(dreamwell_db::DbError::InvalidDeepSearchTransition { .. })
    ));

    // An unknown id is NotFound.
    let err = retry(&pool, &downloader, &videoai, &opts, 999_999, None)
        .await
        .expect_err("unknown id");
    assert!(matches!(
        err,
        DeepSearchError::Db(dreamwell_db::DbError::NotFound)
    ));
}
