//! HTTP client for the video-understanding API.
//!
//! Flow per video: ensure the shared index exists, upload the file as an
//! indexing task, poll the task until ready, then request summary, chapters,
//! and (optionally) a custom-prompt analysis against the indexed asset.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DeepSearchError;

const DEFAULT_BASE_URL: &str = "https://api.twelvelabs.io/v1.3";

/// Model and options requested when the index has to be created.
const INDEX_MODEL: &str = "pegasus1.2";

/// One chapter of an analyzed video, as persisted to the cache row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter_number: i64,
    pub start: f64,
    pub end: f64,
    pub title: String,
    pub summary: String,
}

/// Video-understanding API client.
pub struct VideoAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl VideoAiClient {
    /// Creates a client against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DeepSearchError::Http`] if the `reqwest::Client` cannot be
    /// built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, DeepSearchError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, timeout_secs)
    }

    /// Creates a client against an explicit base URL (mock servers in tests).
    ///
    /// # Errors
    ///
    /// Returns [`DeepSearchError::Http`] if the `reqwest::Client` cannot be
    /// built.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, DeepSearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    /// Returns the id of the named index, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`DeepSearchError`] on transport failure or a non-2xx status.
    pub async fn ensure_index(&self, index_name: &str) -> Result<String, DeepSearchError> {
        #[derive(Deserialize)]
        struct IndexList {
            #[serde(default)]
            data: Vec<IndexEntry>,
        }
        #[derive(Deserialize)]
        struct IndexEntry {
            #[serde(rename = "_id")]
            id: String,
            index_name: String,
        }

        let response = self
            .client
            .get(format!("{}/indexes", self.base_url))
            .header("x-api-key", &self.api_key)
            .query(&[("index_name", index_name)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeepSearchError::UnexpectedStatus {
                status: status.as_u16(),
                context: "index list",
            });
        }
        let list: IndexList = response.json().await?;
        if let Some(existing) = list.data.into_iter().find(|i| i.index_name == index_name) {
            return Ok(existing.id);
        }

        #[derive(Deserialize)]
        struct Created {
            #[serde(rename = "_id")]
            id: String,
        }

        let response = self
            .client
            .post(format!("{}/indexes", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({
                "index_name": index_name,
                "models": [{
                    "model_name": INDEX_MODEL,
                    "model_options": ["visual", "audio"],
                }],
            }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeepSearchError::UnexpectedStatus {
                status: status.as_u16(),
                context: "index create",
            });
        }
        let created: Created = response.json().await?;
        Ok(created.id)
    }

    /// Uploads a local video file as an indexing task; returns the task id.
    ///
    /// # Errors
    ///
    /// Returns [`DeepSearchError`] if the file cannot be read, the upload
    /// fails, or the API answers non-2xx.
    pub async fn create_index_task(
        &self,
        index_id: &str,
        file_path: &Path,
    ) -> Result<String, DeepSearchError> {
        let bytes = tokio::fs::read(file_path)
            .await
            .map_err(|e| DeepSearchError::IndexingFailed {
                reason: format!("could not read {}: {e}", file_path.display()),
            })?;
        let file_name = file_path
            .file_name()
            .map_or_else(|| "video.mp4".to_owned(), |n| n.to_string_lossy().into_owned());

        let form = reqwest::multipart::Form::new()
            .text("index_id", index_id.to_owned())
            .part(
                "video_file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        #[derive(Deserialize)]
        struct Created {
            #[serde(rename = "_id")]
            id: String,
        }

        let response = self
            .client
            .post(format!("{}/tasks", self.base_url))
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeepSearchError::UnexpectedStatus {
                status: status.as_u16(),
                context: "task create",
            });
        }
        let created: Created = response.json().await?;
        Ok(created.id)
    }

    /// Polls an indexing task until it is ready and returns the indexed
    /// asset's video id.
    ///
    /// # Errors
    ///
    /// Returns [`DeepSearchError::IndexingFailed`] if the task reports
    /// failure, [`DeepSearchError::IndexingTimeout`] after `max_attempts`
    /// polls, or a transport/status error.
    pub async fn wait_for_task(
        &self,
        task_id: &str,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Result<String, DeepSearchError> {
        #[derive(Deserialize)]
        struct TaskStatus {
            status: String,
            video_id: Option<String>,
        }

        for attempt in 0..max_attempts {
            let response = self
                .client
                .get(format!("{}/tasks/{task_id}", self.base_url))
                .header("x-api-key", &self.api_key)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(DeepSearchError::UnexpectedStatus {
                    status: status.as_u16(),
                    context: "task poll",
                });
            }
            let task: TaskStatus = response.json().await?;

            tracing::debug!(task_id, status = %task.status, attempt, "indexing task status");
            match task.status.as_str() {
                "ready" => {
                    return task.video_id.ok_or(DeepSearchError::IndexingFailed {
                        reason: "task ready without a video id".to_owned(),
                    });
                }
                "failed" => {
                    return Err(DeepSearchError::IndexingFailed {
                        reason: format!("task {task_id} reported failure"),
                    });
                }
                _ => {}
            }

            tokio::time::sleep(poll_interval).await;
        }

        Err(DeepSearchError::IndexingTimeout {
            attempts: max_attempts,
        })
    }

    /// Generates the prose summary for an indexed video.
    ///
    /// # Errors
    ///
    /// Returns [`DeepSearchError`] on transport failure or a non-2xx status.
    pub async fn summarize(&self, video_id: &str) -> Result<String, DeepSearchError> {
        #[derive(Deserialize)]
        struct SummaryResponse {
            summary: Option<String>,
        }

        let body: SummaryResponse = self
            .summarize_call(video_id, "summary", "summarize")
            .await?;
        Ok(body.summary.unwrap_or_default())
    }

    /// Generates chapter breakdowns for an indexed video.
    ///
    /// # Errors
    ///
    /// Returns [`DeepSearchError`] on transport failure or a non-2xx status.
    pub async fn chapters(&self, video_id: &str) -> Result<Vec<Chapter>, DeepSearchError> {
        #[derive(Deserialize)]
        struct ChaptersResponse {
            #[serde(default)]
            chapters: Vec<WireChapter>,
        }
        #[derive(Deserialize)]
        struct WireChapter {
            chapter_number: i64,
            start: f64,
            end: f64,
            chapter_title: String,
            chapter_summary: String,
        }

        let body: ChaptersResponse = self.summarize_call(video_id, "chapter", "chapters").await?;
        Ok(body
            .chapters
            .into_iter()
            .map(|c| Chapter {
                chapter_number: c.chapter_number,
                start: c.start,
                end: c.end,
                title: c.chapter_title,
                summary: c.chapter_summary,
            })
            .collect())
    }

    /// Runs a custom-prompt analysis against an indexed video.
    ///
    /// # Errors
    ///
    /// Returns [`DeepSearchError`] on transport failure or a non-2xx status.
    pub async fn analyze(&self, video_id: &str, prompt: &str) -> Result<String, DeepSearchError> {
        #[derive(Deserialize)]
        struct AnalyzeResponse {
            data: Option<String>,
        }

        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({"video_id": video_id, "prompt": prompt}))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeepSearchError::UnexpectedStatus {
                status: status.as_u16(),
                context: "analyze",
            });
        }
        let body: AnalyzeResponse = response.json().await?;
        Ok(body.data.unwrap_or_default())
    }

    async fn summarize_call<T: serde::de::DeserializeOwned>(
        &self,
        video_id: &str,
        summary_type: &str,
        context: &'static str,
    ) -> Result<T, DeepSearchError> {
        let response = self
            .client
            .post(format!("{}/summarize", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({"video_id": video_id, "type": summary_type}))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeepSearchError::UnexpectedStatus {
                status: status.as_u16(),
                context,
            });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> VideoAiClient {
        VideoAiClient::with_base_url(&server.uri(), "key", 5).expect("client")
    }

    #[tokio::test]
    async fn ensure_index_reuses_existing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"_id": "idx-1", "index_name": "dreamwell_index"}]
            })))
            .mount(&server)
            .await;

        let id = client(&server)
            .ensure_index("dreamwell_index")
            .await
            .expect("index");
        assert_eq!(id, "idx-1");
    }

    #[tokio::test]
    async fn ensure_index_creates_when_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .and(body_partial_json(
                serde_json::json!({"index_name": "dreamwell_index"}),
            ))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"_id": "idx-new"})),
            )
            .mount(&server)
            .await;

        let id = client(&server)
            .ensure_index("dreamwell_index")
            .await
            .expect("index");
        assert_eq!(id, "idx-new");
    }

    #[tokio::test]
    async fn wait_for_task_returns_video_id_when_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"status": "processing", "video_id": null}),
            ))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks/task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"status": "ready", "video_id": "vid-9"}),
            ))
            .mount(&server)
            .await;

        let video_id = client(&server)
            .wait_for_task("task-1", Duration::from_millis(0), 10)
            .await
            .expect("ready");
        assert_eq!(video_id, "vid-9");
    }

    #[tokio::test]
    async fn wait_for_task_times_out_after_bounded_polls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"status": "processing", "video_id": null}),
            ))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server)
            .wait_for_task("task-1", Duration::from_millis(0), 3)
            .await
            .expect_err("should time out");
        assert!(matches!(
            err,
            DeepSearchError::IndexingTimeout { attempts: 3 }
        ));
    }

    #[tokio::test]
    async fn wait_for_task_surfaces_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"status": "failed", "video_id": null}),
            ))
            .mount(&server)
            .await;

        let err = client(&server)
            .wait_for_task("task-1", Duration::from_millis(0), 3)
            .await
            .expect_err("should fail");
        assert!(matches!(err, DeepSearchError::IndexingFailed { .. }));
    }

    #[tokio::test]
    async fn chapters_map_wire_field_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/summarize"))
            .and(body_partial_json(serde_json::json!({"type": "chapter"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chapters": [{
                    "chapter_number": 1,
                    "start": 0.0,
                    "end": 93.5,
                    "chapter_title": "Unboxing",
                    "chapter_summary": "Product reveal and first impressions"
                }]
            })))
            .mount(&server)
            .await;

        let chapters = client(&server).chapters("vid-9").await.expect("chapters");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Unboxing");
        assert!((chapters[0].end - 93.5).abs() < f64::EPSILON);
    }
}
