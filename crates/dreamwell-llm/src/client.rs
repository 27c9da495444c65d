//! HTTP client for the completion endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::parse::{extract_json_object, parse_keyword_list};
use crate::prompts;
use crate::{FitJudgment, ProductExtraction};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Page HTML beyond this many bytes adds token cost without extraction value.
const MAX_PAGE_BYTES: usize = 8_000;

/// Completion-endpoint client.
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl LlmClient {
    /// Creates a client against the production endpoint with the default model.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, DEFAULT_MODEL, timeout_secs)
    }

    /// Creates a client against an explicit base URL (mock servers in tests).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            model: model.to_owned(),
        })
    }

    /// Sends one prompt and returns the first candidate's text.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on transport failure, non-2xx status, or an empty
    /// candidate list.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body: GenerateResponse = response.json().await?;
        tracing::debug!(model = %self.model, "LLM completion succeeded");
        body.candidates
            .into_iter()
            .find_map(|c| {
                c.content
                    .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    /// Generates up to `top_n` influencer-search keywords from website content.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the completion call fails.
    pub async fn generate_keywords(
        &self,
        url: &str,
        page_text: &str,
        top_n: usize,
    ) -> Result<Vec<String>, LlmError> {
        let truncated = truncate(page_text, MAX_PAGE_BYTES);
        let prompt = prompts::keyword_generation(url, truncated, top_n);
        let text = self.generate(&prompt).await?;
        Ok(parse_keyword_list(&text, top_n))
    }

    /// Extracts product details (name/category/keywords/profit) from a page.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the completion call fails or the output holds
    /// no JSON object.
    pub async fn extract_product(
        &self,
        url: &str,
        html: &str,
    ) -> Result<ProductExtraction, LlmError> {
        let truncated = truncate(html, MAX_PAGE_BYTES);
        let prompt = prompts::product_extraction(url, truncated);
        let text = self.generate(&prompt).await?;
        let value = extract_json_object(&text, "product extraction")?;
        serde_json::from_value(value).map_err(|e| LlmError::Unparseable {
            context: "product extraction".to_owned(),
            reason: e.to_string(),
        })
    }

    /// Judges values alignment and cultural fit for one channel.
    ///
    /// Scores outside [0, 100] are clamped rather than rejected; models
    /// occasionally return 100.0001-style values.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if the completion call fails or the output holds
    /// no parseable judgment.
    pub async fn judge_brand_fit(
        &self,
        company_keywords: &[String],
        company_country: Option<&str>,
        channel_title: &str,
        channel_description: &str,
        channel_country: Option<&str>,
    ) -> Result<FitJudgment, LlmError> {
        let prompt = prompts::brand_fit(
            company_keywords,
            company_country,
            channel_title,
            channel_description,
            channel_country,
        );
        let text = self.generate(&prompt).await?;
        let value = extract_json_object(&text, "brand fit judgment")?;
        let mut judgment: FitJudgment =
            serde_json::from_value(value).map_err(|e| LlmError::Unparseable {
                context: "brand fit judgment".to_owned(),
                reason: e.to_string(),
            })?;
        judgment.values_alignment = judgment.values_alignment.clamp(0.0, 100.0);
        judgment.cultural_fit = judgment.cultural_fit.clamp(0.0, 100.0);
        Ok(judgment)
    }
}

/// Truncates on a char boundary at or below `max_bytes`.
fn truncate(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
