//! Brand-fit judgment seam.
//!
//! The values/cultural sub-scores come from an LLM call in production, but
//! the pipeline only sees this trait so tests can substitute a deterministic
//! judge. Judge failures never fail a search; the caller substitutes the
//! neutral 50/50 judgment and keeps scoring.

use std::future::Future;

use dreamwell_llm::{FitJudgment, LlmClient, LlmError};

use crate::types::CompanyProfile;

/// Facts about one channel handed to the judge.
#[derive(Debug, Clone, Copy)]
pub struct ChannelFacts<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub country: Option<&'a str>,
}

/// Judges values alignment and cultural fit for one channel, 0–100 each.
pub trait FitJudge: Send + Sync {
    fn judge(
        &self,
        company: &CompanyProfile,
        channel: ChannelFacts<'_>,
    ) -> impl Future<Output = Result<FitJudgment, LlmError>> + Send;
}

/// The neutral judgment used when no judge is configured or a call fails.
#[must_use]
pub fn neutral_judgment() -> FitJudgment {
    FitJudgment {
        values_alignment: 50.0,
        cultural_fit: 50.0,
        values_reasoning: None,
        cultural_reasoning: None,
    }
}

/// Always returns the neutral judgment. Used when the deployment has no LLM
/// API key; searches still rank on the metric factors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralJudge;

impl FitJudge for NeutralJudge {
    async fn judge(
        &self,
        _company: &CompanyProfile,
        _channel: ChannelFacts<'_>,
    ) -> Result<FitJudgment, LlmError> {
        Ok(neutral_judgment())
    }
}

impl FitJudge for LlmClient {
    async fn judge(
        &self,
        company: &CompanyProfile,
        channel: ChannelFacts<'_>,
    ) -> Result<FitJudgment, LlmError> {
        self.judge_brand_fit(
            &company.keywords,
            company.country.as_deref(),
            channel.title,
            channel.description,
            channel.country,
        )
        .await
    }
}

/// Deployment-time judge selection: LLM-backed when a key is configured,
/// neutral otherwise.
pub enum Judge {
    Llm(LlmClient),
    Neutral,
}

impl FitJudge for Judge {
    async fn judge(
        &self,
        company: &CompanyProfile,
        channel: ChannelFacts<'_>,
    ) -> Result<FitJudgment, LlmError> {
        match self {
            Judge::Llm(client) => client.judge(company, channel).await,
            Judge::Neutral => Ok(neutral_judgment()),
        }
    }
}
