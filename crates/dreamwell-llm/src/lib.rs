//! LLM completion client.
//!
//! One `generateContent`-style endpoint drives three features: keyword
//! generation from a company website, product extraction from a page, and
//! brand-fit judgment between a company profile and a channel. Prompts live
//! here so every caller gets the same phrasing.

mod client;
mod error;
mod parse;
mod prompts;

pub use client::{LlmClient, DEFAULT_MODEL};
pub use error::LlmError;
pub use parse::{extract_json_object, parse_keyword_list};

use serde::Deserialize;

/// Product details extracted from a page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductExtraction {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Estimated profit per unit in USD, when the page gives enough signal.
    pub estimated_profit: Option<f64>,
}

/// Brand-fit judgment for one channel, both axes on a 0–100 scale.
#[derive(Debug, Clone, Deserialize)]
pub struct FitJudgment {
    pub values_alignment: f64,
    pub cultural_fit: f64,
    #[serde(default)]
    pub values_reasoning: Option<String>,
    #[serde(default)]
    pub cultural_reasoning: Option<String>,
}
