use anyhow::Context;
use clap::{Parser, Subcommand};

use dreamwell_core::ScoringWeights;
use dreamwell_llm::LlmClient;
use dreamwell_match::{run_influencer_search, CompanyProfile, Judge, SearchOptions};
use dreamwell_youtube::YouTubeClient;

#[derive(Debug, Parser)]
#[command(name = "dreamwell-cli")]
#[command(about = "Dreamwell command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate influencer-search keywords from a company website.
    Keywords {
        /// Website URL to analyze.
        #[arg(long)]
        url: String,
        /// Number of keywords to generate.
        #[arg(long, default_value_t = 5)]
        top_n: usize,
    },
    /// Run an influencer search and print the ranked results.
    Search {
        /// Comma-separated search keywords.
        #[arg(long)]
        keywords: String,
        /// Bias results towards a market (ISO-3166 alpha-2).
        #[arg(long)]
        region: Option<String>,
        /// How many results to print.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = dreamwell_core::load_app_config()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Keywords { url, top_n } => {
            let api_key = config
                .llm_api_key
                .as_deref()
                .context("DREAMWELL_LLM_API_KEY is required for keyword generation")?;
            let llm = LlmClient::new(api_key, config.client_request_timeout_secs)?;

            let page_text = reqwest::get(&url)
                .await
                .and_then(reqwest::Response::error_for_status)
                .context("could not fetch the website")?
                .text()
                .await
                .unwrap_or_default();

            let keywords = llm.generate_keywords(&url, &page_text, top_n).await?;
            if keywords.is_empty() {
                println!("no keywords generated for {url}");
            } else {
                for (i, keyword) in keywords.iter().enumerate() {
                    println!("{:2}. {keyword}", i + 1);
                }
            }
        }
        Commands::Search {
            keywords,
            region,
            limit,
        } => {
            let api_key = config
                .youtube_api_key
                .as_deref()
                .context("DREAMWELL_YOUTUBE_API_KEY is required for influencer search")?;
            let youtube = YouTubeClient::new(
                api_key,
                config.client_request_timeout_secs,
                config.client_max_retries,
                config.client_retry_backoff_base_secs,
            )?;
            let judge = match config.llm_api_key.as_deref() {
                Some(key) => Judge::Llm(LlmClient::new(key, config.client_request_timeout_secs)?),
                None => Judge::Neutral,
            };

            let terms = dreamwell_core::split_keywords(&keywords);
            anyhow::ensure!(!terms.is_empty(), "no usable keywords in {keywords:?}");

            let options = SearchOptions {
                channels_per_keyword: config.search_channels_per_keyword,
                recent_video_cap: config.search_recent_video_cap,
                max_concurrent_candidates: config.search_max_concurrent_candidates,
                region,
                relevance_language: Some("en".to_owned()),
                cache_ttl_hours: config.search_cache_ttl_hours,
                month: None,
            };

            let outcome = run_influencer_search(
                &youtube,
                &judge,
                None,
                &options,
                &terms,
                &ScoringWeights::default(),
                &CompanyProfile::default(),
                None,
            )
            .await?;

            println!(
                "{} influencers (avg views {:.0}, avg score {:.1})",
                outcome.count, outcome.averages.avg_views, outcome.averages.avg_score
            );
            for candidate in outcome.influencers.iter().take(limit) {
                println!(
                    "{:5.1}  {:<40}  subs {:>10}  avg views {:>10.0}  est ${:.0}-${:.0}",
                    candidate.score,
                    candidate.title,
                    candidate
                        .subscriber_count
                        .map_or_else(|| "hidden".to_owned(), |s| s.to_string()),
                    candidate.avg_recent_views,
                    candidate.pricing_range_usd.0,
                    candidate.pricing_range_usd.1,
                );
            }
        }
    }

    Ok(())
}
