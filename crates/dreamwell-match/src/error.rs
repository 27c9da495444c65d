use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    /// Every keyword search failed and nothing was collected; the caller gets
    /// an explicit error instead of a silent empty result.
    #[error("influencer search unavailable: {0}")]
    SearchUnavailable(#[source] dreamwell_youtube::YouTubeError),
}
