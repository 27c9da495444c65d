use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeepSearchError {
    #[error("invalid video URL \"{url}\": must be a single YouTube video, not a channel or playlist")]
    InvalidVideoUrl { url: String },

    #[error("video download failed: {reason}")]
    Download { reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("video AI returned status {status} for {context}")]
    UnexpectedStatus { status: u16, context: &'static str },

    #[error("video indexing failed: {reason}")]
    IndexingFailed { reason: String },

    #[error("video indexing timed out after {attempts} status polls")]
    IndexingTimeout { attempts: u32 },

    #[error(transparent)]
    Db(#[from] dreamwell_db::DbError),
}
