use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM returned status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("LLM response had no text candidate")]
    EmptyResponse,

    #[error("could not parse {context} from LLM output: {reason}")]
    Unparseable { context: String, reason: String },
}
