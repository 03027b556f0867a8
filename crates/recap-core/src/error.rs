use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecapError {
    #[error("Invalid YouTube URL: {url}")]
    InvalidUrl { url: String },

    #[error("Transcript unavailable for {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("Transcript contains no text")]
    EmptyTranscript,

    #[error("Summarization model failed: {reason}")]
    ModelFailed { reason: String },

    #[error("Document rendering failed: {reason}")]
    RenderFailed { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

pub type Result<T> = std::result::Result<T, RecapError>;
