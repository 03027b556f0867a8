//! Recap Core Library
//!
//! Core functionality for the recap web service: resolving YouTube URLs to
//! video identifiers, fetching and assembling caption transcripts, running
//! the abstractive summarization pipeline, and rendering transcripts as PDF
//! documents.

pub mod error;
pub mod export;
pub mod model;
pub mod resolve;
pub mod summarize;
pub mod transcript;

// Re-export commonly used items at crate root
pub use error::{RecapError, Result};
pub use export::render_document;
pub use model::{GenerationParams, HfInferenceModel, LanguageModel, Token};
pub use resolve::resolve_video_id;
pub use summarize::{EOS_MARKER, MAX_INPUT_TOKENS, SUMMARY_PREFIX, summarize};
pub use transcript::{TranscriptFragment, TranscriptSource, YouTubeTranscriptClient, assemble};
