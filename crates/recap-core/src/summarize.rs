use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::model::{GenerationParams, LanguageModel};

/// Task prefix the model was pretrained on, concatenated directly to the
/// input with no separator.
pub const SUMMARY_PREFIX: &str = "summarize:";

/// Input budget; anything past it is silently dropped.
pub const MAX_INPUT_TOKENS: usize = 512;

/// End-of-sequence marker stripped from decoded output.
pub const EOS_MARKER: &str = "</s>";

/// Produce a deduplicated set of abstractive summaries for `text`.
///
/// Beam search with the fixed decoding configuration yields up to four
/// candidates; exact-duplicate candidates collapse, so the result holds
/// between one and four strings. Order follows the first occurrence in the
/// generate output.
pub async fn summarize<M>(model: &M, text: &str) -> Result<Vec<String>>
where
    M: LanguageModel + ?Sized,
{
    let prompt = format!("{SUMMARY_PREFIX}{text}");
    let mut tokens = model.encode(&prompt)?;
    if tokens.len() > MAX_INPUT_TOKENS {
        debug!(
            dropped = tokens.len() - MAX_INPUT_TOKENS,
            "truncating model input"
        );
        tokens.truncate(MAX_INPUT_TOKENS);
    }

    let params = GenerationParams::default();
    let outputs = model.generate(&tokens, &params).await?;

    let mut seen = HashSet::new();
    let mut summaries = Vec::new();
    for sequence in outputs {
        let decoded = model.decode(&sequence)?;
        let candidate = decoded.replace(EOS_MARKER, "").trim().to_string();
        if seen.insert(candidate.clone()) {
            summaries.push(candidate);
        }
    }

    Ok(summaries)
}
