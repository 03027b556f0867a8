use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{RecapError, Result};

const INFERENCE_API_BASE: &str = "https://api-inference.huggingface.co/models";

/// Environment variable holding the inference API token.
pub const API_TOKEN_ENV: &str = "HF_API_TOKEN";

/// Model used when no override is given on the command line.
pub const DEFAULT_MODEL_ID: &str = "t5-base";

/// A single unit of a model's client-visible token representation.
pub type Token = String;

/// Fixed beam-search decoding configuration.
///
/// A fixed configuration keeps generation repeatable for a given model and
/// input: beam search involves no sampling.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub min_length: usize,
    pub max_length: usize,
    pub length_penalty: f64,
    pub num_beams: usize,
    pub no_repeat_ngram_size: usize,
    pub num_return_sequences: usize,
    pub early_stopping: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            min_length: 40,
            max_length: 150,
            length_penalty: 2.0,
            num_beams: 4,
            no_repeat_ngram_size: 2,
            num_return_sequences: 4,
            early_stopping: true,
        }
    }
}

/// Pretrained sequence-to-sequence model capability.
///
/// Implementations are read-only after construction and safe to share across
/// concurrent requests.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<Token>>;

    async fn generate(
        &self,
        input: &[Token],
        params: &GenerationParams,
    ) -> Result<Vec<Vec<Token>>>;

    fn decode(&self, tokens: &[Token]) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    summary_text: String,
}

/// Summarization backend on the Hugging Face inference API.
///
/// The hosted API exposes no tokenizer endpoint, so the client-visible token
/// unit is the whitespace-delimited piece; the input budget is applied to
/// those units before the request is sent.
pub struct HfInferenceModel {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
}

impl HfInferenceModel {
    pub fn new(model_id: &str, api_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: format!("{INFERENCE_API_BASE}/{model_id}"),
            api_token,
        }
    }

    /// Build a backend for `model_id` with the API token from the
    /// environment. Fails so a misconfigured server never starts.
    pub fn from_env(model_id: &str) -> Result<Self> {
        let api_token = std::env::var(API_TOKEN_ENV).map_err(|_| RecapError::MissingApiKey {
            env_var: API_TOKEN_ENV.to_string(),
        })?;
        Ok(Self::new(model_id, api_token))
    }
}

#[async_trait]
impl LanguageModel for HfInferenceModel {
    fn encode(&self, text: &str) -> Result<Vec<Token>> {
        Ok(text.split_whitespace().map(str::to_string).collect())
    }

    async fn generate(
        &self,
        input: &[Token],
        params: &GenerationParams,
    ) -> Result<Vec<Vec<Token>>> {
        let body = serde_json::json!({
            "inputs": input.join(" "),
            "parameters": {
                "min_length": params.min_length,
                "max_length": params.max_length,
                "length_penalty": params.length_penalty,
                "num_beams": params.num_beams,
                "no_repeat_ngram_size": params.no_repeat_ngram_size,
                "num_return_sequences": params.num_return_sequences,
                "early_stopping": params.early_stopping,
                "do_sample": false,
            },
        });

        debug!(tokens = input.len(), "requesting generation");
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RecapError::ModelFailed {
                reason: format!("inference request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RecapError::ModelFailed {
                reason: format!("inference API returned {status}: {detail}"),
            });
        }

        let outputs: Vec<GeneratedText> =
            response.json().await.map_err(|e| RecapError::ModelFailed {
                reason: format!("malformed inference response: {e}"),
            })?;

        outputs.iter().map(|o| self.encode(&o.summary_text)).collect()
    }

    fn decode(&self, tokens: &[Token]) -> Result<String> {
        Ok(tokens.join(" "))
    }
}
