use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use recap_core::model::DEFAULT_MODEL_ID;
use recap_core::{HfInferenceModel, YouTubeTranscriptClient};

mod handlers;

use handlers::{AppState, router};

#[derive(Parser)]
#[command(name = "recap-server")]
#[command(about = "Serve YouTube transcript downloads and abstractive summaries over HTTP")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Summarization model id on the inference API
    #[arg(long, default_value = DEFAULT_MODEL_ID)]
    model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // The model handle is heavyweight by contract: build it once at startup
    // and share it read-only across requests.
    let model = HfInferenceModel::from_env(&cli.model)?;
    let state = AppState {
        transcripts: Arc::new(YouTubeTranscriptClient::new()),
        model: Arc::new(model),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!(addr = %cli.bind, model = %cli.model, "recap-server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
