//! Generate one image from a text prompt and save it as PNG.
//!
//! Reads the API key from `LETZAI_API_KEY` and the prompt from the command
//! line. Press Ctrl-C while the job runs to cancel it remotely.
//!
//! ```sh
//! LETZAI_API_KEY=... cargo run --example generate -- "a lighthouse at dusk"
//! ```

use letzai_rs::{ClientConfig, GenerationRequest, LetzClient, Mode, TracingReporter};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let api_key = std::env::var("LETZAI_API_KEY").unwrap_or_default();
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "a lighthouse at dusk, oil painting".to_string());

    let client = LetzClient::with_config(api_key, ClientConfig::from_env()?);

    // Ctrl-C trips the token; the poller interrupts the remote job
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let request = GenerationRequest::new(prompt)
        .size(1600, 1024)
        .quality(3)
        .mode(Mode::Turbo);

    let batch = client
        .generate(&request, &cancel, &TracingReporter::new())
        .await?;
    println!("Received tensor with shape {:?}", batch.shape());

    if let Some(img) = batch.to_rgb_image(0) {
        img.save("letzai_output.png")?;
        println!("Saved: letzai_output.png");
    }

    Ok(())
}
