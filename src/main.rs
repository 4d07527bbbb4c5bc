use anyhow::{Context, Result};
use capture_relay::synth::{FileSink, HttpVoiceEngine, SpeechSynthesizer};
use capture_relay::transcriber::{RemoteRecognizerConfig, RemoteRecognizerFactory};
use capture_relay::{
    create_router, AppState, Config, DeviceFactory, HttpUploader, HttpUploaderConfig,
    SessionConfig, SessionController,
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "capture-relay", about = "Capture session relay service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(short, long, default_value = "config/capture-relay")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);

    let client = reqwest::Client::new();

    let acquirer = DeviceFactory::create(&cfg.device)?;

    let recognizers = Arc::new(RemoteRecognizerFactory::new(
        client.clone(),
        RemoteRecognizerConfig {
            endpoint: cfg.recognizer.endpoint.clone(),
            api_key: cfg.recognizer.api_key.clone(),
            model: cfg.recognizer.model.clone(),
            content_type: cfg.device.content_type.clone(),
        },
    ));

    let uploader = Arc::new(HttpUploader::new(
        client.clone(),
        HttpUploaderConfig {
            backend_url: cfg.backend.url.clone(),
            transcript_path: cfg.backend.transcript_path.clone(),
            payload_shape: cfg.backend.payload_shape,
            reply_field: cfg.backend.reply_field.clone(),
            user_id: cfg.backend.user_id.clone(),
            history: cfg.backend.history.clone(),
            storage_url: cfg.storage.url.clone(),
            storage_key: cfg.storage.key.clone(),
            bucket: cfg.storage.bucket.clone(),
            cache_control: cfg.storage.cache_control.clone(),
        },
    ));

    let synthesizer = Arc::new(SpeechSynthesizer::new(
        Arc::new(HttpVoiceEngine::new(
            client,
            cfg.synthesis.endpoint.clone(),
            cfg.synthesis.api_key.clone(),
            cfg.synthesis.model.clone(),
            cfg.synthesis.voice.clone(),
        )),
        Arc::new(FileSink::new(&cfg.synthesis.output_dir)),
        cfg.synthesis.policy()?,
    ));

    let controller = Arc::new(SessionController::new(
        SessionConfig {
            content_type: cfg.device.content_type.clone(),
            retry: cfg.recognizer.retry_policy(),
        },
        acquirer,
        recognizers,
        uploader,
        synthesizer,
    ));

    let app = create_router(AppState::new(controller));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;

    Ok(())
}
