use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};
use voice_interviewer::config::StoreBackend;
use voice_interviewer::{
    create_router, AppState, CompletionScore, Config, GeminiClient, InterviewStore,
    KeywordHelpClassifier, LlmCodeEvaluator, LlmQuestionGenerator, MemoryStore, NatsClient,
    NatsSessionFactory, ResponseGenerator, SharedServices, SupabaseStore,
};

#[derive(Parser)]
#[command(name = "voice-interviewer")]
#[command(about = "Voice mock-interview service")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/voice-interviewer")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Print the resolved configuration and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }
        Command::Serve => serve(cfg).await,
    }
}

async fn serve(cfg: Config) -> Result<()> {
    info!("Voice Interviewer v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let model = Arc::new(
        GeminiClient::new(cfg.llm.gemini_config()?).context("Failed to create language model client")?,
    );
    info!("Language model: {}", cfg.llm.model);

    let store: Arc<dyn InterviewStore> = match cfg.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory interview store; results are lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Supabase => {
            info!("Using Supabase interview store at {}", cfg.store.url);
            Arc::new(SupabaseStore::new(cfg.store.supabase_config()?)?)
        }
    };

    let services = SharedServices {
        responder: Arc::new(ResponseGenerator::new(
            model.clone(),
            Arc::new(KeywordHelpClassifier::new()),
        )),
        questions: Arc::new(LlmQuestionGenerator::new(model.clone())),
        store,
        scoring: Arc::new(CompletionScore::new()),
        output: cfg.speech.output_config(),
        capture: cfg.speech.capture_config(),
    };

    let nats = Arc::new(NatsClient::connect(&cfg.nats.url).await?);
    let factory = Arc::new(NatsSessionFactory::new(nats, services));
    let evaluator = Arc::new(LlmCodeEvaluator::new(model));

    let state = AppState::new(factory, evaluator, cfg.interview.to_config());
    let app = create_router(state.clone());

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    state.shutdown_all().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
