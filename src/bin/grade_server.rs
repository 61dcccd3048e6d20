use clap::Parser;
use std::sync::Arc;
use turing_grader::app::{create_router, AppState};
use turing_grader::config::toml_config::GraderConfig;
use turing_grader::domain::ports::QuestionStore;
use turing_grader::utils::logger::{self, LogFormat};
use turing_grader::utils::validation::Validate;
use turing_grader::{InMemoryQuestionStore, JsonFileQuestionStore, OpenAiChatModel};

#[derive(Parser)]
#[command(name = "grade-server")]
#[command(about = "HTTP service that grades answers to stored questions")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "turing.toml")]
    config: String,

    /// Override the bind address from config
    #[arg(long)]
    bind: Option<String>,

    /// Override the question store file from config
    #[arg(long)]
    store: Option<String>,

    /// Log in compact text instead of JSON
    #[arg(long)]
    pretty_logs: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let format = if args.pretty_logs {
        LogFormat::Compact
    } else {
        LogFormat::Json
    };
    logger::init_logger(format, args.verbose);

    tracing::info!("🚀 Starting grade server");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = if std::path::Path::new(&args.config).exists() {
        match GraderConfig::from_file(&args.config) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        }
    } else {
        tracing::warn!("⚠️ {} not found, using default configuration", args.config);
        GraderConfig::default()
    };

    // 套用命令列覆蓋設定
    if let Some(bind) = args.bind {
        config.server = Some(turing_grader::config::toml_config::ServerConfig { bind: Some(bind) });
    }
    if let Some(path) = args.store {
        config.store = Some(turing_grader::config::toml_config::StoreConfig { path: Some(path) });
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let store: Arc<dyn QuestionStore> = match config.store_path() {
        Some(path) => {
            let store = JsonFileQuestionStore::open(path).await?;
            tracing::info!("📂 Using question file {}", store.path().display());
            Arc::new(store)
        }
        None => {
            tracing::info!("📂 Using in-memory question store");
            Arc::new(InMemoryQuestionStore::new())
        }
    };

    let model = OpenAiChatModel::new(config.chat_model_settings())?;
    tracing::info!(
        "🤖 Using model {} at {}",
        model.settings().model,
        model.settings().base_url
    );
    let model = Arc::new(model);

    let app = create_router(AppState::new(store, model));

    let addr = config.bind_address().to_string();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("✅ Server listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("🛑 Shutting down");
        })
        .await?;

    Ok(())
}
