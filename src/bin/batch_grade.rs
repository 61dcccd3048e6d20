use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use turing_grader::config::toml_config::GraderConfig;
use turing_grader::utils::error::GradeError;
use turing_grader::utils::logger;
use turing_grader::utils::validation::{validate_file_extension, validate_positive_number, Validate};
use turing_grader::{BatchGrader, JsonFileQuestionStore, OpenAiChatModel};

#[derive(Parser)]
#[command(name = "batch-grade")]
#[command(about = "Grade a CSV of answers (question_id,student_id,answer) against stored questions")]
struct Args {
    /// Input CSV with question_id,student_id,answer columns
    input: PathBuf,

    /// Output CSV path
    #[arg(short, long, default_value = "./output/grades.csv")]
    output: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, default_value = "turing.toml")]
    config: String,

    /// Question store file (overrides [store] path)
    #[arg(long)]
    store: Option<String>,

    /// Override [batch] concurrent_requests
    #[arg(long)]
    concurrent_requests: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show what would be graded without calling the model
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting batch grading");

    match run(&args).await {
        Ok(0) => Ok(()),
        // 有失敗列時以 2 結束，方便重跑
        Ok(_) => std::process::exit(2),
        Err(e) => {
            tracing::error!(
                "❌ Batch grading failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

/// Returns the number of rows that failed.
async fn run(args: &Args) -> turing_grader::Result<usize> {
    let config = if std::path::Path::new(&args.config).exists() {
        tracing::info!("📁 Loading configuration from: {}", args.config);
        GraderConfig::from_file(&args.config)?
    } else {
        tracing::warn!("⚠️ {} not found, using default configuration", args.config);
        GraderConfig::default()
    };
    config.validate()?;

    validate_file_extension("input", &args.input, &["csv"])?;
    let concurrent_requests = args
        .concurrent_requests
        .unwrap_or_else(|| config.concurrent_requests());
    validate_positive_number("concurrent_requests", concurrent_requests, 1)?;

    let store_path = args
        .store
        .clone()
        .or_else(|| config.store_path().map(str::to_string))
        .ok_or_else(|| GradeError::MissingConfigError {
            field: "store.path (or --store)".to_string(),
        })?;
    let store = Arc::new(JsonFileQuestionStore::open(&store_path).await?);

    if args.dry_run {
        let data = tokio::fs::read(&args.input).await?;
        let rows = BatchGrader::read_rows(&data)?;
        tracing::info!("🔍 DRY RUN MODE - {} rows would be graded", rows.len());
        println!(
            "🔍 {} rows in {}, store {}",
            rows.len(),
            args.input.display(),
            store.path().display()
        );
        return Ok(0);
    }

    let model = Arc::new(OpenAiChatModel::new(config.chat_model_settings())?);
    let batch = BatchGrader::new(model, store, concurrent_requests);

    let outcomes = batch.grade_file(&args.input, &args.output).await?;
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();

    println!("✅ Graded {} answers ({} failed)", outcomes.len() - failed, failed);
    println!("📁 Output saved to: {}", args.output.display());

    Ok(failed)
}
