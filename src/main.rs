use clap::Parser;
use std::sync::Arc;
use turing_grader::utils::error::GradeError;
use turing_grader::utils::{logger, validation::Validate};
use turing_grader::{CliConfig, Grader, OpenAiChatModel};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting turing grader CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證參數
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    match run(&config).await {
        Ok(()) => Ok(()),
        Err(e) => exit_with(&e),
    }
}

async fn run(config: &CliConfig) -> turing_grader::Result<()> {
    let grader_config = config.load_grader_config()?;
    let model = OpenAiChatModel::new(grader_config.chat_model_settings())?;
    let settings = model.settings();
    if settings.api_key.is_none() {
        tracing::warn!("⚠️ No API key configured, sending unauthenticated requests");
    }
    tracing::info!("🤖 Using model {} at {}", settings.model, settings.base_url);

    let grader = Grader::new(Arc::new(model));
    let question = config.question()?;
    let assessment = grader.grade_question(&question, &config.answer).await?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        println!("Score: {} / {}", assessment.score, assessment.out_of);
        for criterion in &assessment.breakdown {
            println!(
                "  - {}: {} / {}",
                criterion.objective, criterion.awarded, criterion.weight
            );
        }
        println!();
        println!("{}", assessment.feedback);
    }

    Ok(())
}

fn exit_with(e: &GradeError) -> ! {
    tracing::error!(
        "❌ Grading failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}
