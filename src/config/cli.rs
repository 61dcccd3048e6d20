use crate::config::toml_config::GraderConfig;
use crate::domain::model::{Objective, Rubric, RubricType, ShortAnswerQuestion};
use crate::utils::error::{GradeError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "turing")]
#[command(about = "Grade a short written answer with an LLM and a weighted rubric")]
pub struct CliConfig {
    /// Path to TOML configuration file (optional)
    #[arg(short, long, default_value = "turing.toml")]
    pub config: String,

    /// The question being asked
    #[arg(long)]
    pub question: String,

    /// Reference answer the student answer is compared with
    #[arg(long)]
    pub example_answer: String,

    /// Student answer to grade
    #[arg(long)]
    pub answer: String,

    /// Preset rubric: general, factual, conceptual, explanatory, writing
    #[arg(long, default_value = "general")]
    pub rubric_type: String,

    /// Ad hoc criteria as objective=weight; replaces the preset
    #[arg(long = "criterion", value_delimiter = ',')]
    pub criteria: Vec<String>,

    /// Override the model name from the config file
    #[arg(long)]
    pub model: Option<String>,

    /// Print the full assessment as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 設定檔不存在時使用預設值
    pub fn load_grader_config(&self) -> Result<GraderConfig> {
        let mut config = if Path::new(&self.config).exists() {
            GraderConfig::from_file(&self.config)?
        } else {
            tracing::debug!("Config file {} not found, using defaults", self.config);
            GraderConfig::default()
        };

        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn rubric(&self) -> Result<Rubric> {
        if self.criteria.is_empty() {
            return Ok(Rubric::from_rubric_type(self.rubric_type.parse::<RubricType>()?));
        }

        let mut rubric = Rubric::empty();
        for entry in &self.criteria {
            let (name, weight) = entry.split_once('=').ok_or_else(|| {
                GradeError::InvalidConfigValueError {
                    field: "criterion".to_string(),
                    value: entry.clone(),
                    reason: "expected objective=weight".to_string(),
                }
            })?;
            let weight: u32 = weight.trim().parse().map_err(|_| GradeError::InvalidConfigValueError {
                field: "criterion".to_string(),
                value: entry.clone(),
                reason: "weight must be a whole number".to_string(),
            })?;
            rubric.add_criteria(name.parse::<Objective>()?, weight)?;
        }
        Ok(rubric)
    }

    pub fn question(&self) -> Result<ShortAnswerQuestion> {
        Ok(ShortAnswerQuestion::new(
            self.question.clone(),
            self.example_answer.clone(),
            Some(self.rubric()?),
        ))
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("question", &self.question)?;
        validate_non_empty_string("example_answer", &self.example_answer)?;
        self.rubric()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["turing", "--question", "Q", "--example-answer", "A", "--answer", "x"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_preset_rubric() {
        let config = parse(&["--rubric-type", "conceptual"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.rubric().unwrap().rubric_type(), RubricType::Conceptual);
    }

    #[test]
    fn test_ad_hoc_criteria() {
        let config = parse(&["--criterion", "clarity=2,reasoning=5"]);
        let rubric = config.rubric().unwrap();

        assert_eq!(rubric.rubric_type(), RubricType::Custom);
        assert_eq!(rubric.total_points(), 7);
    }

    #[test]
    fn test_bad_criteria() {
        assert!(parse(&["--criterion", "clarity"]).validate().is_err());
        assert!(parse(&["--criterion", "clarity=two"]).validate().is_err());
        assert!(parse(&["--criterion", "style=2"]).validate().is_err());
        assert!(parse(&["--rubric-type", "poetry"]).validate().is_err());
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let config = parse(&["--config", "/nonexistent/turing.toml", "--model", "local-model"]);
        let grader_config = config.load_grader_config().unwrap();
        assert_eq!(grader_config.llm.model, "local-model");
    }
}
