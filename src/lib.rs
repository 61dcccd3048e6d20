pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::GraderConfig;

pub use adapters::{InMemoryQuestionStore, JsonFileQuestionStore, OpenAiChatModel};
pub use crate::core::{batch::BatchGrader, grader::Grader};
pub use domain::model::{Assessment, Objective, QuestionRecord, Rubric, RubricType, ShortAnswerQuestion};
pub use utils::error::{GradeError, Result};
