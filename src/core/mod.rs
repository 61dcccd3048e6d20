pub mod batch;
pub mod grader;
pub mod prompt;
pub mod question;
pub mod record;
pub mod response;
pub mod rubric;
pub mod tags;

pub use crate::domain::model::{
    Assessment, CriterionScore, NewQuestion, Objective, QuestionRecord, Rubric, RubricType,
    ShortAnswerQuestion,
};
pub use crate::domain::ports::{ChatMessage, GradingModel, QuestionStore};
pub use crate::utils::error::Result;
