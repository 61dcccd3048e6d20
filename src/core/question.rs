use crate::core::prompt::build_grading_messages;
use crate::core::response::parse_grading_reply;
use crate::domain::model::{Assessment, Rubric, RubricType, ShortAnswerQuestion};
use crate::domain::ports::GradingModel;
use crate::utils::error::{GradeError, Result};
use chrono::Utc;
use serde_json::Value;

pub const BLANK_ANSWER_FEEDBACK: &str = "No answer was provided.";

impl ShortAnswerQuestion {
    /// Without a rubric the general preset is used.
    pub fn new(question: impl Into<String>, answer: impl Into<String>, rubric: Option<Rubric>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            rubric: rubric.unwrap_or_default(),
        }
    }

    pub fn from_rubric_type(
        question: impl Into<String>,
        answer: impl Into<String>,
        rubric_type: RubricType,
    ) -> Self {
        Self::new(question, answer, Some(Rubric::from_rubric_type(rubric_type)))
    }

    /// `{"question": "...", "answer": "...", "rubric": {...}}` or with
    /// `"rubric_type": "..."` in place of `rubric`.
    pub fn from_dict(payload: &Value) -> Result<Self> {
        let obj = payload
            .as_object()
            .ok_or_else(|| GradeError::payload("question must be a JSON object"))?;

        let text_field = |key: &str| -> Result<String> {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| GradeError::payload(format!("question payload needs a string '{}'", key)))
        };
        let question = text_field("question")?;
        let answer = text_field("answer")?;

        let rubric = match (obj.get("rubric"), obj.get("rubric_type")) {
            (Some(rubric), _) if !rubric.is_null() => Some(Rubric::from_dict(rubric)?),
            (_, Some(Value::String(tag))) => Some(Rubric::from_rubric_type(tag.parse()?)),
            (_, Some(Value::Null)) | (_, None) => None,
            (_, Some(other)) => {
                return Err(GradeError::payload(format!(
                    "rubric_type must be a string, got {}",
                    other
                )))
            }
        };

        Ok(Self::new(question, answer, rubric))
    }

    pub fn to_dict(&self) -> Value {
        serde_json::json!({
            "question": self.question,
            "answer": self.answer,
            "rubric": self.rubric.to_dict(),
        })
    }

    /// Grades a student answer and returns `(feedback, score)`.
    pub async fn grade<M>(&self, model: &M, answer: &str) -> Result<(String, f64)>
    where
        M: GradingModel + ?Sized,
    {
        Ok(self.grade_detailed(model, answer).await?.into_pair())
    }

    pub async fn grade_detailed<M>(&self, model: &M, answer: &str) -> Result<Assessment>
    where
        M: GradingModel + ?Sized,
    {
        if self.question.trim().is_empty() {
            return Err(GradeError::validation("question text cannot be empty"));
        }
        if self.rubric.is_empty() {
            return Err(GradeError::validation("rubric has no criteria to grade against"));
        }

        if answer.trim().is_empty() {
            tracing::debug!("Blank answer, skipping model call");
            return Ok(Assessment {
                feedback: BLANK_ANSWER_FEEDBACK.to_string(),
                score: 0.0,
                out_of: self.rubric.total_points(),
                breakdown: Vec::new(),
                graded_at: Utc::now(),
            });
        }

        let messages = build_grading_messages(self, answer);
        let reply = model.complete(&messages).await?;
        tracing::debug!("Model reply ({} chars)", reply.len());

        parse_grading_reply(&reply, &self.rubric)
    }
}
