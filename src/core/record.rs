use crate::core::tags::normalize_tag;
use crate::domain::model::{NewQuestion, QuestionRecord, RubricType, ShortAnswerQuestion};
use crate::domain::ports::GradingModel;
use crate::utils::error::{GradeError, Result};
use crate::utils::validation::require_text;

/// 題目分類 → 評分模板
pub fn rubric_type_for_category(category: &str) -> Result<RubricType> {
    match normalize_tag(category).as_str() {
        "fact" | "definition" | "recall" => Ok(RubricType::Factual),
        "concept" | "theory" => Ok(RubricType::Conceptual),
        "explain" | "process" | "how" => Ok(RubricType::Explanatory),
        "essay" | "writing" | "language" => Ok(RubricType::Writing),
        "general" | "" => Ok(RubricType::General),
        _ => category.parse::<RubricType>().map_err(|_| GradeError::InvalidTagError {
            kind: "question category",
            value: category.to_string(),
        }),
    }
}

impl QuestionRecord {
    pub fn rubric_type(&self) -> Result<RubricType> {
        rubric_type_for_category(&self.category)
    }

    pub fn question(&self) -> Result<ShortAnswerQuestion> {
        Ok(ShortAnswerQuestion::from_rubric_type(
            self.body.clone(),
            self.example_answer.clone(),
            self.rubric_type()?,
        ))
    }

    /// Grades `answer` against this record's question.
    pub async fn grade<M>(&self, model: &M, answer: &str) -> Result<(String, f64)>
    where
        M: GradingModel + ?Sized,
    {
        self.question()?.grade(model, answer).await
    }
}

impl NewQuestion {
    /// A stored question must be gradable, so its category has to name a preset.
    pub fn validate(&self) -> Result<()> {
        require_text("body", &self.body)?;
        require_text("example_answer", &self.example_answer)?;
        if !rubric_type_for_category(&self.category)?.is_preset() {
            return Err(GradeError::validation(format!(
                "category '{}' has no preset rubric, so the question could never be graded",
                self.category
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ChatMessage;
    use async_trait::async_trait;
    use chrono::Utc;

    fn record(category: &str) -> QuestionRecord {
        QuestionRecord {
            id: 1,
            body: "Name the powerhouse of the cell.".to_string(),
            example_answer: "The mitochondrion.".to_string(),
            category: category.to_string(),
            created_at: Utc::now(),
        }
    }

    struct EchoPromptModel;

    #[async_trait]
    impl GradingModel for EchoPromptModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            // 回傳滿分，並把題目帶回 feedback 以便檢查
            let user = &messages[1].content;
            Ok(serde_json::json!({
                "feedback": user.lines().nth(1).unwrap_or_default(),
                "scores": { "factual_accuracy": 7, "completeness": 3 }
            })
            .to_string())
        }
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(record("definition").rubric_type().unwrap(), RubricType::Factual);
        assert_eq!(record("Theory").rubric_type().unwrap(), RubricType::Conceptual);
        assert_eq!(record("how").rubric_type().unwrap(), RubricType::Explanatory);
        assert_eq!(record("essay").rubric_type().unwrap(), RubricType::Writing);
        assert_eq!(record("").rubric_type().unwrap(), RubricType::General);
        assert_eq!(record("explanatory").rubric_type().unwrap(), RubricType::Explanatory);
        assert_eq!(record("custom").rubric_type().unwrap(), RubricType::Custom);
    }

    #[test]
    fn test_unknown_category() {
        let err = record("astrology").rubric_type().unwrap_err();
        assert!(matches!(
            err,
            GradeError::InvalidTagError { kind: "question category", .. }
        ));
        assert!(record("astrology").question().is_err());
    }

    #[test]
    fn test_question_carries_record_fields() {
        let question = record("recall").question().unwrap();
        assert_eq!(question.question, "Name the powerhouse of the cell.");
        assert_eq!(question.answer, "The mitochondrion.");
        assert_eq!(question.rubric.rubric_type(), RubricType::Factual);
    }

    #[tokio::test]
    async fn test_grade_forwards_to_question() {
        let (feedback, score) = record("fact").grade(&EchoPromptModel, "Mitochondria").await.unwrap();
        assert_eq!(feedback, "Name the powerhouse of the cell.");
        assert_eq!(score, 10.0);
    }

    #[test]
    fn test_new_question_validation() {
        let ok = NewQuestion {
            body: "Q".to_string(),
            example_answer: "A".to_string(),
            category: "fact".to_string(),
        };
        assert!(ok.validate().is_ok());

        let blank = NewQuestion {
            body: " ".to_string(),
            ..ok.clone()
        };
        assert!(matches!(blank.validate(), Err(GradeError::ValidationError { .. })));

        let blank_answer = NewQuestion {
            example_answer: "\t".to_string(),
            ..ok.clone()
        };
        assert!(matches!(
            blank_answer.validate(),
            Err(GradeError::ValidationError { .. })
        ));

        let bad_category = NewQuestion {
            category: "astrology".to_string(),
            ..ok
        };
        assert!(matches!(
            bad_category.validate(),
            Err(GradeError::InvalidTagError { .. })
        ));
    }

    #[test]
    fn test_new_question_rejects_custom_category() {
        let custom = NewQuestion {
            body: "Q".to_string(),
            example_answer: "A".to_string(),
            category: "Custom".to_string(),
        };
        assert!(matches!(custom.validate(), Err(GradeError::ValidationError { .. })));
    }
}
