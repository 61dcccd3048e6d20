use crate::domain::model::{Assessment, QuestionRecord, ShortAnswerQuestion};
use crate::domain::ports::GradingModel;
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Instant;

pub struct Grader<M: GradingModel + ?Sized> {
    model: Arc<M>,
}

impl<M: GradingModel + ?Sized> Clone for Grader<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
        }
    }
}

impl<M: GradingModel + ?Sized> Grader<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }

    pub async fn grade_question(
        &self,
        question: &ShortAnswerQuestion,
        answer: &str,
    ) -> Result<Assessment> {
        let started = Instant::now();
        tracing::debug!(
            "📝 Grading answer ({} chars) with {} rubric ({} criteria)",
            answer.len(),
            question.rubric.rubric_type(),
            question.rubric.size()
        );

        match question.grade_detailed(self.model.as_ref(), answer).await {
            Ok(assessment) => {
                tracing::info!(
                    "✅ Graded: {}/{} in {:?}",
                    assessment.score,
                    assessment.out_of,
                    started.elapsed()
                );
                Ok(assessment)
            }
            Err(e) => {
                tracing::warn!("❌ Grading failed after {:?}: {}", started.elapsed(), e);
                Err(e)
            }
        }
    }

    pub async fn grade_record(&self, record: &QuestionRecord, answer: &str) -> Result<Assessment> {
        tracing::debug!("📂 Grading against question #{}", record.id);
        self.grade_question(&record.question()?, answer).await
    }
}
