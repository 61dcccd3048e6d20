use crate::core::grader::Grader;
use crate::domain::ports::{GradingModel, QuestionStore};
use crate::utils::error::{GradeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const REQUIRED_COLUMNS: [&str; 3] = ["question_id", "student_id", "answer"];

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRow {
    pub question_id: String,
    pub student_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub question_id: String,
    pub student_id: String,
    pub score: Option<f64>,
    pub out_of: Option<u32>,
    pub feedback: String,
    pub error: String,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_empty()
    }
}

/// 批次評分：並發上限由 `concurrent_requests` 控制，輸出保持輸入順序
pub struct BatchGrader {
    grader: Grader<dyn GradingModel>,
    store: Arc<dyn QuestionStore>,
    concurrent_requests: usize,
}

impl BatchGrader {
    pub fn new(
        model: Arc<dyn GradingModel>,
        store: Arc<dyn QuestionStore>,
        concurrent_requests: usize,
    ) -> Self {
        Self {
            grader: Grader::new(model),
            store,
            concurrent_requests: concurrent_requests.max(1),
        }
    }

    pub fn read_rows(input: &[u8]) -> Result<Vec<BatchRow>> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(input);

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(GradeError::validation(format!(
                    "CSV is missing the '{}' column",
                    column
                )));
            }
        }

        let rows = reader
            .deserialize::<BatchRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub async fn grade_rows(&self, rows: Vec<BatchRow>) -> Result<Vec<BatchOutcome>> {
        let total = rows.len();
        tracing::info!(
            "🚀 Grading {} answers with up to {} concurrent requests",
            total,
            self.concurrent_requests
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrent_requests));
        let mut tasks = JoinSet::new();

        for (index, row) in rows.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let grader = self.grader.clone();
            let store = Arc::clone(&self.store);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let outcome = match grade_row(&grader, store.as_ref(), &row).await {
                    Ok((score, out_of, feedback)) => BatchOutcome {
                        question_id: row.question_id,
                        student_id: row.student_id,
                        score: Some(score),
                        out_of: Some(out_of),
                        feedback,
                        error: String::new(),
                    },
                    Err(e) => {
                        tracing::warn!(
                            "⚠️ Row {} (student {}) failed: {}",
                            index + 1,
                            row.student_id,
                            e
                        );
                        BatchOutcome {
                            question_id: row.question_id,
                            student_id: row.student_id,
                            score: None,
                            out_of: None,
                            feedback: String::new(),
                            error: e.to_string(),
                        }
                    }
                };
                (index, outcome)
            });
        }

        let mut indexed = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            indexed.push(joined.map_err(std::io::Error::from)?);
        }
        indexed.sort_by_key(|(index, _)| *index);

        let outcomes: Vec<BatchOutcome> = indexed.into_iter().map(|(_, outcome)| outcome).collect();
        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        tracing::info!("📊 Batch finished: {} graded, {} failed", total - failed, failed);

        Ok(outcomes)
    }

    pub fn write_outcomes(outcomes: &[BatchOutcome]) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for outcome in outcomes {
            writer.serialize(outcome)?;
        }
        writer
            .into_inner()
            .map_err(|e| GradeError::IoError(e.into_error()))
    }

    /// Reads `input`, grades every row and writes the results CSV to `output`.
    pub async fn grade_file(&self, input: &Path, output: &Path) -> Result<Vec<BatchOutcome>> {
        let data = tokio::fs::read(input).await?;
        let rows = Self::read_rows(&data)?;
        let outcomes = self.grade_rows(rows).await?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(output, Self::write_outcomes(&outcomes)?).await?;
        tracing::info!("📁 Results saved to: {}", output.display());

        Ok(outcomes)
    }
}

async fn grade_row(
    grader: &Grader<dyn GradingModel>,
    store: &dyn QuestionStore,
    row: &BatchRow,
) -> Result<(f64, u32, String)> {
    let id: u64 = row.question_id.trim().parse().map_err(|_| {
        GradeError::validation(format!("question_id '{}' is not a number", row.question_id))
    })?;
    let record = store
        .get(id)
        .await?
        .ok_or_else(|| GradeError::not_found(format!("question {}", id)))?;

    let assessment = grader.grade_record(&record, &row.answer).await?;
    Ok((assessment.score, assessment.out_of, assessment.feedback))
}
