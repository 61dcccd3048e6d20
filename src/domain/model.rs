use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 評分維度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    FactualAccuracy,
    Completeness,
    Clarity,
    Relevance,
    Reasoning,
    Conciseness,
    Grammar,
}

impl Objective {
    pub const ALL: [Objective; 7] = [
        Objective::FactualAccuracy,
        Objective::Completeness,
        Objective::Clarity,
        Objective::Relevance,
        Objective::Reasoning,
        Objective::Conciseness,
        Objective::Grammar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::FactualAccuracy => "factual_accuracy",
            Objective::Completeness => "completeness",
            Objective::Clarity => "clarity",
            Objective::Relevance => "relevance",
            Objective::Reasoning => "reasoning",
            Objective::Conciseness => "conciseness",
            Objective::Grammar => "grammar",
        }
    }

    /// Shown to the model next to each criterion.
    pub fn description(&self) -> &'static str {
        match self {
            Objective::FactualAccuracy => "statements agree with the reference answer and known facts",
            Objective::Completeness => "covers every key point the reference answer covers",
            Objective::Clarity => "easy to follow, with ideas stated plainly",
            Objective::Relevance => "stays on the question without padding or digressions",
            Objective::Reasoning => "explains why or how, with sound logical steps",
            Objective::Conciseness => "says what is needed without repetition",
            Objective::Grammar => "correct spelling, grammar and punctuation",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rubric 的分類：預設模板或臨時組合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricType {
    General,
    Factual,
    Conceptual,
    Explanatory,
    Writing,
    Custom,
}

impl RubricType {
    pub const PRESETS: [RubricType; 5] = [
        RubricType::General,
        RubricType::Factual,
        RubricType::Conceptual,
        RubricType::Explanatory,
        RubricType::Writing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RubricType::General => "general",
            RubricType::Factual => "factual",
            RubricType::Conceptual => "conceptual",
            RubricType::Explanatory => "explanatory",
            RubricType::Writing => "writing",
            RubricType::Custom => "custom",
        }
    }

    pub fn is_preset(&self) -> bool {
        !matches!(self, RubricType::Custom)
    }
}

impl fmt::Display for RubricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weighted set of grading objectives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub(crate) rubric_type: RubricType,
    pub(crate) criteria: BTreeMap<Objective, u32>,
}

/// A prompt/reference-answer pair graded against a rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortAnswerQuestion {
    pub question: String,
    pub answer: String,
    pub rubric: Rubric,
}

/// 已儲存的題目紀錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: u64,
    pub body: String,
    pub example_answer: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestion {
    pub body: String,
    pub example_answer: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub objective: Objective,
    pub awarded: f64,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub feedback: String,
    pub score: f64,
    pub out_of: u32,
    pub breakdown: Vec<CriterionScore>,
    pub graded_at: DateTime<Utc>,
}

impl Assessment {
    pub fn into_pair(self) -> (String, f64) {
        (self.feedback, self.score)
    }
}
