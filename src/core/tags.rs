use crate::domain::model::{Objective, RubricType};
use crate::utils::error::GradeError;
use std::str::FromStr;

/// 統一大小寫與分隔符號：`Factual-Accuracy`、`factual accuracy` 都視為 `factual_accuracy`
pub(crate) fn normalize_tag(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

impl FromStr for Objective {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = normalize_tag(s);
        Objective::ALL
            .into_iter()
            .find(|objective| objective.as_str() == tag)
            .ok_or_else(|| GradeError::InvalidTagError {
                kind: "objective",
                value: s.to_string(),
            })
    }
}

impl FromStr for RubricType {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "general" => Ok(RubricType::General),
            "factual" => Ok(RubricType::Factual),
            "conceptual" => Ok(RubricType::Conceptual),
            "explanatory" => Ok(RubricType::Explanatory),
            "writing" => Ok(RubricType::Writing),
            "custom" => Ok(RubricType::Custom),
            _ => Err(GradeError::InvalidTagError {
                kind: "rubric type",
                value: s.to_string(),
            }),
        }
    }
}
