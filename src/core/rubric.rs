use crate::domain::model::{Objective, Rubric, RubricType};
use crate::utils::error::{GradeError, Result};
use crate::utils::validation::validate_weight;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 預設模板的評分表
fn preset_criteria(rubric_type: RubricType) -> &'static [(Objective, u32)] {
    use Objective::*;
    match rubric_type {
        RubricType::General => &[(FactualAccuracy, 4), (Completeness, 3), (Clarity, 3)],
        RubricType::Factual => &[(FactualAccuracy, 7), (Completeness, 3)],
        RubricType::Conceptual => &[(FactualAccuracy, 3), (Reasoning, 4), (Clarity, 3)],
        RubricType::Explanatory => &[
            (Completeness, 3),
            (Reasoning, 3),
            (Clarity, 2),
            (Relevance, 2),
        ],
        RubricType::Writing => &[(Clarity, 3), (Grammar, 3), (Conciseness, 2), (Relevance, 2)],
        RubricType::Custom => &[],
    }
}

impl Rubric {
    pub fn empty() -> Self {
        Self {
            rubric_type: RubricType::Custom,
            criteria: BTreeMap::new(),
        }
    }

    pub fn from_rubric_type(rubric_type: RubricType) -> Self {
        Self {
            rubric_type,
            criteria: preset_criteria(rubric_type).iter().copied().collect(),
        }
    }

    /// Adds an objective or replaces its weight. The rubric becomes ad hoc.
    ///
    /// Weights run from 1 to [`MAX_CRITERION_WEIGHT`](crate::utils::validation::MAX_CRITERION_WEIGHT),
    /// so a rubric total always fits in a `u32`.
    pub fn add_criteria(&mut self, objective: Objective, weight: u32) -> Result<&mut Self> {
        validate_weight(objective, weight)?;
        self.criteria.insert(objective, weight);
        self.rubric_type = RubricType::Custom;
        Ok(self)
    }

    /// Accepted payloads:
    ///
    /// ```json
    /// { "rubric_type": "factual" }
    /// { "criteria": { "clarity": 2, "factual_accuracy": 5 } }
    /// { "rubric_type": "custom", "criteria": [ { "objective": "clarity", "weight": 2 } ] }
    /// ```
    pub fn from_dict(payload: &Value) -> Result<Self> {
        let obj = payload
            .as_object()
            .ok_or_else(|| GradeError::payload("rubric must be a JSON object"))?;

        let declared = match obj.get("rubric_type") {
            Some(Value::String(tag)) => Some(tag.parse::<RubricType>()?),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(GradeError::payload(format!(
                    "rubric_type must be a string, got {}",
                    other
                )))
            }
        };

        let Some(criteria) = obj.get("criteria") else {
            let rubric_type = declared
                .ok_or_else(|| GradeError::payload("rubric needs either rubric_type or criteria"))?;
            return Ok(Self::from_rubric_type(rubric_type));
        };

        let mut rubric = Self::empty();
        match criteria {
            Value::Object(map) => {
                for (name, weight) in map {
                    rubric.add_criteria(name.parse()?, parse_weight(name, weight)?)?;
                }
            }
            Value::Array(items) => {
                for item in items {
                    let (objective, weight) = parse_criterion_entry(item)?;
                    rubric.add_criteria(objective, weight)?;
                }
            }
            other => {
                return Err(GradeError::payload(format!(
                    "criteria must be an object or an array, got {}",
                    other
                )))
            }
        }

        // 與宣告的預設模板完全相同時保留預設分類
        if let Some(rubric_type) = declared.filter(RubricType::is_preset) {
            if rubric.criteria == Self::from_rubric_type(rubric_type).criteria {
                rubric.rubric_type = rubric_type;
            }
        }

        Ok(rubric)
    }

    pub fn to_dict(&self) -> Value {
        let criteria: Map<String, Value> = self
            .criteria
            .iter()
            .map(|(objective, weight)| (objective.as_str().to_string(), Value::from(*weight)))
            .collect();

        serde_json::json!({
            "rubric_type": self.rubric_type.as_str(),
            "criteria": criteria,
        })
    }

    pub fn rubric_type(&self) -> RubricType {
        self.rubric_type
    }

    pub fn size(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn total_points(&self) -> u32 {
        self.criteria.values().sum()
    }

    pub fn weight(&self, objective: Objective) -> Option<u32> {
        self.criteria.get(&objective).copied()
    }

    pub fn criteria(&self) -> impl Iterator<Item = (Objective, u32)> + '_ {
        self.criteria.iter().map(|(objective, weight)| (*objective, *weight))
    }
}

impl Default for Rubric {
    fn default() -> Self {
        Self::from_rubric_type(RubricType::General)
    }
}

fn parse_weight(name: &str, value: &Value) -> Result<u32> {
    value
        .as_u64()
        .and_then(|w| u32::try_from(w).ok())
        .ok_or_else(|| {
            GradeError::payload(format!(
                "weight for '{}' must be a non-negative integer, got {}",
                name, value
            ))
        })
}

fn parse_criterion_entry(item: &Value) -> Result<(Objective, u32)> {
    let name = item
        .get("objective")
        .and_then(Value::as_str)
        .ok_or_else(|| GradeError::payload("criterion entry needs a string 'objective'"))?;
    let weight = item
        .get("weight")
        .ok_or_else(|| GradeError::payload(format!("criterion '{}' has no weight", name)))?;
    Ok((name.parse()?, parse_weight(name, weight)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_rubric() {
        let rubric = Rubric::empty();
        assert_eq!(rubric.size(), 0);
        assert_eq!(rubric.total_points(), 0);
        assert_eq!(rubric.rubric_type(), RubricType::Custom);
    }

    #[test]
    fn test_presets_total_ten_points() {
        for rubric_type in RubricType::PRESETS {
            let rubric = Rubric::from_rubric_type(rubric_type);
            assert_eq!(rubric.rubric_type(), rubric_type);
            assert_eq!(rubric.total_points(), 10, "{} preset", rubric_type);
        }
        assert!(Rubric::from_rubric_type(RubricType::Custom).is_empty());
    }

    #[test]
    fn test_add_criteria_marks_rubric_custom() {
        let mut rubric = Rubric::from_rubric_type(RubricType::Factual);
        rubric.add_criteria(Objective::Clarity, 2).unwrap();

        assert_eq!(rubric.rubric_type(), RubricType::Custom);
        assert_eq!(rubric.size(), 3);
        assert_eq!(rubric.total_points(), 12);
    }

    #[test]
    fn test_add_criteria_replaces_weight_and_chains() {
        let mut rubric = Rubric::empty();
        rubric
            .add_criteria(Objective::Clarity, 2)
            .unwrap()
            .add_criteria(Objective::Clarity, 5)
            .unwrap();

        assert_eq!(rubric.size(), 1);
        assert_eq!(rubric.weight(Objective::Clarity), Some(5));
    }

    #[test]
    fn test_add_criteria_rejects_zero_weight() {
        let mut rubric = Rubric::empty();
        let err = rubric.add_criteria(Objective::Grammar, 0).unwrap_err();
        assert!(matches!(err, GradeError::ValidationError { .. }));
        assert!(rubric.is_empty());
    }

    #[test]
    fn test_add_criteria_rejects_oversized_weight() {
        let mut rubric = Rubric::empty();
        rubric.add_criteria(Objective::Clarity, 100).unwrap();
        let err = rubric.add_criteria(Objective::Grammar, 101).unwrap_err();

        assert!(matches!(err, GradeError::ValidationError { .. }));
        assert_eq!(rubric.total_points(), 100);
    }

    #[test]
    fn test_from_dict_rejects_weights_that_would_overflow_total() {
        let err = Rubric::from_dict(&json!({
            "criteria": { "clarity": 4294967295u64, "grammar": 4294967295u64 }
        }))
        .unwrap_err();
        assert!(matches!(err, GradeError::ValidationError { .. }));
    }

    #[test]
    fn test_from_dict_preset_only() {
        let rubric = Rubric::from_dict(&json!({ "rubric_type": "writing" })).unwrap();
        assert_eq!(rubric, Rubric::from_rubric_type(RubricType::Writing));
    }

    #[test]
    fn test_from_dict_object_criteria() {
        let rubric = Rubric::from_dict(&json!({
            "criteria": { "clarity": 2, "Factual Accuracy": 5 }
        }))
        .unwrap();

        assert_eq!(rubric.rubric_type(), RubricType::Custom);
        assert_eq!(rubric.weight(Objective::FactualAccuracy), Some(5));
        assert_eq!(rubric.total_points(), 7);
    }

    #[test]
    fn test_from_dict_array_criteria_matching_preset_keeps_tag() {
        let rubric = Rubric::from_dict(&json!({
            "rubric_type": "factual",
            "criteria": [
                { "objective": "factual_accuracy", "weight": 7 },
                { "objective": "completeness", "weight": 3 }
            ]
        }))
        .unwrap();
        assert_eq!(rubric.rubric_type(), RubricType::Factual);

        let altered = Rubric::from_dict(&json!({
            "rubric_type": "factual",
            "criteria": [{ "objective": "factual_accuracy", "weight": 9 }]
        }))
        .unwrap();
        assert_eq!(altered.rubric_type(), RubricType::Custom);
    }

    #[test]
    fn test_from_dict_errors() {
        assert!(matches!(
            Rubric::from_dict(&json!([1, 2])),
            Err(GradeError::PayloadError { .. })
        ));
        assert!(matches!(
            Rubric::from_dict(&json!({})),
            Err(GradeError::PayloadError { .. })
        ));
        assert!(matches!(
            Rubric::from_dict(&json!({ "rubric_type": "haiku" })),
            Err(GradeError::InvalidTagError { .. })
        ));
        assert!(matches!(
            Rubric::from_dict(&json!({ "criteria": { "clarity": 1.5 } })),
            Err(GradeError::PayloadError { .. })
        ));
        assert!(matches!(
            Rubric::from_dict(&json!({ "criteria": { "style": 2 } })),
            Err(GradeError::InvalidTagError { .. })
        ));
        assert!(matches!(
            Rubric::from_dict(&json!({ "criteria": { "clarity": 0 } })),
            Err(GradeError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_to_dict_round_trips() {
        let mut rubric = Rubric::empty();
        rubric.add_criteria(Objective::Reasoning, 6).unwrap();
        rubric.add_criteria(Objective::Grammar, 1).unwrap();

        let restored = Rubric::from_dict(&rubric.to_dict()).unwrap();
        assert_eq!(restored, rubric);

        let preset = Rubric::from_rubric_type(RubricType::Conceptual);
        assert_eq!(Rubric::from_dict(&preset.to_dict()).unwrap(), preset);
    }
}
