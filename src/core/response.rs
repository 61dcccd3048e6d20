use crate::domain::model::{Assessment, CriterionScore, Objective, Rubric};
use crate::utils::error::{GradeError, Result};
use chrono::Utc;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

fn score_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)score\**\s*[:=]?\s*\**\s*(\d+(?:\.\d+)?)(?:\s*(?:/|out of)\s*(\d+(?:\.\d+)?))?")
            .expect("score pattern is valid")
    })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 解析模型回覆：優先讀取 JSON，其次退回 `Score: x / y` 文字格式
pub fn parse_grading_reply(reply: &str, rubric: &Rubric) -> Result<Assessment> {
    if let Some(obj) = extract_json_object(reply) {
        if let Some(assessment) = assessment_from_json(&obj, rubric) {
            return Ok(assessment);
        }
        tracing::debug!("JSON reply had neither 'scores' nor 'score', trying text fallback");
    }

    assessment_from_text(reply, rubric).ok_or_else(|| {
        let preview: String = reply.chars().take(120).collect();
        GradeError::model_response(format!("no score found in reply: {:?}", preview))
    })
}

/// Finds the first balanced `{...}` block that parses as a JSON object.
pub(crate) fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let bytes = text.as_bytes();
    let mut start = 0;

    while let Some(offset) = text[start..].find('{') {
        let open = start + offset;
        if let Some(close) = matching_brace(bytes, open) {
            if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&text[open..=close]) {
                return Some(obj);
            }
        }
        start = open + 1;
    }
    None
}

fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reads a finite number from a JSON number or numeric string. `"NaN"` and `"inf"` are rejected.
fn number_of(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn assessment_from_json(obj: &Map<String, Value>, rubric: &Rubric) -> Option<Assessment> {
    let feedback = obj
        .get("feedback")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    if let Some(Value::Object(scores)) = obj.get("scores") {
        let mut awarded_by_objective: HashMap<Objective, f64> = HashMap::new();
        for (name, value) in scores {
            let Ok(objective) = name.parse::<Objective>() else {
                tracing::debug!("Ignoring unknown objective '{}' in model reply", name);
                continue;
            };
            match number_of(value) {
                Some(points) => {
                    awarded_by_objective.insert(objective, points);
                }
                None => tracing::warn!("⚠️ Non-numeric score for '{}': {}", name, value),
            }
        }

        let breakdown: Vec<CriterionScore> = rubric
            .criteria()
            .map(|(objective, weight)| {
                let awarded = match awarded_by_objective.get(&objective) {
                    Some(points) => points.clamp(0.0, weight as f64),
                    None => {
                        tracing::warn!("⚠️ Model reply has no score for '{}', counting 0", objective);
                        0.0
                    }
                };
                CriterionScore {
                    objective,
                    awarded,
                    weight,
                }
            })
            .collect();

        let score = round2(breakdown.iter().map(|c| c.awarded).sum());
        return Some(Assessment {
            feedback,
            score,
            out_of: rubric.total_points(),
            breakdown,
            graded_at: Utc::now(),
        });
    }

    let total = obj.get("score").and_then(number_of)?;
    let out_of = obj.get("out_of").and_then(number_of);
    Some(Assessment {
        feedback,
        score: scale_total(total, out_of, rubric.total_points()),
        out_of: rubric.total_points(),
        breakdown: Vec::new(),
        graded_at: Utc::now(),
    })
}

fn assessment_from_text(reply: &str, rubric: &Rubric) -> Option<Assessment> {
    let caps = score_line_regex().captures(reply)?;
    let total = caps
        .get(1)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())?;
    let out_of = caps
        .get(2)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite());

    Some(Assessment {
        feedback: reply.trim().to_string(),
        score: scale_total(total, out_of, rubric.total_points()),
        out_of: rubric.total_points(),
        breakdown: Vec::new(),
        graded_at: Utc::now(),
    })
}

fn scale_total(total: f64, out_of: Option<f64>, rubric_total: u32) -> f64 {
    let max = rubric_total as f64;
    let scaled = match out_of {
        Some(denominator) if denominator > 0.0 => total / denominator * max,
        _ => total,
    };
    round2(scaled.clamp(0.0, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RubricType;

    fn factual() -> Rubric {
        Rubric::from_rubric_type(RubricType::Factual)
    }

    #[test]
    fn test_plain_json_reply() {
        let reply = r#"{"feedback": "Correct and complete.", "scores": {"factual_accuracy": 7, "completeness": 2.5}}"#;
        let assessment = parse_grading_reply(reply, &factual()).unwrap();

        assert_eq!(assessment.feedback, "Correct and complete.");
        assert_eq!(assessment.score, 9.5);
        assert_eq!(assessment.out_of, 10);
        assert_eq!(assessment.breakdown.len(), 2);
    }

    #[test]
    fn test_fenced_json_with_prose() {
        let reply = "Here is my grade:\n```json\n{\"feedback\": \"Mentions {tilt}.\", \"scores\": {\"Factual Accuracy\": \"5\", \"completeness\": 3}}\n```\nThanks!";
        let assessment = parse_grading_reply(reply, &factual()).unwrap();

        assert_eq!(assessment.feedback, "Mentions {tilt}.");
        assert_eq!(assessment.score, 8.0);
    }

    #[test]
    fn test_scores_are_clamped_and_unknown_objectives_ignored() {
        let reply = r#"{"feedback": "ok", "scores": {"factual_accuracy": 12, "completeness": -1, "grammar": 3, "style": 4}}"#;
        let assessment = parse_grading_reply(reply, &factual()).unwrap();

        assert_eq!(assessment.score, 7.0);
        let completeness = assessment
            .breakdown
            .iter()
            .find(|c| c.objective == Objective::Completeness)
            .unwrap();
        assert_eq!(completeness.awarded, 0.0);
        assert!(assessment.breakdown.iter().all(|c| c.objective != Objective::Grammar));
    }

    #[test]
    fn test_missing_objective_counts_zero() {
        let reply = r#"{"feedback": "partial", "scores": {"factual_accuracy": 4}}"#;
        let assessment = parse_grading_reply(reply, &factual()).unwrap();
        assert_eq!(assessment.score, 4.0);
        assert_eq!(assessment.breakdown.len(), 2);
    }

    #[test]
    fn test_non_finite_scores_are_not_counted() {
        let reply = r#"{"feedback": "odd", "scores": {"factual_accuracy": "NaN", "completeness": 3}}"#;
        let assessment = parse_grading_reply(reply, &factual()).unwrap();

        assert_eq!(assessment.score, 3.0);
        assert!(assessment
            .breakdown
            .iter()
            .all(|c| c.awarded.is_finite() && c.awarded <= c.weight as f64));
        let json = serde_json::to_value(&assessment).unwrap();
        assert_eq!(json["score"], 3.0);

        let reply = r#"{"feedback": "odd", "scores": {"factual_accuracy": "inf", "completeness": "-inf"}}"#;
        assert_eq!(parse_grading_reply(reply, &factual()).unwrap().score, 0.0);
    }

    #[test]
    fn test_non_finite_total_falls_through() {
        let err = parse_grading_reply(r#"{"feedback": "x", "score": "NaN"}"#, &factual()).unwrap_err();
        assert!(matches!(err, GradeError::ModelResponseError { .. }));

        let reply = r#"{"feedback": "x", "score": 4, "out_of": "inf"}"#;
        assert_eq!(parse_grading_reply(reply, &factual()).unwrap().score, 4.0);
    }

    #[test]
    fn test_json_total_score_is_scaled() {
        let reply = r#"{"feedback": "fine", "score": 4, "out_of": 5}"#;
        let assessment = parse_grading_reply(reply, &factual()).unwrap();
        assert_eq!(assessment.score, 8.0);
        assert!(assessment.breakdown.is_empty());
    }

    #[test]
    fn test_text_fallback_with_denominator() {
        let reply = "The answer names the axial tilt but skips the orbit.\n**Score:** 3/4";
        let assessment = parse_grading_reply(reply, &factual()).unwrap();

        assert_eq!(assessment.score, 7.5);
        assert!(assessment.feedback.contains("axial tilt"));
    }

    #[test]
    fn test_text_fallback_without_denominator_is_clamped() {
        let assessment = parse_grading_reply("Score: 14", &factual()).unwrap();
        assert_eq!(assessment.score, 10.0);
    }

    #[test]
    fn test_unparseable_reply() {
        let err = parse_grading_reply("I cannot grade this.", &factual()).unwrap_err();
        assert!(matches!(err, GradeError::ModelResponseError { .. }));
    }

    #[test]
    fn test_extract_skips_invalid_braces() {
        let obj = extract_json_object("set {a, b} then {\"feedback\": \"x\"}").unwrap();
        assert_eq!(obj.get("feedback").and_then(Value::as_str), Some("x"));
    }
}
