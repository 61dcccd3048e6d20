use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use turing_grader::adapters::llm::ChatModelSettings;
use turing_grader::domain::model::NewQuestion;
use turing_grader::domain::ports::QuestionStore;
use turing_grader::{
    InMemoryQuestionStore, Objective, OpenAiChatModel, Rubric, RubricType, ShortAnswerQuestion,
};

fn model_for(server: &MockServer) -> OpenAiChatModel {
    OpenAiChatModel::new(ChatModelSettings {
        base_url: server.url("/v1"),
        model: "grader-test".to_string(),
        api_key: None,
        max_retries: 2,
        retry_delay: Duration::from_millis(1),
        ..ChatModelSettings::default()
    })
    .unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// 題目紀錄 → rubric → LLM → (feedback, score)
#[tokio::test]
async fn test_record_grading_end_to_end() -> Result<()> {
    let server = MockServer::start();
    let reply = r#"```json
{"feedback": "You named photosynthesis but not its products.", "scores": {"factual_accuracy": 6, "completeness": 1}}
```"#;
    let llm_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("Which process do plants use to make food?")
            .body_contains("factual_accuracy (7 points)")
            .body_contains("Photosynthesis");
        then.status(200).json_body(completion(reply));
    });

    let store = InMemoryQuestionStore::new();
    let record = store
        .insert(NewQuestion {
            body: "Which process do plants use to make food?".to_string(),
            example_answer: "Photosynthesis, producing glucose and oxygen.".to_string(),
            category: "recall".to_string(),
        })
        .await?;
    assert_eq!(record.rubric_type()?, RubricType::Factual);

    let model = model_for(&server);
    let (feedback, score) = record.grade(&model, "Photosynthesis").await?;

    assert_eq!(feedback, "You named photosynthesis but not its products.");
    assert_eq!(score, 7.0);
    llm_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_ad_hoc_rubric_from_payload() -> Result<()> {
    let server = MockServer::start();
    let llm_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("grammar (2 points)")
            .body_contains("reasoning (4 points)");
        then.status(200).json_body(completion(
            r#"{"feedback": "Clear argument.", "scores": {"reasoning": 3.5, "grammar": 2}}"#,
        ));
    });

    let question = ShortAnswerQuestion::from_dict(&json!({
        "question": "Why do we have leap years?",
        "answer": "A solar year is about 365.24 days, so a day is added every four years.",
        "rubric": {
            "criteria": [
                { "objective": "reasoning", "weight": 4 },
                { "objective": "grammar", "weight": 2 }
            ]
        }
    }))?;
    assert_eq!(question.rubric.rubric_type(), RubricType::Custom);
    assert_eq!(question.rubric.size(), 2);

    let (feedback, score) = question
        .grade(&model_for(&server), "The year is slightly longer than 365 days.")
        .await?;
    assert_eq!(feedback, "Clear argument.");
    assert_eq!(score, 5.5);
    llm_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_builder_style_rubric() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .json_body(completion("Decent attempt overall.\nScore: 2 / 4"));
    });

    let mut rubric = Rubric::empty();
    rubric
        .add_criteria(Objective::Clarity, 3)?
        .add_criteria(Objective::Relevance, 3)?;
    let question = ShortAnswerQuestion::new("Describe a cell.", "A membrane-bound unit of life.", Some(rubric));

    let model = Arc::new(model_for(&server));
    let (feedback, score) = question.grade(model.as_ref(), "It is small.").await?;

    assert!(feedback.starts_with("Decent attempt"));
    assert_eq!(score, 3.0);
    Ok(())
}

#[tokio::test]
async fn test_llm_outage_surfaces_error() -> Result<()> {
    let server = MockServer::start();
    let llm_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(500).body("boom");
    });

    let question = ShortAnswerQuestion::from_rubric_type("Q", "A", RubricType::General);
    let err = question
        .grade(&model_for(&server), "answer")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        turing_grader::GradeError::LlmError { status: 500, .. }
    ));
    llm_mock.assert_hits(2);
    Ok(())
}
