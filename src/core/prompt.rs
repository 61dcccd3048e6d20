use crate::domain::model::ShortAnswerQuestion;
use crate::domain::ports::ChatMessage;

const SYSTEM_PROMPT: &str = r#"You are a careful teaching assistant who grades short written answers.
Grade only against the rubric you are given. Compare the student answer with the reference answer,
but accept correct answers that are worded differently.

Reply with a single JSON object and nothing else:
{"feedback": "<two to four sentences addressed to the student>", "scores": {"<objective>": <points>}}

Use the objective names exactly as listed in the rubric. Each score is a number between 0 and the
points available for that objective."#;

/// Builds the system and user messages for one grading request.
pub fn build_grading_messages(question: &ShortAnswerQuestion, student_answer: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(render_user_prompt(question, student_answer)),
    ]
}

fn render_user_prompt(question: &ShortAnswerQuestion, student_answer: &str) -> String {
    let criteria = question
        .rubric
        .criteria()
        .map(|(objective, weight)| {
            format!("- {} ({} points): {}", objective, weight, objective.description())
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"## Question
{}

## Reference Answer
{}

## Rubric ({} points total)
{}

## Student Answer
{}"#,
        question.question.trim(),
        question.answer.trim(),
        question.rubric.total_points(),
        criteria,
        student_answer.trim()
    )
}
