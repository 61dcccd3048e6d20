use crate::domain::model::{NewQuestion, QuestionRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message in a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// 外部 LLM 評分服務
#[async_trait]
pub trait GradingModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// 題目紀錄的持久層
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn get(&self, id: u64) -> Result<Option<QuestionRecord>>;
    async fn insert(&self, question: NewQuestion) -> Result<QuestionRecord>;
    async fn list(&self) -> Result<Vec<QuestionRecord>>;
}
