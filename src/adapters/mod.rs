// Adapters layer: concrete implementations of the domain ports (LLM endpoint, question storage).

pub mod llm;
pub mod store;

pub use llm::{ChatModelSettings, OpenAiChatModel};
pub use store::{InMemoryQuestionStore, JsonFileQuestionStore};
