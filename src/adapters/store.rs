use crate::domain::model::{NewQuestion, QuestionRecord};
use crate::domain::ports::QuestionStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<u64, QuestionRecord>,
    next_id: u64,
}

impl Table {
    fn from_records(records: Vec<QuestionRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            rows: records.into_iter().map(|r| (r.id, r)).collect(),
            next_id,
        }
    }

    fn insert(&mut self, question: NewQuestion) -> QuestionRecord {
        self.next_id += 1;
        let record = QuestionRecord {
            id: self.next_id,
            body: question.body,
            example_answer: question.example_answer,
            category: question.category,
            created_at: Utc::now(),
        };
        self.rows.insert(record.id, record.clone());
        record
    }
}

/// 記憶體內的題目表，id 從 1 開始遞增
#[derive(Debug, Default)]
pub struct InMemoryQuestionStore {
    table: RwLock<Table>,
}

impl InMemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<QuestionRecord>) -> Self {
        Self {
            table: RwLock::new(Table::from_records(records)),
        }
    }
}

#[async_trait]
impl QuestionStore for InMemoryQuestionStore {
    async fn get(&self, id: u64) -> Result<Option<QuestionRecord>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn insert(&self, question: NewQuestion) -> Result<QuestionRecord> {
        question.validate()?;
        Ok(self.table.write().await.insert(question))
    }

    async fn list(&self) -> Result<Vec<QuestionRecord>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }
}

/// JSON 檔案持久化的題目表，每次新增後整檔重寫
#[derive(Debug)]
pub struct JsonFileQuestionStore {
    path: PathBuf,
    table: RwLock<Table>,
}

impl JsonFileQuestionStore {
    /// A missing file opens as an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records: Vec<QuestionRecord> = match tokio::fs::read(&path).await {
            Ok(data) if data.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("📂 No question file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("Loaded {} questions from {}", records.len(), path.display());

        Ok(Self {
            path,
            table: RwLock::new(Table::from_records(records)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, table: &Table) -> Result<()> {
        let records: Vec<&QuestionRecord> = table.rows.values().collect();
        let data = serde_json::to_vec_pretty(&records)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for JsonFileQuestionStore {
    async fn get(&self, id: u64) -> Result<Option<QuestionRecord>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn insert(&self, question: NewQuestion) -> Result<QuestionRecord> {
        question.validate()?;
        let mut table = self.table.write().await;
        let record = table.insert(question);
        if let Err(e) = self.persist(&table).await {
            table.rows.remove(&record.id);
            table.next_id -= 1;
            return Err(e);
        }
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<QuestionRecord>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }
}
