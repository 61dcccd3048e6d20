use crate::core::grader::Grader;
use crate::domain::model::{Assessment, NewQuestion, QuestionRecord, ShortAnswerQuestion};
use crate::domain::ports::{GradingModel, QuestionStore};
use crate::utils::error::{ErrorCategory, GradeError};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

type ApiResult<T> = std::result::Result<T, GradeError>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuestionStore>,
    pub model: Arc<dyn GradingModel>,
}

impl AppState {
    pub fn new(store: Arc<dyn QuestionStore>, model: Arc<dyn GradingModel>) -> Self {
        Self { store, model }
    }

    fn grader(&self) -> Grader<dyn GradingModel> {
        Grader::new(Arc::clone(&self.model))
    }
}

#[derive(Debug, Deserialize)]
pub struct GradeQuery {
    pub answer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GradeResponse {
    pub feedback: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct GradePayload {
    pub question: Value,
    #[serde(default)]
    pub answer: String,
}

impl IntoResponse for GradeError {
    fn into_response(self) -> Response {
        let status = match &self {
            GradeError::NotFoundError { .. } => StatusCode::NOT_FOUND,
            GradeError::ValidationError { .. }
            | GradeError::InvalidTagError { .. }
            | GradeError::PayloadError { .. } => StatusCode::BAD_REQUEST,
            GradeError::ModelResponseError { .. }
            | GradeError::LlmError { .. }
            | GradeError::HttpError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("❌ Internal error ({:?}): {}", self.category(), self);
            "Internal server error".to_string()
        } else {
            if self.category() == ErrorCategory::Network || self.category() == ErrorCategory::Model {
                tracing::warn!("⚠️ Upstream model error: {}", self);
            }
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// Extractor failures use the same `{"error": ...}` body as every other error.

impl From<JsonRejection> for GradeError {
    fn from(rejection: JsonRejection) -> Self {
        GradeError::payload(rejection.body_text())
    }
}

impl From<PathRejection> for GradeError {
    fn from(rejection: PathRejection) -> Self {
        GradeError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for GradeError {
    fn from(rejection: QueryRejection) -> Self {
        GradeError::validation(rejection.body_text())
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/{id}", get(get_question))
        .route("/questions/{id}/grade", get(grade_question))
        .route("/grade", post(grade_payload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_questions(State(state): State<AppState>) -> ApiResult<Json<Vec<QuestionRecord>>> {
    Ok(Json(state.store.list().await?))
}

async fn create_question(
    State(state): State<AppState>,
    payload: Result<Json<NewQuestion>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let record = state.store.insert(payload).await?;
    tracing::info!("📝 Created question #{} ({})", record.id, record.category);
    Ok((StatusCode::CREATED, Json(record)))
}

async fn fetch_record(state: &AppState, id: u64) -> ApiResult<QuestionRecord> {
    state
        .store
        .get(id)
        .await?
        .ok_or_else(|| GradeError::not_found(format!("question {}", id)))
}

async fn get_question(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<QuestionRecord>> {
    let Path(id) = id?;
    Ok(Json(fetch_record(&state, id).await?))
}

/// Fetches the record, grades the `answer` query parameter and returns `(feedback, score)`.
async fn grade_question(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    query: Result<Query<GradeQuery>, QueryRejection>,
) -> ApiResult<Json<GradeResponse>> {
    let (Path(id), Query(query)) = (id?, query?);
    let record = fetch_record(&state, id).await?;
    let answer = query.answer.unwrap_or_default();

    let (feedback, score) = record.grade(state.model.as_ref(), &answer).await?;
    tracing::info!("✅ Question #{} graded: {}", id, score);

    Ok(Json(GradeResponse { feedback, score }))
}

async fn grade_payload(
    State(state): State<AppState>,
    payload: Result<Json<GradePayload>, JsonRejection>,
) -> ApiResult<Json<Assessment>> {
    let Json(payload) = payload?;
    let question = ShortAnswerQuestion::from_dict(&payload.question)?;
    let assessment = state.grader().grade_question(&question, &payload.answer).await?;
    Ok(Json(assessment))
}
