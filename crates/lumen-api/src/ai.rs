use axum::{Extension, extract::State, response::IntoResponse};
use tracing::error;

use lumen_ai::{AiError, Language};
use lumen_types::api::{
    ReviewPayload, ReviewRequest, SummaryPayload, SummaryRequest, TopicsPayload, TopicsRequest,
    WisdomPayload, WisdomRequest,
};

use crate::error::{ApiError, ok};
use crate::extract::Json;
use crate::token::Claims;
use crate::{AppState, with_db};

/// How many recent entries feed the personalized-topics prompt.
const TOPIC_CONTEXT_ENTRIES: i64 = 10;

/// POST /api/ai/wisdom (public)
pub async fn wisdom(
    State(state): State<AppState>,
    Json(req): Json<WisdomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let language = Language::from_tag(req.language.as_deref());
    let wisdoms = state
        .ai
        .generate_wisdom(&req.topic, &req.content, language)
        .await
        .map_err(|e| provider_error("wisdom", e))?;
    Ok(ok(WisdomPayload { wisdoms }))
}

/// POST /api/ai/summary (public)
pub async fn summary(
    State(state): State<AppState>,
    Json(req): Json<SummaryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.topic.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::invalid("topic and content are required"));
    }
    let language = Language::from_tag(req.language.as_deref());
    let summaries = state
        .ai
        .generate_summary(&req.topic, &req.content, language)
        .await
        .map_err(|e| provider_error("summary", e))?;
    Ok(ok(SummaryPayload { summaries }))
}

/// POST /api/ai/topics
pub async fn topics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<TopicsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let language = Language::from_tag(req.language.as_deref());
    let user_id = claims.sub;

    let recent = with_db(state.clone(), move |db| {
        db.recent_entries(user_id, TOPIC_CONTEXT_ENTRIES)
    })
    .await?;
    let contents: Vec<String> = recent.into_iter().map(|e| e.content).collect();

    let topics = state
        .ai
        .generate_topics(&contents, language)
        .await
        .map_err(|e| provider_error("topics", e))?;
    Ok(ok(TopicsPayload { topics }))
}

/// POST /api/ai/review
pub async fn review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let language = Language::from_tag(req.language.as_deref());
    let user_id = claims.sub;

    let entries = with_db(state.clone(), move |db| db.list_entries(user_id)).await?;
    if entries.is_empty() {
        return Err(ApiError::invalid("no journal entries to analyze"));
    }
    let contents: Vec<String> = entries
        .into_iter()
        .map(|e| format!("{}\n{}", e.topic, e.content))
        .collect();

    let content = state
        .ai
        .generate_review(req.kind, &contents, language)
        .await
        .map_err(|e| provider_error("review", e))?;
    Ok(ok(ReviewPayload {
        kind: req.kind,
        content,
    }))
}

/// Provider failures map onto the taxonomy: a missing key is a server
/// misconfiguration, everything else is a degraded downstream the client may
/// retry.
fn provider_error(what: &str, err: AiError) -> ApiError {
    error!("AI {} generation failed: {}", what, err);
    match err {
        AiError::NotConfigured => ApiError::internal("AI provider not configured"),
        _ => ApiError::unavailable(format!("failed to generate {what}")),
    }
}
