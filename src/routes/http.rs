//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{rejection::JsonRejection, Path, Query, State},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::auth::{AuthUser, Viewer};
use crate::domain::{QuestionId, TopicId};
use crate::error::ApiError;
use crate::filters::{QuestionFilter, QuestionQuery};
use crate::logic::*;
use crate::pagination::{paginate, Page};
use crate::protocol::*;
use crate::state::AppState;
use crate::stats::{profile_stats, ProfileStats};

fn parse_id(raw: &str, what: &str) -> Result<u64, ApiError> {
  raw.trim().parse::<u64>().map_err(|_| ApiError::NotFound(format!("{what} {raw} not found")))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_topics(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TopicOut>>, ApiError> {
  let topics = state.topics.list_topics().await?;
  Ok(Json(topics.iter().map(TopicOut::from).collect()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_topic(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<TopicOut>, ApiError> {
  let id = TopicId(parse_id(&id, "topic")?);
  let topic = state.topics.get_topic(id).await.map_err(|e| match e {
    crate::error::StorageError::NotFound => ApiError::NotFound(format!("topic {id} not found")),
    other => other.into(),
  })?;
  Ok(Json(TopicOut::from(&topic)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_questions(
  State(state): State<Arc<AppState>>,
  viewer: Viewer,
  Query(q): Query<QuestionQuery>,
) -> Result<Json<Page<QuestionOut>>, ApiError> {
  let filter = QuestionFilter::from_query(&q)?;
  let rows = annotated_questions(&state, viewer.0, &filter).await?;
  let page = paginate(rows, &state.pagination, q.page.as_deref(), q.page_size.as_deref())?;
  info!(target: "quiz", count = page.count, page = page.page, returned = page.results.len(), "HTTP questions listed");
  Ok(Json(Page {
    count: page.count,
    page: page.page,
    page_size: page.page_size,
    next: page.next,
    previous: page.previous,
    results: page.results.iter().map(to_out).collect(),
  }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  viewer: Viewer,
  Path(id): Path<String>,
) -> Result<Json<QuestionOut>, ApiError> {
  let id = QuestionId(parse_id(&id, "question")?);
  let row = get_question_for(&state, viewer.0, id).await?;
  Ok(Json(to_out(&row)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_mark_learned(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  Path(id): Path<String>,
  body: Result<Json<MarkLearnedIn>, JsonRejection>,
) -> Result<Json<QuestionOut>, ApiError> {
  let id = QuestionId(parse_id(&id, "question")?);
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let row = mark_learned(&state, user.0, id, body.is_learned.as_ref()).await?;
  info!(target: "progress", user = %user.0, question = %id, learned = row.learned, "HTTP mark_learned applied");
  Ok(Json(to_out(&row)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_random_question(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  Query(q): Query<QuestionQuery>,
) -> Result<Json<QuestionOut>, ApiError> {
  let filter = QuestionFilter::from_query(&q)?;
  let candidates = unlearned_candidates(&state, user.0, &filter).await?;
  let remaining = candidates.len();
  let row = pick_uniform(candidates, &mut rand::thread_rng())?;
  info!(target: "quiz", user = %user.0, id = %row.question.id, remaining, "HTTP random question served");
  Ok(Json(to_out(&row)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_profile_stats(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
) -> Result<Json<ProfileStats>, ApiError> {
  Ok(Json(profile_stats(&state, user.0).await?))
}
