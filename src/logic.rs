//! Question query service shared by the HTTP handlers.
//!
//! This includes:
//!   - building the filtered, learned-annotated view of active questions
//!   - single-question retrieval for a viewer
//!   - marking a question learned / not learned
//!   - picking a random unlearned question

use std::collections::HashMap;

use rand::Rng;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::domain::{AnnotatedQuestion, Question, QuestionId, Topic, TopicId, UserId};
use crate::error::{ApiError, StorageError};
use crate::filters::{parse_bool, LearnedFilter, QuestionFilter};
use crate::repository::Snapshot;
use crate::state::AppState;

/// Join active questions from one snapshot with their topics and the
/// viewer's learned set, in id order.
fn annotate_snapshot(snap: Snapshot) -> Result<Vec<AnnotatedQuestion>, ApiError> {
  let topics: HashMap<TopicId, Topic> = snap.topics.into_iter().map(|t| (t.id, t)).collect();
  let mut rows = Vec::with_capacity(snap.active_questions.len());
  for question in snap.active_questions {
    let topic = topics.get(&question.topic_id).cloned().ok_or_else(|| {
      StorageError::Invalid(format!("question {} references missing topic {}", question.id, question.topic_id))
    })?;
    let learned = snap.learned.contains(&question.id);
    rows.push(AnnotatedQuestion { question, topic, learned });
  }
  Ok(rows)
}

/// Active questions annotated for `viewer` and filtered, in id order.
///
/// Anonymous viewers never trigger a progress lookup, see every question as
/// unlearned, and learned-state filters do not apply to them.
#[instrument(level = "debug", skip(state))]
pub async fn annotated_questions(
  state: &AppState,
  viewer: Option<UserId>,
  filter: &QuestionFilter,
) -> Result<Vec<AnnotatedQuestion>, ApiError> {
  let rows = annotate_snapshot(state.views.snapshot(viewer).await?)?;
  let rows = apply_filter(rows, filter, viewer.is_some());
  debug!(target: "quiz", viewer = ?viewer, matched = rows.len(), "Question listing evaluated");
  Ok(rows)
}

/// Conjunctive filtering over annotated rows.
pub fn apply_filter(rows: Vec<AnnotatedQuestion>, filter: &QuestionFilter, identified: bool) -> Vec<AnnotatedQuestion> {
  let learned = if identified { filter.learned } else { None };
  rows
    .into_iter()
    .filter(|r| filter.topic.map_or(true, |t| r.question.topic_id == t))
    .filter(|r| filter.difficulty.map_or(true, |d| d.matches(r.question.difficulty)))
    .filter(|r| filter.search.as_deref().map_or(true, |s| matches_search(r, s)))
    .filter(|r| learned.map_or(true, |l| l.keeps(r.learned)))
    .collect()
}

/// `needle` must already be lowercased.
fn matches_search(row: &AnnotatedQuestion, needle: &str) -> bool {
  row.question.title.to_lowercase().contains(needle)
    || row.question.description.to_lowercase().contains(needle)
    || row.topic.title.to_lowercase().contains(needle)
}

/// Fetch one active question; unknown and inactive ids are both `NotFound`.
async fn active_question(state: &AppState, id: QuestionId) -> Result<Question, ApiError> {
  match state.questions.get_question(id).await {
    Ok(q) if q.is_active => Ok(q),
    Ok(_) | Err(StorageError::NotFound) => Err(not_found(id)),
    Err(e) => Err(e.into()),
  }
}

fn not_found(id: QuestionId) -> ApiError {
  ApiError::NotFound(format!("question {id} not found"))
}

/// Storage `NotFound` here means the question went away or was deactivated.
fn progress_err(id: QuestionId) -> impl Fn(StorageError) -> ApiError {
  move |e| match e {
    StorageError::NotFound => not_found(id),
    other => other.into(),
  }
}

async fn annotate_one(state: &AppState, question: Question, learned: bool) -> Result<AnnotatedQuestion, ApiError> {
  let topic = state.topics.get_topic(question.topic_id).await?;
  Ok(AnnotatedQuestion { question, topic, learned })
}

#[instrument(level = "debug", skip(state))]
pub async fn get_question_for(state: &AppState, viewer: Option<UserId>, id: QuestionId) -> Result<AnnotatedQuestion, ApiError> {
  annotate_snapshot(state.views.snapshot(viewer).await?)?
    .into_iter()
    .find(|r| r.question.id == id)
    .ok_or_else(|| not_found(id))
}

/// Interpret a JSON body field as a bool-like value.
pub fn bool_from_json(value: &Value) -> Option<bool> {
  match value {
    Value::Bool(b) => Some(*b),
    Value::String(s) => parse_bool(s),
    Value::Number(n) => parse_bool(&n.to_string()),
    _ => None,
  }
}

/// Upsert the caller's progress row for an active question.
///
/// # Errors
///
/// `NotFound` for an unknown or inactive question (checked first), then
/// `Validation` when `raw` is missing or not bool-like.
#[instrument(level = "info", skip(state, raw))]
pub async fn mark_learned(
  state: &AppState,
  user: UserId,
  id: QuestionId,
  raw: Option<&Value>,
) -> Result<AnnotatedQuestion, ApiError> {
  let question = active_question(state, id).await?;
  let value = raw
    .and_then(bool_from_json)
    .ok_or_else(|| ApiError::Validation("is_learned must be a boolean value".into()))?;

  let mut row = state.progress.get_or_create(user, id).await.map_err(progress_err(id))?;
  row.is_learned = value;
  let row = state.progress.save_progress(row).await.map_err(progress_err(id))?;
  info!(target: "progress", %user, question = %id, learned = row.is_learned, "Progress updated");
  annotate_one(state, question, row.is_learned).await
}

/// The filtered set for `user`, further restricted to unlearned questions.
#[instrument(level = "debug", skip(state))]
pub async fn unlearned_candidates(
  state: &AppState,
  user: UserId,
  filter: &QuestionFilter,
) -> Result<Vec<AnnotatedQuestion>, ApiError> {
  let rows = annotated_questions(state, Some(user), filter).await?;
  Ok(rows.into_iter().filter(|r| LearnedFilter::Unlearned.keeps(r.learned)).collect())
}

/// Uniform pick by index.
///
/// # Errors
///
/// `NotFound("no unlearned questions")` on an empty candidate set.
pub fn pick_uniform<R: Rng + ?Sized>(mut candidates: Vec<AnnotatedQuestion>, rng: &mut R) -> Result<AnnotatedQuestion, ApiError> {
  if candidates.is_empty() {
    return Err(ApiError::NotFound("no unlearned questions".into()));
  }
  let index = rng.gen_range(0..candidates.len());
  Ok(candidates.swap_remove(index))
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::domain::{Difficulty, NewQuestion};
  use crate::filters::DifficultyFilter;
  use crate::pagination::PaginationConfig;
  use crate::store::InMemoryStore;
  use rand::{rngs::StdRng, SeedableRng};
  use serde_json::json;

  pub const ALICE: UserId = UserId(1);

  /// Two topics: "Ownership" (q1 easy, q2 hard) and "Async" (q3 medium, q4 inactive).
  pub async fn fixture() -> AppState {
    let store = InMemoryStore::new();
    let state = AppState::with_store(store, Default::default(), PaginationConfig::default());
    let own = state.topics.create_topic("Ownership", "moves and borrows").await.unwrap();
    let asy = state.topics.create_topic("Async", "").await.unwrap();
    let add = |title: &str, description: &str, difficulty, topic_id, is_active| NewQuestion {
      title: title.into(),
      description: description.into(),
      difficulty,
      topic_id,
      is_active,
    };
    for new in [
      add("What is a move?", "Transfer of ownership", Difficulty::Easy, own.id, true),
      add("Explain reborrowing", "Implicit &mut *x", Difficulty::Hard, own.id, true),
      add("What is a Future?", "Lazy computation", Difficulty::Medium, asy.id, true),
      add("Green threads", "Removed before 1.0", Difficulty::Medium, asy.id, false),
    ] {
      state.questions.create_question(new).await.unwrap();
    }
    state
  }

  async fn learned_count(state: &AppState) -> usize {
    state.views.snapshot(Some(ALICE)).await.unwrap().learned.len()
  }

  fn ids(rows: &[AnnotatedQuestion]) -> Vec<u64> {
    rows.iter().map(|r| r.question.id.0).collect()
  }

  fn filter(topic: Option<u64>, difficulty: Option<Difficulty>, search: Option<&str>, learned: Option<LearnedFilter>) -> QuestionFilter {
    QuestionFilter {
      topic: topic.map(TopicId),
      difficulty: difficulty.map(DifficultyFilter::Exactly),
      search: search.map(str::to_string),
      learned,
    }
  }

  #[tokio::test]
  async fn listing_only_returns_active_questions_in_order() {
    let state = fixture().await;
    let rows = annotated_questions(&state, None, &QuestionFilter::default()).await.unwrap();
    assert_eq!(ids(&rows), vec![1, 2, 3]);
    assert!(rows.iter().all(|r| r.question.is_active && !r.learned));
  }

  #[tokio::test]
  async fn filters_are_conjunctive() {
    let state = fixture().await;
    let by_topic = annotated_questions(&state, None, &filter(Some(1), None, None, None)).await.unwrap();
    assert_eq!(ids(&by_topic), vec![1, 2]);

    let topic_and_diff = annotated_questions(&state, None, &filter(Some(1), Some(Difficulty::Hard), None, None)).await.unwrap();
    assert_eq!(ids(&topic_and_diff), vec![2]);

    let none = annotated_questions(&state, None, &filter(Some(2), Some(Difficulty::Hard), None, None)).await.unwrap();
    assert!(none.is_empty());
  }

  #[tokio::test]
  async fn unmatched_difficulty_selects_nothing() {
    let state = fixture().await;
    let f = QuestionFilter { difficulty: Some(DifficultyFilter::Unmatched), ..Default::default() };
    assert!(annotated_questions(&state, None, &f).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn single_question_is_annotated_for_its_viewer() {
    let state = fixture().await;
    mark_learned(&state, ALICE, QuestionId(3), Some(&json!(true))).await.unwrap();

    let mine = get_question_for(&state, Some(ALICE), QuestionId(3)).await.unwrap();
    assert!(mine.learned);
    assert_eq!(mine.topic.title, "Async");
    assert!(!get_question_for(&state, Some(UserId(2)), QuestionId(3)).await.unwrap().learned);
    assert!(!get_question_for(&state, None, QuestionId(3)).await.unwrap().learned);

    for id in [4, 99] {
      let err = get_question_for(&state, Some(ALICE), QuestionId(id)).await.unwrap_err();
      assert!(matches!(err, ApiError::NotFound(_)), "{id}");
    }
  }

  #[tokio::test]
  async fn search_matches_title_description_or_topic_title() {
    let state = fixture().await;
    let title = annotated_questions(&state, None, &filter(None, None, Some("future"), None)).await.unwrap();
    assert_eq!(ids(&title), vec![3]);
    let description = annotated_questions(&state, None, &filter(None, None, Some("&mut"), None)).await.unwrap();
    assert_eq!(ids(&description), vec![2]);
    let topic = annotated_questions(&state, None, &filter(None, None, Some("owner"), None)).await.unwrap();
    assert_eq!(ids(&topic), vec![1, 2]);
    // Inactive question text never leaks through search.
    let inactive = annotated_questions(&state, None, &filter(None, None, Some("green"), None)).await.unwrap();
    assert!(inactive.is_empty());
  }

  #[tokio::test]
  async fn learned_filters_apply_only_to_identified_viewers() {
    let state = fixture().await;
    mark_learned(&state, ALICE, QuestionId(1), Some(&json!(true))).await.unwrap();

    let learned = annotated_questions(&state, Some(ALICE), &filter(None, None, None, Some(LearnedFilter::Learned))).await.unwrap();
    assert_eq!(ids(&learned), vec![1]);
    assert!(learned[0].learned);

    let new = annotated_questions(&state, Some(ALICE), &filter(None, None, None, Some(LearnedFilter::Unlearned))).await.unwrap();
    assert_eq!(ids(&new), vec![2, 3]);

    let anonymous = annotated_questions(&state, None, &filter(None, None, None, Some(LearnedFilter::Learned))).await.unwrap();
    assert_eq!(ids(&anonymous), vec![1, 2, 3]);
    assert!(anonymous.iter().all(|r| !r.learned));
  }

  #[tokio::test]
  async fn mark_learned_is_idempotent() {
    let state = fixture().await;
    let first = mark_learned(&state, ALICE, QuestionId(2), Some(&json!("yes"))).await.unwrap();
    let second = mark_learned(&state, ALICE, QuestionId(2), Some(&json!("yes"))).await.unwrap();
    assert!(first.learned && second.learned);
    assert_eq!(first.question, second.question);
    assert_eq!(learned_count(&state).await, 1);

    let undone = mark_learned(&state, ALICE, QuestionId(2), Some(&json!(0))).await.unwrap();
    assert!(!undone.learned);
    assert_eq!(learned_count(&state).await, 0);
  }

  #[tokio::test]
  async fn mark_learned_rejects_unparseable_values() {
    let state = fixture().await;
    for raw in [Some(json!("maybe")), Some(json!(null)), Some(json!(2)), Some(json!([true])), None] {
      let err = mark_learned(&state, ALICE, QuestionId(1), raw.as_ref()).await.unwrap_err();
      assert!(matches!(err, ApiError::Validation(_)), "{raw:?}");
    }
    assert_eq!(learned_count(&state).await, 0);
  }

  #[tokio::test]
  async fn mark_learned_on_inactive_or_unknown_is_not_found() {
    let state = fixture().await;
    for id in [4, 99] {
      let err = mark_learned(&state, ALICE, QuestionId(id), Some(&json!(true))).await.unwrap_err();
      assert!(matches!(err, ApiError::NotFound(_)), "{id}");
    }
  }

  #[tokio::test]
  async fn random_never_returns_learned_and_empties_to_not_found() {
    let state = fixture().await;
    let mut rng = StdRng::seed_from_u64(7);
    mark_learned(&state, ALICE, QuestionId(1), Some(&json!(true))).await.unwrap();

    for _ in 0..20 {
      let candidates = unlearned_candidates(&state, ALICE, &QuestionFilter::default()).await.unwrap();
      let picked = pick_uniform(candidates, &mut rng).unwrap();
      assert!(!picked.learned);
      assert_ne!(picked.question.id, QuestionId(1));
    }

    for id in [2, 3] {
      mark_learned(&state, ALICE, QuestionId(id), Some(&json!(true))).await.unwrap();
    }
    let candidates = unlearned_candidates(&state, ALICE, &QuestionFilter::default()).await.unwrap();
    assert!(matches!(pick_uniform(candidates, &mut rng), Err(ApiError::NotFound(_))));
  }

  #[tokio::test]
  async fn random_respects_other_filters() {
    let state = fixture().await;
    let mut rng = StdRng::seed_from_u64(1);
    let candidates = unlearned_candidates(&state, ALICE, &filter(Some(2), None, None, None)).await.unwrap();
    assert_eq!(pick_uniform(candidates, &mut rng).unwrap().question.id, QuestionId(3));

    // Asking for learned rows only leaves nothing unlearned to pick from.
    let learned_only = unlearned_candidates(&state, ALICE, &filter(None, None, None, Some(LearnedFilter::Learned))).await.unwrap();
    assert!(learned_only.is_empty());
  }

  #[test]
  fn pick_uniform_covers_every_candidate() {
    let row = |id| AnnotatedQuestion {
      question: Question {
        id: QuestionId(id),
        title: format!("q{id}"),
        description: String::new(),
        is_active: true,
        difficulty: Difficulty::Medium,
        topic_id: TopicId(1),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
      },
      topic: Topic { id: TopicId(1), title: "t".into(), description: String::new() },
      learned: false,
    };
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen = std::collections::HashSet::new();
    for _ in 0..200 {
      seen.insert(pick_uniform(vec![row(1), row(2), row(3)], &mut rng).unwrap().question.id);
    }
    assert_eq!(seen.len(), 3);
  }
}
