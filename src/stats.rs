//! Per-user progress summary.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{TopicId, UserId};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
  pub questions_learned: usize,
  pub topics_learned: usize,
  pub progress: String,
}

/// `round(learned / total * 100)` as `"<n>%"`, `"0%"` when `total` is zero.
pub fn progress_percent(learned: usize, total: usize) -> String {
  if total == 0 {
    return "0%".into();
  }
  let pct = (learned as f64 / total as f64 * 100.0).round() as u64;
  format!("{pct}%")
}

/// `questions_learned` counts every learned row, including rows for
/// questions that have since been deactivated. A topic counts as learned when
/// it has at least one active question and all of them are learned.
///
/// All three figures come from one store snapshot.
#[instrument(level = "info", skip(state))]
pub async fn profile_stats(state: &AppState, user: UserId) -> Result<ProfileStats, ApiError> {
  let snap = state.views.snapshot(Some(user)).await?;
  let questions_learned = snap.learned.len();

  // topic -> (active, learned active)
  let mut per_topic: HashMap<TopicId, (usize, usize)> = HashMap::new();
  for q in &snap.active_questions {
    let entry = per_topic.entry(q.topic_id).or_default();
    entry.0 += 1;
    if snap.learned.contains(&q.id) {
      entry.1 += 1;
    }
  }

  let topics_learned = snap
    .topics
    .iter()
    .filter(|t| matches!(per_topic.get(&t.id), Some(&(total, learned)) if total > 0 && learned == total))
    .count();

  let progress = progress_percent(questions_learned, snap.active_questions.len());
  debug!(target: "progress", %user, questions_learned, topics_learned, %progress, "Stats computed");
  Ok(ProfileStats { questions_learned, topics_learned, progress })
}
