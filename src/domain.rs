//! Domain models used by the backend: topics, questions, per-user progress and ids.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
  ($name:ident) => {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(pub u64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
    }
  };
}

numeric_id!(TopicId);
numeric_id!(QuestionId);
numeric_id!(UserId);

/// Three-valued question difficulty. New questions default to `Medium`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
  pub id: TopicId,
  pub title: String,
  #[serde(default)] pub description: String,
}

/// A question always references an existing topic. Inactive questions are
/// retained (with their progress history) but never listed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
  pub id: QuestionId,
  pub title: String,
  pub description: String,
  pub is_active: bool,
  pub difficulty: Difficulty,
  pub topic_id: TopicId,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input for creating a question; timestamps and id are assigned by the store.
#[derive(Clone, Debug)]
pub struct NewQuestion {
  pub title: String,
  pub description: String,
  pub difficulty: Difficulty,
  pub topic_id: TopicId,
  pub is_active: bool,
}

/// Editable question fields. `None` leaves the field untouched.
// Only built by admin maintenance code.
#[allow(dead_code)]
#[derive(Clone, Debug, Default)]
pub struct QuestionPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub difficulty: Option<Difficulty>,
  pub topic_id: Option<TopicId>,
}

/// At most one row exists per (user, question) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
  pub user_id: UserId,
  pub question_id: QuestionId,
  pub is_learned: bool,
  pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
  pub id: UserId,
  pub email: String,
}

/// A question joined with its topic and annotated for one viewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedQuestion {
  pub question: Question,
  pub topic: Topic,
  pub learned: bool,
}
