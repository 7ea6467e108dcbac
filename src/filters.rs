//! Boundary parsing for question-listing filters.
//!
//! Raw query strings are parsed once into `QuestionFilter`; everything
//! downstream works on typed optionals.

use serde::Deserialize;

use crate::domain::{Difficulty, TopicId};
use crate::error::ApiError;

/// Parse a bool-like token. Unrecognized input yields `None`, not an error.
pub fn parse_bool(raw: &str) -> Option<bool> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "true" | "1" | "yes" | "y" | "on" => Some(true),
    "false" | "0" | "no" | "n" | "off" => Some(false),
    _ => None,
  }
}

/// `None`, `""`, `"any"` and `"all"` all mean "do not filter".
fn non_sentinel(raw: Option<&str>) -> Option<&str> {
  let v = raw?.trim();
  if v.is_empty() || v.eq_ignore_ascii_case("any") || v.eq_ignore_ascii_case("all") {
    None
  } else {
    Some(v)
  }
}

/// Query string of `GET /questions` and `GET /questions/random`.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionQuery {
  pub topic: Option<String>,
  pub difficulty: Option<String>,
  pub search: Option<String>,
  pub only_new: Option<String>,
  pub is_learned: Option<String>,
  pub page: Option<String>,
  pub page_size: Option<String>,
}

/// Which learned-state rows to keep. Only applied for identified viewers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LearnedFilter {
  Learned,
  Unlearned,
}

impl LearnedFilter {
  pub fn keeps(self, learned: bool) -> bool {
    match self {
      LearnedFilter::Learned => learned,
      LearnedFilter::Unlearned => !learned,
    }
  }
}

/// Difficulty selection. Values are compared exactly against the stored
/// lowercase names, so `Hard` or `extreme` select nothing rather than fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DifficultyFilter {
  Exactly(Difficulty),
  Unmatched,
}

impl DifficultyFilter {
  pub fn parse(raw: &str) -> Self {
    [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
      .into_iter()
      .find(|d| d.as_str() == raw)
      .map_or(DifficultyFilter::Unmatched, DifficultyFilter::Exactly)
  }

  pub fn matches(self, difficulty: Difficulty) -> bool {
    self == DifficultyFilter::Exactly(difficulty)
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionFilter {
  pub topic: Option<TopicId>,
  pub difficulty: Option<DifficultyFilter>,
  /// Lowercased, trimmed; `None` when blank.
  pub search: Option<String>,
  pub learned: Option<LearnedFilter>,
}

impl QuestionFilter {
  /// Build typed filters from the raw query.
  ///
  /// `only_new=true` wins over any `is_learned`; otherwise a definite
  /// `is_learned` selects that state. Unparseable booleans are ignored.
  ///
  /// # Errors
  ///
  /// `Validation` for a non-numeric topic id.
  pub fn from_query(q: &QuestionQuery) -> Result<Self, ApiError> {
    let topic = match non_sentinel(q.topic.as_deref()) {
      Some(raw) => Some(TopicId(raw.parse::<u64>().map_err(|_| {
        ApiError::Validation(format!("topic must be a numeric id, got '{raw}'"))
      })?)),
      None => None,
    };

    let difficulty = non_sentinel(q.difficulty.as_deref())
      .and(q.difficulty.as_deref())
      .map(DifficultyFilter::parse);

    let search = q
      .search
      .as_deref()
      .map(|s| s.trim().to_lowercase())
      .filter(|s| !s.is_empty());

    let only_new = q.only_new.as_deref().and_then(parse_bool);
    let is_learned = q.is_learned.as_deref().and_then(parse_bool);
    let learned = if only_new == Some(true) {
      Some(LearnedFilter::Unlearned)
    } else {
      is_learned.map(|b| if b { LearnedFilter::Learned } else { LearnedFilter::Unlearned })
    };

    Ok(Self { topic, difficulty, search, learned })
  }
}
