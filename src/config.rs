//! Loading service configuration (pagination, users, seed content) from TOML.
//!
//! See `QuizConfig` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Difficulty;
use crate::pagination::PaginationConfig;

#[derive(Clone, Debug, Deserialize)]
pub struct QuizConfig {
  /// Load the built-in demo topics and questions before the configured ones.
  #[serde(default = "default_true")]
  pub seed_builtin: bool,
  #[serde(default)]
  pub pagination: PaginationConfig,
  #[serde(default)]
  pub users: Vec<UserCfg>,
  #[serde(default)]
  pub topics: Vec<TopicCfg>,
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
}

impl Default for QuizConfig {
  fn default() -> Self {
    Self {
      seed_builtin: true,
      pagination: PaginationConfig::default(),
      users: Vec::new(),
      topics: Vec::new(),
      questions: Vec::new(),
    }
  }
}

fn default_true() -> bool { true }

/// A known identity and the bearer token that resolves to it.
#[derive(Clone, Debug, Deserialize)]
pub struct UserCfg {
  pub id: u64,
  pub email: String,
  pub token: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TopicCfg {
  pub title: String,
  #[serde(default)] pub description: String,
}

/// Question entry; `topic` names a topic by title.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  pub title: String,
  #[serde(default)] pub description: String,
  pub topic: String,
  #[serde(default)] pub difficulty: Difficulty,
  #[serde(default = "default_true")] pub is_active: bool,
}

/// Parse a TOML document into `QuizConfig`.
pub fn parse_config(raw: &str) -> Result<QuizConfig, toml::de::Error> {
  toml::from_str::<QuizConfig>(raw)
}

/// Load from QUIZ_CONFIG_PATH. A missing variable, unreadable file or parse
/// error falls back to defaults (the error is logged).
pub fn load_config_from_env() -> QuizConfig {
  let Ok(path) = std::env::var("QUIZ_CONFIG_PATH") else {
    info!(target: "quiz", "QUIZ_CONFIG_PATH not set; using defaults");
    return QuizConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "quiz", %path, users = cfg.users.len(), topics = cfg.topics.len(), questions = cfg.questions.len(), "Loaded config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "quiz", %path, error = %e, "Failed to parse TOML config; using defaults");
        QuizConfig::default()
      }
    },
    Err(e) => {
      error!(target: "quiz", %path, error = %e, "Failed to read TOML config file; using defaults");
      QuizConfig::default()
    }
  }
}
