//! Application state: injected repositories, the token table and pagination settings.
//!
//! `AppState::from_config` builds an in-memory store and seeds it from the
//! built-in demo content and the TOML config. Bad seed entries are skipped
//! with an error log, never fatal.

use std::{collections::HashMap, sync::Arc};
use tracing::{error, info, instrument, warn};

use crate::config::{QuestionCfg, QuizConfig, TopicCfg};
use crate::domain::{NewQuestion, User, UserId};
use crate::pagination::PaginationConfig;
use crate::repository::{ProgressRepository, QuestionRepository, SnapshotRepository, TopicRepository};
use crate::seeds::{seed_questions, seed_topics};
use crate::store::InMemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub topics: Arc<dyn TopicRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    /// Consistent multi-table reads for listings and stats.
    pub views: Arc<dyn SnapshotRepository>,
    /// token -> user
    pub users: HashMap<String, User>,
    pub pagination: PaginationConfig,
}

impl AppState {
    /// Wire all repositories to one in-memory store.
    pub fn with_store(store: InMemoryStore, users: HashMap<String, User>, pagination: PaginationConfig) -> Self {
        let store = Arc::new(store);
        Self {
            topics: store.clone(),
            questions: store.clone(),
            progress: store.clone(),
            views: store,
            users,
            pagination: pagination.normalized(),
        }
    }

    /// Build state from config: token table, pagination, seeded store.
    #[instrument(level = "info", skip_all)]
    pub async fn from_config(cfg: QuizConfig) -> Self {
        let store = InMemoryStore::new();

        let mut topics: Vec<TopicCfg> = Vec::new();
        let mut questions: Vec<QuestionCfg> = Vec::new();
        if cfg.seed_builtin {
            topics.extend(seed_topics());
            questions.extend(seed_questions());
        }
        topics.extend(cfg.topics.iter().cloned());
        questions.extend(cfg.questions.iter().cloned());
        seed_store(&store, &topics, &questions).await;

        let users = build_token_table(&cfg);
        if users.is_empty() {
            warn!(target: "quiz", "No users configured; identity-gated routes will reject every request");
        }

        Self::with_store(store, users, cfg.pagination)
    }

    /// Resolve a bearer token to a user.
    pub fn user_for_token(&self, token: &str) -> Option<&User> {
        self.users.get(token)
    }
}

fn build_token_table(cfg: &QuizConfig) -> HashMap<String, User> {
    let mut users = HashMap::<String, User>::new();
    for u in &cfg.users {
        let token = u.token.trim();
        if token.is_empty() {
            error!(target: "quiz", id = u.id, "Skipping user: empty token");
            continue;
        }
        if users.contains_key(token) {
            error!(target: "quiz", id = u.id, "Skipping user: token already assigned");
            continue;
        }
        if users.values().any(|existing| existing.id.0 == u.id || existing.email == u.email) {
            error!(target: "quiz", id = u.id, email = %u.email, "Skipping user: duplicate id or email");
            continue;
        }
        users.insert(token.to_string(), User { id: UserId(u.id), email: u.email.clone() });
    }
    users
}

async fn seed_store(store: &InMemoryStore, topics: &[TopicCfg], questions: &[QuestionCfg]) {
    let mut by_title = HashMap::new();
    for t in topics {
        match store.create_topic(&t.title, &t.description).await {
            Ok(topic) => {
                by_title.insert(topic.title.clone(), topic.id);
            }
            Err(e) => error!(target: "quiz", title = %t.title, error = %e, "Skipping topic"),
        }
    }

    let mut inactive = 0usize;
    for q in questions {
        let Some(&topic_id) = by_title.get(q.topic.trim()) else {
            error!(target: "quiz", title = %q.title, topic = %q.topic, "Skipping question: unknown topic");
            continue;
        };
        let new = NewQuestion {
            title: q.title.clone(),
            description: q.description.clone(),
            difficulty: q.difficulty,
            topic_id,
            is_active: q.is_active,
        };
        match store.create_question(new).await {
            Ok(created) if !created.is_active => inactive += 1,
            Ok(_) => {}
            Err(e) => error!(target: "quiz", title = %q.title, error = %e, "Skipping question"),
        }
    }
    match store.count_active_questions().await {
        Ok(active) => info!(target: "quiz", topics = by_title.len(), active, inactive, "Startup question inventory"),
        Err(e) => error!(target: "quiz", error = %e, "Could not count seeded questions"),
    }
}
