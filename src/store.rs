//! In-memory store implementing every repository trait.
//!
//! All three tables sit behind one `RwLock` so cross-table checks (topic still
//! referenced, question exists) and the progress upsert are atomic. Maps are
//! `BTreeMap`s keyed by id, which gives listing its insertion order.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::{NewQuestion, Progress, Question, QuestionId, QuestionPatch, Topic, TopicId, UserId};
use crate::error::StorageError;
use crate::repository::{ProgressRepository, QuestionRepository, Snapshot, SnapshotRepository, TopicRepository};

#[derive(Default)]
struct Tables {
    topics: BTreeMap<TopicId, Topic>,
    questions: BTreeMap<QuestionId, Question>,
    progress: BTreeMap<(UserId, QuestionId), Progress>,
    next_topic: u64,
    next_question: u64,
}

impl Tables {
    fn topic_title_taken(&self, title: &str, except: Option<TopicId>) -> bool {
        self.topics
            .values()
            .any(|t| t.title == title && Some(t.id) != except)
    }

    fn is_active(&self, question: QuestionId) -> bool {
        self.questions.get(&question).is_some_and(|q| q.is_active)
    }

    fn question_title_taken(&self, title: &str, except: Option<QuestionId>) -> bool {
        self.questions
            .values()
            .any(|q| q.title == title && Some(q.id) != except)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn clean_title(title: &str, what: &str) -> Result<String, StorageError> {
    let t = title.trim();
    if t.is_empty() {
        return Err(StorageError::Invalid(format!("{what} title must not be empty")));
    }
    Ok(t.to_string())
}

#[async_trait]
impl TopicRepository for InMemoryStore {
    #[instrument(level = "debug", skip(self, description))]
    async fn create_topic(&self, title: &str, description: &str) -> Result<Topic, StorageError> {
        let title = clean_title(title, "topic")?;
        let mut t = self.tables.write().await;
        if t.topic_title_taken(&title, None) {
            return Err(StorageError::Conflict(format!("topic '{title}' already exists")));
        }
        t.next_topic += 1;
        let topic = Topic { id: TopicId(t.next_topic), title, description: description.to_string() };
        t.topics.insert(topic.id, topic.clone());
        Ok(topic)
    }

    async fn update_topic(&self, id: TopicId, title: &str, description: &str) -> Result<Topic, StorageError> {
        let title = clean_title(title, "topic")?;
        let mut t = self.tables.write().await;
        if t.topic_title_taken(&title, Some(id)) {
            return Err(StorageError::Conflict(format!("topic '{title}' already exists")));
        }
        let topic = t.topics.get_mut(&id).ok_or(StorageError::NotFound)?;
        topic.title = title;
        topic.description = description.to_string();
        Ok(topic.clone())
    }

    async fn get_topic(&self, id: TopicId) -> Result<Topic, StorageError> {
        self.tables.read().await.topics.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        Ok(self.tables.read().await.topics.values().cloned().collect())
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_topic(&self, id: TopicId) -> Result<(), StorageError> {
        let mut t = self.tables.write().await;
        if !t.topics.contains_key(&id) {
            return Err(StorageError::NotFound);
        }
        let referenced = t.questions.values().filter(|q| q.topic_id == id).count();
        if referenced > 0 {
            return Err(StorageError::Conflict(format!(
                "topic {id} is referenced by {referenced} question(s)"
            )));
        }
        t.topics.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryStore {
    #[instrument(level = "debug", skip(self, new), fields(title = %new.title, topic = %new.topic_id))]
    async fn create_question(&self, new: NewQuestion) -> Result<Question, StorageError> {
        let title = clean_title(&new.title, "question")?;
        let mut t = self.tables.write().await;
        if !t.topics.contains_key(&new.topic_id) {
            return Err(StorageError::Invalid(format!("topic {} does not exist", new.topic_id)));
        }
        if t.question_title_taken(&title, None) {
            return Err(StorageError::Conflict(format!("question '{title}' already exists")));
        }
        t.next_question += 1;
        let now = Utc::now();
        let question = Question {
            id: QuestionId(t.next_question),
            title,
            description: new.description,
            is_active: new.is_active,
            difficulty: new.difficulty,
            topic_id: new.topic_id,
            created_at: now,
            updated_at: now,
        };
        t.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn update_question(&self, id: QuestionId, patch: QuestionPatch) -> Result<Question, StorageError> {
        let mut t = self.tables.write().await;
        if !t.questions.contains_key(&id) {
            return Err(StorageError::NotFound);
        }
        let title = match patch.title {
            Some(raw) => {
                let title = clean_title(&raw, "question")?;
                if t.question_title_taken(&title, Some(id)) {
                    return Err(StorageError::Conflict(format!("question '{title}' already exists")));
                }
                Some(title)
            }
            None => None,
        };
        if let Some(topic_id) = patch.topic_id {
            if !t.topics.contains_key(&topic_id) {
                return Err(StorageError::Invalid(format!("topic {topic_id} does not exist")));
            }
        }
        let q = t.questions.get_mut(&id).ok_or(StorageError::NotFound)?;
        if let Some(title) = title {
            q.title = title;
        }
        if let Some(description) = patch.description {
            q.description = description;
        }
        if let Some(difficulty) = patch.difficulty {
            q.difficulty = difficulty;
        }
        if let Some(topic_id) = patch.topic_id {
            q.topic_id = topic_id;
        }
        q.updated_at = Utc::now();
        Ok(q.clone())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        self.tables.read().await.questions.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn count_active_questions(&self) -> Result<usize, StorageError> {
        Ok(self.tables.read().await.questions.values().filter(|q| q.is_active).count())
    }

    #[instrument(level = "debug", skip(self))]
    async fn soft_delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut t = self.tables.write().await;
        let q = t.questions.get_mut(&id).ok_or(StorageError::NotFound)?;
        if q.is_active {
            q.is_active = false;
            q.updated_at = Utc::now();
            debug!(target: "quiz", question = %id, "Question deactivated");
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryStore {
    async fn get_or_create(&self, user: UserId, question: QuestionId) -> Result<Progress, StorageError> {
        let mut t = self.tables.write().await;
        if !t.is_active(question) {
            return Err(StorageError::NotFound);
        }
        let row = t.progress.entry((user, question)).or_insert_with(|| Progress {
            user_id: user,
            question_id: question,
            is_learned: false,
            updated_at: Utc::now(),
        });
        Ok(row.clone())
    }

    #[instrument(level = "debug", skip(self), fields(user = %row.user_id, question = %row.question_id))]
    async fn save_progress(&self, mut row: Progress) -> Result<Progress, StorageError> {
        let mut t = self.tables.write().await;
        if !t.is_active(row.question_id) {
            return Err(StorageError::NotFound);
        }
        row.updated_at = Utc::now();
        t.progress.insert((row.user_id, row.question_id), row.clone());
        Ok(row)
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryStore {
    async fn snapshot(&self, viewer: Option<UserId>) -> Result<Snapshot, StorageError> {
        let t = self.tables.read().await;
        let learned = match viewer {
            Some(user) => t
                .progress
                .values()
                .filter(|p| p.user_id == user && p.is_learned)
                .map(|p| p.question_id)
                .collect(),
            None => HashSet::new(),
        };
        Ok(Snapshot {
            topics: t.topics.values().cloned().collect(),
            active_questions: t.questions.values().filter(|q| q.is_active).cloned().collect(),
            learned,
        })
    }
}
