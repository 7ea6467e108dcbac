//! Repository contracts, one per entity. Services only see these traits; the
//! concrete store is injected through `AppState`.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::{NewQuestion, Progress, Question, QuestionId, QuestionPatch, Topic, TopicId, UserId};
use crate::error::StorageError;

#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Create a topic.
    ///
    /// # Errors
    ///
    /// `Invalid` for a blank title, `Conflict` when the title is taken.
    async fn create_topic(&self, title: &str, description: &str) -> Result<Topic, StorageError>;

    /// Replace title and description of an existing topic.
    ///
    /// # Errors
    ///
    /// Same as `create_topic`, plus `NotFound` for an unknown id.
    // Admin maintenance only; no HTTP route edits topics.
    #[allow(dead_code)]
    async fn update_topic(&self, id: TopicId, title: &str, description: &str) -> Result<Topic, StorageError>;

    async fn get_topic(&self, id: TopicId) -> Result<Topic, StorageError>;

    /// All topics in id order.
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError>;

    /// Delete a topic.
    ///
    /// # Errors
    ///
    /// `Conflict` while any question (active or not) still references it.
    // Admin maintenance only.
    #[allow(dead_code)]
    async fn delete_topic(&self, id: TopicId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Create a question under an existing topic.
    ///
    /// # Errors
    ///
    /// `Invalid` for a blank title or unknown topic, `Conflict` when the title is taken.
    async fn create_question(&self, new: NewQuestion) -> Result<Question, StorageError>;

    // Admin maintenance only.
    #[allow(dead_code)]
    async fn update_question(&self, id: QuestionId, patch: QuestionPatch) -> Result<Question, StorageError>;

    /// Fetch a question regardless of its active flag.
    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError>;

    async fn count_active_questions(&self) -> Result<usize, StorageError>;

    /// Logical delete. Idempotent; the record and its progress history are kept.
    // Admin maintenance only.
    #[allow(dead_code)]
    async fn soft_delete_question(&self, id: QuestionId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Return the row for (user, question), creating an unlearned one if absent.
    /// Atomic: concurrent identical calls observe a single row.
    ///
    /// # Errors
    ///
    /// `NotFound` unless the question exists and is active.
    async fn get_or_create(&self, user: UserId, question: QuestionId) -> Result<Progress, StorageError>;

    /// Store `row` (insert or replace) with a fresh `updated_at`.
    ///
    /// # Errors
    ///
    /// `NotFound` unless the question exists and is active at write time.
    async fn save_progress(&self, row: Progress) -> Result<Progress, StorageError>;
}

/// Everything a listing or stats request reads, taken under one lock.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// All topics in id order.
    pub topics: Vec<Topic>,
    /// Active questions in id order.
    pub active_questions: Vec<Question>,
    /// Questions the viewer has a learned row for, active or not. Empty for anonymous viewers.
    pub learned: HashSet<QuestionId>,
}

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Consistent read of topics, active questions and the viewer's learned set.
    /// No progress rows are read when `viewer` is `None`.
    async fn snapshot(&self, viewer: Option<UserId>) -> Result<Snapshot, StorageError>;
}
