//! Public HTTP request/response structs (serde ready).
//! Handlers build these from domain rows (`to_out`); field names are the JSON contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{AnnotatedQuestion, Difficulty, Topic};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicOut {
    pub id: u64,
    pub title: String,
    pub description: String,
}

impl From<&Topic> for TopicOut {
    fn from(t: &Topic) -> Self {
        Self { id: t.id.0, title: t.title.clone(), description: t.description.clone() }
    }
}

/// Question as seen by one viewer.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionOut {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub topic: TopicOut,
    pub is_learned: bool,
}

pub fn to_out(row: &AnnotatedQuestion) -> QuestionOut {
    QuestionOut {
        id: row.question.id.0,
        title: row.question.title.clone(),
        description: row.question.description.clone(),
        difficulty: row.question.difficulty,
        topic: TopicOut::from(&row.topic),
        is_learned: row.learned,
    }
}

/// Body of `POST /questions/{id}/mark_learned`. The value is bool-like:
/// a JSON bool, a number, or a string token.
#[derive(Debug, Default, Deserialize)]
pub struct MarkLearnedIn {
    #[serde(default)]
    pub is_learned: Option<Value>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
