//! Built-in demo content so the service is useful without a config file.

use crate::config::{QuestionCfg, TopicCfg};
use crate::domain::Difficulty;

pub fn seed_topics() -> Vec<TopicCfg> {
  vec![
    TopicCfg { title: "Ownership".into(), description: "Moves, borrows and lifetimes.".into() },
    TopicCfg { title: "Concurrency".into(), description: "Threads, channels and async.".into() },
  ]
}

fn q(title: &str, description: &str, topic: &str, difficulty: Difficulty) -> QuestionCfg {
  QuestionCfg {
    title: title.into(),
    description: description.into(),
    topic: topic.into(),
    difficulty,
    is_active: true,
  }
}

pub fn seed_questions() -> Vec<QuestionCfg> {
  vec![
    q("What happens to a String on assignment?", "Explain move semantics.", "Ownership", Difficulty::Easy),
    q("When can you hold two &mut references?", "Aliasing rules for mutable borrows.", "Ownership", Difficulty::Medium),
    q("What does 'static mean as a bound?", "Lifetime bounds on generic parameters.", "Ownership", Difficulty::Hard),
    q("Why is Rc not Send?", "Reference counting across threads.", "Concurrency", Difficulty::Medium),
    q("What does an async fn return?", "Futures and lazy evaluation.", "Concurrency", Difficulty::Easy),
  ]
}
