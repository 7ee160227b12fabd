//! Classification of post bodies by an external LLM service
//!
//! This module contains:
//! - The `Classifier` seam the crawler talks to
//! - An Ollama implementation of it
//! - Bounded extraction of the JSON object from free-text answers
//! - Normalization of that object into a fully-defaulted `Classification`

mod client;
mod extract;
mod types;

pub use client::{truncate_chars, OllamaClassifier, CLASSIFICATION_PROMPT};
pub use extract::{first_json_object, parse_response};
pub use types::{clamp_score, premine_value, Classification, ClassifierOutcome};

use async_trait::async_trait;

/// Anything that can turn a post body into a classification
///
/// Implementations never fail: transport and decoding problems are logged
/// and reported as [`ClassifierOutcome::Unparseable`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, body: &str) -> ClassifierOutcome;
}
