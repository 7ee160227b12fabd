//! Ollama-backed classification client
//!
//! Sends the (truncated) post body inside a prompt that spells out the JSON
//! fields we expect, then hands the free-text answer to the extractor.

use crate::classifier::extract::parse_response;
use crate::classifier::types::ClassifierOutcome;
use crate::classifier::Classifier;
use crate::config::ClassifierConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Prompt sent for every post; `{content}` is replaced by the truncated body.
pub const CLASSIFICATION_PROMPT: &str = r#"You are reviewing a cryptocurrency announcement posted on a forum. Assess it technically and skeptically.

CRITERIA:
1. REAL INNOVATION (0-100): genuine technical novelty as opposed to marketing
2. POTENTIAL DISRUPTIVENESS (0-100): ability to change its market
3. TECHNICAL QUALITY (0-100): soundness of the architecture
4. PREMINE: percentage of supply allocated before public mining, and its justification
5. PROJECT TYPE: fork, clone, or original work
6. UNIQUE MECHANISMS: original technical features
7. REALISM: technical feasibility of what is promised

CONTENT:
{content}

Answer with STRICT JSON only, using exactly these fields:
{
    "innovation_score": 0-100,
    "disruptiveness_score": 0-100,
    "technical_score": 0-100,
    "premine_analysis": "0% or an estimate such as 5%",
    "is_fork": true/false,
    "fork_base": "name of the parent project or null",
    "mining_algorithm": "specific algorithm",
    "consensus_mechanism": "PoW/PoS/DPoS/etc",
    "unique_technical_features": ["list"],
    "technical_red_flags": ["list"],
    "technical_strengths": ["list"],
    "realism_assessment": "very realistic/realistic/optimistic/unrealistic"
}"#;

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Classifier talking to an Ollama `/api/generate` endpoint
pub struct OllamaClassifier {
    config: ClassifierConfig,
    client: Client,
}

impl OllamaClassifier {
    /// Builds the client; fails only if the TLS backend cannot initialize
    pub fn new(config: ClassifierConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Builds the full prompt for a post body
    pub fn build_prompt(&self, body: &str) -> String {
        let truncated = truncate_chars(body, self.config.max_input_chars);
        CLASSIFICATION_PROMPT.replace("{content}", truncated)
    }

    /// Calls `/api/generate` and returns the raw model text
    async fn call_ollama(&self, prompt: String) -> Result<String, String> {
        let request = OllamaRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!(
            "{}/api/generate",
            self.config.endpoint.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("connection error: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, body));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| format!("invalid response envelope: {}", e))?;

        Ok(ollama_resp.response)
    }
}

#[async_trait]
impl Classifier for OllamaClassifier {
    async fn classify(&self, body: &str) -> ClassifierOutcome {
        let prompt = self.build_prompt(body);

        debug!(
            "Requesting classification from {} ({} prompt chars)",
            self.config.model,
            prompt.chars().count()
        );

        let text = match self.call_ollama(prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("Classification request failed: {}", e);
                return ClassifierOutcome::Unparseable;
            }
        };

        let outcome = parse_response(&text);
        if !outcome.is_parsed() {
            warn!(
                "Classification response contained no usable JSON object ({} chars)",
                text.len()
            );
        }
        outcome
    }
}

/// Keeps at most `max_chars` characters of `text` (UTF-8 safe)
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
