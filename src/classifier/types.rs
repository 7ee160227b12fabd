//! Classification result types
//!
//! The service answers free text; whatever JSON object we manage to pull out
//! of it is normalized here into a [`Classification`] whose every field has a
//! concrete value. Nothing downstream deals with missing keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

use regex::Regex;

static PERCENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*%").expect("hardcoded regex pattern is valid")
});

static LEADING_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:[.,]\d+)?)").expect("hardcoded regex pattern is valid")
});

/// Fields whose presence makes a decoded object count as a classification.
const SCORE_KEYS: [&str; 3] = ["innovation_score", "disruptiveness_score", "technical_score"];

/// Structured output of the classification service for one post body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub technical_score: u8,
    pub innovation_score: u8,
    pub disruptiveness_score: u8,
    pub is_fork: bool,
    pub fork_base: String,
    pub mining_algorithm: String,
    pub consensus_mechanism: String,
    pub realism_assessment: String,
    pub unique_features: Vec<String>,
    pub red_flags: Vec<String>,
    pub strengths: Vec<String>,
    /// Estimated premine, in percent of total supply
    pub premine_estimate: f64,
}

/// What the classification client hands back for one body text
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierOutcome {
    Parsed(Classification),
    Unparseable,
}

impl ClassifierOutcome {
    /// The classification to score with; unparseable answers score as all defaults.
    pub fn classification(&self) -> Classification {
        match self {
            Self::Parsed(c) => c.clone(),
            Self::Unparseable => Classification::default(),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

impl Classification {
    /// Builds a classification from a decoded JSON object.
    ///
    /// Returns `None` when the value is not an object or carries none of the
    /// three score fields. Otherwise every field is coerced: scores are
    /// truncated and clamped into `[0, 100]`, non-numeric scores become 0,
    /// absent fields take their default.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        if !SCORE_KEYS.iter().any(|key| obj.contains_key(*key)) {
            return None;
        }

        Some(Self {
            technical_score: score_field(obj, "technical_score"),
            innovation_score: score_field(obj, "innovation_score"),
            disruptiveness_score: score_field(obj, "disruptiveness_score"),
            is_fork: bool_field(obj, "is_fork"),
            fork_base: string_field(obj, "fork_base"),
            mining_algorithm: string_field(obj, "mining_algorithm"),
            consensus_mechanism: string_field(obj, "consensus_mechanism"),
            realism_assessment: string_field(obj, "realism_assessment"),
            unique_features: list_field(obj, "unique_technical_features"),
            red_flags: list_field(obj, "technical_red_flags"),
            strengths: list_field(obj, "technical_strengths"),
            premine_estimate: obj.get("premine_analysis").map(premine_value).unwrap_or(0.0),
        })
    }
}

/// Coerces a score into `[0, 100]`.
pub fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.trunc().clamp(0.0, 100.0) as u8
}

fn score_field(obj: &Map<String, Value>, key: &str) -> u8 {
    let raw = match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_number(s.trim()),
        _ => None,
    };
    raw.map(clamp_score).unwrap_or(0)
}

fn bool_field(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "oui" | "1"
        ),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().eq_ignore_ascii_case("null") => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn list_field(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Reads the premine percentage out of `premine_analysis`.
///
/// A number is taken as a percentage directly. In text, the first number
/// followed by `%` wins ("about 3.5% for devs" gives 3.5); failing that, a
/// bare leading number; anything else is 0.
pub fn premine_value(value: &Value) -> f64 {
    let pct = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_premine_text(s),
        _ => None,
    };
    pct.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0)
}

fn parse_premine_text(text: &str) -> Option<f64> {
    PERCENT_REGEX
        .captures(text)
        .or_else(|| LEADING_NUMBER_REGEX.captures(text))
        .and_then(|caps| parse_number(&caps[1]))
}

fn parse_number(text: &str) -> Option<f64> {
    text.replace(',', ".").parse::<f64>().ok()
}
