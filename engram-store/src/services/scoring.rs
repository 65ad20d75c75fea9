//! Deterministic rule-based scoring of model outputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FENCE: &str = "```";

/// Score for code output that carries a fenced block.
const FENCED_CODE_SCORE: f64 = 1.0;
/// Score for code output with no fenced block.
const UNFENCED_CODE_SCORE: f64 = 0.7;
/// Score for non-empty text or vision output when nothing specific is required.
const DEFAULT_SCORE: f64 = 0.8;

/// High-level task category of an eval prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Code,
    Text,
    Vision,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskType::Code => "code",
            TaskType::Text => "text",
            TaskType::Vision => "vision",
        })
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(TaskType::Code),
            "text" => Ok(TaskType::Text),
            "vision" => Ok(TaskType::Vision),
            other => Err(format!("unknown task type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RuleScoreInput<'a> {
    pub output: &'a str,
    pub required_patterns: &'a [&'a str],
    pub task_type: TaskType,
}

/// Score an output in `[0, 1]` using pattern checks.
///
/// With required patterns, the score is the fraction found (case-insensitive).
/// Without them, code output is judged on the presence of a fenced block and
/// anything else non-empty gets a flat default.
pub fn score_rule_based(input: &RuleScoreInput<'_>) -> f64 {
    let trimmed = input.output.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    if input.required_patterns.is_empty() {
        return match input.task_type {
            TaskType::Code if has_fenced_block(trimmed) => FENCED_CODE_SCORE,
            TaskType::Code => UNFENCED_CODE_SCORE,
            _ => DEFAULT_SCORE,
        };
    }

    let haystack = trimmed.to_lowercase();
    let matches = input
        .required_patterns
        .iter()
        .filter(|pattern| haystack.contains(&pattern.to_lowercase()))
        .count();
    matches as f64 / input.required_patterns.len() as f64
}

fn has_fenced_block(text: &str) -> bool {
    text.find(FENCE)
        .map(|open| text[open + FENCE.len()..].contains(FENCE))
        .unwrap_or(false)
}
