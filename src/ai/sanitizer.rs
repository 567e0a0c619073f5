//! Recovery of JSON objects from raw completion text.
//!
//! Models asked for `json_object` output still sometimes wrap the object in
//! prose or a fenced code block. [`sanitize`] runs an ordered list of named
//! [`RecoveryStrategy`] values and keeps the first one that yields an object.
//!
//! No repair of malformed JSON (trailing commas, single quotes) is attempted.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Contents of the first fenced block; an unterminated fence runs to the end.
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)(?:```|\z)").expect("valid fence regex")
});

/// A single way of turning raw text into a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryStrategy {
    /// Parse the whole text as JSON.
    Direct,
    /// Parse the span from the first `{` to the last `}`.
    ///
    /// Greedy: trailing text holding a `}` can mis-bound the span.
    BraceSpan,
    /// Parse the contents of the first fenced code block.
    FenceStrip,
    /// Parse the first brace-balanced span, ignoring braces inside strings.
    BalancedObject,
}

/// Strategies in the order [`sanitize`] tries them.
pub const STRATEGIES: [RecoveryStrategy; 4] = [
    RecoveryStrategy::Direct,
    RecoveryStrategy::BraceSpan,
    RecoveryStrategy::FenceStrip,
    RecoveryStrategy::BalancedObject,
];

impl RecoveryStrategy {
    /// Short name used in logs and failure reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::BraceSpan => "brace-span",
            Self::FenceStrip => "fence-strip",
            Self::BalancedObject => "balanced-object",
        }
    }

    /// Run this strategy alone.
    pub fn attempt(self, raw: &str) -> Result<Map<String, Value>, String> {
        match self {
            Self::Direct => parse_object(raw.trim()),
            Self::BraceSpan => {
                let start = raw.find('{').ok_or("no '{' in text")?;
                let end = raw.rfind('}').ok_or("no '}' in text")?;
                if end < start {
                    return Err("last '}' precedes first '{'".to_string());
                }
                parse_object(&raw[start..=end])
            }
            Self::FenceStrip => {
                let captures = FENCED_BLOCK.captures(raw).ok_or("no fenced code block")?;
                let body = captures.get(1).map_or("", |m| m.as_str());
                parse_object(body.trim())
            }
            Self::BalancedObject => {
                let mut last_error = "no balanced '{...}' span".to_string();
                for (start, _) in raw.match_indices('{') {
                    let Some(end) = balanced_end(&raw[start..]) else {
                        continue;
                    };
                    match parse_object(&raw[start..start + end]) {
                        Ok(object) => return Ok(object),
                        Err(e) => last_error = e,
                    }
                }
                Err(last_error)
            }
        }
    }
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A successfully recovered object.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    /// The parsed object
    pub object: Map<String, Value>,
    /// Which strategy produced it
    pub strategy: RecoveryStrategy,
}

/// One failed strategy and why it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    pub strategy: RecoveryStrategy,
    pub reason: String,
}

/// Every strategy failed. The raw text is kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no JSON object could be recovered ({} strategies failed)", .attempts.len())]
pub struct SanitizeFailure {
    /// Text exactly as received
    pub raw: String,
    /// Failures in the order the strategies ran
    pub attempts: Vec<StrategyAttempt>,
}

/// Recover a JSON object from raw completion text.
pub fn sanitize(raw: &str) -> Result<Recovered, SanitizeFailure> {
    let mut attempts = Vec::new();

    for strategy in STRATEGIES {
        match strategy.attempt(raw) {
            Ok(object) => {
                if !attempts.is_empty() {
                    tracing::debug!(strategy = strategy.name(), "Recovered JSON after fallback");
                }
                return Ok(Recovered { object, strategy });
            }
            Err(reason) => attempts.push(StrategyAttempt { strategy, reason }),
        }
    }

    Err(SanitizeFailure { raw: raw.to_string(), attempts })
}

fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Byte length of the balanced `{...}` span at the start of `text`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
