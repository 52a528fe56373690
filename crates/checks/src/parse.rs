//! Decoding of a script's JSON output into findings.
//!
//! Expected shape:
//!
//! ```json
//! { "skill": "…", "summary": { … }, "issues": [ { "file", "line", "rule", "message", "severity" } ] }
//! ```
//!
//! Keys are matched case-insensitively. Only `issues` is read; the script's
//! own `summary` is ignored since counts are always recomputed.

use serde_json::{Map, Value};

use crate::types::{Finding, Severity};

/// Result of decoding one script's stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput {
    /// A findings document; the list may be empty.
    Findings(Vec<Finding>),
    /// Nothing to parse: blank output, or a document without an issues list.
    Empty,
    /// Output was present but is not a findings document.
    Unparseable { reason: String },
}

impl ParsedOutput {
    pub fn into_findings(self) -> Vec<Finding> {
        match self {
            Self::Findings(findings) => findings,
            Self::Empty | Self::Unparseable { .. } => Vec::new(),
        }
    }
}

/// Decode a script's stdout. Never fails; see [`ParsedOutput`].
pub fn parse_output(stdout: &str) -> ParsedOutput {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return ParsedOutput::Empty;
    }

    let doc = match decode_document(trimmed) {
        Ok(doc) => doc,
        Err(reason) => return ParsedOutput::Unparseable { reason },
    };
    let Value::Object(map) = doc else {
        return ParsedOutput::Unparseable {
            reason: "expected a JSON object".into(),
        };
    };

    match get_ci(&map, &["issues", "findings"]) {
        None | Some(Value::Null) => ParsedOutput::Empty,
        Some(Value::Array(items)) => ParsedOutput::Findings(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(fields) => Some(finding_from(fields)),
                    other => {
                        tracing::debug!(entry = %other, "skipping non-object issue entry");
                        None
                    },
                })
                .collect(),
        ),
        Some(_) => ParsedOutput::Unparseable {
            reason: "issues is not a list".into(),
        },
    }
}

/// Whole output first; then the span from the first `{` to the last `}` for
/// scripts that print a banner around their JSON.
fn decode_document(text: &str) -> Result<Value, String> {
    match serde_json::from_str(text) {
        Ok(v) => Ok(v),
        Err(first) => {
            let span = text
                .find('{')
                .zip(text.rfind('}'))
                .filter(|(start, end)| start < end)
                .map(|(start, end)| &text[start..=end]);
            match span {
                Some(inner) if inner.len() < text.len() => {
                    serde_json::from_str(inner).map_err(|_| first.to_string())
                },
                _ => Err(first.to_string()),
            }
        },
    }
}

fn finding_from(fields: &Map<String, Value>) -> Finding {
    Finding {
        file: get_ci(fields, &["file", "path"])
            .and_then(scalar_string)
            .unwrap_or_default(),
        line: get_ci(fields, &["line"]).map_or(0, line_number),
        rule: get_ci(fields, &["rule", "rule_id", "ruleId"])
            .and_then(scalar_string)
            .unwrap_or_default(),
        message: get_ci(fields, &["message"])
            .and_then(scalar_string)
            .unwrap_or_default(),
        severity: get_ci(fields, &["severity"])
            .and_then(scalar_string)
            .map_or(Severity::Low, |s| Severity::parse_lossy(&s)),
    }
}

/// First key in `keys` present in `map`, compared case-insensitively.
fn get_ci<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|wanted| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(wanted))
            .map(|(_, v)| v)
    })
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn line_number(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
