//! Strict parsing of provider output into a [`CriterionScore`].
//!
//! The response may be a bare JSON object, a fenced code block, or an object
//! embedded in prose. All three criteria must be present as JSON numbers within
//! range; anything else is a parse failure, never a guessed or clamped score.

use answer_grader_domain::{Criterion, CriterionScore, ScoreError};
use regex::Regex;
use serde_json::{Deserializer, Map, Value};
use std::sync::OnceLock;

/// Reasons a provider response could not be turned into a score
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// No JSON object could be located
    #[error("no JSON object found in response")]
    NoObject,

    /// A JSON object was located but is malformed
    #[error("malformed JSON: {0}")]
    InvalidJson(String),

    /// A criterion field is present but not a number
    #[error("{0} is not a number")]
    NotNumeric(Criterion),

    /// The values failed score validation (missing, non-finite, out of range)
    #[error(transparent)]
    Score(#[from] ScoreError),
}

fn fenced_block() -> &'static Regex {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    FENCED.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("fenced block pattern is valid")
    })
}

/// Parse raw provider output into a validated score
pub fn parse_scores(raw: &str) -> Result<CriterionScore, ParseError> {
    let object = locate_object(raw)?;

    let field = |criterion: Criterion| -> Result<Option<f64>, ParseError> {
        match object.get(criterion.as_str()) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or(ParseError::NotNumeric(criterion)),
            Some(_) => Err(ParseError::NotNumeric(criterion)),
        }
    };

    let score = CriterionScore::from_parts(
        field(Criterion::Completeness)?,
        field(Criterion::Conciseness)?,
        field(Criterion::Correctness)?,
    )?;
    Ok(score)
}

fn locate_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let trimmed = raw.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(map);
    }

    if let Some(captures) = fenced_block().captures(trimmed) {
        return as_object(&captures[1]);
    }

    first_embedded_object(trimmed)
}

/// First `{` that starts a complete JSON object; text after the object is ignored.
fn first_embedded_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    let mut first_error = None;
    for (start, _) in text.match_indices('{') {
        let mut values = Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Object(map))) => return Ok(map),
            Some(Err(err)) => {
                first_error.get_or_insert_with(|| ParseError::InvalidJson(err.to_string()));
            }
            _ => {}
        }
    }
    Err(first_error.unwrap_or(ParseError::NoObject))
}

fn as_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ParseError::NoObject),
        Err(err) => Err(ParseError::InvalidJson(err.to_string())),
    }
}
