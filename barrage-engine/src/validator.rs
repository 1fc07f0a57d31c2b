//! Response validation
//!
//! Expectations are compiled once per run. Checks run in a fixed order
//! (status, exact body, substring, pattern, then JSON fields sorted by path)
//! and the first failure is reported.

use barrage_config::ConfigError;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::model::Expectations;

const DOMAIN: &str = "stress_test";

/// Why a response was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("status {actual} not in expected set {expected:?}")]
    StatusMismatch { expected: Vec<u16>, actual: u16 },

    #[error("body failed {check} check")]
    BodyMismatch { check: BodyCheck },

    #[error("field '{path}' expected '{expected}', got {}", .actual.as_deref().unwrap_or("<missing>"))]
    FieldMismatch {
        path: String,
        expected: String,
        actual: Option<String>,
    },
}

/// Which body check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyCheck {
    Exact,
    Contains,
    Pattern,
}

impl fmt::Display for BodyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BodyCheck::Exact => "exact",
            BodyCheck::Contains => "contains",
            BodyCheck::Pattern => "pattern",
        };
        f.write_str(name)
    }
}

/// One step of a JSON field path
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Object key; also an array index when numeric
    Key(String),
    /// Explicit `[n]` array index
    Index(usize),
}

/// Parsed JSON field path such as `data.items[0].id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| {
            ConfigError::domain(DOMAIN, format!("invalid field path '{}': {}", raw, reason))
        };

        if raw.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };

            if key.is_empty() && rest.is_empty() {
                return Err(invalid("empty segment"));
            }
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            }

            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let index = rest[1..close]
                    .parse::<usize>()
                    .map_err(|_| invalid("array index must be a non-negative integer"))?;
                segments.push(Segment::Index(index));

                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid("unexpected characters after ']'"));
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Follow the path through a JSON document
    pub fn extract<'a>(&self, root: &'a JsonValue) -> Option<&'a JsonValue> {
        self.segments
            .iter()
            .try_fold(root, |value, segment| match (segment, value) {
                (Segment::Key(key), JsonValue::Object(map)) => map.get(key),
                (Segment::Key(key), JsonValue::Array(items)) => {
                    key.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                (Segment::Index(i), JsonValue::Array(items)) => items.get(*i),
                _ => None,
            })
    }
}

/// Strings compare by content, everything else by compact JSON
fn render(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Expectations ready to be checked against responses
#[derive(Debug, Clone, Default)]
pub struct CompiledExpectations {
    status_codes: BTreeSet<u16>,
    body_exact: Option<String>,
    body_contains: Option<String>,
    body_pattern: Option<Regex>,
    fields: Vec<(FieldPath, String)>,
}

impl CompiledExpectations {
    pub fn compile(expectations: &Expectations) -> Result<Self, ConfigError> {
        let body_pattern = expectations
            .expected_body_pattern
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    ConfigError::domain(
                        DOMAIN,
                        format!("invalid expected_body_pattern '{}': {}", pattern, e),
                    )
                })
            })
            .transpose()?;

        // BTreeMap iteration keeps fields in lexicographic path order
        let fields = expectations
            .expected_body_fields
            .iter()
            .map(|(path, expected)| -> Result<_, ConfigError> {
                Ok((FieldPath::parse(path)?, expected.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            status_codes: expectations.expected_status_codes.clone(),
            body_exact: expectations.expected_body_exact.clone(),
            body_contains: expectations.expected_body_contains.clone(),
            body_pattern,
            fields,
        })
    }

    /// True when every response is accepted
    pub fn is_empty(&self) -> bool {
        self.status_codes.is_empty()
            && self.body_exact.is_none()
            && self.body_contains.is_none()
            && self.body_pattern.is_none()
            && self.fields.is_empty()
    }

    pub fn validate(&self, status: u16, body: &str) -> Result<(), ValidationError> {
        if !self.status_codes.is_empty() && !self.status_codes.contains(&status) {
            return Err(ValidationError::StatusMismatch {
                expected: self.status_codes.iter().copied().collect(),
                actual: status,
            });
        }

        if let Some(ref exact) = self.body_exact {
            if body != exact.as_str() {
                return Err(ValidationError::BodyMismatch {
                    check: BodyCheck::Exact,
                });
            }
        }

        if let Some(ref needle) = self.body_contains {
            if !body.contains(needle.as_str()) {
                return Err(ValidationError::BodyMismatch {
                    check: BodyCheck::Contains,
                });
            }
        }

        if let Some(ref pattern) = self.body_pattern {
            if !pattern.is_match(body) {
                return Err(ValidationError::BodyMismatch {
                    check: BodyCheck::Pattern,
                });
            }
        }

        if let Some((first_path, first_expected)) = self.fields.first() {
            let Ok(document) = serde_json::from_str::<JsonValue>(body) else {
                return Err(ValidationError::FieldMismatch {
                    path: first_path.as_str().to_string(),
                    expected: first_expected.clone(),
                    actual: None,
                });
            };

            for (path, expected) in &self.fields {
                let actual = path.extract(&document).map(render);
                if actual.as_deref() != Some(expected.as_str()) {
                    return Err(ValidationError::FieldMismatch {
                        path: path.as_str().to_string(),
                        expected: expected.clone(),
                        actual,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Check one response against compiled expectations
pub fn validate(
    status: u16,
    body: &str,
    expectations: &CompiledExpectations,
) -> Result<(), ValidationError> {
    expectations.validate(status, body)
}
