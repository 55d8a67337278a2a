//! Scope patterns and capability strings.
//!
//! Both are dot-separated segment lists:
//!
//! ```text
//! scope       "api.*.update_key"   -> [Exact("api"), Wildcard, Exact("update_key")]
//! capability  "api.key_1.update_key"
//! ```
//!
//! A `*` segment stands for exactly one non-empty segment.

use std::fmt;

use crate::domain::key::KeyId;

/// Scope literal that grants every capability
pub const GLOBAL_SCOPE: &str = "*";

const SEPARATOR: char = '.';
const WILDCARD: &str = "*";

/// A single segment of a scope pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly the given string
    Exact(String),
    /// Matches any one non-empty segment
    Wildcard,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == WILDCARD {
            Self::Wildcard
        } else {
            Self::Exact(raw.to_string())
        }
    }

    /// Returns `true` if this segment matches the given requirement segment
    pub fn matches(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }

        match self {
            Self::Exact(s) => s == value,
            Self::Wildcard => true,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => f.write_str(s),
            Self::Wildcard => f.write_str(WILDCARD),
        }
    }
}

/// A parsed scope held by a root credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionPattern {
    segments: Vec<Segment>,
}

impl PermissionPattern {
    pub fn parse(scope: &str) -> Self {
        Self {
            segments: scope.split(SEPARATOR).map(Segment::parse).collect(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segment-by-segment match against a capability of the same length
    pub fn matches(&self, capability: &Capability) -> bool {
        self.segments.len() == capability.segments.len()
            && self
                .segments
                .iter()
                .zip(&capability.segments)
                .all(|(pattern, value)| pattern.matches(value))
    }
}

impl fmt::Display for PermissionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// A concrete capability required by an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    segments: Vec<String>,
}

impl Capability {
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw.split(SEPARATOR).map(String::from).collect(),
        }
    }

    /// `api.<keyId>.update_key`
    pub fn update_key(key_id: &KeyId) -> Self {
        Self {
            segments: vec![
                "api".to_string(),
                key_id.as_str().to_string(),
                "update_key".to_string(),
            ],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
