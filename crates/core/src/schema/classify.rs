//! Shape classification of stored link structures.
//!
//! A stored document is matched against the closed set of shapes exactly
//! once, here. Everything downstream branches on [`Shape`], never on keys.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::{Map, Value};

use crate::content::payload::{COMPANY_POLICIES_KEY, FOOTER_LINKS_KEY, GENERAL_LINKS_KEY};
use crate::document::validate::{validate_link_fields, ValidationError};

/// Keys that only ever appeared in the deprecated link layout.
pub const LEGACY_KEYS: &[&str] = &["courses", "resources"];

/// Keys of the current layout. A canonical structure has exactly these.
pub const CANONICAL_KEYS: &[&str] = &[COMPANY_POLICIES_KEY, GENERAL_LINKS_KEY];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Deprecated layout; safe to rewrite.
    Legacy { deprecated_keys: Vec<String> },
    Canonical,
    /// Neither layout; needs operator attention, never rewritten implicitly.
    Unknown(UnknownReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownReason {
    MissingLinks,
    NotAnObject,
    UnexpectedKeys { found: Vec<String> },
    InvalidGroup(ValidationError),
    GroupNotAList(String),
}

impl Shape {
    pub fn label(&self) -> &'static str {
        match self {
            Shape::Legacy { .. } => "legacy",
            Shape::Canonical => "canonical",
            Shape::Unknown(_) => "unknown",
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, Shape::Canonical)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Legacy { deprecated_keys } => {
                write!(f, "legacy ({})", deprecated_keys.join(", "))
            }
            Shape::Canonical => f.write_str("canonical"),
            Shape::Unknown(reason) => write!(f, "unknown ({reason})"),
        }
    }
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownReason::MissingLinks => write!(f, "no `{FOOTER_LINKS_KEY}` object"),
            UnknownReason::NotAnObject => write!(f, "`{FOOTER_LINKS_KEY}` is not an object"),
            UnknownReason::UnexpectedKeys { found } => {
                write!(f, "unexpected link keys [{}]", found.join(", "))
            }
            UnknownReason::InvalidGroup(err) => write!(f, "{err}"),
            UnknownReason::GroupNotAList(group) => write!(f, "`{group}` is not a list"),
        }
    }
}

/// Classify the link-group substructure of a payload.
pub fn classify(links: &Value) -> Shape {
    let Some(object) = links.as_object() else {
        return Shape::Unknown(UnknownReason::NotAnObject);
    };

    let deprecated_keys: Vec<String> = LEGACY_KEYS
        .iter()
        .filter(|key| object.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if !deprecated_keys.is_empty() {
        return Shape::Legacy { deprecated_keys };
    }

    let found: BTreeSet<&str> = object.keys().map(String::as_str).collect();
    let expected: BTreeSet<&str> = CANONICAL_KEYS.iter().copied().collect();
    if found != expected {
        return Shape::Unknown(UnknownReason::UnexpectedKeys {
            found: found.into_iter().map(str::to_string).collect(),
        });
    }

    for group in CANONICAL_KEYS {
        if let Err(reason) = check_group(object, group) {
            return Shape::Unknown(reason);
        }
    }
    Shape::Canonical
}

/// Classify a whole payload by its `footerLinks` entry.
pub fn classify_payload(payload: &Value) -> Shape {
    match payload.get(FOOTER_LINKS_KEY) {
        Some(links) => classify(links),
        None => Shape::Unknown(UnknownReason::MissingLinks),
    }
}

/// Top-level keys of a payload's link structure, for operator reports.
pub fn link_keys(payload: &Value) -> Vec<String> {
    payload
        .get(FOOTER_LINKS_KEY)
        .and_then(Value::as_object)
        .map(|object| object.keys().cloned().collect())
        .unwrap_or_default()
}

fn check_group(object: &Map<String, Value>, group: &str) -> Result<(), UnknownReason> {
    let Some(items) = object.get(group).and_then(Value::as_array) else {
        return Err(UnknownReason::GroupNotAList(group.to_string()));
    };
    if items.is_empty() {
        return Err(UnknownReason::InvalidGroup(ValidationError::EmptyGroup(
            group.to_string(),
        )));
    }
    for (index, item) in items.iter().enumerate() {
        let name = item.get("name").and_then(Value::as_str);
        let href = item.get("href").and_then(Value::as_str);
        validate_link_fields(group, index, name, href).map_err(UnknownReason::InvalidGroup)?;
    }
    Ok(())
}
