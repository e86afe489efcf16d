//! Link validation shared by the shape classifier and the institute profile.

use thiserror::Error;

use crate::content::payload::Link;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("link group `{0}` is empty")]
    EmptyGroup(String),
    #[error("link {index} in `{group}` is not a {{name, href}} object")]
    MalformedLink { group: String, index: usize },
    #[error("link {index} in `{group}` has an empty name")]
    EmptyName { group: String, index: usize },
    #[error("link {index} in `{group}` has an empty href")]
    EmptyHref { group: String, index: usize },
}

/// Validate a single `{name, href}` pair.
pub fn validate_link_fields(
    group: &str,
    index: usize,
    name: Option<&str>,
    href: Option<&str>,
) -> Result<(), ValidationError> {
    match name {
        None => {
            return Err(ValidationError::MalformedLink {
                group: group.to_string(),
                index,
            })
        }
        Some(n) if n.trim().is_empty() => {
            return Err(ValidationError::EmptyName {
                group: group.to_string(),
                index,
            })
        }
        _ => {}
    }
    match href {
        None => Err(ValidationError::MalformedLink {
            group: group.to_string(),
            index,
        }),
        Some(h) if h.trim().is_empty() => Err(ValidationError::EmptyHref {
            group: group.to_string(),
            index,
        }),
        _ => Ok(()),
    }
}

/// Validate an ordered, non-empty list of typed links.
pub fn validate_link_group(group: &str, links: &[Link]) -> Result<(), ValidationError> {
    if links.is_empty() {
        return Err(ValidationError::EmptyGroup(group.to_string()));
    }
    for (index, link) in links.iter().enumerate() {
        validate_link_fields(group, index, Some(&link.name), Some(&link.href))?;
    }
    Ok(())
}
