//! Attribute validation run before any request is sent

use crate::error::ValidationError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static PROJECT_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z0-9]{3,6}$").expect("valid regex"));

pub const MAX_DISPLAY_NAME_LENGTH: usize = 32;

pub fn validate_project_key(attribute: &str, key: &str) -> Result<(), ValidationError> {
    if PROJECT_KEY_RE.is_match(key) {
        Ok(())
    } else {
        Err(ValidationError::new(
            attribute,
            "key must be 3 - 6 lowercase alphanumeric characters",
        ))
    }
}

pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("display_name", "must not be empty"));
    }
    let length = name.chars().count();
    if length > MAX_DISPLAY_NAME_LENGTH {
        return Err(ValidationError::new(
            "display_name",
            format!(
                "must be at most {} characters, got {}",
                MAX_DISPLAY_NAME_LENGTH, length
            ),
        ));
    }
    Ok(())
}

pub fn validate_storage_quota(gigabytes: i64) -> Result<(), ValidationError> {
    if gigabytes >= 1 || gigabytes == super::units::UNLIMITED {
        Ok(())
    } else {
        Err(ValidationError::new(
            "max_storage_in_gigabytes",
            format!("must be at least 1 or exactly -1, got {}", gigabytes),
        ))
    }
}

pub fn validate_not_empty(attribute: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::new(attribute, "must not be empty"))
    } else {
        Ok(())
    }
}

/// Checks a list of nested `{name, roles}` blocks
pub fn validate_membership_blocks<'a>(
    attribute: &str,
    blocks: impl IntoIterator<Item = (&'a str, usize)>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for (index, (name, role_count)) in blocks.into_iter().enumerate() {
        validate_not_empty(&format!("{}.{}.name", attribute, index), name)?;
        if role_count == 0 {
            return Err(ValidationError::new(
                format!("{}.{}.roles", attribute, index),
                "at least one role is required",
            ));
        }
        if !seen.insert(name) {
            return Err(ValidationError::new(
                attribute,
                format!("{} is listed more than once", name),
            ));
        }
    }

    Ok(())
}
