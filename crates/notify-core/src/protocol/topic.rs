//! MQTT topic-filter validation.
//!
//! The bridge subscribes to a single filter taken from the command line.  A
//! broker refuses an invalid filter only after the connection is up, which
//! would surface as a subscribe failure.  Checking the filter at startup turns
//! that into a clear configuration error instead.
//!
//! Rules (MQTT 3.1.1 §4.7):
//!
//! - The filter is not empty and contains no NUL character.
//! - `#` must occupy a whole level and must be the last level.
//! - `+` must occupy a whole level.

use thiserror::Error;

/// Reasons a topic filter is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("topic filter is empty")]
    Empty,

    #[error("topic filter contains a NUL character")]
    NulCharacter,

    /// `#` appears somewhere other than as the whole final level.
    #[error("'#' must be the last level of the topic filter, found in level {level}")]
    MisplacedMultiLevelWildcard { level: usize },

    /// `+` is combined with other characters inside one level.
    #[error("'+' must occupy a whole level of the topic filter, found in level {level}")]
    MisplacedSingleLevelWildcard { level: usize },
}

/// Checks that `filter` is a valid MQTT subscription filter.
///
/// # Errors
///
/// Returns the first [`TopicError`] found, scanning levels left to right.
/// Level numbers in errors are zero-based.
///
/// # Example
///
/// ```rust
/// use notify_core::validate_topic_filter;
///
/// assert!(validate_topic_filter("/surveillance/notification/#").is_ok());
/// assert!(validate_topic_filter("cameras/#/motion").is_err());
/// ```
pub fn validate_topic_filter(filter: &str) -> Result<(), TopicError> {
    if filter.is_empty() {
        return Err(TopicError::Empty);
    }
    if filter.contains('\0') {
        return Err(TopicError::NulCharacter);
    }

    let levels: Vec<&str> = filter.split('/').collect();
    let last = levels.len() - 1;

    for (index, level) in levels.iter().enumerate() {
        if level.contains('#') && (*level != "#" || index != last) {
            return Err(TopicError::MisplacedMultiLevelWildcard { level: index });
        }
        if level.contains('+') && *level != "+" {
            return Err(TopicError::MisplacedSingleLevelWildcard { level: index });
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
