//! Serde helpers for provider callbacks and HTML form submissions.

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, treating empty strings as None.
///
/// Providers send `error_description=` and Apple sends `user=` with no value
/// often enough that an empty field has to mean "absent".
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}
