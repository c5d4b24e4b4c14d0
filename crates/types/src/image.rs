//! Registry image tags and references

use hrel_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A registry tag after normalization
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageTag(String);

impl ImageTag {
    /// Trim surrounding whitespace and strip one leading `v`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidTag` when nothing is left after normalization.
    pub fn normalize(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let tag = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if tag.is_empty() {
            return Err(ConfigError::InvalidTag {
                tag: raw.to_string(),
                reason: "empty after trimming".to_string(),
            });
        }
        Ok(Self(tag.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a tag list, keeping first-seen order and dropping duplicates.
///
/// # Errors
///
/// Returns the first tag that fails normalization.
pub fn normalize_tags<S: AsRef<str>>(raw: &[S]) -> Result<Vec<ImageTag>, ConfigError> {
    let mut tags: Vec<ImageTag> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = ImageTag::normalize(tag.as_ref())?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// `registry/namespace/repository:tag`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub registry: String,
    pub namespace: String,
    pub repository: String,
    pub tag: ImageTag,
}

impl ImageRef {
    pub fn new(
        registry: impl Into<String>,
        namespace: impl Into<String>,
        repository: impl Into<String>,
        tag: ImageTag,
    ) -> Self {
        Self {
            registry: registry.into(),
            namespace: namespace.into(),
            repository: repository.into(),
            tag,
        }
    }

    /// Reference without the tag, e.g. `demo.goharbor.io/harbor-cli/harbor-cli`
    #[must_use]
    pub fn repository_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.registry.trim_end_matches('/'),
            self.namespace,
            self.repository
        )
    }

    /// Address pinned to a pushed digest
    #[must_use]
    pub fn with_digest(&self, digest: &str) -> String {
        format!("{self}@{digest}")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository_path(), self.tag)
    }
}
