//! Multi-platform image builds

use hrel_errors::EngineError;
use hrel_types::ImageRef;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Key under which buildx records the pushed manifest digest
pub const DIGEST_KEY: &str = "containerimage.digest";

/// A runtime image assembled from prebuilt per-architecture binaries
///
/// The build context must hold one binary per platform named
/// `<binary_prefix><arch>`; the rendered Dockerfile picks the right one
/// through the `TARGETARCH` build argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuildRequest {
    pub context_dir: PathBuf,
    pub base_image: String,
    pub binary_prefix: String,
    pub entrypoint: String,
    pub platforms: Vec<String>,
    pub tags: Vec<ImageRef>,
    pub labels: BTreeMap<String, String>,
    /// Run `<entrypoint> version` inside the image while building
    pub smoke_test: bool,
}

impl ImageBuildRequest {
    pub fn new(
        context_dir: impl Into<PathBuf>,
        base_image: impl Into<String>,
        binary_prefix: impl Into<String>,
    ) -> Self {
        Self {
            context_dir: context_dir.into(),
            base_image: base_image.into(),
            binary_prefix: binary_prefix.into(),
            entrypoint: "/harbor".to_string(),
            platforms: Vec::new(),
            tags: Vec::new(),
            labels: BTreeMap::new(),
            smoke_test: true,
        }
    }

    #[must_use]
    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = entrypoint.into();
        self
    }

    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        let platform = platform.into();
        if !self.platforms.contains(&platform) {
            self.platforms.push(platform);
        }
        self
    }

    #[must_use]
    pub fn tag(mut self, image: ImageRef) -> Self {
        self.tags.push(image);
        self
    }

    #[must_use]
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn smoke_test(mut self, enabled: bool) -> Self {
        self.smoke_test = enabled;
        self
    }

    /// Reject requests the engine could never satisfy
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidSpec` for an empty platform or tag list.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.platforms.is_empty() {
            return Err(EngineError::InvalidSpec {
                message: "image build needs at least one platform".to_string(),
            });
        }
        if self.tags.is_empty() {
            return Err(EngineError::InvalidSpec {
                message: "image build needs at least one tag".to_string(),
            });
        }
        Ok(())
    }

    /// Render the Dockerfile for this request
    #[must_use]
    pub fn dockerfile(&self) -> String {
        let entrypoint = quote(&self.entrypoint);
        let mut out = String::new();
        let _ = writeln!(out, "FROM {}", self.base_image);
        let _ = writeln!(out, "ARG TARGETARCH");
        for (key, value) in &self.labels {
            let _ = writeln!(out, "LABEL {key}={}", quote(value));
        }
        let _ = writeln!(
            out,
            "COPY {}${{TARGETARCH}} {}",
            self.binary_prefix, self.entrypoint
        );
        let _ = writeln!(out, "ENTRYPOINT [{entrypoint}]");
        if self.smoke_test {
            let _ = writeln!(out, "RUN [{entrypoint}, \"version\"]");
        }
        out
    }
}

/// JSON string quoting is valid Dockerfile quoting for labels and exec form
fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

/// Result of a successful multi-tag push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedImage {
    pub refs: Vec<ImageRef>,
    pub digest: String,
}

impl PublishedImage {
    /// One `repository:tag@digest` address per pushed tag
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        self.refs
            .iter()
            .map(|image| image.with_digest(&self.digest))
            .collect()
    }
}

#[derive(Deserialize)]
struct BuildMetadata {
    #[serde(rename = "containerimage.digest")]
    digest: Option<String>,
}

/// Extract the pushed digest from a buildx `--metadata-file`
///
/// # Errors
///
/// Returns `EngineError::MetadataMissing` when the document is not JSON or
/// has no digest.
pub fn parse_build_metadata(contents: &str) -> Result<String, EngineError> {
    let metadata: BuildMetadata =
        serde_json::from_str(contents).map_err(|e| EngineError::MetadataMissing {
            message: e.to_string(),
        })?;
    metadata
        .digest
        .filter(|digest| !digest.trim().is_empty())
        .ok_or_else(|| EngineError::MetadataMissing {
            message: format!("no {DIGEST_KEY} in build metadata"),
        })
}
