//! Image, signing and SBOM sections

use crate::constants;
use serde::{Deserialize, Serialize};

/// Container image publishing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub registry: Option<String>,
    /// Defaults to the project name
    pub namespace: Option<String>,
    /// Defaults to the project name
    pub repository: Option<String>,
    #[serde(default = "default_base_image")]
    pub base_image: String,
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,
    /// Used when no tag is given on the command line
    #[serde(default = "default_tags")]
    pub default_tags: Vec<String>,
    /// Run `<entrypoint> version` inside each platform image while building
    #[serde(default = "default_true")]
    pub smoke_test: bool,
    #[serde(default)]
    pub labels: ImageLabels,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            registry: None,
            namespace: None,
            repository: None,
            base_image: default_base_image(),
            entrypoint: default_entrypoint(),
            default_tags: default_tags(),
            smoke_test: true,
            labels: ImageLabels::default(),
        }
    }
}

/// OCI and ArtifactHub metadata stamped on published images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageLabels {
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_readme_url")]
    pub readme_url: String,
    #[serde(default = "default_license")]
    pub license: String,
}

impl Default for ImageLabels {
    fn default() -> Self {
        Self {
            description: default_description(),
            source: default_source(),
            readme_url: default_readme_url(),
            license: default_license(),
        }
    }
}

/// cosign invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignConfig {
    #[serde(default = "default_cosign_image")]
    pub cosign_image: String,
    #[serde(default = "default_cosign_timeout")]
    pub timeout: String,
    /// Sign every platform manifest of a multi-platform index
    #[serde(default = "default_true")]
    pub recursive: bool,
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            cosign_image: default_cosign_image(),
            timeout: default_cosign_timeout(),
            recursive: true,
        }
    }
}

/// syft invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbomConfig {
    #[serde(default = "default_syft_image")]
    pub syft_image: String,
    #[serde(default = "default_sbom_format")]
    pub format: String,
}

impl Default for SbomConfig {
    fn default() -> Self {
        Self {
            syft_image: default_syft_image(),
            format: default_sbom_format(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_image() -> String {
    constants::BASE_IMAGE.to_string()
}

fn default_entrypoint() -> String {
    constants::ENTRYPOINT.to_string()
}

fn default_tags() -> Vec<String> {
    vec![constants::DEFAULT_TAG.to_string()]
}

fn default_description() -> String {
    constants::IMAGE_DESCRIPTION.to_string()
}

fn default_source() -> String {
    constants::IMAGE_SOURCE.to_string()
}

fn default_readme_url() -> String {
    constants::IMAGE_README_URL.to_string()
}

fn default_license() -> String {
    constants::IMAGE_LICENSE.to_string()
}

fn default_cosign_image() -> String {
    constants::COSIGN_IMAGE.to_string()
}

fn default_cosign_timeout() -> String {
    constants::COSIGN_TIMEOUT.to_string()
}

fn default_syft_image() -> String {
    constants::SYFT_IMAGE.to_string()
}

fn default_sbom_format() -> String {
    constants::SBOM_FORMAT.to_string()
}
