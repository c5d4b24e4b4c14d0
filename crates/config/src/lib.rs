#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for hrel
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (`hrel.toml` in the source directory, or `--config`)
//! - Environment variables (`HREL_*`)
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod core;
pub mod image;

pub use crate::core::{BuildConfig, EngineConfig, ProjectConfig};
pub use crate::image::{ImageConfig, ImageLabels, SbomConfig, SignConfig};

use hrel_errors::{ConfigError, Error};
use hrel_types::{Target, TargetArch, TargetOs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub sign: SignConfig,

    #[serde(default)]
    pub sbom: SbomConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML document
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` for invalid TOML or unknown enum values.
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration for a project checkout
    ///
    /// An explicit path must exist. Without one, `hrel.toml` in `source_dir`
    /// is used when present, otherwise defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or parsed.
    pub async fn load_for_source(
        source_dir: &Path,
        explicit: Option<&Path>,
    ) -> Result<Self, Error> {
        if let Some(path) = explicit {
            return Self::load_from_file(path).await;
        }

        let candidate = source_dir.join(constants::CONFIG_FILE_NAME);
        if fs::try_exists(&candidate).await.unwrap_or(false) {
            tracing::debug!(path = %candidate.display(), "loading project config");
            Self::load_from_file(&candidate).await
        } else {
            Ok(Self::default())
        }
    }

    /// Merge with process environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge values produced by `lookup`, keyed by `HREL_*` variable names
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for unparsable lists.
    pub fn merge_env_from<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(program) = lookup("HREL_ENGINE") {
            self.engine.program = program;
        }
        if let Some(registry) = lookup("HREL_REGISTRY") {
            self.image.registry = Some(registry);
        }
        if let Some(version) = lookup("HREL_APP_VERSION") {
            self.project.app_version = Some(version);
        }
        if let Some(version) = lookup("HREL_GO_VERSION") {
            self.project.go_version = Some(version);
        }
        if let Some(dist) = lookup("HREL_DIST_DIR") {
            self.build.dist_dir = PathBuf::from(dist);
        }
        if let Some(oses) = lookup("HREL_OSES") {
            self.build.oses = parse_list::<TargetOs>("HREL_OSES", &oses)?;
        }
        if let Some(arches) = lookup("HREL_ARCHES") {
            self.build.arches = parse_list::<TargetArch>("HREL_ARCHES", &arches)?;
        }

        Ok(())
    }

    /// Check cross-field constraints after all layers are merged
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first violated constraint.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |message: &str| -> Result<(), Error> {
            Err(ConfigError::Invalid {
                message: message.to_string(),
            }
            .into())
        };

        if self.project.name.trim().is_empty() {
            return invalid("project.name must not be empty");
        }
        if self.build.oses.is_empty() {
            return invalid("build.oses must list at least one operating system");
        }
        if self.build.arches.is_empty() {
            return invalid("build.arches must list at least one architecture");
        }
        if self.engine.program.trim().is_empty() {
            return invalid("engine.program must not be empty");
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SerializeError` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializeError {
                error: e.to_string(),
            }
            .into()
        })
    }

    /// Full cross-compilation matrix
    #[must_use]
    pub fn targets(&self) -> Vec<Target> {
        Target::matrix(&self.build.oses, &self.build.arches)
    }

    /// Linux targets packaged into the container image
    #[must_use]
    pub fn image_targets(&self) -> Vec<Target> {
        Target::matrix(&[TargetOs::Linux], &self.build.arches)
    }

    /// Dist directory resolved against the source checkout
    #[must_use]
    pub fn dist_path(&self, source_dir: &Path) -> PathBuf {
        if self.build.dist_dir.is_absolute() {
            self.build.dist_dir.clone()
        } else {
            source_dir.join(&self.build.dist_dir)
        }
    }

    /// Registry host, required by publish and sign
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when no registry was configured.
    pub fn registry(&self) -> Result<&str, Error> {
        self.image
            .registry
            .as_deref()
            .filter(|registry| !registry.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::MissingField {
                    field: "registry".to_string(),
                }
                .into()
            })
    }

    /// Image namespace (defaults to the project name)
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.image
            .namespace
            .as_deref()
            .unwrap_or(&self.project.name)
    }

    /// Image repository (defaults to the project name)
    #[must_use]
    pub fn repository(&self) -> &str {
        self.image
            .repository
            .as_deref()
            .unwrap_or(&self.project.name)
    }
}

fn parse_list<T>(field: &str, raw: &str) -> Result<Vec<T>, Error>
where
    T: std::str::FromStr,
{
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<T>().map_err(|_| {
                Error::from(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: item.to_string(),
                })
            })
        })
        .collect()
}
