//! Project, build and engine sections

use crate::constants;
use hrel_types::{TargetArch, TargetOs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What is being released
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_project_name")]
    pub name: String,
    /// Go file passed to `go build`, relative to the source root
    #[serde(default = "default_main_package")]
    pub main_package: String,
    /// Go package whose variables receive `-X` link flags
    #[serde(default = "default_version_package")]
    pub version_package: String,
    /// Overrides `git describe`
    pub app_version: Option<String>,
    /// Overrides the `go` directive of go.mod
    pub go_version: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            main_package: default_main_package(),
            version_package: default_version_package(),
            app_version: None,
            go_version: None,
        }
    }
}

/// Cross-compilation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_oses")]
    pub oses: Vec<TargetOs>,
    #[serde(default = "default_arches")]
    pub arches: Vec<TargetArch>,
    /// Output root, relative paths resolve against the source directory
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
    /// Go toolchain image name; the Go version becomes its tag
    #[serde(default = "default_go_image")]
    pub go_image: String,
    /// Enable cgo for binaries shipped in the container image
    #[serde(default)]
    pub cgo: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            oses: default_oses(),
            arches: default_arches(),
            dist_dir: default_dist_dir(),
            go_image: default_go_image(),
            cgo: false,
        }
    }
}

/// Container engine selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// docker-compatible CLI (`docker`, `podman`, or an absolute path)
    #[serde(default = "default_engine_program")]
    pub program: String,
    /// Always pull tool images before running them
    #[serde(default)]
    pub pull: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_engine_program(),
            pull: false,
        }
    }
}

fn default_project_name() -> String {
    constants::PROJECT_NAME.to_string()
}

fn default_main_package() -> String {
    constants::MAIN_PACKAGE.to_string()
}

fn default_version_package() -> String {
    constants::VERSION_PACKAGE.to_string()
}

fn default_oses() -> Vec<TargetOs> {
    TargetOs::ALL.to_vec()
}

fn default_arches() -> Vec<TargetArch> {
    TargetArch::ALL.to_vec()
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from(constants::DIST_DIR)
}

fn default_go_image() -> String {
    constants::GO_IMAGE.to_string()
}

fn default_engine_program() -> String {
    constants::ENGINE_PROGRAM.to_string()
}
