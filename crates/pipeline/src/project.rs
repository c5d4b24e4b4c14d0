//! Version detection for the project being released

use chrono::{SecondsFormat, Utc};
use hrel_config::ProjectConfig;
use hrel_errors::{BuildError, Error};
use hrel_types::ArtifactNames;
use std::path::Path;
use tokio::process::Command;

/// Versions stamped into every artifact of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    pub app_version: String,
    pub go_version: String,
    /// Short commit hash, empty outside a git checkout
    pub git_commit: String,
    /// RFC 3339 UTC timestamp taken once per run
    pub build_time: String,
}

impl ProjectInfo {
    /// Resolve versions for the checkout at `source`
    ///
    /// The application version comes from the config override, then the
    /// nearest tag, then the short commit. The Go version comes from the
    /// override, then the `go` directive in `go.mod`.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::DetectionFailed` when a version cannot be resolved.
    pub async fn detect(source: &Path, config: &ProjectConfig) -> Result<Self, Error> {
        let git_commit = git(source, &["rev-parse", "--short", "HEAD"])
            .await
            .unwrap_or_default();

        let app_version = match non_empty(config.app_version.as_deref()) {
            Some(version) => version,
            None => match git(source, &["describe", "--tags", "--abbrev=0"]).await {
                Ok(tag) if !tag.is_empty() => tag,
                _ if !git_commit.is_empty() => git_commit.clone(),
                _ => {
                    return Err(BuildError::DetectionFailed {
                        message: "no app version: set project.app_version or tag the repository"
                            .to_string(),
                    }
                    .into())
                }
            },
        };

        let go_version = match non_empty(config.go_version.as_deref()) {
            Some(version) => version,
            None => go_mod_version(source).await?,
        };

        Ok(Self {
            name: config.name.clone(),
            app_version,
            go_version,
            git_commit,
            build_time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    /// `-X` link flags for the version package
    #[must_use]
    pub fn ldflags(&self, version_package: &str) -> String {
        format!(
            "-X {pkg}.Version={} -X {pkg}.GoVersion={} -X {pkg}.BuildTime={} -X {pkg}.GitCommit={}",
            self.app_version,
            self.go_version,
            self.build_time,
            self.git_commit,
            pkg = version_package,
        )
    }

    #[must_use]
    pub fn names(&self) -> ArtifactNames {
        ArtifactNames::new(&self.name, &self.app_version)
    }

    /// Go toolchain image tag, e.g. `golang:1.24.2`
    #[must_use]
    pub fn go_image(&self, image: &str) -> String {
        format!("{image}:{}", self.go_version)
    }
}

/// Extract the version from the `go` directive of a go.mod file
#[must_use]
pub fn parse_go_directive(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("go"), Some(version), None) => Some(version.to_string()),
            _ => None,
        }
    })
}

async fn go_mod_version(source: &Path) -> Result<String, Error> {
    let path = source.join("go.mod");
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| BuildError::DetectionFailed {
            message: format!("cannot read {}: {e}", path.display()),
        })?;

    parse_go_directive(&contents).ok_or_else(|| {
        BuildError::DetectionFailed {
            message: format!("no go directive in {}", path.display()),
        }
        .into()
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

async fn git(source: &Path, args: &[&str]) -> Result<String, BuildError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(source)
        .output()
        .await
        .map_err(|e| BuildError::GitFailed {
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(BuildError::GitFailed {
            message: format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
