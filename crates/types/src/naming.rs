//! File naming for release artifacts
//!
//! Every artifact is keyed by `<project>_<version>_<os>_<arch>`; the suffix
//! depends on the artifact kind and the target OS.

use crate::target::{Target, TargetOs};

/// Archive container used for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    #[must_use]
    pub fn for_os(os: TargetOs) -> Self {
        match os {
            TargetOs::Windows => Self::Zip,
            TargetOs::Linux | TargetOs::Darwin => Self::TarGz,
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::TarGz => ".tar.gz",
            Self::Zip => ".zip",
        }
    }
}

/// Computes artifact file names for one project version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    project: String,
    version: String,
}

impl ArtifactNames {
    pub fn new(project: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            version: version.into(),
        }
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Shared stem, e.g. `harbor-cli_v0.0.3_linux_amd64`
    #[must_use]
    pub fn stem(&self, target: &Target) -> String {
        format!(
            "{}_{}_{}_{}",
            self.project, self.version, target.os, target.arch
        )
    }

    /// Compiled binary name (`.exe` on windows)
    #[must_use]
    pub fn binary(&self, target: &Target) -> String {
        format!("{}{}", self.stem(target), target.os.exe_suffix())
    }

    /// Name of the executable inside a release archive
    #[must_use]
    pub fn packaged_binary(&self, target: &Target) -> String {
        format!("{}{}", self.project, target.os.exe_suffix())
    }

    /// Release archive name (`.zip` on windows, `.tar.gz` elsewhere)
    #[must_use]
    pub fn archive(&self, target: &Target) -> String {
        format!(
            "{}{}",
            self.stem(target),
            ArchiveKind::for_os(target.os).extension()
        )
    }

    /// CycloneDX document generated for the target's archive
    #[must_use]
    pub fn sbom(&self, target: &Target) -> String {
        format!("{}.sbom.json", self.archive(target))
    }
}
