//! Cross-compilation targets and the build matrix

use hrel_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating systems the Go toolchain is asked to target (`GOOS`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Linux,
    Darwin,
    Windows,
}

impl TargetOs {
    /// All supported operating systems, in release order
    pub const ALL: [Self; 3] = [Self::Linux, Self::Darwin, Self::Windows];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }

    /// Suffix appended to executables for this OS
    #[must_use]
    pub fn exe_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux | Self::Darwin => "",
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetOs {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "linux" => Ok(Self::Linux),
            "darwin" => Ok(Self::Darwin),
            "windows" => Ok(Self::Windows),
            other => Err(ConfigError::InvalidValue {
                field: "os".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl clap::ValueEnum for TargetOs {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// CPU architectures (`GOARCH`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetArch {
    Amd64,
    Arm64,
}

impl TargetArch {
    pub const ALL: [Self; 2] = [Self::Amd64, Self::Arm64];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for TargetArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetArch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "amd64" => Ok(Self::Amd64),
            "arm64" => Ok(Self::Arm64),
            other => Err(ConfigError::InvalidValue {
                field: "arch".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl clap::ValueEnum for TargetArch {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// One cell of the build matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub os: TargetOs,
    pub arch: TargetArch,
}

impl Target {
    #[must_use]
    pub fn new(os: TargetOs, arch: TargetArch) -> Self {
        Self { os, arch }
    }

    /// Expand the cartesian product of `oses` and `arches`, OS-major.
    ///
    /// Duplicate entries in either list are skipped so each target is built once.
    #[must_use]
    pub fn matrix(oses: &[TargetOs], arches: &[TargetArch]) -> Vec<Self> {
        let mut targets = Vec::with_capacity(oses.len() * arches.len());
        for &os in oses {
            for &arch in arches {
                let target = Self::new(os, arch);
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        targets
    }

    /// Full release matrix: linux, darwin and windows on amd64 and arm64
    #[must_use]
    pub fn release_matrix() -> Vec<Self> {
        Self::matrix(&TargetOs::ALL, &TargetArch::ALL)
    }

    /// Targets baked into the published container image
    #[must_use]
    pub fn image_matrix() -> Vec<Self> {
        Self::matrix(&[TargetOs::Linux], &TargetArch::ALL)
    }

    /// Container platform string, e.g. `linux/arm64`
    #[must_use]
    pub fn platform(&self) -> String {
        format!("{}/{}", self.os, self.arch)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_matrix_is_os_major() {
        let names: Vec<String> = Target::release_matrix()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            names,
            vec![
                "linux_amd64",
                "linux_arm64",
                "darwin_amd64",
                "darwin_arm64",
                "windows_amd64",
                "windows_arm64",
            ]
        );
    }

    #[test]
    fn matrix_skips_duplicates() {
        let targets = Target::matrix(
            &[TargetOs::Linux, TargetOs::Linux],
            &[TargetArch::Arm64, TargetArch::Arm64],
        );
        assert_eq!(targets, vec![Target::new(TargetOs::Linux, TargetArch::Arm64)]);
    }

    #[test]
    fn parses_go_names() {
        assert_eq!("darwin".parse::<TargetOs>().unwrap(), TargetOs::Darwin);
        assert_eq!(" arm64 ".parse::<TargetArch>().unwrap(), TargetArch::Arm64);
        assert!("x86_64".parse::<TargetArch>().is_err());
        assert_eq!(
            Target::new(TargetOs::Linux, TargetArch::Amd64).platform(),
            "linux/amd64"
        );
    }
}
