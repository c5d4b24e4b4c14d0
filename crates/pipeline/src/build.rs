//! Cross-compilation of the Go binary inside the toolchain image

use hrel_config::Config;
use hrel_engine::ContainerSpec;
use hrel_errors::{BuildError, Error};
use hrel_events::{EventEmitter, Stage};
use hrel_types::Target;
use std::path::{Path, PathBuf};

use crate::project::ProjectInfo;
use crate::Pipeline;

const MOD_CACHE: &str = "/go/pkg/mod";
const BUILD_CACHE: &str = "/go/build-cache";

/// Which set of binaries a build produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    /// Full OS × arch matrix for release archives, in `<dist>/bin`
    Release,
    /// Static linux binaries for the container image, in `<dist>/linux`
    Image,
}

impl BuildKind {
    #[must_use]
    pub fn subdir(self) -> &'static str {
        match self {
            Self::Release => "bin",
            Self::Image => "linux",
        }
    }
}

/// Container spec that compiles one target into `out_dir`
#[must_use]
pub fn build_spec(
    config: &Config,
    info: &ProjectInfo,
    target: &Target,
    kind: BuildKind,
    source_dir: &Path,
    out_dir: &Path,
) -> ContainerSpec {
    let go = &info.go_version;
    let binary = info.names().binary(target);

    let mut spec = ContainerSpec::from(info.go_image(&config.build.go_image))
        .cache(format!("go-mod-{go}"), MOD_CACHE)
        .env("GOMODCACHE", MOD_CACHE)
        .cache(format!("go-build-{go}"), BUILD_CACHE)
        .env("GOCACHE", BUILD_CACHE)
        .mount(source_dir, "/src")
        .mount(out_dir, "/out")
        .workdir("/src")
        .env("GOOS", target.os.as_str())
        .env("GOARCH", target.arch.as_str())
        // VCS data comes from -ldflags; the bind mount is not owned by root
        .env("GOFLAGS", "-buildvcs=false");

    if kind == BuildKind::Image {
        spec = spec.env("CGO_ENABLED", if config.build.cgo { "1" } else { "0" });
    }

    spec.exec([
        "go".to_string(),
        "build".to_string(),
        "-v".to_string(),
        "-ldflags".to_string(),
        info.ldflags(&config.project.version_package),
        "-o".to_string(),
        format!("/out/{binary}"),
        format!("/src/{}", config.project.main_package),
    ])
}

impl Pipeline {
    /// Compile the full release matrix into `<dist>/bin`
    ///
    /// # Errors
    ///
    /// Returns an error if any target fails to compile.
    pub async fn build(&self, info: &ProjectInfo) -> Result<Vec<PathBuf>, Error> {
        let targets = self.config().targets();
        self.stage(Stage::Build, &targets, self.compile(info, &targets, BuildKind::Release))
            .await
    }

    /// Compile the linux binaries packaged into the container image
    ///
    /// # Errors
    ///
    /// Returns an error if any target fails to compile.
    pub async fn build_image_binaries(&self, info: &ProjectInfo) -> Result<Vec<PathBuf>, Error> {
        let targets = self.config().image_targets();
        self.stage(Stage::Build, &targets, self.compile(info, &targets, BuildKind::Image))
            .await
    }

    async fn compile(
        &self,
        info: &ProjectInfo,
        targets: &[Target],
        kind: BuildKind,
    ) -> Result<Vec<PathBuf>, Error> {
        let out_dir = self.dist_dir().join(kind.subdir());
        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &out_dir))?;

        let names = info.names();
        let mut binaries = Vec::with_capacity(targets.len());

        for target in targets {
            let spec = build_spec(
                self.config(),
                info,
                target,
                kind,
                self.source_dir(),
                &out_dir,
            );
            tracing::debug!(%target, image = spec.image(), "compiling");

            self.engine
                .run(&self.ctx, &spec)
                .await
                .map_err(|e| BuildError::Failed {
                    target: target.to_string(),
                    message: e.to_string(),
                })?;

            let binary = out_dir.join(names.binary(target));
            if !tokio::fs::try_exists(&binary).await.unwrap_or(false) {
                return Err(BuildError::MissingBinary {
                    path: binary.display().to_string(),
                }
                .into());
            }

            self.emit_artifact(Stage::Build, Some(*target), &binary);
            binaries.push(binary);
        }

        Ok(binaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrel_types::{TargetArch, TargetOs};

    fn info() -> ProjectInfo {
        ProjectInfo {
            name: "harbor-cli".to_string(),
            app_version: "v0.1.0".to_string(),
            go_version: "1.24.2".to_string(),
            git_commit: "abc1234".to_string(),
            build_time: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn release_spec_uses_version_keyed_caches() {
        let config = Config::default();
        let target = Target::new(TargetOs::Windows, TargetArch::Arm64);
        let spec = build_spec(
            &config,
            &info(),
            &target,
            BuildKind::Release,
            Path::new("/work/src"),
            Path::new("/work/src/dist/bin"),
        );

        assert_eq!(spec.image(), "golang:1.24.2");
        let caches: Vec<&str> = spec.get_caches().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(caches, vec!["go-mod-1.24.2", "go-build-1.24.2"]);
        assert_eq!(spec.env_value("GOOS"), Some("windows"));
        assert_eq!(spec.env_value("GOARCH"), Some("arm64"));
        assert_eq!(spec.env_value("GOMODCACHE"), Some("/go/pkg/mod"));
        assert_eq!(spec.env_value("CGO_ENABLED"), None);

        let command = spec.redacted_command();
        assert_eq!(command[..4], ["go", "build", "-v", "-ldflags"]);
        assert!(command[4].contains(".GitCommit=abc1234"));
        assert_eq!(command[6], "/out/harbor-cli_v0.1.0_windows_arm64.exe");
        assert_eq!(command[7], "/src/cmd/harbor/main.go");
    }

    #[test]
    fn image_spec_disables_cgo() {
        let config = Config::default();
        let target = Target::new(TargetOs::Linux, TargetArch::Amd64);
        let spec = build_spec(
            &config,
            &info(),
            &target,
            BuildKind::Image,
            Path::new("/src"),
            Path::new("/src/dist/linux"),
        );
        assert_eq!(spec.env_value("CGO_ENABLED"), Some("0"));
        assert_eq!(BuildKind::Image.subdir(), "linux");
    }
}
