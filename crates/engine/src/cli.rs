//! docker-compatible CLI implementation of [`ContainerEngine`]
//!
//! Works with `docker` and `podman`. Image builds use `buildx build --push`,
//! so publishing needs a docker installation with buildx (or podman's
//! compatible `buildx` alias) and QEMU emulation for foreign platforms.

use async_trait::async_trait;
use hrel_errors::{EngineError, Error};
use hrel_events::{AppEvent, EngineEvent, EventEmitter, FailureContext};
use hrel_types::Secret;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::context::EngineContext;
use crate::engine::{ContainerEngine, ExecOutput, RegistryAuth};
use crate::image::{parse_build_metadata, ImageBuildRequest, PublishedImage};
use crate::spec::{ContainerSpec, ExecArg};

/// Lines of stderr kept in error messages
const STDERR_TAIL_LINES: usize = 20;

/// Drives a docker-compatible command line tool
#[derive(Debug, Clone)]
pub struct CliEngine {
    program: String,
    pull: bool,
}

/// One fully rendered engine invocation
struct Invocation<'a> {
    /// Short form used in error messages, e.g. `docker run alpine`
    label: String,
    args: Vec<ExecArg>,
    env: &'a [(String, Secret)],
    stdin: Option<&'a Secret>,
}

impl CliEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            pull: false,
        }
    }

    /// Pull tool images on every run instead of reusing local copies
    #[must_use]
    pub fn with_pull(mut self, pull: bool) -> Self {
        self.pull = pull;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check whether the engine binary answers `version`
    pub async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|status| status.success())
    }

    /// Arguments for `run --rm`
    ///
    /// Secret variables are passed as bare `-e NAME`; the engine copies the
    /// value from its own environment, so it never reaches the command line.
    #[must_use]
    pub fn run_args(&self, spec: &ContainerSpec) -> Vec<ExecArg> {
        let mut args: Vec<ExecArg> = vec!["run".into(), "--rm".into()];

        if self.pull {
            args.push("--pull".into());
            args.push("always".into());
        }
        if let Some(platform) = spec.get_platform() {
            args.push("--platform".into());
            args.push(platform.into());
        }
        for (name, value) in spec.get_env() {
            args.push("-e".into());
            args.push(format!("{name}={value}").into());
        }
        for (name, _) in spec.get_secret_env() {
            args.push("-e".into());
            args.push(name.into());
        }
        for mount in spec.get_mounts() {
            let mut volume = format!("{}:{}", mount.host.display(), mount.container);
            if mount.read_only {
                volume.push_str(":ro");
            }
            args.push("-v".into());
            args.push(volume.into());
        }
        for cache in spec.get_caches() {
            args.push("-v".into());
            args.push(format!("{}:{}", cache.name, cache.container).into());
        }
        if let Some(workdir) = spec.get_workdir() {
            args.push("-w".into());
            args.push(workdir.into());
        }
        if let Some(entrypoint) = spec.get_entrypoint() {
            args.push("--entrypoint".into());
            args.push(entrypoint.into());
        }

        args.push(spec.image().into());
        args.extend(spec.get_command().iter().cloned());
        args
    }

    /// Arguments for `login`; the password travels over stdin
    #[must_use]
    pub fn login_args(&self, auth: &RegistryAuth) -> Vec<ExecArg> {
        vec![
            "login".into(),
            auth.registry.as_str().into(),
            "--username".into(),
            auth.username.as_str().into(),
            "--password-stdin".into(),
        ]
    }

    /// Arguments for `buildx build --push`
    #[must_use]
    pub fn build_args(
        &self,
        request: &ImageBuildRequest,
        dockerfile: &Path,
        metadata_file: &Path,
    ) -> Vec<ExecArg> {
        let mut args: Vec<ExecArg> = vec![
            "buildx".into(),
            "build".into(),
            "--platform".into(),
            request.platforms.join(",").into(),
            "--file".into(),
            dockerfile.display().to_string().into(),
        ];
        if self.pull {
            args.push("--pull".into());
        }
        for image in &request.tags {
            args.push("--tag".into());
            args.push(image.to_string().into());
        }
        args.push("--push".into());
        args.push("--metadata-file".into());
        args.push(metadata_file.display().to_string().into());
        args.push(request.context_dir.display().to_string().into());
        args
    }

    async fn execute(
        &self,
        ctx: &EngineContext,
        invocation: Invocation<'_>,
    ) -> Result<ExecOutput, EngineError> {
        let command_id = uuid::Uuid::new_v4().to_string();
        let start = Instant::now();

        ctx.emit(AppEvent::Engine(EngineEvent::CommandStarted {
            command_id: command_id.clone(),
            program: self.program.clone(),
            args: invocation
                .args
                .iter()
                .map(|arg| arg.redacted().to_string())
                .collect(),
        }));

        let result = self.spawn_and_wait(&invocation).await;
        let duration = start.elapsed();

        match &result {
            Ok((exit_code, output)) => {
                ctx.emit(AppEvent::Engine(EngineEvent::CommandCompleted {
                    command_id,
                    exit_code: *exit_code,
                    duration,
                    stdout_bytes: byte_len(&output.stdout),
                    stderr_bytes: byte_len(&output.stderr),
                }));
            }
            Err(error) => emit_failed(ctx, command_id, error, duration),
        }

        result.map(|(_, output)| output)
    }

    async fn spawn_and_wait(
        &self,
        invocation: &Invocation<'_>,
    ) -> Result<(Option<i32>, ExecOutput), EngineError> {
        let mut command = Command::new(&self.program);
        command
            .args(invocation.args.iter().map(ExecArg::expose))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);
        for (name, value) in invocation.env {
            command.env(name, value.expose());
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::Unavailable {
                    program: self.program.clone(),
                }
            } else {
                EngineError::SpawnFailed {
                    program: self.program.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        if let (Some(secret), Some(mut stdin)) = (invocation.stdin, child.stdin.take()) {
            // An engine that exits before reading stdin closes the pipe early;
            // its exit status decides the outcome
            match stdin.write_all(secret.expose().as_bytes()).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => {
                    return Err(EngineError::SpawnFailed {
                        program: self.program.clone(),
                        message: format!("failed to write stdin: {e}"),
                    });
                }
            }
            // Closing stdin lets the engine stop reading
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| EngineError::SpawnFailed {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        let exec = ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if output.status.success() {
            Ok((output.status.code(), exec))
        } else {
            Err(EngineError::CommandFailed {
                command: invocation.label.clone(),
                exit_code: output.status.code(),
                stderr: stderr_tail(&exec.stderr),
            })
        }
    }
}

#[async_trait]
impl ContainerEngine for CliEngine {
    async fn run(&self, ctx: &EngineContext, spec: &ContainerSpec) -> Result<ExecOutput, Error> {
        tracing::debug!(image = spec.image(), command = ?spec.redacted_command(), "running container");

        let invocation = Invocation {
            label: format!("{} run {}", self.program, spec.image()),
            args: self.run_args(spec),
            env: spec.get_secret_env(),
            stdin: None,
        };
        self.execute(ctx, invocation).await.map_err(Error::from)
    }

    async fn login(&self, ctx: &EngineContext, auth: &RegistryAuth) -> Result<(), Error> {
        let invocation = Invocation {
            label: format!("{} login {}", self.program, auth.registry),
            args: self.login_args(auth),
            env: &[],
            stdin: Some(&auth.password),
        };

        self.execute(ctx, invocation).await.map_err(|e| match e {
            EngineError::CommandFailed { stderr, .. } => EngineError::LoginFailed {
                registry: auth.registry.clone(),
                message: stderr,
            },
            other => other,
        })?;

        ctx.emit(AppEvent::Engine(EngineEvent::RegistryLogin {
            registry: auth.registry.clone(),
            username: auth.username.clone(),
        }));
        Ok(())
    }

    async fn build_image(
        &self,
        ctx: &EngineContext,
        request: &ImageBuildRequest,
    ) -> Result<PublishedImage, Error> {
        request.validate()?;

        let workspace = tempfile::tempdir()
            .map_err(|e| Error::internal(format!("failed to create build workspace: {e}")))?;
        let dockerfile = workspace.path().join("Dockerfile");
        let metadata_file = workspace.path().join("metadata.json");

        tokio::fs::write(&dockerfile, request.dockerfile())
            .await
            .map_err(|e| Error::io_with_path(&e, &dockerfile))?;

        let invocation = Invocation {
            label: format!("{} buildx build", self.program),
            args: self.build_args(request, &dockerfile, &metadata_file),
            env: &[],
            stdin: None,
        };
        self.execute(ctx, invocation)
            .await
            .map_err(|e| match e {
                EngineError::CommandFailed { stderr, .. } => {
                    EngineError::ImageBuildFailed { message: stderr }
                }
                other => other,
            })?;

        let metadata = tokio::fs::read_to_string(&metadata_file)
            .await
            .map_err(|e| EngineError::MetadataMissing {
                message: format!("{}: {e}", metadata_file.display()),
            })?;
        let digest = parse_build_metadata(&metadata)?;

        Ok(PublishedImage {
            refs: request.tags.clone(),
            digest,
        })
    }
}

fn emit_failed(ctx: &EngineContext, command_id: String, error: &EngineError, duration: Duration) {
    ctx.emit(AppEvent::Engine(EngineEvent::CommandFailed {
        command_id,
        failure: FailureContext::from_error(error),
        duration,
    }));
}

fn byte_len(text: &str) -> u64 {
    u64::try_from(text.len()).unwrap_or(u64::MAX)
}

/// Keep the last lines of stderr, where engines put the actual error
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrel_types::{ImageRef, ImageTag};

    fn plain(args: &[ExecArg]) -> Vec<&str> {
        args.iter().map(ExecArg::redacted).collect()
    }

    #[test]
    fn run_args_cover_every_spec_field() {
        let spec = ContainerSpec::from("golang:1.24-alpine")
            .platform("linux/amd64")
            .env("GOOS", "linux")
            .secret_env("TOKEN", Secret::new("t0ken"))
            .mount("/src", "/src")
            .mount_read_only("/dist/archive", "/input")
            .cache("go-mod-1.24", "/go/pkg/mod")
            .workdir("/src")
            .entrypoint("go")
            .exec(["version"]);

        let args = CliEngine::new("docker").with_pull(true).run_args(&spec);
        assert_eq!(
            plain(&args),
            vec![
                "run",
                "--rm",
                "--pull",
                "always",
                "--platform",
                "linux/amd64",
                "-e",
                "GOOS=linux",
                "-e",
                "TOKEN",
                "-v",
                "/src:/src",
                "-v",
                "/dist/archive:/input:ro",
                "-v",
                "go-mod-1.24:/go/pkg/mod",
                "-w",
                "/src",
                "--entrypoint",
                "go",
                "golang:1.24-alpine",
                "version",
            ]
        );
        assert!(args.iter().all(|arg| !arg.expose().contains("t0ken")));
    }

    #[test]
    fn login_reads_password_from_stdin() {
        let auth = RegistryAuth::new("ghcr.io", "bot", Secret::new("pw"));
        let args = CliEngine::new("podman").login_args(&auth);
        assert_eq!(
            plain(&args),
            vec!["login", "ghcr.io", "--username", "bot", "--password-stdin"]
        );
    }

    #[test]
    fn build_args_tag_and_push() {
        let tag = |raw: &str| ImageRef::new("r.io", "ns", "cli", ImageTag::normalize(raw).unwrap());
        let request = ImageBuildRequest::new("/dist/linux", "alpine:latest", "cli_1_linux_")
            .platform("linux/amd64")
            .platform("linux/arm64")
            .tag(tag("v1"))
            .tag(tag("latest"));

        let args = CliEngine::new("docker").build_args(
            &request,
            Path::new("/tmp/x/Dockerfile"),
            Path::new("/tmp/x/metadata.json"),
        );
        assert_eq!(
            plain(&args),
            vec![
                "buildx",
                "build",
                "--platform",
                "linux/amd64,linux/arm64",
                "--file",
                "/tmp/x/Dockerfile",
                "--tag",
                "r.io/ns/cli:1",
                "--tag",
                "r.io/ns/cli:latest",
                "--push",
                "--metadata-file",
                "/tmp/x/metadata.json",
                "/dist/linux",
            ]
        );
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(&stderr);
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let engine = CliEngine::new("hrel-definitely-not-installed");
        assert!(!engine.is_available().await);

        let err = engine
            .run(&EngineContext::silent(), &ContainerSpec::from("alpine"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Engine(EngineError::Unavailable { .. })
        ));
    }
}
