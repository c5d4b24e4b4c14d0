//! Integration tests for the pipeline stages
//!
//! A recording engine stands in for docker: it captures every spec and
//! fakes the files the real tools would write into mounted directories.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use hrel_config::Config;
    use hrel_engine::{
        ContainerEngine, ContainerSpec, EngineContext, ExecOutput, ImageBuildRequest,
        PublishedImage, RegistryAuth,
    };
    use hrel_errors::{BuildError, ConfigError, EngineError, Error, SbomError, SigningError};
    use hrel_events::{channel, AppEvent, EventReceiver, PipelineEvent, Stage};
    use hrel_pipeline::*;
    use hrel_types::Secret;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const DIGEST: &str = "sha256:feedface";

    #[derive(Debug, Clone)]
    enum Call {
        Run(ContainerSpec),
        Login(RegistryAuth),
        Build(ImageBuildRequest),
    }

    #[derive(Default)]
    struct RecordingEngine {
        calls: Mutex<Vec<Call>>,
        /// Fail any container whose image starts with this prefix
        fail_image: Option<String>,
    }

    impl RecordingEngine {
        fn failing(image_prefix: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_image: Some(image_prefix.to_string()),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn runs(&self) -> Vec<ContainerSpec> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Run(spec) => Some(spec),
                    _ => None,
                })
                .collect()
        }
    }

    fn host_path(spec: &ContainerSpec, container_path: &str) -> Option<PathBuf> {
        spec.get_mounts().iter().find_map(|mount| {
            container_path
                .strip_prefix(&format!("{}/", mount.container))
                .map(|rest| mount.host.join(rest))
        })
    }

    #[async_trait]
    impl ContainerEngine for RecordingEngine {
        async fn run(&self, _ctx: &EngineContext, spec: &ContainerSpec) -> Result<ExecOutput, Error> {
            self.calls.lock().unwrap().push(Call::Run(spec.clone()));

            if let Some(prefix) = &self.fail_image {
                if spec.image().starts_with(prefix.as_str()) {
                    return Err(EngineError::CommandFailed {
                        command: format!("docker run {}", spec.image()),
                        exit_code: Some(1),
                        stderr: "boom".to_string(),
                    }
                    .into());
                }
            }

            let command = spec.redacted_command();
            let output_file = match command.first().map(String::as_str) {
                Some("go") => command
                    .iter()
                    .position(|arg| arg == "-o")
                    .and_then(|i| command.get(i + 1))
                    .cloned(),
                _ => command
                    .iter()
                    .find_map(|arg| arg.split_once('=').map(|(_, path)| path.to_string()))
                    .filter(|path| path.starts_with("/out/")),
            };
            if let Some(file) = output_file {
                let path = host_path(spec, &file).expect("output is mounted");
                tokio::fs::write(&path, b"artifact").await.unwrap();
            }

            let stdout = if command.first().map(String::as_str) == Some("sign") {
                "tlog entry created\n".to_string()
            } else {
                String::new()
            };
            Ok(ExecOutput {
                stdout,
                stderr: String::new(),
            })
        }

        async fn login(&self, _ctx: &EngineContext, auth: &RegistryAuth) -> Result<(), Error> {
            self.calls.lock().unwrap().push(Call::Login(auth.clone()));
            Ok(())
        }

        async fn build_image(
            &self,
            _ctx: &EngineContext,
            request: &ImageBuildRequest,
        ) -> Result<PublishedImage, Error> {
            self.calls.lock().unwrap().push(Call::Build(request.clone()));
            Ok(PublishedImage {
                refs: request.tags.clone(),
                digest: DIGEST.to_string(),
            })
        }
    }

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        engine: Arc<RecordingEngine>,
        pipeline: Pipeline,
        events: EventReceiver,
    }

    async fn fixture_with(engine: RecordingEngine, configure: impl FnOnce(&mut Config)) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().to_path_buf();
        tokio::fs::write(
            source.join("go.mod"),
            "module github.com/goharbor/harbor-cli\n\ngo 1.24.2\n",
        )
        .await
        .unwrap();
        tokio::fs::write(source.join("LICENSE"), "Apache License").await.unwrap();

        let mut config = Config::default();
        config.image.registry = Some("registry.example.com".to_string());
        config.project.app_version = Some("v1.2.3".to_string());
        configure(&mut config);

        let engine = Arc::new(engine);
        let (tx, events) = channel();
        let pipeline = Pipeline::new(
            config,
            &source,
            engine.clone(),
            EngineContext::new(Some(tx)).with_correlation_id("test-run"),
        );

        Fixture {
            _dir: dir,
            source,
            engine,
            pipeline,
            events,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(RecordingEngine::default(), |_| {}).await
    }

    fn creds() -> RegistryCredentials {
        RegistryCredentials::new("robot$ci", Secret::new("s3cret"))
    }

    fn stage_events(rx: &mut EventReceiver) -> Vec<(Stage, &'static str)> {
        let mut stages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let AppEvent::Pipeline(event) = message.event {
                match event {
                    PipelineEvent::StageStarted { stage, .. } => stages.push((stage, "started")),
                    PipelineEvent::StageCompleted { stage, .. } => {
                        stages.push((stage, "completed"));
                    }
                    PipelineEvent::StageFailed { stage, .. } => stages.push((stage, "failed")),
                    _ => {}
                }
            }
        }
        stages
    }

    async fn tar_entries(path: &Path) -> Vec<String> {
        use async_compression::tokio::bufread::GzipDecoder;
        use tokio::io::{AsyncReadExt, BufReader};

        let file = tokio::fs::File::open(path).await.unwrap();
        let mut decoder = GzipDecoder::new(BufReader::new(file));
        let mut tar_bytes = Vec::new();
        decoder.read_to_end(&mut tar_bytes).await.unwrap();

        let mut archive = tar::Archive::new(tar_bytes.as_slice());
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                entry.path().unwrap().display().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_detect_uses_override_and_go_mod() {
        let mut fx = fixture().await;
        let info = fx.pipeline.detect().await.unwrap();
        assert_eq!(info.app_version, "v1.2.3");
        assert_eq!(info.go_version, "1.24.2");
        assert!(info.build_time.ends_with('Z'));
        assert_eq!(
            stage_events(&mut fx.events),
            vec![(Stage::Detect, "started"), (Stage::Detect, "completed")]
        );
    }

    #[tokio::test]
    async fn test_detect_without_go_mod_fails() {
        let fx = fixture().await;
        tokio::fs::remove_file(fx.source.join("go.mod")).await.unwrap();
        let err = fx.pipeline.detect().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Build(BuildError::DetectionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_build_produces_full_matrix() {
        let fx = fixture().await;
        let info = fx.pipeline.detect().await.unwrap();
        let binaries = fx.pipeline.build(&info).await.unwrap();

        assert_eq!(binaries.len(), 6);
        assert!(binaries
            .iter()
            .all(|path| path.starts_with(fx.source.join("dist").join("bin"))));
        assert!(binaries
            .iter()
            .any(|path| path.ends_with("harbor-cli_v1.2.3_windows_arm64.exe")));

        let runs = fx.engine.runs();
        assert_eq!(runs.len(), 6);
        assert!(runs.iter().all(|spec| spec.image() == "golang:1.24.2"));
        assert!(runs.iter().all(|spec| spec.env_value("CGO_ENABLED").is_none()));
    }

    #[tokio::test]
    async fn test_build_failure_emits_stage_failed() {
        let mut fx = fixture_with(RecordingEngine::failing("golang"), |_| {}).await;
        let info = fx.pipeline.detect().await.unwrap();
        let err = fx.pipeline.build(&info).await.unwrap_err();

        assert!(matches!(err, Error::Build(BuildError::Failed { .. })));
        assert_eq!(fx.engine.runs().len(), 1);
        assert_eq!(
            stage_events(&mut fx.events).last(),
            Some(&(Stage::Build, "failed"))
        );
    }

    #[tokio::test]
    async fn test_archive_requires_binaries() {
        let fx = fixture().await;
        let info = fx.pipeline.detect().await.unwrap();
        let err = fx.pipeline.archive(&info).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Build(BuildError::MissingBinary { .. })
        ));
    }

    #[tokio::test]
    async fn test_archive_packages_binary_and_license() {
        let fx = fixture_with(RecordingEngine::default(), |config| {
            config.build.oses = vec![hrel_types::TargetOs::Linux, hrel_types::TargetOs::Windows];
            config.build.arches = vec![hrel_types::TargetArch::Amd64];
        })
        .await;
        let info = fx.pipeline.detect().await.unwrap();
        fx.pipeline.build(&info).await.unwrap();
        let archives = fx.pipeline.archive(&info).await.unwrap();

        assert_eq!(archives.len(), 2);
        assert!(archives[0].ends_with("harbor-cli_v1.2.3_linux_amd64.tar.gz"));
        assert!(archives[1].ends_with("harbor-cli_v1.2.3_windows_amd64.zip"));

        let entries = tar_entries(&archives[0]).await;
        assert_eq!(entries, vec!["harbor-cli", "LICENSE"]);

        let zip = zip::ZipArchive::new(std::fs::File::open(&archives[1]).unwrap()).unwrap();
        let names: Vec<&str> = zip.file_names().collect();
        assert!(names.contains(&"harbor-cli.exe"));
        assert!(names.contains(&"LICENSE"));
    }

    #[tokio::test]
    async fn test_sbom_requires_build_output() {
        let fx = fixture().await;
        let info = fx.pipeline.detect().await.unwrap();
        let err = fx.pipeline.sbom(&info).await.unwrap_err();
        assert!(matches!(err, Error::Sbom(SbomError::EmptyDist { .. })));
        assert!(err.to_string().contains("run build first"));
        assert!(fx.engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_publish_strips_v_and_pins_digest() {
        let mut fx = fixture().await;
        let info = fx.pipeline.detect().await.unwrap();
        let addresses = fx
            .pipeline
            .publish(&info, &[" v1.2.3".to_string(), "latest".to_string()], &creds())
            .await
            .unwrap();

        assert_eq!(
            addresses,
            vec![
                format!("registry.example.com/harbor-cli/harbor-cli:1.2.3@{DIGEST}"),
                format!("registry.example.com/harbor-cli/harbor-cli:latest@{DIGEST}"),
            ]
        );

        let calls = fx.engine.calls();
        assert_eq!(calls.len(), 4);
        assert!(matches!(&calls[0], Call::Run(spec) if spec.env_value("CGO_ENABLED") == Some("0")));
        match (&calls[2], &calls[3]) {
            (Call::Login(auth), Call::Build(request)) => {
                assert_eq!(auth.registry, "registry.example.com");
                assert_eq!(auth.username, "robot$ci");
                assert!(request.context_dir.ends_with("dist/linux"));
                assert_eq!(request.platforms, vec!["linux/amd64", "linux/arm64"]);
            }
            other => panic!("unexpected calls {other:?}"),
        }

        let mut resolved = None;
        while let Ok(message) = fx.events.try_recv() {
            if let AppEvent::Pipeline(PipelineEvent::TagsResolved { tags }) = message.event {
                resolved = Some(tags);
            }
        }
        assert_eq!(resolved, Some(vec!["1.2.3".to_string(), "latest".to_string()]));
    }

    #[tokio::test]
    async fn test_publish_without_registry_fails_early() {
        let fx = fixture_with(RecordingEngine::default(), |config| {
            config.image.registry = None;
        })
        .await;
        let info = fx.pipeline.detect().await.unwrap();
        let err = fx.pipeline.publish(&info, &[], &creds()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField { .. })
        ));
        assert!(fx.engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sign_rejects_incomplete_oidc() {
        let fx = fixture().await;
        let oidc = OidcCredentials {
            github_token: Some(Secret::new("ghp")),
            request_url: None,
            request_token: Some(Secret::new("req")),
        };
        let err = fx
            .pipeline
            .sign("registry.example.com/a/b:1@sha256:x", &creds(), &oidc)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::IncompleteOidc {
                url_present: false,
                token_present: true
            })
        ));
        assert!(fx.engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sign_runs_env_then_sign() {
        let fx = fixture().await;
        let output = fx
            .pipeline
            .sign(
                "registry.example.com/a/b:1@sha256:x",
                &creds(),
                &OidcCredentials::default(),
            )
            .await
            .unwrap();
        assert_eq!(output, "tlog entry created\n");

        let runs = fx.engine.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].redacted_command(), vec!["env"]);
        assert_eq!(runs[1].redacted_command()[0], "sign");
        assert!(runs
            .iter()
            .all(|spec| spec.image() == "cgr.dev/chainguard/cosign"));
    }

    #[tokio::test]
    async fn test_sign_rejects_empty_address() {
        let fx = fixture().await;
        let err = fx
            .pipeline
            .sign("  ", &creds(), &OidcCredentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Signing(SigningError::EmptyAddress)));
    }

    #[tokio::test]
    async fn test_publish_and_sign_wraps_sign_failure() {
        let fx = fixture_with(RecordingEngine::failing("cgr.dev"), |_| {}).await;
        let info = fx.pipeline.detect().await.unwrap();
        let err = fx
            .pipeline
            .publish_and_sign(&info, &[], &creds(), &OidcCredentials::default())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("failed to sign image: "));
        assert!(matches!(
            err.root(),
            Error::Signing(SigningError::SignFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_publish_and_sign_returns_first_address() {
        let fx = fixture().await;
        let info = fx.pipeline.detect().await.unwrap();
        let address = fx
            .pipeline
            .publish_and_sign(&info, &[], &creds(), &OidcCredentials::default())
            .await
            .unwrap();
        assert_eq!(
            address,
            format!("registry.example.com/harbor-cli/harbor-cli:latest@{DIGEST}")
        );

        let runs = fx.engine.runs();
        let sign = runs.last().unwrap();
        assert!(sign.redacted_command().contains(&address));
    }

    #[tokio::test]
    async fn test_release_runs_stages_in_order() {
        let mut fx = fixture().await;
        let info = fx.pipeline.detect().await.unwrap();
        let report = fx
            .pipeline
            .release(&info, &[], &creds(), &OidcCredentials::default())
            .await
            .unwrap();

        assert_eq!(report.binaries.len(), 6);
        assert_eq!(report.archives.len(), 6);
        assert_eq!(report.sboms.len(), 6);
        assert_eq!(report.addresses.len(), 2);
        assert_eq!(
            report.signed,
            format!("registry.example.com/harbor-cli/harbor-cli:1.2.3@{DIGEST}")
        );
        assert!(report.sboms[0]
            .to_string_lossy()
            .ends_with("harbor-cli_v1.2.3_linux_amd64.tar.gz.sbom.json"));

        let completed: Vec<Stage> = stage_events(&mut fx.events)
            .into_iter()
            .filter(|(_, state)| *state == "completed")
            .map(|(stage, _)| stage)
            .collect();
        assert_eq!(
            completed,
            vec![
                Stage::Detect,
                Stage::Build,
                Stage::Archive,
                Stage::Build,
                Stage::Publish,
                Stage::Sign,
                Stage::Sbom,
            ]
        );

        // 6 release builds + 2 image builds + cosign env/sign + 6 syft scans
        assert_eq!(fx.engine.runs().len(), 16);
    }

    #[tokio::test]
    async fn test_release_validates_oidc_before_building() {
        let fx = fixture().await;
        let info = fx.pipeline.detect().await.unwrap();
        let oidc = OidcCredentials {
            github_token: Some(Secret::new("ghp")),
            request_url: Some("https://token.actions".to_string()),
            request_token: None,
        };
        let err = fx
            .pipeline
            .release(&info, &[], &creds(), &oidc)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::IncompleteOidc { .. })));
        assert!(fx.engine.calls().is_empty());
    }
}
