//! Container image publishing

use chrono::{SecondsFormat, Utc};
use hrel_config::Config;
use hrel_engine::{ImageBuildRequest, RegistryAuth};
use hrel_errors::{Error, PublishError};
use hrel_events::{AppEvent, EventEmitter, PipelineEvent, Stage};
use hrel_types::{normalize_tags, ImageRef, ImageTag};
use std::collections::BTreeMap;
use std::path::Path;

use crate::credentials::RegistryCredentials;
use crate::project::ProjectInfo;
use crate::Pipeline;

pub const LABEL_CREATED: &str = "org.opencontainers.image.created";
pub const LABEL_DESCRIPTION: &str = "org.opencontainers.image.description";
pub const LABEL_SOURCE: &str = "org.opencontainers.image.source";
pub const LABEL_VERSION: &str = "org.opencontainers.image.version";
pub const LABEL_README_URL: &str = "io.artifacthub.package.readme-url";
pub const LABEL_LICENSE: &str = "io.artifacthub.package.license";

/// OCI and ArtifactHub labels stamped on the runtime image
#[must_use]
pub fn image_labels(config: &Config, version: &str, created: &str) -> BTreeMap<String, String> {
    let labels = &config.image.labels;
    [
        (LABEL_CREATED, created),
        (LABEL_DESCRIPTION, labels.description.as_str()),
        (LABEL_SOURCE, labels.source.as_str()),
        (LABEL_VERSION, version),
        (LABEL_README_URL, labels.readme_url.as_str()),
        (LABEL_LICENSE, labels.license.as_str()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

/// Normalize requested tags, falling back to the configured defaults
///
/// # Errors
///
/// Returns a config error for a blank tag and `PublishError::NoTags` when
/// nothing is left to push.
pub fn resolve_tags(requested: &[String], defaults: &[String]) -> Result<Vec<ImageTag>, Error> {
    let raw = if requested.is_empty() {
        defaults
    } else {
        requested
    };
    let tags = normalize_tags(raw)?;
    if tags.is_empty() {
        return Err(PublishError::NoTags.into());
    }
    Ok(tags)
}

/// Describe the multi-platform image for `tags`
///
/// # Errors
///
/// Returns `ConfigError::MissingField` when no registry is configured.
pub fn image_request(
    config: &Config,
    info: &ProjectInfo,
    tags: &[ImageTag],
    context_dir: &Path,
    created: &str,
) -> Result<ImageBuildRequest, Error> {
    let registry = config.registry()?;
    let image = &config.image;
    let names = info.names();
    let prefix = format!("{}_{}_linux_", names.project(), names.version());

    let mut request = ImageBuildRequest::new(context_dir, &image.base_image, prefix)
        .entrypoint(&image.entrypoint)
        .smoke_test(image.smoke_test);

    for target in config.image_targets() {
        request = request.platform(target.platform());
    }
    for tag in tags {
        request = request.tag(ImageRef::new(
            registry,
            config.namespace(),
            config.repository(),
            tag.clone(),
        ));
    }
    for (key, value) in image_labels(config, &info.app_version, created) {
        request = request.label(key, value);
    }

    Ok(request)
}

impl Pipeline {
    /// Build the linux binaries, then push one multi-platform image per tag
    ///
    /// Returns the pushed addresses pinned to the manifest digest, one per
    /// tag in request order.
    ///
    /// # Errors
    ///
    /// Returns an error if the build, login or push fails.
    pub async fn publish(
        &self,
        info: &ProjectInfo,
        tags: &[String],
        credentials: &RegistryCredentials,
    ) -> Result<Vec<String>, Error> {
        let registry = self.config().registry()?.to_string();
        let tags = resolve_tags(tags, &self.config().image.default_tags)?;
        self.emit(AppEvent::Pipeline(PipelineEvent::TagsResolved {
            tags: tags.iter().map(ToString::to_string).collect(),
        }));

        self.build_image_binaries(info).await?;

        let targets = self.config().image_targets();
        self.stage(Stage::Publish, &targets, async {
            let created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            let context_dir = self.dist_dir().join("linux");
            let request = image_request(self.config(), info, &tags, &context_dir, &created)?;

            let auth = RegistryAuth::new(
                &registry,
                &credentials.username,
                credentials.password.clone(),
            );
            self.engine.login(&self.ctx, &auth).await?;

            let published = self.engine.build_image(&self.ctx, &request).await?;
            let addresses = published.addresses();
            if addresses.is_empty() {
                return Err(PublishError::NoAddresses.into());
            }

            for address in &addresses {
                tracing::info!(%address, "published image");
                self.emit(AppEvent::Pipeline(PipelineEvent::ImagePublished {
                    address: address.clone(),
                }));
            }
            Ok::<_, Error>(addresses)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ProjectInfo {
        ProjectInfo {
            name: "harbor-cli".to_string(),
            app_version: "v0.2.0".to_string(),
            go_version: "1.24.2".to_string(),
            git_commit: String::new(),
            build_time: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn tags_fall_back_to_defaults() {
        let defaults = vec!["latest".to_string()];
        let tags = resolve_tags(&[], &defaults).unwrap();
        assert_eq!(tags[0].as_str(), "latest");

        let tags = resolve_tags(&[" v1.2.3 ".to_string()], &defaults).unwrap();
        assert_eq!(tags[0].as_str(), "1.2.3");

        assert!(resolve_tags(&[], &[]).is_err());
        assert!(resolve_tags(&["  ".to_string()], &defaults).is_err());
    }

    #[test]
    fn request_needs_registry() {
        let config = Config::default();
        let tags = resolve_tags(&[], &config.image.default_tags).unwrap();
        let err = image_request(&config, &info(), &tags, Path::new("/d"), "now").unwrap_err();
        assert!(err.to_string().contains("registry"));
    }

    #[test]
    fn request_carries_labels_and_refs() {
        let mut config = Config::default();
        config.image.registry = Some("demo.goharbor.io".to_string());
        let tags = resolve_tags(&["v0.2.0".to_string(), "latest".to_string()], &[]).unwrap();

        let request = image_request(
            &config,
            &info(),
            &tags,
            Path::new("/dist/linux"),
            "2025-02-02T00:00:00Z",
        )
        .unwrap();

        assert_eq!(request.platforms, vec!["linux/amd64", "linux/arm64"]);
        assert_eq!(request.binary_prefix, "harbor-cli_v0.2.0_linux_");
        assert_eq!(
            request.tags[0].to_string(),
            "demo.goharbor.io/harbor-cli/harbor-cli:0.2.0"
        );
        assert_eq!(request.labels[LABEL_VERSION], "v0.2.0");
        assert_eq!(request.labels[LABEL_CREATED], "2025-02-02T00:00:00Z");
        assert_eq!(request.labels[LABEL_LICENSE], "Apache-2.0");
        assert_eq!(request.labels.len(), 6);
    }
}
