//! Composite operations chaining several stages

use hrel_errors::{Error, PublishError};
use hrel_events::EventEmitter;
use std::path::PathBuf;

use crate::credentials::{OidcCredentials, RegistryCredentials};
use crate::project::ProjectInfo;
use crate::Pipeline;

/// Everything a full release produced
#[derive(Debug, Clone)]
pub struct ReleaseReport {
    pub info: ProjectInfo,
    pub binaries: Vec<PathBuf>,
    pub archives: Vec<PathBuf>,
    pub addresses: Vec<String>,
    /// The address that was signed (the first published one)
    pub signed: String,
    pub sboms: Vec<PathBuf>,
}

/// Tags pushed by a release when none are requested: the version and `latest`
#[must_use]
pub fn release_tags(info: &ProjectInfo) -> Vec<String> {
    vec![info.app_version.clone(), "latest".to_string()]
}

impl Pipeline {
    /// Publish the image, then sign its first address
    ///
    /// # Errors
    ///
    /// Returns the OIDC validation error before anything is pushed, otherwise
    /// the publish or sign error wrapped with the failing step.
    pub async fn publish_and_sign(
        &self,
        info: &ProjectInfo,
        tags: &[String],
        credentials: &RegistryCredentials,
        oidc: &OidcCredentials,
    ) -> Result<String, Error> {
        oidc.validate()?;

        let addresses = self
            .publish(info, tags, credentials)
            .await
            .map_err(|e| e.context("failed to publish image"))?;
        let first = first_address(&addresses)?;

        self.sign(&first, credentials, oidc)
            .await
            .map_err(|e| e.context("failed to sign image"))?;

        tracing::info!(address = %first, "signed image");
        Ok(first)
    }

    /// build → archive → publish → sign → sbom
    ///
    /// # Errors
    ///
    /// Returns the first stage error; later stages do not run.
    pub async fn release(
        &self,
        info: &ProjectInfo,
        tags: &[String],
        credentials: &RegistryCredentials,
        oidc: &OidcCredentials,
    ) -> Result<ReleaseReport, Error> {
        oidc.validate()?;
        // Fail before compiling anything when publishing cannot succeed
        self.config().registry()?;

        self.emit_operation_started("release");
        let result = self.run_release(info, tags, credentials, oidc).await;
        match &result {
            Ok(_) => self.emit_operation_completed("release", true),
            Err(error) => self.emit_operation_failed("release", error),
        }
        result
    }

    async fn run_release(
        &self,
        info: &ProjectInfo,
        tags: &[String],
        credentials: &RegistryCredentials,
        oidc: &OidcCredentials,
    ) -> Result<ReleaseReport, Error> {
        let tags = if tags.is_empty() {
            release_tags(info)
        } else {
            tags.to_vec()
        };

        let binaries = self.build(info).await?;
        let archives = self.archive(info).await?;
        let addresses = self
            .publish(info, &tags, credentials)
            .await
            .map_err(|e| e.context("failed to publish image"))?;
        let signed = first_address(&addresses)?;
        self.sign(&signed, credentials, oidc)
            .await
            .map_err(|e| e.context("failed to sign image"))?;
        let sboms = self.sbom(info).await?;

        Ok(ReleaseReport {
            info: info.clone(),
            binaries,
            archives,
            addresses,
            signed,
            sboms,
        })
    }
}

fn first_address(addresses: &[String]) -> Result<String, Error> {
    addresses
        .first()
        .cloned()
        .ok_or_else(|| PublishError::NoAddresses.into())
}
