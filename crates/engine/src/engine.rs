//! The container engine seam

use async_trait::async_trait;
use hrel_errors::Error;
use hrel_types::Secret;

use crate::context::EngineContext;
use crate::image::{ImageBuildRequest, PublishedImage};
use crate::spec::ContainerSpec;

/// Output of a container command that exited successfully
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Credentials for a registry login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    pub registry: String,
    pub username: String,
    pub password: Secret,
}

impl RegistryAuth {
    pub fn new(registry: impl Into<String>, username: impl Into<String>, password: Secret) -> Self {
        Self {
            registry: registry.into(),
            username: username.into(),
            password,
        }
    }
}

/// Trait for running containers and publishing images
///
/// Stages only describe work; an implementation decides how it runs.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Run `spec` to completion in a fresh container
    async fn run(&self, ctx: &EngineContext, spec: &ContainerSpec) -> Result<ExecOutput, Error>;

    /// Authenticate against a registry before pushing
    async fn login(&self, ctx: &EngineContext, auth: &RegistryAuth) -> Result<(), Error>;

    /// Build and push a multi-platform image under every requested tag
    async fn build_image(
        &self,
        ctx: &EngineContext,
        request: &ImageBuildRequest,
    ) -> Result<PublishedImage, Error>;
}
