//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// hrel - release pipeline for the Harbor CLI
#[derive(Parser)]
#[command(name = "hrel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build, package, publish and sign Harbor CLI releases")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Project checkout to release
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub source: PathBuf,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Container engine binary (docker, podman)
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub engine: Option<String>,

    /// Always pull tool images before running them
    #[arg(long, global = true)]
    pub pull: bool,

    /// Registry host images are pushed to
    #[arg(long, global = true, value_name = "HOST")]
    pub registry: Option<String>,

    /// Override the detected application version
    #[arg(long, global = true, value_name = "VERSION")]
    pub app_version: Option<String>,

    /// Override the Go version read from go.mod
    #[arg(long, global = true, value_name = "VERSION")]
    pub go_version: Option<String>,
}

/// Registry login, shared by the pushing commands
#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    /// Registry username
    #[arg(long, env = "REGISTRY_USERNAME")]
    pub username: String,

    /// Registry password
    #[arg(long, env = "REGISTRY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// GitHub Actions OIDC values for keyless signing
#[derive(Args, Debug, Clone, Default)]
pub struct OidcArgs {
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    #[arg(long, env = "ACTIONS_ID_TOKEN_REQUEST_URL", hide_env_values = true)]
    pub actions_id_token_request_url: Option<String>,

    #[arg(long, env = "ACTIONS_ID_TOKEN_REQUEST_TOKEN", hide_env_values = true)]
    pub actions_id_token_request_token: Option<String>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Cross-compile the binary for every configured platform
    Build,

    /// Build and package release archives
    Archive,

    /// Generate SBOMs for the archives in the dist directory
    Sbom,

    /// Build and push the multi-platform runtime image
    Publish {
        /// Image tags (defaults to the configured tags)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Sign a published image with cosign
    Sign {
        /// Image address, ideally pinned by digest (image@sha256:...)
        address: String,

        #[command(flatten)]
        registry: RegistryArgs,

        #[command(flatten)]
        oidc: OidcArgs,
    },

    /// Publish the image and sign its first address
    #[command(name = "publish-and-sign")]
    PublishAndSign {
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        #[command(flatten)]
        registry: RegistryArgs,

        #[command(flatten)]
        oidc: OidcArgs,
    },

    /// Run build, archive, publish, sign and sbom in order
    Release {
        /// Image tags (defaults to the version and latest)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        #[command(flatten)]
        registry: RegistryArgs,

        #[command(flatten)]
        oidc: OidcArgs,
    },

    /// Print the effective configuration as TOML
    Config,
}

impl Commands {
    /// Name used for operation events and logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Archive => "archive",
            Self::Sbom => "sbom",
            Self::Publish { .. } => "publish",
            Self::Sign { .. } => "sign",
            Self::PublishAndSign { .. } => "publish-and-sign",
            Self::Release { .. } => "release",
            Self::Config => "config",
        }
    }

    /// Whether the command needs a container engine
    pub fn needs_engine(&self) -> bool {
        !matches!(self, Self::Config)
    }
}
