//! Default values baked into the release pipeline

pub const CONFIG_FILE_NAME: &str = "hrel.toml";

pub const PROJECT_NAME: &str = "harbor-cli";
pub const MAIN_PACKAGE: &str = "cmd/harbor/main.go";
pub const VERSION_PACKAGE: &str = "github.com/goharbor/harbor-cli/cmd/harbor/internal/version";

pub const DIST_DIR: &str = "dist";
pub const GO_IMAGE: &str = "golang";

pub const BASE_IMAGE: &str = "alpine:latest";
pub const ENTRYPOINT: &str = "/harbor";
pub const DEFAULT_TAG: &str = "latest";

pub const IMAGE_DESCRIPTION: &str =
    "Harbor CLI - A command-line interface for CNCF Harbor, the cloud native registry!";
pub const IMAGE_SOURCE: &str = "https://github.com/goharbor/harbor-cli";
pub const IMAGE_README_URL: &str =
    "https://raw.githubusercontent.com/goharbor/harbor-cli/main/README.md";
pub const IMAGE_LICENSE: &str = "Apache-2.0";

pub const COSIGN_IMAGE: &str = "cgr.dev/chainguard/cosign";
pub const COSIGN_TIMEOUT: &str = "1m";

pub const SYFT_IMAGE: &str = "anchore/syft:latest";
pub const SBOM_FORMAT: &str = "cyclonedx-json";

pub const ENGINE_PROGRAM: &str = "docker";
