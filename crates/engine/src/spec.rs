//! Declarative description of a single container invocation

use hrel_types::Secret;
use std::fmt;
use std::path::PathBuf;

/// One argument of the container command
#[derive(Clone, PartialEq, Eq)]
pub enum ExecArg {
    Plain(String),
    /// Passed to the process but rendered as `***` everywhere else
    Secret(Secret),
}

impl ExecArg {
    /// The value handed to the child process
    #[must_use]
    pub fn expose(&self) -> &str {
        match self {
            Self::Plain(value) => value,
            Self::Secret(secret) => secret.expose(),
        }
    }

    /// The value as it may appear in logs and events
    #[must_use]
    pub fn redacted(&self) -> &str {
        match self {
            Self::Plain(value) => value,
            Self::Secret(_) => "***",
        }
    }
}

impl fmt::Debug for ExecArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.redacted())
    }
}

impl From<&str> for ExecArg {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

impl From<String> for ExecArg {
    fn from(value: String) -> Self {
        Self::Plain(value)
    }
}

impl From<&String> for ExecArg {
    fn from(value: &String) -> Self {
        Self::Plain(value.clone())
    }
}

impl From<Secret> for ExecArg {
    fn from(value: Secret) -> Self {
        Self::Secret(value)
    }
}

/// Host directory bound into the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host: PathBuf,
    pub container: String,
    pub read_only: bool,
}

/// Named engine volume that survives between runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVolume {
    pub name: String,
    pub container: String,
}

/// Everything needed to run one command in a throwaway container
///
/// Built with chained calls:
///
/// ```
/// use hrel_engine::ContainerSpec;
///
/// let spec = ContainerSpec::from("golang:1.24-alpine")
///     .env("GOOS", "linux")
///     .cache("go-mod-1.24", "/go/pkg/mod")
///     .workdir("/src")
///     .exec(["go", "version"]);
/// assert_eq!(spec.image(), "golang:1.24-alpine");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    image: String,
    platform: Option<String>,
    env: Vec<(String, String)>,
    secret_env: Vec<(String, Secret)>,
    mounts: Vec<Mount>,
    caches: Vec<CacheVolume>,
    workdir: Option<String>,
    entrypoint: Option<String>,
    command: Vec<ExecArg>,
}

impl ContainerSpec {
    /// Start a spec for `image`
    pub fn from(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            platform: None,
            env: Vec::new(),
            secret_env: Vec::new(),
            mounts: Vec::new(),
            caches: Vec::new(),
            workdir: None,
            entrypoint: None,
            command: Vec::new(),
        }
    }

    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Set a plain environment variable, replacing an earlier value
    #[must_use]
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.env.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.env.push((name, value));
        }
        self
    }

    /// Set a variable whose value must not appear on the command line
    #[must_use]
    pub fn secret_env(mut self, name: impl Into<String>, value: Secret) -> Self {
        let name = name.into();
        self.secret_env.retain(|(key, _)| *key != name);
        self.secret_env.push((name, value));
        self
    }

    #[must_use]
    pub fn mount(mut self, host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        self.mounts.push(Mount {
            host: host.into(),
            container: container.into(),
            read_only: false,
        });
        self
    }

    #[must_use]
    pub fn mount_read_only(
        mut self,
        host: impl Into<PathBuf>,
        container: impl Into<String>,
    ) -> Self {
        self.mounts.push(Mount {
            host: host.into(),
            container: container.into(),
            read_only: true,
        });
        self
    }

    #[must_use]
    pub fn cache(mut self, name: impl Into<String>, container: impl Into<String>) -> Self {
        self.caches.push(CacheVolume {
            name: name.into(),
            container: container.into(),
        });
        self
    }

    #[must_use]
    pub fn workdir(mut self, dir: impl Into<String>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    /// Set the command, replacing any previous one
    #[must_use]
    pub fn exec<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ExecArg>,
    {
        self.command = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    #[must_use]
    pub fn get_platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    #[must_use]
    pub fn get_env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Look up a plain variable by name
    #[must_use]
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn get_secret_env(&self) -> &[(String, Secret)] {
        &self.secret_env
    }

    #[must_use]
    pub fn get_mounts(&self) -> &[Mount] {
        &self.mounts
    }

    #[must_use]
    pub fn get_caches(&self) -> &[CacheVolume] {
        &self.caches
    }

    #[must_use]
    pub fn get_workdir(&self) -> Option<&str> {
        self.workdir.as_deref()
    }

    #[must_use]
    pub fn get_entrypoint(&self) -> Option<&str> {
        self.entrypoint.as_deref()
    }

    #[must_use]
    pub fn get_command(&self) -> &[ExecArg] {
        &self.command
    }

    /// Command with secret arguments replaced by `***`
    #[must_use]
    pub fn redacted_command(&self) -> Vec<String> {
        self.command
            .iter()
            .map(|arg| arg.redacted().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_keep_position() {
        let spec = ContainerSpec::from("alpine")
            .env("A", "1")
            .env("B", "2")
            .env("A", "3");
        assert_eq!(
            spec.get_env(),
            &[
                ("A".to_string(), "3".to_string()),
                ("B".to_string(), "2".to_string())
            ]
        );
        assert_eq!(spec.env_value("A"), Some("3"));
    }

    #[test]
    fn secret_args_are_redacted() {
        let spec = ContainerSpec::from("cosign").exec([
            ExecArg::from("--registry-password"),
            ExecArg::from(Secret::new("pa55")),
        ]);
        assert_eq!(spec.redacted_command(), vec!["--registry-password", "***"]);
        assert_eq!(spec.get_command()[1].expose(), "pa55");
        assert!(!format!("{spec:?}").contains("pa55"));
    }

    #[test]
    fn exec_replaces_command() {
        let spec = ContainerSpec::from("alpine")
            .exec(["echo", "one"])
            .exec(["echo", "two"]);
        assert_eq!(spec.redacted_command(), vec!["echo", "two"]);
    }
}
