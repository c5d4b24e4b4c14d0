//! Cosign image signing

use hrel_config::SignConfig;
use hrel_engine::{ContainerSpec, ExecArg};
use hrel_errors::{Error, SigningError};
use hrel_events::{AppEvent, EventEmitter, PipelineEvent, Stage};

use crate::credentials::{OidcCredentials, RegistryCredentials};
use crate::Pipeline;

/// The two cosign invocations: `cosign env`, then `cosign sign`
///
/// The registry password is exposed both as `REGISTRY_PASSWORD` and as a
/// secret argument; OIDC values are only set when a GitHub token is present.
#[must_use]
pub fn cosign_specs(
    settings: &SignConfig,
    address: &str,
    credentials: &RegistryCredentials,
    oidc: &OidcCredentials,
) -> (ContainerSpec, ContainerSpec) {
    let mut base = ContainerSpec::from(&settings.cosign_image).entrypoint("cosign");
    for (name, value) in oidc.env() {
        base = base.secret_env(name, value);
    }
    base = base.secret_env("REGISTRY_PASSWORD", credentials.password.clone());

    let env = base.clone().exec(["env"]);

    let mut args: Vec<ExecArg> = vec!["sign".into(), "--yes".into()];
    if settings.recursive {
        args.push("--recursive".into());
    }
    args.extend([
        "--registry-username".into(),
        credentials.username.as_str().into(),
        "--registry-password".into(),
        ExecArg::Secret(credentials.password.clone()),
        address.into(),
        "--timeout".into(),
        settings.timeout.as_str().into(),
    ]);

    (env, base.exec(args))
}

impl Pipeline {
    /// Sign `address` with cosign and return cosign's output
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::IncompleteOidc` for a partial OIDC triple and
    /// `SigningError::SignFailed` when cosign fails.
    pub async fn sign(
        &self,
        address: &str,
        credentials: &RegistryCredentials,
        oidc: &OidcCredentials,
    ) -> Result<String, Error> {
        oidc.validate()?;

        let address = address.trim();
        if address.is_empty() {
            return Err(SigningError::EmptyAddress.into());
        }
        if !address.contains('@') {
            self.emit_warning(format!(
                "signing {address} by tag; the signature follows the digest the tag points to now"
            ));
        }
        if oidc.github_token.is_some() {
            self.emit_debug("keyless signing with the GitHub Actions OIDC token");
        }

        self.stage(Stage::Sign, &[], async {
            let (env, sign) = cosign_specs(&self.config().sign, address, credentials, oidc);
            let failed = |e: Error| SigningError::SignFailed {
                image: address.to_string(),
                message: e.to_string(),
            };

            self.engine.run(&self.ctx, &env).await.map_err(failed)?;
            let output = self.engine.run(&self.ctx, &sign).await.map_err(failed)?;

            self.emit(AppEvent::Pipeline(PipelineEvent::ImageSigned {
                address: address.to_string(),
            }));
            Ok::<_, Error>(output.stdout)
        })
        .await
    }
}
