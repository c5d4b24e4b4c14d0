//! Registry and keyless-signing credentials

use hrel_errors::ConfigError;
use hrel_types::Secret;

/// Username and password for the image registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: Secret,
}

impl RegistryCredentials {
    pub fn new(username: impl Into<String>, password: Secret) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// GitHub Actions OIDC values used by cosign for keyless signing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OidcCredentials {
    pub github_token: Option<Secret>,
    pub request_url: Option<String>,
    pub request_token: Option<Secret>,
}

impl OidcCredentials {
    /// A GitHub token is only usable together with both request values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::IncompleteOidc` when the token is set but the
    /// request URL is empty or the request token is missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github_token.is_none() {
            return Ok(());
        }

        let url_present = self
            .request_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        let token_present = self.request_token.is_some();

        if url_present && token_present {
            Ok(())
        } else {
            Err(ConfigError::IncompleteOidc {
                url_present,
                token_present,
            })
        }
    }

    /// Variables to expose to cosign, all passed as secrets
    #[must_use]
    pub fn env(&self) -> Vec<(&'static str, Secret)> {
        let (Some(token), Some(url), Some(request_token)) = (
            self.github_token.as_ref(),
            self.request_url.as_ref(),
            self.request_token.as_ref(),
        ) else {
            return Vec::new();
        };

        vec![
            ("GITHUB_TOKEN", token.clone()),
            ("ACTIONS_ID_TOKEN_REQUEST_URL", Secret::new(url.clone())),
            ("ACTIONS_ID_TOKEN_REQUEST_TOKEN", request_token.clone()),
        ]
    }
}
