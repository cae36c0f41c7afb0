//! Credentials for the control-plane client.

use std::fmt;
use std::sync::Arc;

use sidecar_core::{Environment, ProcessEnvironment};

use crate::error::CredentialsError;

const ACCESS_KEY_VARS: [&str; 2] = ["AWS_ACCESS_KEY_ID", "AWS_ACCESS_KEY"];
const SECRET_KEY_VARS: [&str; 2] = ["AWS_SECRET_ACCESS_KEY", "AWS_SECRET_KEY"];
const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Supplies credentials to a [`ControlPlaneFactory`].
///
/// [`ControlPlaneFactory`]: crate::control_plane::ControlPlaneFactory
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> Result<Credentials, CredentialsError>;
}

/// Credentials from the standard environment variables.
#[derive(Clone)]
pub struct EnvironmentCredentials {
    env: Arc<dyn Environment>,
}

impl EnvironmentCredentials {
    pub fn new(env: Arc<dyn Environment>) -> Self {
        Self { env }
    }

    pub fn from_process_env() -> Self {
        Self::new(Arc::new(ProcessEnvironment))
    }

    fn first_of(&self, names: &[&'static str]) -> Option<String> {
        names
            .iter()
            .filter_map(|name| self.env.var(name))
            .find(|value| !value.is_empty())
    }
}

impl CredentialProvider for EnvironmentCredentials {
    fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let access_key_id = self
            .first_of(&ACCESS_KEY_VARS)
            .ok_or(CredentialsError::Missing(ACCESS_KEY_VARS[0]))?;
        let secret_access_key = self
            .first_of(&SECRET_KEY_VARS)
            .ok_or(CredentialsError::Missing(SECRET_KEY_VARS[0]))?;
        Ok(Credentials {
            access_key_id,
            secret_access_key,
            session_token: self.first_of(&[SESSION_TOKEN_VAR]),
        })
    }
}

impl fmt::Debug for EnvironmentCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentCredentials").finish_non_exhaustive()
    }
}
