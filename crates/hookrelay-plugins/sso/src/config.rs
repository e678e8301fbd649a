//! `[plugins.sso]` settings.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::error;

use crate::error::SsoError;

/// The `plugins.sso` section as written. Required keys are optional here so
/// that every missing one can be reported.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SsoSettings {
    #[serde(deserialize_with = "text")]
    pub realm: Option<String>,
    #[serde(deserialize_with = "text")]
    pub auth_realm: Option<String>,
    #[serde(deserialize_with = "text")]
    pub hostname: Option<String>,
    #[serde(deserialize_with = "text")]
    pub client_id: Option<String>,
    #[serde(deserialize_with = "text")]
    pub service_username: Option<String>,
    #[serde(deserialize_with = "text")]
    pub service_password: Option<String>,
    #[serde(deserialize_with = "text")]
    pub scheme: Option<String>,
    #[serde(deserialize_with = "text")]
    pub context_path: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub accept_invalid_certs: Option<bool>,
    #[serde(deserialize_with = "millis")]
    pub timeout_ms: Option<u64>,
}

/// Scalar as written in a file or an environment variable.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// Strings, numbers and booleans as text; blank counts as unset.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .filter(|s| !s.trim().is_empty()))
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Bool(b)) => Ok(Some(b)),
        Some(other) => match other.into_text().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            v => Err(serde::de::Error::custom(format!("invalid boolean '{v}'"))),
        },
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Int(n)) => Ok(Some(n)),
        Some(other) => {
            let v = other.into_text();
            v.trim()
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid milliseconds '{v}'")))
        }
    }
}

/// Validated plugin settings.
#[derive(Clone)]
pub struct SsoConfig {
    /// Realm the clients are managed in.
    pub realm: String,
    /// Realm the service account authenticates against; defaults to `realm`.
    pub auth_realm: Option<String>,
    /// `host[:port]` of the identity provider.
    pub hostname: String,
    /// Client used for the password grant.
    pub client_id: String,
    pub service_username: String,
    pub service_password: String,
    pub scheme: String,
    /// Path prefix of the Keycloak endpoints (`/auth` on older servers).
    pub context_path: String,
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

impl TryFrom<SsoSettings> for SsoConfig {
    type Error = SsoError;

    /// Logs every missing required key before failing.
    fn try_from(settings: SsoSettings) -> Result<Self, SsoError> {
        let required = [
            ("realm", &settings.realm),
            ("hostname", &settings.hostname),
            ("client_id", &settings.client_id),
            ("service_username", &settings.service_username),
            ("service_password", &settings.service_password),
        ];
        for (key, value) in required {
            if value.is_none() {
                error!(key, "SSO configuration key is missing or empty");
            }
        }

        let (
            Some(realm),
            Some(hostname),
            Some(client_id),
            Some(service_username),
            Some(service_password),
        ) = (
            settings.realm,
            settings.hostname,
            settings.client_id,
            settings.service_username,
            settings.service_password,
        )
        else {
            return Err(SsoError::MissingConfiguration);
        };

        Ok(Self {
            realm,
            auth_realm: settings.auth_realm,
            hostname,
            client_id,
            service_username,
            service_password,
            scheme: settings.scheme.unwrap_or_else(|| "https".to_string()),
            context_path: settings
                .context_path
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "/auth".to_string()),
            accept_invalid_certs: settings.accept_invalid_certs.unwrap_or(true),
            timeout: Duration::from_millis(settings.timeout_ms.unwrap_or(30_000)),
        })
    }
}

impl SsoConfig {
    /// Realm used for the password grant.
    pub fn authentication_realm(&self) -> &str {
        self.auth_realm.as_deref().unwrap_or(&self.realm)
    }

    fn base_url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.hostname, self.context_path)
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url(),
            self.authentication_realm()
        )
    }

    pub fn clients_url(&self) -> String {
        format!("{}/admin/realms/{}/clients", self.base_url(), self.realm)
    }

    pub fn client_url(&self, id: &str) -> String {
        format!("{}/{id}", self.clients_url())
    }
}

impl std::fmt::Debug for SsoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoConfig")
            .field("realm", &self.realm)
            .field("auth_realm", &self.auth_realm)
            .field("hostname", &self.hostname)
            .field("client_id", &self.client_id)
            .field("service_username", &self.service_username)
            .field("service_password", &"<redacted>")
            .field("scheme", &self.scheme)
            .field("context_path", &self.context_path)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout", &self.timeout)
            .finish()
    }
}
