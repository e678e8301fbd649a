//! Minimal Keycloak admin REST client.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::SsoConfig;
use crate::error::SsoError;
use crate::model::{ClientRepresentation, ExistingClient};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Talks to the admin API of one realm.
#[derive(Debug, Clone)]
pub struct KeycloakClient {
    http: Client,
    config: SsoConfig,
}

impl KeycloakClient {
    pub fn new(config: SsoConfig) -> Result<Self, SsoError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SsoConfig {
        &self.config
    }

    /// Obtains an access token through the password grant.
    pub async fn authenticate(&self) -> Result<String, SsoError> {
        let config = &self.config;
        info!(
            realm = config.authentication_realm(),
            username = %config.service_username,
            "Authenticating to SSO"
        );

        let response = self
            .http
            .post(config.token_url())
            .form(&[
                ("grant_type", "password"),
                ("client_id", config.client_id.as_str()),
                ("username", config.service_username.as_str()),
                ("password", config.service_password.as_str()),
            ])
            .send()
            .await?;
        debug!(status = %response.status(), "SSO token response");

        if response.status() != StatusCode::OK {
            warn!("Error while authenticating to SSO");
            if config.auth_realm.is_none()
                && config.service_username == "admin"
                && config.realm != "master"
            {
                warn!(
                    "The built-in 'admin' user lives in the 'master' realm; \
                     set plugins.sso.auth_realm = \"master\" (or SSO_AUTH_REALM=master)"
                );
            }
            return Err(SsoError::status(response.status(), "authenticating"));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Looks up the client whose `clientId` is `client_id`.
    pub async fn find_client(
        &self,
        token: &str,
        client_id: &str,
    ) -> Result<Option<ExistingClient>, SsoError> {
        let response = self
            .http
            .get(self.config.clients_url())
            .bearer_auth(token)
            .query(&[("clientId", client_id)])
            .send()
            .await?;
        debug!(status = %response.status(), "SSO client search response");

        if response.status() != StatusCode::OK {
            return Err(SsoError::status(
                response.status(),
                "trying to check if client exists",
            ));
        }

        let mut clients: Vec<ExistingClient> = response.json().await?;
        info!(count = clients.len(), client_id, "Searched for matching clients");
        match clients.len() {
            0 => Ok(None),
            1 => Ok(clients.pop()),
            n => Err(SsoError::TooManyClients(n)),
        }
    }

    pub async fn create_client(
        &self,
        token: &str,
        client: &ClientRepresentation,
    ) -> Result<(), SsoError> {
        let response = self
            .http
            .post(self.config.clients_url())
            .bearer_auth(token)
            .json(client)
            .send()
            .await?;
        expect_status(response.status(), StatusCode::CREATED, "creating client")
    }

    pub async fn update_client(
        &self,
        token: &str,
        id: &str,
        client: &ClientRepresentation,
    ) -> Result<(), SsoError> {
        let response = self
            .http
            .put(self.config.client_url(id))
            .bearer_auth(token)
            .json(client)
            .send()
            .await?;
        expect_status(response.status(), StatusCode::NO_CONTENT, "updating client")
    }

    pub async fn delete_client(&self, token: &str, id: &str) -> Result<(), SsoError> {
        let response = self
            .http
            .delete(self.config.client_url(id))
            .bearer_auth(token)
            .send()
            .await?;
        expect_status(response.status(), StatusCode::NO_CONTENT, "deleting client")
    }
}

fn expect_status(
    actual: StatusCode,
    expected: StatusCode,
    during: &'static str,
) -> Result<(), SsoError> {
    debug!(status = %actual, during, "SSO response");
    if actual == expected {
        Ok(())
    } else {
        Err(SsoError::status(actual, during))
    }
}
