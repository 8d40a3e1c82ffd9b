use serde::{Deserialize, Serialize};

use super::client::check_status;
use super::OidcError;

/// Subset of the OpenID discovery document this service consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    pub jwks_uri: String,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
}

impl ProviderMetadata {
    pub fn discovery_url(issuer: &str) -> String {
        format!("{}/.well-known/openid-configuration", issuer.trim_end_matches('/'))
    }

    /// Fetch the discovery document and check it describes `issuer`
    pub async fn discover(http: &reqwest::Client, issuer: &str) -> Result<Self, OidcError> {
        let url = Self::discovery_url(issuer);
        tracing::debug!("Fetching OIDC discovery document from {}", url);

        let response = check_status(http.get(&url).send().await?).await?;
        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| OidcError::InvalidResponse(format!("discovery document: {}", e)))?;

        metadata.ensure_issuer(issuer)?;
        Ok(metadata)
    }

    fn ensure_issuer(&self, expected: &str) -> Result<(), OidcError> {
        if self.issuer.trim_end_matches('/') != expected.trim_end_matches('/') {
            return Err(OidcError::Configuration(format!(
                "discovery document advertises issuer '{}', expected '{}'",
                self.issuer, expected
            )));
        }
        Ok(())
    }
}
