//! Service principal authentication through azure_identity.

use crate::config::{Credentials, ARM_SCOPE};
use crate::error::{Error, Result};
use azure_core::auth::TokenCredential;
use azure_identity::ClientSecretCredential;

/// Client-secret credential scoped to the management plane.
pub struct ServicePrincipal {
    credential: ClientSecretCredential,
}

impl ServicePrincipal {
    pub fn new(credentials: &Credentials, authority_host: &str) -> Result<ServicePrincipal> {
        let authority = azure_core::Url::parse(authority_host).map_err(|e| Error::InvalidSetting {
            name: "AUTHORITY_HOST",
            reason: e.to_string(),
        })?;
        log::debug!(
            "ServicePrincipal client_id={} tenant_id={} authority={authority}",
            credentials.client_id,
            credentials.tenant_id
        );
        let credential = ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority,
            credentials.tenant_id.clone(),
            credentials.client_id.clone(),
            credentials.client_secret.clone(),
        );
        Ok(ServicePrincipal { credential })
    }

    /// Bearer token for Azure Resource Manager.
    pub async fn bearer_token(&self) -> Result<String> {
        let token = self.credential.get_token(&[ARM_SCOPE]).await?;
        log::trace!("got token expiring {}", token.expires_on);
        Ok(token.token.secret().to_string())
    }
}
