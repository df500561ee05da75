//! Profile API endpoints.

use crate::MpkiClient;
use mpki_core::{CertificateProfile, Result};

/// Profile API endpoints
pub struct ProfileApi<'a> {
    client: &'a MpkiClient,
}

impl<'a> ProfileApi<'a> {
    pub(crate) const fn new(client: &'a MpkiClient) -> Self {
        Self { client }
    }

    /// List every certificate profile visible to the account
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// for profile in client.profiles().list().await? {
    ///     println!("{} {:?}", profile.id, profile.name);
    /// }
    /// ```
    pub async fn list(&self) -> Result<Vec<CertificateProfile>> {
        self.client.get(&["mpki", "api", "v1", "profile"]).await
    }

    /// Profile ids only
    pub async fn ids(&self) -> Result<Vec<String>> {
        Ok(self.list().await?.into_iter().map(|p| p.id).collect())
    }
}
