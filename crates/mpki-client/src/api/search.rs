//! Certificate search endpoints.

use crate::MpkiClient;
use mpki_core::{Result, SyncPage};
use serde::Serialize;

/// Default number of certificates per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Certificate search endpoints
pub struct SearchApi<'a> {
    client: &'a MpkiClient,
}

impl<'a> SearchApi<'a> {
    pub(crate) const fn new(client: &'a MpkiClient) -> Self {
        Self { client }
    }

    /// Search certificates issued under a profile
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let page = client
    ///     .search()
    ///     .profile("2.16.840.1.113733.1.16.1.5.2.5.1.1234")
    ///     .start_index(50)
    ///     .send()
    ///     .await?;
    /// println!("{} total", page.total_count);
    /// ```
    #[must_use]
    pub fn profile(&self, profile_id: impl Into<String>) -> SearchRequestBuilder<'a> {
        SearchRequestBuilder::new(self.client, profile_id.into())
    }
}

/// Builder for certificate search requests
pub struct SearchRequestBuilder<'a> {
    client: &'a MpkiClient,
    body: SearchBody,
}

#[derive(Debug, Serialize)]
struct SearchBody {
    profile_id: String,
    start_index: u64,
    page_size: u32,
}

impl<'a> SearchRequestBuilder<'a> {
    const fn new(client: &'a MpkiClient, profile_id: String) -> Self {
        Self {
            client,
            body: SearchBody {
                profile_id,
                start_index: 0,
                page_size: DEFAULT_PAGE_SIZE,
            },
        }
    }

    /// Zero-based index of the first certificate to return
    #[must_use]
    pub const fn start_index(mut self, index: u64) -> Self {
        self.body.start_index = index;
        self
    }

    /// Number of certificates per page
    #[must_use]
    pub const fn page_size(mut self, size: u32) -> Self {
        self.body.page_size = size;
        self
    }

    /// Execute the search
    pub async fn send(self) -> Result<SyncPage> {
        self.client.post(&["mpki", "api", "v1", "searchcert"], &self.body).await
    }
}
