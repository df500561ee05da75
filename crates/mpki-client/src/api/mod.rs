//! API endpoint modules.

mod certificates;
mod profiles;
mod search;

pub use certificates::CertificateApi;
pub use profiles::ProfileApi;
pub use search::{SearchApi, SearchRequestBuilder, DEFAULT_PAGE_SIZE};
