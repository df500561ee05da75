//! Certificate lifecycle operations over a provider transport.

use crate::builder::{EnrollmentRequestBuilder, SanMap};
use crate::catalog::{ParamKind, TemplateCatalog};
use crate::config::GatewayConfig;
use crate::csr::ParsedCsr;
use crate::index::ProfileAttributeIndex;
use crate::mapper::{map_status, revoke_reason_to_provider};
use crate::sync::{SyncPaginator, SyncSummary, DEFAULT_PAGE_SIZE};
use chrono::{DateTime, Utc};
use mpki_client::MpkiClient;
use mpki_core::{
    CertificateLookup, CertificateRecord, CertificateStatus, EnrollmentOutcome,
    EnrollmentProductInfo, EnrollmentRequest, EnrollmentResult, EnrollmentType, MpkiError,
    MpkiTransport, RequestDisposition, Result, RevokeOutcome, RevokeRequest, SyncRecord,
};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Product parameter carrying the serial of the certificate being renewed
pub const PRIOR_CERT_SN: &str = "PriorCertSN";

/// Entry point for enrollment, renewal, revocation, lookup and sync.
///
/// Every call builds its own CSR, profile index and request; a `Gateway`
/// can be shared between concurrent callers.
pub struct Gateway<T> {
    transport: T,
    catalog: TemplateCatalog,
    page_size: u32,
}

impl Gateway<MpkiClient> {
    /// Validate `config`, then connect the REST client and discover templates
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        let catalog = TemplateCatalog::discover(&config.template_dir)?;
        info!(
            base_url = %config.base_url,
            templates = catalog.len(),
            "gateway configured"
        );
        Ok(Self::new(config.client()?, catalog).with_page_size(config.page_size))
    }
}

impl<T: MpkiTransport> Gateway<T> {
    /// Create a gateway over a transport and template catalog
    pub fn new(transport: T, catalog: TemplateCatalog) -> Self {
        Self {
            transport,
            catalog,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the synchronization page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// The underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The template catalog
    pub const fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Submit a new enrollment
    #[instrument(skip(self, csr, san, product), fields(product = %product.product_id))]
    pub async fn enroll(
        &self,
        csr: &str,
        san: &SanMap,
        product: &EnrollmentProductInfo,
    ) -> Result<EnrollmentResult> {
        let request = match self.build_request(csr, san, product).await {
            Ok(request) => request,
            Err(e) if e.is_request_error() => return Ok(enrollment_failed(&e)),
            Err(e) => return Err(e),
        };

        let outcome = self.transport.enroll(&request).await?;
        self.complete(outcome, |serial| {
            format!("Order successfully created with serial number {serial}.")
        })
        .await
    }

    /// Renew the certificate named by the `PriorCertSN` product parameter
    #[instrument(skip(self, csr, san, product), fields(product = %product.product_id))]
    pub async fn renew(
        &self,
        csr: &str,
        san: &SanMap,
        product: &EnrollmentProductInfo,
    ) -> Result<EnrollmentResult> {
        let Some(prior) = product
            .product_parameters
            .get(PRIOR_CERT_SN)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        else {
            return Ok(EnrollmentResult::failed(format!(
                "Enrollment Failed: the {PRIOR_CERT_SN} product parameter is required for renewal"
            )));
        };

        let request = match self.build_request(csr, san, product).await {
            Ok(request) => request,
            Err(e) if e.is_request_error() => return Ok(enrollment_failed(&e)),
            Err(e) => return Err(e),
        };

        debug!(prior = %prior, "renewing certificate");
        let outcome = self.transport.renew(prior, &request).await?;
        self.complete(outcome, |serial| {
            format!("Certificate renewal successful with serial number {serial}.")
        })
        .await
    }

    /// Dispatch on the enrollment type; reissue is handled as renewal
    pub async fn enroll_with_type(
        &self,
        kind: EnrollmentType,
        csr: &str,
        san: &SanMap,
        product: &EnrollmentProductInfo,
    ) -> Result<EnrollmentResult> {
        match kind {
            EnrollmentType::New => self.enroll(csr, san, product).await,
            EnrollmentType::Renew | EnrollmentType::RenewOrReissue => {
                self.renew(csr, san, product).await
            }
        }
    }

    /// Revoke a certificate by hex serial.
    ///
    /// The reason is checked before anything is sent to the provider.
    #[instrument(skip(self))]
    pub async fn revoke(&self, hex_serial: &str, reason_code: u32) -> Result<RequestDisposition> {
        let revocation_reason = revoke_reason_to_provider(reason_code)?.to_string();

        let serial = match hex_serial.trim().trim_start_matches('0') {
            "" => "0",
            trimmed => trimmed,
        };

        let request = RevokeRequest { revocation_reason };
        match self.transport.revoke(serial, &request).await? {
            RevokeOutcome::Revoked(_) => {
                info!(serial, "certificate revoked");
                Ok(RequestDisposition::Revoked)
            }
            RevokeOutcome::Rejected(errors) => {
                warn!(serial, errors = %errors.flatten(), "revocation rejected");
                Ok(RequestDisposition::Failed)
            }
        }
    }

    /// Fetch one certificate; `None` for an empty request id
    #[instrument(skip(self))]
    pub async fn get_single_record(&self, request_id: &str) -> Result<Option<CertificateRecord>> {
        if request_id.trim().is_empty() {
            warn!("empty request id, nothing to look up");
            return Ok(None);
        }

        let record = match self.transport.get_certificate(request_id).await? {
            CertificateLookup::Found(details) => CertificateRecord {
                request_id: request_id.to_string(),
                status: details
                    .status
                    .as_deref()
                    .map_or(CertificateStatus::Failed, map_status),
                certificate: details.certificate,
            },
            CertificateLookup::Rejected(errors) => {
                warn!(request_id, errors = %errors.flatten(), "certificate lookup rejected");
                CertificateRecord {
                    request_id: request_id.to_string(),
                    certificate: None,
                    status: CertificateStatus::Failed,
                }
            }
        };

        Ok(Some(record))
    }

    /// Run a full synchronization of every catalogued product into `sink`.
    ///
    /// Incremental synchronization is rejected before any page is fetched.
    pub async fn synchronize(
        &self,
        sink: &mpsc::Sender<SyncRecord>,
        last_sync: Option<DateTime<Utc>>,
        full_sync: bool,
        cancel: &CancellationToken,
    ) -> Result<SyncSummary> {
        if !full_sync {
            return Err(MpkiError::PartialSyncUnsupported);
        }

        let products = self.catalog.product_ids();
        info!(
            products = products.len(),
            last_sync = ?last_sync,
            page_size = self.page_size,
            "starting full synchronization"
        );

        SyncPaginator::new(&self.transport, self.page_size)
            .run(&products, sink, cancel)
            .await
    }

    /// Enrollment parameters referenced by the templates
    pub fn template_parameters(&self) -> BTreeMap<String, ParamKind> {
        self.catalog.enrollment_params()
    }

    /// Check connection settings without contacting the provider
    pub fn validate_connection(config: &GatewayConfig) -> Result<()> {
        config.validate()
    }

    async fn build_request(
        &self,
        csr: &str,
        san: &SanMap,
        product: &EnrollmentProductInfo,
    ) -> Result<EnrollmentRequest> {
        let csr = ParsedCsr::parse(csr)?;
        let profiles = self.transport.list_profiles().await?;
        let index = ProfileAttributeIndex::build(&profiles, &product.product_id);
        EnrollmentRequestBuilder::new(&self.catalog, &index, &csr).build(product, san)
    }

    async fn complete(
        &self,
        outcome: EnrollmentOutcome,
        message: impl FnOnce(&str) -> String + Send,
    ) -> Result<EnrollmentResult> {
        let success = match outcome {
            EnrollmentOutcome::Accepted(success) => success,
            EnrollmentOutcome::Rejected(errors) => {
                warn!(errors = %errors.flatten(), "provider rejected enrollment");
                return Ok(EnrollmentResult::failed(format!(
                    "Enrollment Failed: {}",
                    errors.flatten()
                )));
            }
        };

        let certificate = match success.certificate {
            Some(cert) => Some(cert),
            None => match self.transport.get_certificate(&success.serial_number).await {
                Ok(CertificateLookup::Found(details)) => details.certificate,
                Ok(CertificateLookup::Rejected(errors)) => {
                    warn!(serial = %success.serial_number, errors = %errors.flatten(), "issued certificate not retrievable yet");
                    None
                }
                Err(e) => {
                    warn!(serial = %success.serial_number, error = %e, "issued certificate lookup failed");
                    None
                }
            },
        };

        info!(serial = %success.serial_number, "enrollment accepted");
        Ok(EnrollmentResult {
            status: CertificateStatus::Generated,
            message: message(&success.serial_number),
            request_id: Some(success.serial_number),
            certificate,
        })
    }
}

fn enrollment_failed(error: &MpkiError) -> EnrollmentResult {
    warn!(error = %error, "enrollment request could not be built");
    EnrollmentResult::failed(format!("Enrollment Failed: {error}"))
}
