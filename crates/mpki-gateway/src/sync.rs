//! Paginated full synchronization.
//!
//! Profiles are walked one after another and pages within a profile are
//! fetched sequentially, since the provider pages by a live start index.
//! Records are pushed into a bounded channel; a full channel blocks the
//! producer. Cancellation is observed before each page and each record, and
//! while waiting on a full channel. In-flight provider calls are never
//! interrupted.

use crate::mapper::{map_status, revoke_reason_from_provider};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mpki_core::{MpkiError, MpkiTransport, Result, SearchRecord, SyncRecord};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use mpki_client::DEFAULT_PAGE_SIZE;

/// Outcome of a synchronization pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Profiles paged to the end
    pub profiles: usize,
    /// Search pages fetched
    pub pages: usize,
    /// Records handed to the consumer
    pub emitted: usize,
    /// Records dropped because they could not be converted
    pub skipped: usize,
    /// Whether the pass stopped on cancellation
    pub cancelled: bool,
}

/// Drives paged certificate searches into a bounded record channel
pub struct SyncPaginator<'a, T: ?Sized> {
    transport: &'a T,
    page_size: u32,
}

impl<'a, T: MpkiTransport + ?Sized> SyncPaginator<'a, T> {
    /// Create a paginator; a zero page size is raised to one
    pub fn new(transport: &'a T, page_size: u32) -> Self {
        Self {
            transport,
            page_size: page_size.max(1),
        }
    }

    /// Synchronize every profile in `profile_ids`, in order.
    ///
    /// Transport errors end the pass. A dropped receiver ends it with
    /// [`MpkiError::SinkClosed`]. Records already sent stay valid when the
    /// pass is cancelled.
    pub async fn run(
        &self,
        profile_ids: &[String],
        sink: &mpsc::Sender<SyncRecord>,
        cancel: &CancellationToken,
    ) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();

        for profile in profile_ids {
            if !self.sync_profile(profile, sink, cancel, &mut summary).await? {
                info!(profile = %profile, "synchronization cancelled");
                summary.cancelled = true;
                break;
            }
            summary.profiles += 1;
        }

        info!(
            profiles = summary.profiles,
            pages = summary.pages,
            emitted = summary.emitted,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "synchronization finished"
        );
        Ok(summary)
    }

    /// Page through one profile. Returns `false` if cancelled.
    async fn sync_profile(
        &self,
        profile: &str,
        sink: &mpsc::Sender<SyncRecord>,
        cancel: &CancellationToken,
        summary: &mut SyncSummary,
    ) -> Result<bool> {
        let page_size = u64::from(self.page_size);
        let mut total_pages = 1;
        let mut page_index = 0;

        while page_index < total_pages {
            if cancel.is_cancelled() {
                return Ok(false);
            }

            let start_index = page_index * page_size;
            let page = self
                .transport
                .search_certificates(profile, start_index, self.page_size)
                .await?;
            summary.pages += 1;

            if page_index == 0 {
                total_pages = page.total_count.div_ceil(page_size);
                debug!(profile, total = page.total_count, pages = total_pages, "starting profile");
            }
            debug!(profile, start_index, records = page.records.len(), "fetched page");

            for record in page.records.into_iter().flatten() {
                if cancel.is_cancelled() {
                    return Ok(false);
                }

                let Some(record) = convert(record, profile) else {
                    summary.skipped += 1;
                    continue;
                };

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Ok(false),
                    sent = sink.send(record) => sent.map_err(|_| MpkiError::SinkClosed)?,
                }
                summary.emitted += 1;
            }

            page_index += 1;
        }

        Ok(true)
    }
}

/// Normalize one search record; `None` if it cannot be represented.
fn convert(record: SearchRecord, profile: &str) -> Option<SyncRecord> {
    if record.serial_number.trim().is_empty() {
        warn!(profile, "skipping record without serial number");
        return None;
    }

    let encoded: String = record
        .certificate
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .collect();
    let der = match STANDARD.decode(encoded.as_bytes()) {
        Ok(der) => der,
        Err(e) => {
            warn!(serial = %record.serial_number, error = %e, "skipping record with certificate that is not base64");
            return None;
        }
    };
    if let Err(e) = x509_parser::parse_x509_certificate(&der) {
        warn!(serial = %record.serial_number, error = %e, "skipping record with undecodable certificate");
        return None;
    }

    let revocation_reason = match record.revocation_reason.as_deref().filter(|r| !r.is_empty()) {
        None => None,
        Some(reason) => match revoke_reason_from_provider(reason) {
            Ok(code) => Some(code),
            Err(e) => {
                warn!(serial = %record.serial_number, error = %e, "skipping record with unsupported revocation reason");
                return None;
            }
        },
    };

    let product_id = match record.profile_id() {
        "" => profile.to_string(),
        id => id.to_string(),
    };

    Some(SyncRecord {
        certificate_base64: STANDARD.encode(&der),
        status: map_status(record.status.as_deref().unwrap_or_default()),
        request_id: record.serial_number,
        product_id,
        revocation_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mpki_core::{
        CertificateLookup, CertificateProfile, CertificateStatus, EnrollmentOutcome,
        EnrollmentRequest, ProfileRef, RevokeOutcome, RevokeRequest, SyncPage,
    };
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    const CERT: &str = include_str!("testdata/cert.pem");

    fn cert_der() -> Vec<u8> {
        pem::parse(CERT).unwrap().into_contents()
    }

    /// Search-only transport serving `total` synthetic records per profile
    struct FakeSearch {
        totals: BTreeMap<String, u64>,
        overrides: HashMap<(String, u64), Option<SearchRecord>>,
        cancel_at: Option<(String, u64, CancellationToken)>,
        calls: Mutex<Vec<(String, u64, u32)>>,
    }

    impl FakeSearch {
        fn new(totals: &[(&str, u64)]) -> Self {
            Self {
                totals: totals.iter().map(|(p, t)| ((*p).to_string(), *t)).collect(),
                overrides: HashMap::new(),
                cancel_at: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_record(mut self, profile: &str, index: u64, record: Option<SearchRecord>) -> Self {
            self.overrides.insert((profile.to_string(), index), record);
            self
        }

        fn cancel_at(mut self, profile: &str, start_index: u64, token: CancellationToken) -> Self {
            self.cancel_at = Some((profile.to_string(), start_index, token));
            self
        }

        fn calls(&self) -> Vec<(String, u64, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn valid_record(profile: &str, index: u64) -> SearchRecord {
        SearchRecord {
            serial_number: format!("{profile}-{index}"),
            status: Some("VALID".into()),
            revocation_reason: None,
            certificate: Some(STANDARD.encode(cert_der())),
            profile: Some(ProfileRef { id: profile.into() }),
        }
    }

    #[async_trait]
    impl MpkiTransport for FakeSearch {
        async fn list_profiles(&self) -> Result<Vec<CertificateProfile>> {
            unreachable!("search-only transport")
        }

        async fn enroll(&self, _: &EnrollmentRequest) -> Result<EnrollmentOutcome> {
            unreachable!("search-only transport")
        }

        async fn renew(&self, _: &str, _: &EnrollmentRequest) -> Result<EnrollmentOutcome> {
            unreachable!("search-only transport")
        }

        async fn revoke(&self, _: &str, _: &RevokeRequest) -> Result<RevokeOutcome> {
            unreachable!("search-only transport")
        }

        async fn get_certificate(&self, _: &str) -> Result<CertificateLookup> {
            unreachable!("search-only transport")
        }

        async fn search_certificates(
            &self,
            profile_id: &str,
            start_index: u64,
            page_size: u32,
        ) -> Result<SyncPage> {
            self.calls
                .lock()
                .unwrap()
                .push((profile_id.to_string(), start_index, page_size));

            if let Some((profile, index, token)) = &self.cancel_at {
                if profile == profile_id && *index == start_index {
                    token.cancel();
                }
            }

            let total = self.totals.get(profile_id).copied().unwrap_or(0);
            let end = total.min(start_index + u64::from(page_size));
            let records = (start_index..end)
                .map(|i| {
                    self.overrides
                        .get(&(profile_id.to_string(), i))
                        .cloned()
                        .unwrap_or_else(|| Some(valid_record(profile_id, i)))
                })
                .collect();

            Ok(SyncPage {
                total_count: total,
                more_available: end < total,
                index: start_index,
                records,
            })
        }
    }

    fn profiles(ids: &[&str]) -> Vec<String> {
        ids.iter().map(ToString::to_string).collect()
    }

    fn drain(rx: &mut mpsc::Receiver<SyncRecord>) -> Vec<SyncRecord> {
        let mut out = Vec::new();
        while let Ok(record) = rx.try_recv() {
            out.push(record);
        }
        out
    }

    #[tokio::test]
    async fn pages_by_reported_total() {
        let transport = FakeSearch::new(&[("A", 120)]);
        let (tx, mut rx) = mpsc::channel(256);

        let summary = SyncPaginator::new(&transport, 50)
            .run(&profiles(&["A"]), &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            transport.calls(),
            vec![("A".to_string(), 0, 50), ("A".to_string(), 50, 50), ("A".to_string(), 100, 50)]
        );
        assert_eq!(summary.pages, 3);
        assert_eq!(summary.emitted, 120);
        assert_eq!(summary.profiles, 1);
        assert!(!summary.cancelled);

        let records = drain(&mut rx);
        assert_eq!(records.len(), 120);
        assert_eq!(records[0].request_id, "A-0");
        assert_eq!(records[119].request_id, "A-119");
        assert_eq!(records[0].status, CertificateStatus::Generated);
        assert_eq!(records[0].product_id, "A");
        assert_eq!(records[0].certificate_base64, STANDARD.encode(cert_der()));
    }

    #[tokio::test]
    async fn empty_profile_needs_one_query() {
        let transport = FakeSearch::new(&[("A", 0), ("B", 3)]);
        let (tx, mut rx) = mpsc::channel(16);

        let summary = SyncPaginator::new(&transport, 50)
            .run(&profiles(&["A", "B"]), &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(transport.calls().len(), 2);
        assert_eq!(summary.profiles, 2);
        assert_eq!(drain(&mut rx).len(), 3);
    }

    #[tokio::test]
    async fn bad_records_are_skipped() {
        let mut revoked = valid_record("A", 2);
        revoked.status = Some("REVOKED".into());
        revoked.revocation_reason = Some("superseded".into());
        let mut unsupported = valid_record("A", 3);
        unsupported.status = Some("REVOKED".into());
        unsupported.revocation_reason = Some("ca_compromise".into());
        let mut broken = valid_record("A", 1);
        broken.certificate = Some("AQID".into());

        let transport = FakeSearch::new(&[("A", 5)])
            .with_record("A", 1, Some(broken))
            .with_record("A", 2, Some(revoked))
            .with_record("A", 3, Some(unsupported))
            .with_record("A", 4, None);
        let (tx, mut rx) = mpsc::channel(16);

        let summary = SyncPaginator::new(&transport, 50)
            .run(&profiles(&["A"]), &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.emitted, 2);
        assert_eq!(summary.skipped, 2);

        let records = drain(&mut rx);
        assert_eq!(records[0].revocation_reason, None);
        assert_eq!(records[1].request_id, "A-2");
        assert_eq!(records[1].status, CertificateStatus::Revoked);
        assert_eq!(records[1].revocation_reason, Some(4));
    }

    #[tokio::test]
    async fn cancellation_mid_profile_stops_before_next_profile() {
        let cancel = CancellationToken::new();
        let transport = FakeSearch::new(&[("A", 120), ("B", 10)]).cancel_at("A", 50, cancel.clone());
        let (tx, mut rx) = mpsc::channel(256);

        let summary = SyncPaginator::new(&transport, 50)
            .run(&profiles(&["A", "B"]), &tx, &cancel)
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.profiles, 0);
        assert_eq!(summary.emitted, 50);
        assert!(transport.calls().iter().all(|(profile, _, _)| profile == "A"));
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(drain(&mut rx).len(), 50);
    }

    #[tokio::test]
    async fn cancellation_releases_blocked_send() {
        let transport = FakeSearch::new(&[("A", 10)]);
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel::<SyncRecord>(1);
        let paginator = SyncPaginator::new(&transport, 50);
        let ids = profiles(&["A"]);

        let consumer = async {
            let first = rx.recv().await;
            cancel.cancel();
            first
        };
        let (summary, first) = tokio::join!(paginator.run(&ids, &tx, &cancel), consumer);

        let summary = summary.unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.emitted, 1);
        assert_eq!(first.unwrap().request_id, "A-0");
    }

    #[tokio::test]
    async fn slow_consumer_receives_everything_in_order() {
        let transport = FakeSearch::new(&[("A", 7), ("B", 4)]);
        let (tx, mut rx) = mpsc::channel::<SyncRecord>(2);
        let paginator = SyncPaginator::new(&transport, 3);
        let ids = profiles(&["A", "B"]);
        let cancel = CancellationToken::new();

        let consumer = async {
            let mut seen = Vec::new();
            while let Some(record) = rx.recv().await {
                tokio::task::yield_now().await;
                seen.push(record.request_id);
                if seen.len() == 11 {
                    break;
                }
            }
            seen
        };
        let (summary, seen) = tokio::join!(paginator.run(&ids, &tx, &cancel), consumer);

        assert_eq!(summary.unwrap().pages, 5);
        assert_eq!(seen.len(), 11);
        assert_eq!(seen[0], "A-0");
        assert_eq!(seen[7], "B-0");
    }

    #[tokio::test]
    async fn malformed_wire_records_are_skipped() {
        let page: SyncPage = serde_json::from_value(serde_json::json!({
            "count": 4,
            "certificates": [
                {"serial_number": "01", "status": "VALID", "certificate": "-----BEGIN CERTIFICATE-----"},
                {"status": "VALID", "certificate": STANDARD.encode(cert_der())},
                {"serial_number": "03", "status": "VALID", "certificate": STANDARD.encode(cert_der())},
                {"serial_number": "04", "status": "VALID"}
            ]
        }))
        .unwrap();

        let mut transport = FakeSearch::new(&[("A", 4)]);
        for (i, record) in (0u64..).zip(page.records) {
            transport = transport.with_record("A", i, record);
        }
        let (tx, mut rx) = mpsc::channel(8);

        let summary = SyncPaginator::new(&transport, 50)
            .run(&profiles(&["A"]), &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.emitted, 1);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.profiles, 1);
        let records = drain(&mut rx);
        assert_eq!(records[0].request_id, "03");
        assert_eq!(records[0].product_id, "A");
    }

    #[tokio::test]
    async fn dropped_receiver_is_reported() {
        let transport = FakeSearch::new(&[("A", 3)]);
        let (tx, rx) = mpsc::channel(4);
        drop(rx);

        let result = SyncPaginator::new(&transport, 50)
            .run(&profiles(&["A"]), &tx, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(MpkiError::SinkClosed)));
    }
}
