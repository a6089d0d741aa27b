//! 域名与区域记录缓存

use std::collections::HashMap;
use std::time::Duration;

use registrobr_provider::{
    Credentials, Domain, OtpSource, ProviderError, Session, Submission, codec,
};

use crate::error::{CoreError, CoreResult};
use crate::types::{PendingChanges, RecordState, Zone};

/// Cache key for a zone: lowercase, without the trailing dot.
fn zone_key(fqdn: &str) -> String {
    fqdn.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Per-domain cache of the decoded remote baseline, backed by one [`Session`].
#[derive(Debug)]
pub struct ZoneRepository {
    session: Session,
    domains: Option<Vec<Domain>>,
    zones: HashMap<String, Zone>,
    max_age: Option<Duration>,
}

impl ZoneRepository {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            domains: None,
            zones: HashMap::new(),
            max_age: None,
        }
    }

    /// Re-fetch cached zones older than `max_age` on non-forced reads.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Log in, dropping anything cached under a previous login.
    pub async fn login(&mut self, credentials: &Credentials, otp: &dyn OtpSource) -> CoreResult<()> {
        self.clear();
        self.session.login(credentials, otp).await?;
        Ok(())
    }

    pub async fn logout(&mut self) -> CoreResult<()> {
        self.clear();
        self.session.logout().await?;
        Ok(())
    }

    /// Fetch the account's domains. Always hits the registrar.
    pub async fn list_domains(&mut self) -> CoreResult<Vec<Domain>> {
        let domains = self.session.list_domains().await?;
        self.domains = Some(domains.clone());
        Ok(domains)
    }

    /// Resolve `fqdn` against the domain list, fetching it once if needed.
    pub async fn find_domain(&mut self, fqdn: &str) -> CoreResult<Domain> {
        if self.domains.is_none() {
            self.list_domains().await?;
        }
        let key = zone_key(fqdn);
        self.domains
            .iter()
            .flatten()
            .find(|d| zone_key(&d.fqdn) == key)
            .cloned()
            .ok_or_else(|| CoreError::DomainNotFound(fqdn.to_string()))
    }

    /// Decoded records of `fqdn`, in page order.
    ///
    /// Served from cache unless `force` is set, nothing is cached yet, or the
    /// entry is stale. A stale entry holding unsaved edits is still served
    /// from cache; only `force` discards edits.
    pub async fn zone_info(&mut self, fqdn: &str, force: bool) -> CoreResult<&Zone> {
        if !self.session.is_logged() {
            return Err(ProviderError::NotAuthenticated.into());
        }
        let key = zone_key(fqdn);
        let refetch = force
            || self
                .zones
                .get(&key)
                .is_none_or(|z| z.is_stale(self.max_age) && !z.has_pending());
        if refetch {
            self.fetch_zone(&key).await?;
        } else {
            log::debug!("[registro.br] Zone {key} served from cache");
        }
        self.zone(&key)
    }

    /// Cached zone, without contacting the registrar.
    pub fn zone(&self, fqdn: &str) -> CoreResult<&Zone> {
        self.zones
            .get(&zone_key(fqdn))
            .ok_or_else(|| CoreError::ZoneNotLoaded(fqdn.to_string()))
    }

    pub(crate) fn zone_mut(&mut self, fqdn: &str) -> CoreResult<&mut Zone> {
        self.zones
            .get_mut(&zone_key(fqdn))
            .ok_or_else(|| CoreError::ZoneNotLoaded(fqdn.to_string()))
    }

    /// Flag a cached zone so the next read re-fetches it.
    pub fn mark_stale(&mut self, fqdn: &str) {
        if let Some(zone) = self.zones.get_mut(&zone_key(fqdn)) {
            zone.mark_stale();
        }
    }

    /// Drop a cached zone, staged edits included.
    pub fn evict(&mut self, fqdn: &str) {
        self.zones.remove(&zone_key(fqdn));
    }

    /// Post the remove list, then the add list.
    pub(crate) async fn submit(&mut self, fqdn: &str, changes: &PendingChanges) -> CoreResult<()> {
        let key = zone_key(fqdn);
        self.session
            .submit_records(&key, Submission::Remove, &changes.removals)
            .await?;
        self.session
            .submit_records(&key, Submission::Add, &changes.additions)
            .await?;
        Ok(())
    }

    async fn fetch_zone(&mut self, key: &str) -> CoreResult<()> {
        let wire = self.session.fetch_zone_records(key).await?;
        let records = wire
            .into_iter()
            .map(|w| codec::deserialize(&w).map(|record| RecordState::remote(record, w)))
            .collect::<Result<Vec<_>, ProviderError>>()?;
        log::info!(
            "[registro.br] Zone {key} refreshed ({} records)",
            records.len()
        );
        self.zones.insert(key.to_string(), Zone::new(key, records));
        Ok(())
    }

    fn clear(&mut self) {
        self.domains = None;
        self.zones.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use registrobr_provider::HttpResponse;
    use registrobr_provider::mock::{MockTransport, zone_page};

    use super::*;
    use crate::test_utils::{DOMAINS_JSON, logged_in_repository, repository};
    use crate::types::{ChangeState, RecordData};

    #[tokio::test]
    async fn zone_info_decodes_in_page_order_and_caches() {
        let mock = Arc::new(MockTransport::new());
        let mut repo = logged_in_repository(&mock).await;
        mock.push(HttpResponse::ok(zone_page(&[
            "www|A|1.2.3.4",
            "|MX|10 mx.example.com.br",
            "_443._tcp|TLSA|3 1 1 abcdef",
        ])));

        let zone = repo.zone_info("example.com.br", false).await.unwrap();
        let records = zone.records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.state() == ChangeState::Unchanged));
        assert_eq!(records[0].record().ownername(), "www");
        assert_eq!(
            records[0].record().data(),
            &RecordData::A {
                address: "1.2.3.4".to_string()
            }
        );
        assert_eq!(records[1].record().ownername(), "");

        let calls = mock.requests().len();
        repo.zone_info("Example.com.br.", false).await.unwrap();
        assert_eq!(mock.requests().len(), calls, "second read must hit the cache");
    }

    #[tokio::test]
    async fn forced_and_stale_reads_refetch() {
        let mock = Arc::new(MockTransport::new());
        let mut repo = logged_in_repository(&mock).await;
        mock.push(HttpResponse::ok(zone_page(&["www|A|1.2.3.4"])));
        mock.push(HttpResponse::ok(zone_page(&["www|A|5.6.7.8"])));
        mock.push(HttpResponse::ok(zone_page(&[])));

        repo.zone_info("example.com.br", false).await.unwrap();
        let zone = repo.zone_info("example.com.br", true).await.unwrap();
        assert_eq!(zone.records()[0].wire(), "www|A|5.6.7.8");

        repo.mark_stale("example.com.br");
        let zone = repo.zone_info("example.com.br", false).await.unwrap();
        assert!(zone.records().is_empty());
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn max_age_zero_always_refetches() {
        let mock = Arc::new(MockTransport::new());
        let mut repo = logged_in_repository(&mock)
            .await
            .with_max_age(Duration::ZERO);
        mock.push(HttpResponse::ok(zone_page(&["www|A|1.2.3.4"])));
        mock.push(HttpResponse::ok(zone_page(&["www|A|1.2.3.4"])));

        repo.zone_info("example.com.br", false).await.unwrap();
        std::thread::sleep(Duration::from_millis(2));
        repo.zone_info("example.com.br", false).await.unwrap();
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn unknown_type_on_page_is_surfaced() {
        let mock = Arc::new(MockTransport::new());
        let mut repo = logged_in_repository(&mock).await;
        mock.push(HttpResponse::ok(zone_page(&["www|A|1.2.3.4", "_sip|SRV|0 5 5060 sip"])));

        let res = repo.zone_info("example.com.br", false).await;
        assert!(
            matches!(
                &res,
                Err(CoreError::Provider(ProviderError::UnknownRecordType { record_type })) if record_type == "SRV"
            ),
            "unexpected result: {res:?}"
        );
        assert!(matches!(
            repo.zone("example.com.br"),
            Err(CoreError::ZoneNotLoaded(_))
        ));
    }

    #[tokio::test]
    async fn requires_login() {
        let mock = Arc::new(MockTransport::new());
        let mut repo = repository(&mock);

        let res = repo.zone_info("example.com.br", false).await;
        assert!(matches!(
            res,
            Err(CoreError::Provider(ProviderError::NotAuthenticated))
        ));
        let res = repo.list_domains().await;
        assert!(matches!(
            res,
            Err(CoreError::Provider(ProviderError::NotAuthenticated))
        ));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn find_domain_uses_cached_list() {
        let mock = Arc::new(MockTransport::new());
        let mut repo = logged_in_repository(&mock).await;
        mock.push(HttpResponse::ok(DOMAINS_JSON));

        let domain = repo.find_domain("EXAMPLE.com.br").await.unwrap();
        assert_eq!(domain.fqdn, "example.com.br");

        let calls = mock.requests().len();
        let res = repo.find_domain("other.com.br").await;
        assert!(matches!(res, Err(CoreError::DomainNotFound(name)) if name == "other.com.br"));
        assert_eq!(mock.requests().len(), calls);
    }

    #[tokio::test]
    async fn logout_drops_cache() {
        let mock = Arc::new(MockTransport::new());
        let mut repo = logged_in_repository(&mock).await;
        mock.push(HttpResponse::ok(zone_page(&["www|A|1.2.3.4"])));
        mock.push(HttpResponse::ok("bye"));

        repo.zone_info("example.com.br", false).await.unwrap();
        repo.logout().await.unwrap();
        assert!(repo.zone("example.com.br").is_err());
        assert!(!repo.session().is_logged());
    }
}
