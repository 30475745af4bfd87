//! The license store behind the dashboard.
//!
//! `DashboardStore` is the contract handlers call; a real deployment backs it
//! with the license server's database. `InMemoryStore` keeps records in
//! memory and recomputes every aggregate from them on each call.

use std::collections::{BTreeMap, HashMap, HashSet};

use axum::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::errors::{DashError, DashResult};
use crate::models::{
    ChartDataPoint, DashboardSnapshot, LicenseRecord, LicenseStatus, LicenseType, NamedCount,
    OversharedLicense, Page, Publication, RevokeOutcome, UsageEvent,
};
use crate::server::pagination::Pagination;
use crate::server::sample_data;

/// Read and revoke operations available to authenticated handlers.
#[async_trait]
pub trait DashboardStore: Send + Sync {
    /// Aggregate counts as of the call.
    async fn snapshot(&self) -> DashResult<DashboardSnapshot>;

    /// Licenses exceeding the oversharing policy, ordered by license id.
    async fn overshared_licenses(&self) -> DashResult<Vec<OversharedLicense>>;

    /// Licenses held by `user_id`; empty when the user is unknown.
    async fn user_licenses(&self, user_id: &str) -> DashResult<Vec<LicenseRecord>>;

    /// Usage events of a license in chronological order; empty when unknown.
    async fn license_events(&self, license_id: &str) -> DashResult<Vec<UsageEvent>>;

    /// One page of the publication catalog.
    async fn publications(&self, pagination: Pagination) -> DashResult<Page<Publication>>;

    /// Remove a publication from the catalog.
    async fn delete_publication(&self, uuid: &str) -> DashResult<()>;

    async fn license(&self, license_id: &str) -> DashResult<Option<LicenseRecord>>;

    /// Move a license from `ready`/`active` to `revoked`.
    ///
    /// Revoking a revoked license succeeds without change; any other status
    /// is rejected with `DashError::InvalidStateTransition`.
    async fn revoke_license(&self, license_id: &str) -> DashResult<RevokeOutcome>;
}

/// Dashboard store held entirely in memory.
pub struct InMemoryStore {
    licenses: RwLock<BTreeMap<String, LicenseRecord>>,
    events: RwLock<HashMap<String, Vec<UsageEvent>>>,
    publications: RwLock<BTreeMap<String, Publication>>,
    device_limit: u32,
}

impl InMemoryStore {
    /// An empty store flagging licenses with more than `device_limit` devices.
    pub fn new(device_limit: u32) -> Self {
        Self {
            licenses: RwLock::new(BTreeMap::new()),
            events: RwLock::new(HashMap::new()),
            publications: RwLock::new(BTreeMap::new()),
            device_limit,
        }
    }

    /// A store seeded with the sample catalog, dated relative to `now`.
    pub fn with_sample_data(device_limit: u32, now: DateTime<Utc>) -> Self {
        let licenses = sample_data::licenses(now)
            .into_iter()
            .map(|l| (l.id.clone(), l))
            .collect();
        let publications = sample_data::publications(now)
            .into_iter()
            .map(|p| (p.uuid.clone(), p))
            .collect();

        Self {
            licenses: RwLock::new(licenses),
            events: RwLock::new(sample_data::usage_events(now)),
            publications: RwLock::new(publications),
            device_limit,
        }
    }

    pub fn device_limit(&self) -> u32 {
        self.device_limit
    }

    pub async fn insert_license(&self, license: LicenseRecord) {
        self.licenses
            .write()
            .await
            .insert(license.id.clone(), license);
    }

    pub async fn insert_publication(&self, publication: Publication) {
        self.publications
            .write()
            .await
            .insert(publication.uuid.clone(), publication);
    }

    /// Append a usage event to a license's history.
    pub async fn record_event(&self, license_id: &str, event: UsageEvent) {
        self.events
            .write()
            .await
            .entry(license_id.to_string())
            .or_default()
            .push(event);
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("device_limit", &self.device_limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DashboardStore for InMemoryStore {
    async fn snapshot(&self) -> DashResult<DashboardSnapshot> {
        let licenses = self.licenses.read().await;
        let publications = self.publications.read().await;
        Ok(build_snapshot(
            licenses.values(),
            publications.values(),
            self.device_limit,
            Utc::now(),
        ))
    }

    async fn overshared_licenses(&self) -> DashResult<Vec<OversharedLicense>> {
        let licenses = self.licenses.read().await;
        Ok(licenses
            .values()
            .filter(|l| l.device_count > self.device_limit)
            .map(|l| OversharedLicense {
                license: l.clone(),
                device_limit: self.device_limit,
            })
            .collect())
    }

    async fn user_licenses(&self, user_id: &str) -> DashResult<Vec<LicenseRecord>> {
        let licenses = self.licenses.read().await;
        Ok(licenses
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn license_events(&self, license_id: &str) -> DashResult<Vec<UsageEvent>> {
        let mut events = self
            .events
            .read()
            .await
            .get(license_id)
            .cloned()
            .unwrap_or_default();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    async fn publications(&self, pagination: Pagination) -> DashResult<Page<Publication>> {
        let publications = self.publications.read().await;
        let total = publications.len() as u64;
        let items = publications
            .values()
            .skip(pagination.offset())
            .take(pagination.limit())
            .cloned()
            .collect();

        Ok(Page {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages: pagination.total_pages(total),
        })
    }

    async fn delete_publication(&self, uuid: &str) -> DashResult<()> {
        self.publications
            .write()
            .await
            .remove(uuid)
            .map(|_| ())
            .ok_or_else(|| DashError::PublicationNotFound(uuid.to_string()))
    }

    async fn license(&self, license_id: &str) -> DashResult<Option<LicenseRecord>> {
        Ok(self.licenses.read().await.get(license_id).cloned())
    }

    async fn revoke_license(&self, license_id: &str) -> DashResult<RevokeOutcome> {
        // The write guard serializes concurrent revocations of the same license.
        let mut licenses = self.licenses.write().await;
        let license = licenses
            .get_mut(license_id)
            .ok_or_else(|| DashError::LicenseNotFound(license_id.to_string()))?;

        let outcome = license
            .status
            .revoke()
            .map_err(|from| DashError::InvalidStateTransition {
                license_id: license_id.to_string(),
                from,
            })?;

        if outcome == RevokeOutcome::Revoked {
            license.status = LicenseStatus::Revoked;
            license.updated_at = Some(Utc::now());
        }
        Ok(outcome)
    }
}

/// Compute the dashboard aggregates at instant `now`.
pub fn build_snapshot<'a>(
    licenses: impl IntoIterator<Item = &'a LicenseRecord>,
    publications: impl IntoIterator<Item = &'a Publication>,
    device_limit: u32,
    now: DateTime<Utc>,
) -> DashboardSnapshot {
    let licenses: Vec<&LicenseRecord> = licenses.into_iter().collect();
    let publications: Vec<&Publication> = publications.into_iter().collect();

    let issued_since = |window: Duration| -> u64 {
        let from = now - window;
        licenses.iter().filter(|l| l.created_at > from).count() as u64
    };

    let users: HashSet<&str> = licenses.iter().map(|l| l.user_id.as_str()).collect();

    let license_statuses = LicenseStatus::ALL
        .iter()
        .map(|status| {
            let count = licenses.iter().filter(|l| l.status == *status).count() as u64;
            NamedCount::new(status.label(), count)
        })
        .collect();

    let license_types = LicenseType::ALL
        .iter()
        .map(|kind| {
            let count = licenses.iter().filter(|l| l.license_type == *kind).count() as u64;
            NamedCount::new(kind.label(), count)
        })
        .collect();

    let mut kinds: BTreeMap<&str, u64> = BTreeMap::new();
    for publication in &publications {
        *kinds.entry(publication.kind()).or_default() += 1;
    }
    let mut publication_types: Vec<NamedCount> = kinds
        .into_iter()
        .map(|(name, count)| NamedCount::new(name, count))
        .collect();
    publication_types.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    DashboardSnapshot {
        total_publications: publications.len() as u64,
        total_users: users.len() as u64,
        total_licenses: licenses.len() as u64,
        licenses_last_12_months: issued_since(Duration::days(365)),
        licenses_last_month: issued_since(Duration::days(30)),
        licenses_last_week: issued_since(Duration::days(7)),
        licenses_last_day: issued_since(Duration::days(1)),
        oldest_license_date: licenses.iter().map(|l| l.created_at.date_naive()).min(),
        latest_license_date: licenses.iter().map(|l| l.created_at.date_naive()).max(),
        overshared_licenses_count: licenses
            .iter()
            .filter(|l| l.device_count > device_limit)
            .count() as u64,
        publication_types,
        license_statuses,
        license_types,
        chart_data: monthly_issuance(&licenses, now),
    }
}

/// Licenses issued in each of the twelve calendar months ending with `now`'s.
fn monthly_issuance(licenses: &[&LicenseRecord], now: DateTime<Utc>) -> Vec<ChartDataPoint> {
    let current = now.year() * 12 + now.month0() as i32;

    (0..12)
        .rev()
        .map(|back| {
            let index = current - back;
            let (year, month) = (index.div_euclid(12), index.rem_euclid(12) as u32 + 1);
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%b").to_string())
                .unwrap_or_default();
            let count = licenses
                .iter()
                .filter(|l| l.created_at.year() == year && l.created_at.month() == month)
                .count() as u64;
            ChartDataPoint {
                month: label,
                licenses: count,
            }
        })
        .collect()
}
