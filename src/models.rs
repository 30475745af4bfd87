//! Wire types shared by the store and the HTTP layer.
//!
//! Every JSON key is snake_case and every enum value is a lowercase string.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a license was lent or sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    Loan,
    Buy,
}

impl LicenseType {
    pub const ALL: [LicenseType; 2] = [LicenseType::Loan, LicenseType::Buy];

    pub fn label(&self) -> &'static str {
        match self {
            LicenseType::Loan => "Loan",
            LicenseType::Buy => "Buy",
        }
    }
}

/// License lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Ready,
    Active,
    Expired,
    Revoked,
    Canceled,
    Returned,
}

/// Result of applying a revocation to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The license moved from `ready` or `active` to `revoked`.
    Revoked,
    /// The license was already revoked; nothing changed.
    AlreadyRevoked,
}

impl LicenseStatus {
    /// Lifecycle order, used for the status breakdown.
    pub const ALL: [LicenseStatus; 6] = [
        LicenseStatus::Ready,
        LicenseStatus::Active,
        LicenseStatus::Expired,
        LicenseStatus::Revoked,
        LicenseStatus::Canceled,
        LicenseStatus::Returned,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LicenseStatus::Ready => "Ready",
            LicenseStatus::Active => "Active",
            LicenseStatus::Expired => "Expired",
            LicenseStatus::Revoked => "Revoked",
            LicenseStatus::Canceled => "Canceled",
            LicenseStatus::Returned => "Returned",
        }
    }

    /// Check whether a revocation may be applied from this status.
    ///
    /// Returns `Err(self)` when the transition is not allowed.
    pub fn revoke(self) -> Result<RevokeOutcome, LicenseStatus> {
        match self {
            LicenseStatus::Ready | LicenseStatus::Active => Ok(RevokeOutcome::Revoked),
            LicenseStatus::Revoked => Ok(RevokeOutcome::AlreadyRevoked),
            other => Err(other),
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LicenseStatus::Ready => "ready",
            LicenseStatus::Active => "active",
            LicenseStatus::Expired => "expired",
            LicenseStatus::Revoked => "revoked",
            LicenseStatus::Canceled => "canceled",
            LicenseStatus::Returned => "returned",
        };
        write!(f, "{}", s)
    }
}

/// A license as seen by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub id: String,
    pub publication_id: String,
    pub alt_id: String,
    pub title: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    pub status: LicenseStatus,
    pub device_count: u32,
    /// Issuance instant.
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Content provider that issued the license.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Rights period; unbounded on purchases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Furthest date a loan can be extended to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_end: Option<DateTime<Utc>>,
    /// Characters the reader may copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<u32>,
    /// Pages the reader may print.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print: Option<u32>,
}

/// A license whose device footprint exceeds the oversharing policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OversharedLicense {
    #[serde(flatten)]
    pub license: LicenseRecord,
    /// Device count the license was allowed before being flagged.
    pub device_limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageEventType {
    Register,
    Return,
    Renew,
}

/// Device interaction recorded against a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: UsageEventType,
    pub device_name: String,
    pub device_id: String,
}

/// Catalog entry for a protected publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub uuid: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_id: Option<String>,
    pub content_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub href: String,
    pub size: u64,
    pub checksum: String,
}

impl Publication {
    /// Dashboard category derived from the media type.
    pub fn kind(&self) -> &'static str {
        match self.content_type.as_str() {
            "application/epub+zip" => "EPUB",
            "application/pdf" | "application/pdf+lcp" => "PDF",
            "application/audiobook+zip" | "application/audiobook+lcp" => "Audiobooks",
            "application/divina+zip" | "application/divina+lcp" => "Comics",
            _ => "Other",
        }
    }
}

/// A named counter in a breakdown (status, type, publication kind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub count: u64,
}

impl NamedCount {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Licenses issued during one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub month: String,
    pub licenses: u64,
}

/// Aggregate view rendered on the dashboard home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub total_publications: u64,
    pub total_users: u64,
    pub total_licenses: u64,
    pub licenses_last_12_months: u64,
    pub licenses_last_month: u64,
    pub licenses_last_week: u64,
    pub licenses_last_day: u64,
    pub oldest_license_date: Option<NaiveDate>,
    pub latest_license_date: Option<NaiveDate>,
    pub overshared_licenses_count: u64,
    pub publication_types: Vec<NamedCount>,
    pub license_statuses: Vec<NamedCount>,
    pub license_types: Vec<NamedCount>,
    pub chart_data: Vec<ChartDataPoint>,
}

/// One page of a larger collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_license() -> LicenseRecord {
        LicenseRecord {
            id: "lic-002".to_string(),
            publication_id: "pub-002".to_string(),
            alt_id: "alt-456".to_string(),
            title: "Advanced JavaScript Patterns".to_string(),
            user_id: "user-002".to_string(),
            user_email: None,
            license_type: LicenseType::Buy,
            status: LicenseStatus::Ready,
            device_count: 4,
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
            updated_at: None,
            provider: None,
            start: None,
            end: None,
            max_end: None,
            copy: None,
            print: None,
        }
    }

    fn loan_details(license: &mut LicenseRecord) {
        license.updated_at = Some(Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap());
        license.provider = Some("EDRLab".to_string());
        license.start = Some(Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap());
        license.end = Some(Utc.with_ymd_and_hms(2025, 4, 14, 23, 59, 59).unwrap());
        license.max_end = Some(Utc.with_ymd_and_hms(2025, 5, 14, 23, 59, 59).unwrap());
        license.copy = Some(5);
        license.print = Some(10);
    }

    #[test]
    fn license_record_survives_the_wire() {
        let mut license = sample_license();
        loan_details(&mut license);
        let json = serde_json::to_string(&license).unwrap();
        let parsed: LicenseRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, license);
    }

    #[test]
    fn license_details_are_exposed() {
        let mut license = sample_license();
        loan_details(&mut license);
        let value = serde_json::to_value(&license).unwrap();

        assert_eq!(value["provider"], "EDRLab");
        assert_eq!(value["start"], "2025-03-15T00:00:00Z");
        assert_eq!(value["end"], "2025-04-14T23:59:59Z");
        assert_eq!(value["max_end"], "2025-05-14T23:59:59Z");
        assert_eq!(value["updated_at"], "2025-04-01T08:00:00Z");
        assert_eq!(value["copy"], 5);
        assert_eq!(value["print"], 10);
    }

    #[test]
    fn absent_details_are_omitted() {
        let value = serde_json::to_value(sample_license()).unwrap();
        for key in ["provider", "start", "end", "max_end", "updated_at", "copy", "print"] {
            assert!(value.get(key).is_none(), "{key}");
        }
    }

    #[test]
    fn license_record_uses_snake_case_keys() {
        let mut license = sample_license();
        license.user_email = Some("jane.smith@example.com".to_string());
        let value = serde_json::to_value(&license).unwrap();

        assert_eq!(value["publication_id"], "pub-002");
        assert_eq!(value["alt_id"], "alt-456");
        assert_eq!(value["user_email"], "jane.smith@example.com");
        assert_eq!(value["type"], "buy");
        assert_eq!(value["status"], "ready");
        assert_eq!(value["device_count"], 4);
        assert!(value.get("publicationId").is_none());
    }

    #[test]
    fn missing_email_is_omitted() {
        let value = serde_json::to_value(sample_license()).unwrap();
        assert!(value.get("user_email").is_none());
    }

    #[test]
    fn overshared_license_is_flat() {
        let flagged = OversharedLicense {
            license: sample_license(),
            device_limit: 2,
        };
        let value = serde_json::to_value(&flagged).unwrap();
        assert_eq!(value["id"], "lic-002");
        assert_eq!(value["device_limit"], 2);

        let parsed: OversharedLicense = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, flagged);
    }

    #[test]
    fn revoke_transitions() {
        assert_eq!(LicenseStatus::Ready.revoke(), Ok(RevokeOutcome::Revoked));
        assert_eq!(LicenseStatus::Active.revoke(), Ok(RevokeOutcome::Revoked));
        assert_eq!(
            LicenseStatus::Revoked.revoke(),
            Ok(RevokeOutcome::AlreadyRevoked)
        );
        for status in [
            LicenseStatus::Expired,
            LicenseStatus::Canceled,
            LicenseStatus::Returned,
        ] {
            assert_eq!(status.revoke(), Err(status));
        }
    }

    #[test]
    fn usage_event_type_is_lowercase() {
        let event = UsageEvent {
            timestamp: Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap(),
            event_type: UsageEventType::Renew,
            device_name: "MacBook Pro".to_string(),
            device_id: "device-003".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "renew");
        assert_eq!(value["device_name"], "MacBook Pro");
    }

    #[test]
    fn publication_kind_from_content_type() {
        let mut publication = Publication {
            uuid: "pub-001".to_string(),
            created_at: Utc::now(),
            provider: None,
            alt_id: None,
            content_type: "application/epub+zip".to_string(),
            title: "t".to_string(),
            description: None,
            authors: None,
            publishers: None,
            cover_url: None,
            href: "https://example.com/pub-001.lcpub".to_string(),
            size: 1,
            checksum: "00".to_string(),
        };
        assert_eq!(publication.kind(), "EPUB");
        publication.content_type = "application/audiobook+lcp".to_string();
        assert_eq!(publication.kind(), "Audiobooks");
        publication.content_type = "text/plain".to_string();
        assert_eq!(publication.kind(), "Other");
    }
}
