//! Records seeded into `InMemoryStore::with_sample_data`.
//!
//! Dates are relative to the seeding instant so the time-bucketed
//! aggregates stay meaningful whenever the server starts.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::{
    LicenseRecord, LicenseStatus, LicenseType, Publication, UsageEvent, UsageEventType,
};

const TITLES: [&str; 8] = [
    "The Complete Guide to Modern Web Development with React and TypeScript",
    "Advanced JavaScript Patterns",
    "Mastering Node.js: Build Scalable Applications",
    "CSS Grid and Flexbox: A Complete Guide",
    "Python for Data Science and Machine Learning",
    "Introduction to Digital Publishing",
    "Advanced eBook Technologies",
    "Modern Library Management",
];

const CONTENT_TYPES: [&str; 4] = [
    "application/epub+zip",
    "application/pdf+lcp",
    "application/audiobook+lcp",
    "application/divina+lcp",
];

const CATALOG_SIZE: usize = 32;

fn catalog_title(n: usize) -> String {
    let base = TITLES[(n - 1) % TITLES.len()];
    match (n - 1) / TITLES.len() + 1 {
        1 => base.to_string(),
        edition => format!("{base} (Edition {edition})"),
    }
}

/// The publication catalog: `pub-001` through `pub-032`.
pub fn publications(now: DateTime<Utc>) -> Vec<Publication> {
    (1..=CATALOG_SIZE)
        .map(|n| {
            let uuid = format!("pub-{n:03}");

            Publication {
                href: format!("https://content.example.com/{uuid}.lcp"),
                created_at: now - Duration::days(30 * n as i64),
                provider: Some("https://edrlab.org".to_string()),
                alt_id: Some(format!("alt-{n:03}")),
                content_type: CONTENT_TYPES[n % CONTENT_TYPES.len()].to_string(),
                title: catalog_title(n),
                description: None,
                authors: None,
                publishers: Some("EDRLab Press".to_string()),
                cover_url: None,
                size: 250_000 + (n as u64) * 37_411,
                checksum: format!("{:064x}", (n as u64) * 0x9e37_79b9),
                uuid,
            }
        })
        .collect()
}

fn email_for(user_id: &str) -> Option<String> {
    let local = match user_id {
        "user-002" => return None,
        "user-001" | "john.doe" => "john.doe",
        "user-003" => "bob.wilson",
        "user-004" => "alice.brown",
        "user-005" => "charlie.davis",
        other => other,
    };
    Some(format!("{local}@example.com"))
}

fn license(
    id: &str,
    publication: usize,
    user_id: &str,
    license_type: LicenseType,
    status: LicenseStatus,
    device_count: u32,
    created_at: DateTime<Utc>,
) -> LicenseRecord {
    // Loans run 30 days and may be extended by another 30; purchases never end.
    let (end, max_end, copy, print) = match license_type {
        LicenseType::Loan => {
            let end = created_at + Duration::days(30);
            (Some(end), Some(end + Duration::days(30)), 5, 10)
        }
        LicenseType::Buy => (None, None, 2000, 100),
    };

    LicenseRecord {
        id: id.to_string(),
        publication_id: format!("pub-{publication:03}"),
        alt_id: format!("alt-{publication:03}"),
        title: catalog_title(publication),
        user_id: user_id.to_string(),
        user_email: email_for(user_id),
        license_type,
        status,
        device_count,
        created_at,
        updated_at: Some(created_at),
        provider: Some("EDRLab".to_string()),
        start: Some(created_at),
        end,
        max_end,
        copy: Some(copy),
        print: Some(print),
    }
}

/// Licenses across a handful of readers, including overshared ones.
pub fn licenses(now: DateTime<Utc>) -> Vec<LicenseRecord> {
    use LicenseStatus::*;
    use LicenseType::*;

    let days = |d: i64| now - Duration::days(d);

    vec![
        license("lic-001", 1, "user-001", Loan, Active, 5, days(12)),
        license("lic-002", 2, "user-002", Buy, Ready, 4, days(3)),
        license("lic-003", 3, "user-003", Loan, Active, 6, days(40)),
        license("lic-004", 4, "user-004", Buy, Expired, 3, days(200)),
        license("lic-005", 5, "user-005", Loan, Active, 7, now - Duration::hours(5)),
        license("lic-006", 9, "user-002", Loan, Returned, 1, days(95)),
        license("lic-007", 10, "user-004", Loan, Canceled, 0, days(150)),
        license("lic-008", 11, "user-005", Buy, Revoked, 2, days(320)),
        license("license-001-user123", 6, "user123", Loan, Active, 3, days(60)),
        license("license-002-user123", 7, "user123", Loan, Expired, 2, days(30)),
        license("license-003-johndoe", 8, "john.doe", Buy, Active, 5, days(90)),
        license("license-004-johndoe", 12, "john.doe", Loan, Ready, 1, days(700)),
    ]
}

fn event(at: DateTime<Utc>, kind: UsageEventType, name: &str, device_id: &str) -> UsageEvent {
    UsageEvent {
        timestamp: at,
        event_type: kind,
        device_name: name.to_string(),
        device_id: device_id.to_string(),
    }
}

/// Device histories keyed by license id.
pub fn usage_events(now: DateTime<Utc>) -> HashMap<String, Vec<UsageEvent>> {
    use UsageEventType::*;

    let days = |d: i64| now - Duration::days(d);
    let mut events = HashMap::new();

    events.insert(
        "license-001-user123".to_string(),
        vec![
            event(days(7), Register, "John's iPad", "device-001"),
            event(days(5), Return, "John's iPad", "device-001"),
            event(days(3), Register, "John's iPhone", "device-002"),
        ],
    );
    events.insert(
        "license-002-user123".to_string(),
        vec![
            event(days(10), Register, "MacBook Pro", "device-003"),
            event(days(1), Renew, "MacBook Pro", "device-003"),
        ],
    );
    events.insert(
        "license-003-johndoe".to_string(),
        vec![
            event(days(20), Register, "Library Tablet 1", "lib-tablet-001"),
            event(days(15), Register, "Library Tablet 2", "lib-tablet-002"),
            event(days(10), Return, "Library Tablet 1", "lib-tablet-001"),
        ],
    );
    events.insert(
        "lic-001".to_string(),
        vec![
            event(days(12), Register, "Kobo Libra", "device-101"),
            event(days(11), Register, "Pixel 8", "device-102"),
            event(days(9), Register, "Thorium Desktop", "device-103"),
            event(days(6), Register, "iPad Air", "device-104"),
            event(days(2), Register, "Work Laptop", "device-105"),
        ],
    );

    events
}
