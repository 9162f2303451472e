//! File-backed record storage

mod common;

use chrono::Utc;
use common::{settings, text, ZONE_ID};
use std::collections::BTreeSet;
use zone_settings::contract::{Baseline, ManagedZone, SettingValue};
use zone_settings::domain::repository::ManagedZoneRepository;
use zone_settings::infra::storage::FileZoneRepository;

fn record(zone_id: &str) -> ManagedZone {
    let baseline = Baseline {
        settings: settings(&[
            ("cache_level", text("basic")),
            ("browser_cache_ttl", SettingValue::Integer(14400)),
            ("universal_ssl", text("on")),
        ]),
        read_only: BTreeSet::from(["waf".to_string()]),
        captured_at: Utc::now(),
    };
    let mut zone = ManagedZone::new(
        zone_id,
        settings(&[("cache_level", text("aggressive"))]),
        baseline,
    );
    zone.observed = settings(&[("cache_level", text("aggressive"))]);
    zone.zone_status = Some("active".to_string());
    zone
}

#[tokio::test]
async fn test_records_survive_a_new_repository() {
    let dir = tempfile::tempdir().unwrap();
    let zone = record(ZONE_ID);

    FileZoneRepository::new(dir.path()).upsert(&zone).await.unwrap();

    let reopened = FileZoneRepository::new(dir.path());
    assert_eq!(reopened.find(ZONE_ID).await.unwrap(), Some(zone));
    assert!(dir.path().join(format!("{ZONE_ID}.json")).exists());
    assert!(!dir.path().join(format!("{ZONE_ID}.json.tmp")).exists());
}

#[tokio::test]
async fn test_upsert_replaces_and_delete_removes() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileZoneRepository::new(dir.path().join("state"));
    let mut zone = record(ZONE_ID);

    assert!(repo.find(ZONE_ID).await.unwrap().is_none());
    assert!(repo.list_all().await.unwrap().is_empty());

    repo.upsert(&zone).await.unwrap();
    zone.desired = settings(&[("cache_level", text("simplified"))]);
    repo.upsert(&zone).await.unwrap();
    assert_eq!(repo.find(ZONE_ID).await.unwrap(), Some(zone));

    assert!(repo.delete(ZONE_ID).await.unwrap());
    assert!(!repo.delete(ZONE_ID).await.unwrap());
    assert!(repo.find(ZONE_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_is_sorted_and_skips_foreign_files() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileZoneRepository::new(dir.path());

    repo.upsert(&record("zone-b")).await.unwrap();
    repo.upsert(&record("zone-a")).await.unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a record").unwrap();
    std::fs::write(dir.path().join("broken.json"), "{").unwrap();

    let ids: Vec<String> = repo
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|z| z.zone_id)
        .collect();
    assert_eq!(ids, vec!["zone-a".to_string(), "zone-b".to_string()]);
}

#[tokio::test]
async fn test_unsafe_zone_identifiers_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileZoneRepository::new(dir.path());

    assert!(repo.find("../outside").await.is_err());
    assert!(repo.upsert(&record(".hidden")).await.is_err());
    assert!(repo.delete("").await.is_err());
}
