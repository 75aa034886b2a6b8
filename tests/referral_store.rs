//! Referral store behavior against a real on-disk SQLite file.

use tempfile::tempdir;

use fundpulse::referral::{ReferralContext, ReferralStore, TTL_DAYS_DEFAULT};

fn store_at(dir: &tempfile::TempDir) -> ReferralStore {
    let path = dir.path().join("ref.sqlite");
    ReferralStore::new(path.to_str().unwrap(), TTL_DAYS_DEFAULT).unwrap()
}

#[test]
fn r01_absorb_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let store = store_at(&dir);
    store
        .absorb_url("https://fundchamps.example/?ref=coach&team=tigers&utm_source=mail")
        .unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.ref_code.as_deref(), Some("coach"));
    assert_eq!(loaded.team.as_deref(), Some("tigers"));
    assert_eq!(loaded.utm_source.as_deref(), Some("mail"));
}

#[test]
fn r02_url_values_override_stored_key_by_key() {
    let dir = tempdir().unwrap();
    let store = store_at(&dir);
    store
        .absorb_url("https://fundchamps.example/?ref=old&team=tigers")
        .unwrap();
    let merged = store
        .absorb_url("https://fundchamps.example/?ref=new&utm_campaign=spring")
        .unwrap();

    // Last write wins per key; untouched keys survive.
    assert_eq!(merged.ref_code.as_deref(), Some("new"));
    assert_eq!(merged.team.as_deref(), Some("tigers"));
    assert_eq!(merged.utm_campaign.as_deref(), Some("spring"));
}

#[test]
fn r03_entries_older_than_ttl_are_discarded() {
    let dir = tempdir().unwrap();
    let store = store_at(&dir);
    store
        .absorb_url("https://fundchamps.example/?ref=stale")
        .unwrap();
    store.backdate(TTL_DAYS_DEFAULT + 1).unwrap();
    assert!(store.load().unwrap().is_none());

    // A fresh absorb starts over rather than resurrecting the stale row.
    let ctx = store
        .absorb_url("https://fundchamps.example/?team=lions")
        .unwrap();
    assert!(ctx.ref_code.is_none());
    assert_eq!(ctx.team.as_deref(), Some("lions"));
}

#[test]
fn r04_merge_refreshes_ttl() {
    let dir = tempdir().unwrap();
    let store = store_at(&dir);
    store
        .absorb_url("https://fundchamps.example/?ref=coach")
        .unwrap();
    store.backdate(TTL_DAYS_DEFAULT - 1).unwrap();
    // Still within TTL; the merge rewrites saved_at.
    store
        .absorb_url("https://fundchamps.example/?team=tigers")
        .unwrap();
    store.backdate(2).unwrap();
    // Old saved_at would now be expired; the refreshed one is not.
    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.ref_code.as_deref(), Some("coach"));
}

#[test]
fn r05_decoration_uses_stored_context() {
    let dir = tempdir().unwrap();
    let store = store_at(&dir);
    let ctx = store
        .absorb_url("https://fundchamps.example/?ref=coach&utm_source=mail")
        .unwrap();

    let out = ctx
        .decorate_url("https://donate.example/checkout?amount=50")
        .unwrap();
    assert!(out.contains("amount=50"));
    assert!(out.contains("ref=coach"));
    assert!(out.contains("utm_source=mail"));
}

#[test]
fn r06_empty_store_loads_none() {
    let dir = tempdir().unwrap();
    let store = store_at(&dir);
    assert!(store.load().unwrap().is_none());
}

#[test]
fn r07_context_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ref.sqlite");
    {
        let store = ReferralStore::new(path.to_str().unwrap(), TTL_DAYS_DEFAULT).unwrap();
        store
            .absorb_url("https://fundchamps.example/?campaign=fall")
            .unwrap();
    }
    let store = ReferralStore::new(path.to_str().unwrap(), TTL_DAYS_DEFAULT).unwrap();
    let ctx: ReferralContext = store.load().unwrap().unwrap();
    assert_eq!(ctx.campaign.as_deref(), Some("fall"));
}
