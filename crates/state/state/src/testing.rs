use maas_core::{AuthDocument, RateLimitDocument};

use crate::error::StateError;
use crate::key::PolicyKey;
use crate::store::{CasResult, PolicyEntry, PolicyStore};

fn entry(version: u64) -> PolicyEntry {
    PolicyEntry::new(AuthDocument::new("gpt-oss-20b", vec![]), RateLimitDocument::new("gpt-oss-20b", vec![]), version)
}

/// Run the full `PolicyStore` conformance test suite.
///
/// Call this from a backend's own test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn PolicyStore) -> Result<(), StateError> {
    test_get_missing(store).await?;
    test_set_and_get(store).await?;
    test_delete(store).await?;
    test_compare_and_swap_create(store).await?;
    test_compare_and_swap_conflict(store).await?;
    test_scan_namespace(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn PolicyStore) -> Result<(), StateError> {
    let key = PolicyKey::new("ns", "missing");
    assert!(store.get(&key).await?.is_none());
    Ok(())
}

async fn test_set_and_get(store: &dyn PolicyStore) -> Result<(), StateError> {
    let key = PolicyKey::new("ns", "set-get");
    store.set(&key, entry(1)).await?;
    let got = store.get(&key).await?.expect("entry should exist");
    assert_eq!(got.version, 1);
    Ok(())
}

async fn test_delete(store: &dyn PolicyStore) -> Result<(), StateError> {
    let key = PolicyKey::new("ns", "to-delete");
    store.set(&key, entry(1)).await?;
    assert!(store.delete(&key).await?);
    assert!(store.get(&key).await?.is_none());
    assert!(!store.delete(&key).await?);
    Ok(())
}

async fn test_compare_and_swap_create(store: &dyn PolicyStore) -> Result<(), StateError> {
    let key = PolicyKey::new("ns", "cas-create");
    let result = store.compare_and_swap(&key, 0, entry(1)).await?;
    assert_eq!(result, CasResult::Ok);
    Ok(())
}

async fn test_compare_and_swap_conflict(store: &dyn PolicyStore) -> Result<(), StateError> {
    let key = PolicyKey::new("ns", "cas-conflict");
    store.set(&key, entry(1)).await?;
    let result = store.compare_and_swap(&key, 999, entry(2)).await?;
    assert!(matches!(result, CasResult::Conflict { .. }));

    let result = store.compare_and_swap(&key, 1, entry(2)).await?;
    assert_eq!(result, CasResult::Ok);
    let got = store.get(&key).await?.expect("entry should exist");
    assert_eq!(got.version, 2);
    Ok(())
}

async fn test_scan_namespace(store: &dyn PolicyStore) -> Result<(), StateError> {
    store.set(&PolicyKey::new("scan-ns", "a"), entry(1)).await?;
    store.set(&PolicyKey::new("scan-ns", "b"), entry(1)).await?;
    let entries = store.scan_namespace("scan-ns").await?;
    assert_eq!(entries.len(), 2);
    Ok(())
}
