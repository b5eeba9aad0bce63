use async_trait::async_trait;
use maas_core::{AuthDocument, RateLimitDocument};
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::key::PolicyKey;

/// The generated-policy pair for one model, plus the version the store's
/// compare-and-swap is keyed on (spec.md §4.1, §5 "atomicity primitive").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub auth: AuthDocument,
    pub rate_limit: RateLimitDocument,
    pub version: u64,
    /// Mirrors the `managed=false` annotation (spec.md §3, §4.2): when
    /// `false`, reconcilers observe this entry but do not overwrite it.
    #[serde(default = "default_managed")]
    pub managed: bool,
}

fn default_managed() -> bool {
    true
}

impl PolicyEntry {
    #[must_use]
    pub fn new(auth: AuthDocument, rate_limit: RateLimitDocument, version: u64) -> Self {
        Self {
            auth,
            rate_limit,
            version,
            managed: true,
        }
    }
}

/// Result of a compare-and-swap write.
#[derive(Debug, Clone, PartialEq)]
pub enum CasResult {
    Ok,
    Conflict { current: Option<PolicyEntry> },
}

/// Atomicity primitive for the generated-policy store / informer cache
/// (spec.md §5). Reconcilers write through `compare_and_swap` so two
/// concurrent reconciles of overlapping `AccessPolicy`/`Subscription` sets
/// can't silently clobber each other's aggregation.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn get(&self, key: &PolicyKey) -> Result<Option<PolicyEntry>, StateError>;

    /// Unconditional write, overwriting any previous entry.
    async fn set(&self, key: &PolicyKey, entry: PolicyEntry) -> Result<(), StateError>;

    /// Write only if the stored version matches `expected_version` (0 means
    /// "key must not exist yet").
    async fn compare_and_swap(
        &self,
        key: &PolicyKey,
        expected_version: u64,
        entry: PolicyEntry,
    ) -> Result<CasResult, StateError>;

    /// Returns `true` if the key existed.
    async fn delete(&self, key: &PolicyKey) -> Result<bool, StateError>;

    /// All entries under a namespace, used by the Finalizer/Cascade Manager
    /// (E) to enumerate generated policies for a deleted model and by the
    /// informer cache on startup (spec.md §4.3).
    async fn scan_namespace(&self, namespace: &str) -> Result<Vec<(PolicyKey, PolicyEntry)>, StateError>;
}
