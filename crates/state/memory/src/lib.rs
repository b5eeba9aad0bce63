use async_trait::async_trait;
use dashmap::DashMap;
use maas_state::{CasResult, PolicyEntry, PolicyKey, PolicyStore, StateError};

/// In-process `PolicyStore` backed by a `DashMap`, for tests, local
/// development, and single-node deployments where the reconciler and server
/// share a process (spec.md §5).
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    entries: DashMap<PolicyKey, PolicyEntry>,
}

impl MemoryPolicyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn get(&self, key: &PolicyKey) -> Result<Option<PolicyEntry>, StateError> {
        Ok(self.entries.get(key).map(|e| e.clone()))
    }

    async fn set(&self, key: &PolicyKey, entry: PolicyEntry) -> Result<(), StateError> {
        self.entries.insert(key.clone(), entry);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &PolicyKey,
        expected_version: u64,
        entry: PolicyEntry,
    ) -> Result<CasResult, StateError> {
        match self.entries.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                if expected_version == 0 {
                    slot.insert(entry);
                    Ok(CasResult::Ok)
                } else {
                    Ok(CasResult::Conflict { current: None })
                }
            }
            dashmap::mapref::entry::Entry::Occupied(mut slot) => {
                if slot.get().version == expected_version {
                    slot.insert(entry);
                    Ok(CasResult::Ok)
                } else {
                    Ok(CasResult::Conflict {
                        current: Some(slot.get().clone()),
                    })
                }
            }
        }
    }

    async fn delete(&self, key: &PolicyKey) -> Result<bool, StateError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn scan_namespace(&self, namespace: &str) -> Result<Vec<(PolicyKey, PolicyEntry)>, StateError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.key().namespace == namespace)
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect())
    }
}
