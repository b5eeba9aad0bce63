//! API-Key Service (component I, spec.md §4.7).
//!
//! Opaque bearer keys: a fixed ASCII prefix followed by a base62 encoding of
//! 256 bits of CSPRNG output. Only a SHA-256 hash and a short display prefix
//! are ever stored, so `validate` is an O(1) hash lookup -- the plaintext is
//! returned exactly once, at `create` time.
//!
//! Storage is a plain trait (spec.md's non-goal excludes the persistence
//! *engine*, not the interface); `InMemoryApiKeyStore` is the in-process
//! backend for tests/dev, mirroring `maas-state-memory`'s `DashMap` pattern.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

const KEY_PREFIX: &str = "maas_sk_";
const BASE62_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// One stored key record. The plaintext is never retained.
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    pub id: String,
    pub owner_user: String,
    pub owner_groups: Vec<String>,
    pub name: String,
    pub description: Option<String>,
    pub display_prefix: String,
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked: bool,
}

impl ApiKeyRecord {
    fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// Returned once, at creation time (spec.md §4.7).
#[derive(Debug, Clone)]
pub struct CreatedKey {
    pub id: String,
    pub plaintext: String,
    pub prefix: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of `validate`, either admitted with the owner identity or denied
/// with a machine-readable reason (spec.md §4.7, §7 `NotFound`/`Denied`).
#[derive(Debug, Clone)]
pub enum ValidateOutcome {
    Valid { key_id: String, user_id: String, groups: Vec<String> },
    Invalid { reason: &'static str },
}

/// Pagination parameters for `list` (spec.md §4.7: `limit ∈ [1, 100]`).
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Pagination {
    #[must_use]
    pub fn clamp(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self {
            limit: limit.unwrap_or(20).clamp(1, 100),
            offset: offset.unwrap_or(0),
        }
    }
}

pub struct ListPage {
    pub keys: Vec<ApiKeyRecord>,
    pub has_more: bool,
}

fn generate_plaintext() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let mut value = num_bigint_from_bytes(&bytes);
    let mut encoded = Vec::with_capacity(44);
    if value == [0u32; 8] {
        encoded.push(BASE62_ALPHABET[0]);
    }
    while value != [0u32; 8] {
        let (quotient, remainder) = divmod62(value);
        encoded.push(BASE62_ALPHABET[remainder as usize]);
        value = quotient;
    }
    encoded.reverse();
    format!("{KEY_PREFIX}{}", String::from_utf8(encoded).expect("base62 alphabet is ASCII"))
}

// 256-bit big-endian value as eight u32 limbs, avoiding a bignum dependency
// the teacher's stack doesn't already carry.
fn num_bigint_from_bytes(bytes: &[u8; 32]) -> [u32; 8] {
    let mut limbs = [0u32; 8];
    for (i, chunk) in bytes.chunks_exact(4).enumerate() {
        limbs[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    limbs
}

fn divmod62(mut limbs: [u32; 8]) -> ([u32; 8], u32) {
    let mut remainder: u64 = 0;
    for limb in &mut limbs {
        let acc = (remainder << 32) | u64::from(*limb);
        *limb = (acc / 62) as u32;
        remainder = acc % 62;
    }
    (limbs, remainder as u32)
}

fn hash_key(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

fn display_prefix(plaintext: &str) -> String {
    plaintext.chars().take(KEY_PREFIX.len() + 6).collect()
}

/// Storage seam for the API-key service (spec.md's non-goal excludes the
/// persistence *engine*; this is the interface it names).
#[async_trait::async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn insert(&self, record: ApiKeyRecord);
    async fn find_by_hash(&self, hash: &str) -> Option<ApiKeyRecord>;
    async fn find_by_id(&self, id: &str) -> Option<ApiKeyRecord>;
    async fn revoke(&self, id: &str) -> bool;
    async fn revoke_all(&self, owner_user: &str) -> usize;
    async fn list_by_owner(&self, owner_user: &str) -> Vec<ApiKeyRecord>;
}

/// In-process backend, keyed by hash for O(1) `validate` lookups and by id
/// for owner-scoped operations.
#[derive(Default)]
pub struct InMemoryApiKeyStore {
    by_hash: DashMap<String, ApiKeyRecord>,
    by_id: DashMap<String, String>,
}

impl InMemoryApiKeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ApiKeyStore for InMemoryApiKeyStore {
    async fn insert(&self, record: ApiKeyRecord) {
        self.by_id.insert(record.id.clone(), record.hash.clone());
        self.by_hash.insert(record.hash.clone(), record);
    }

    async fn find_by_hash(&self, hash: &str) -> Option<ApiKeyRecord> {
        self.by_hash.get(hash).map(|e| e.value().clone())
    }

    async fn find_by_id(&self, id: &str) -> Option<ApiKeyRecord> {
        let hash = self.by_id.get(id)?.value().clone();
        self.by_hash.get(&hash).map(|e| e.value().clone())
    }

    async fn revoke(&self, id: &str) -> bool {
        let Some(hash) = self.by_id.get(id).map(|e| e.value().clone()) else {
            return false;
        };
        if let Some(mut entry) = self.by_hash.get_mut(&hash) {
            entry.revoked = true;
            true
        } else {
            false
        }
    }

    async fn revoke_all(&self, owner_user: &str) -> usize {
        let mut count = 0;
        for mut entry in self.by_hash.iter_mut() {
            if entry.owner_user == owner_user && !entry.revoked {
                entry.revoked = true;
                count += 1;
            }
        }
        count
    }

    async fn list_by_owner(&self, owner_user: &str) -> Vec<ApiKeyRecord> {
        let mut records: Vec<ApiKeyRecord> = self.by_hash.iter().filter(|e| e.owner_user == owner_user).map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        records
    }
}

/// The service façade `maas-server`'s handlers call (spec.md §4.7).
pub struct ApiKeyService {
    store: Arc<dyn ApiKeyStore>,
}

impl ApiKeyService {
    #[must_use]
    pub fn new(store: Arc<dyn ApiKeyStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        owner_user: &str,
        owner_groups: &[String],
        name: &str,
        description: Option<String>,
        expires_in_seconds: Option<i64>,
        now: DateTime<Utc>,
    ) -> CreatedKey {
        let plaintext = generate_plaintext();
        let hash = hash_key(&plaintext);
        let prefix = display_prefix(&plaintext);
        let id = uuid::Uuid::new_v4().to_string();
        let expires_at = expires_in_seconds.map(|s| now + chrono::Duration::seconds(s));

        self.store
            .insert(ApiKeyRecord {
                id: id.clone(),
                owner_user: owner_user.to_owned(),
                owner_groups: owner_groups.to_vec(),
                name: name.to_owned(),
                description,
                display_prefix: prefix.clone(),
                hash,
                created_at: now,
                expires_at,
                revoked: false,
            })
            .await;

        CreatedKey { id, plaintext, prefix, created_at: now, expires_at }
    }

    /// O(1) hash lookup, invoked by the gateway on every inference request
    /// (spec.md §4.7).
    pub async fn validate(&self, plaintext: &str, now: DateTime<Utc>) -> ValidateOutcome {
        if !plaintext.starts_with(KEY_PREFIX) {
            return ValidateOutcome::Invalid { reason: "key not found" };
        }
        let hash = hash_key(plaintext);
        let Some(record) = self.store.find_by_hash(&hash).await else {
            return ValidateOutcome::Invalid { reason: "key not found" };
        };
        if !record.is_usable(now) {
            return ValidateOutcome::Invalid { reason: "key revoked or expired" };
        }
        ValidateOutcome::Valid { key_id: record.id, user_id: record.owner_user, groups: record.owner_groups }
    }

    /// Returns `false` if the key doesn't exist or isn't owned by
    /// `owner_user` (spec.md §6 "owner check").
    pub async fn revoke(&self, id: &str, owner_user: &str) -> bool {
        match self.store.find_by_id(id).await {
            Some(record) if record.owner_user == owner_user => self.store.revoke(id).await,
            _ => false,
        }
    }

    pub async fn revoke_all(&self, owner_user: &str) -> usize {
        self.store.revoke_all(owner_user).await
    }

    pub async fn list(&self, owner_user: &str, page: Pagination) -> ListPage {
        let all = self.store.list_by_owner(owner_user).await;
        let keys: Vec<ApiKeyRecord> = all.iter().skip(page.offset).take(page.limit).cloned().collect();
        let has_more = page.offset + keys.len() < all.len();
        ListPage { keys, has_more }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn service() -> ApiKeyService {
        ApiKeyService::new(Arc::new(InMemoryApiKeyStore::new()))
    }

    #[tokio::test]
    async fn generated_key_has_fixed_prefix() {
        let svc = service();
        let created = svc.create("alice", &[], "k1", None, None, now()).await;
        assert!(created.plaintext.starts_with(KEY_PREFIX));
        assert!(created.plaintext.len() > KEY_PREFIX.len());
    }

    #[tokio::test]
    async fn validate_round_trips_owner_identity() {
        let svc = service();
        let created = svc.create("alice", &["free-users".to_owned()], "k1", None, None, now()).await;
        match svc.validate(&created.plaintext, now()).await {
            ValidateOutcome::Valid { user_id, groups, .. } => {
                assert_eq!(user_id, "alice");
                assert_eq!(groups, vec!["free-users".to_owned()]);
            }
            ValidateOutcome::Invalid { .. } => panic!("expected valid"),
        }
    }

    #[tokio::test]
    async fn validate_unknown_key_is_not_found() {
        let svc = service();
        let outcome = svc.validate("maas_sk_doesnotexist", now()).await;
        assert!(matches!(outcome, ValidateOutcome::Invalid { reason: "key not found" }));
    }

    #[tokio::test]
    async fn revoke_then_validate_denies_with_reason() {
        let svc = service();
        let created = svc.create("alice", &[], "k1", None, None, now()).await;
        assert!(svc.revoke(&created.id, "alice").await);
        let outcome = svc.validate(&created.plaintext, now()).await;
        assert!(matches!(outcome, ValidateOutcome::Invalid { reason: "key revoked or expired" }));
    }

    #[tokio::test]
    async fn revoke_by_non_owner_fails() {
        let svc = service();
        let created = svc.create("alice", &[], "k1", None, None, now()).await;
        assert!(!svc.revoke(&created.id, "mallory").await);
    }

    #[tokio::test]
    async fn expired_key_fails_validation() {
        let svc = service();
        let created = svc.create("alice", &[], "k1", None, Some(60), now()).await;
        let later = now() + chrono::Duration::seconds(120);
        let outcome = svc.validate(&created.plaintext, later).await;
        assert!(matches!(outcome, ValidateOutcome::Invalid { reason: "key revoked or expired" }));
    }

    #[tokio::test]
    async fn list_paginates_and_reports_has_more() {
        let svc = service();
        for i in 0..5 {
            svc.create("alice", &[], &format!("k{i}"), None, None, now()).await;
        }
        let page = svc.list("alice", Pagination { limit: 2, offset: 0 }).await;
        assert_eq!(page.keys.len(), 2);
        assert!(page.has_more);

        let last_page = svc.list("alice", Pagination { limit: 2, offset: 4 }).await;
        assert_eq!(last_page.keys.len(), 1);
        assert!(!last_page.has_more);
    }

    #[tokio::test]
    async fn revoke_all_revokes_every_key_for_owner() {
        let svc = service();
        svc.create("alice", &[], "k1", None, None, now()).await;
        svc.create("alice", &[], "k2", None, None, now()).await;
        svc.create("bob", &[], "k3", None, None, now()).await;

        let revoked = svc.revoke_all("alice").await;
        assert_eq!(revoked, 2);

        let page = svc.list("alice", Pagination { limit: 10, offset: 0 }).await;
        assert!(page.keys.iter().all(|k| k.revoked));
    }

    #[test]
    fn pagination_clamps_limit_into_bounds() {
        assert_eq!(Pagination::clamp(Some(0), None).limit, 1);
        assert_eq!(Pagination::clamp(Some(500), None).limit, 100);
        assert_eq!(Pagination::clamp(None, None).limit, 20);
    }
}
