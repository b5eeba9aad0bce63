//! Authentication/credential ambient stack (spec.md §4.7, §6), grounded on
//! the teacher's `auth/` module layout (`api_key.rs`, `crypto.rs`).

pub mod api_key;
pub mod token;

pub use api_key::{ApiKeyService, ApiKeyStore, InMemoryApiKeyStore, Pagination, ValidateOutcome};
