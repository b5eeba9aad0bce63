use serde::{Deserialize, Serialize};

/// The identity the gateway resolved for an inbound caller, per spec.md §4.6.
///
/// Produced by the identity extractor middleware from `X-Identity-User` /
/// `X-Identity-Groups`; never constructed from untrusted input directly by
/// downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CallerIdentity {
    pub user_id: String,
    pub groups: Vec<String>,
}

impl CallerIdentity {
    #[must_use]
    pub fn new(user_id: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            groups,
        }
    }

    /// Whether this caller matches an `AccessPolicy`/`Subscription` subject
    /// set: membership in any listed group OR a listed user (OR semantics,
    /// spec.md §3).
    #[must_use]
    pub fn matches(&self, subjects: &crate::subject::Subjects) -> bool {
        subjects.users.iter().any(|u| u == &self.user_id)
            || self.groups.iter().any(|g| subjects.groups.contains(g))
    }
}

/// In-flight, non-persisted identity enriched by the auth document
/// (spec.md §3 "Derived identity").
///
/// `groups_str` is the sorted, comma-joined subset of the caller's groups
/// that were accepted by the matching `AccessPolicy` rule(s) -- the
/// scalar-string bridge the rate-limit document's expression language
/// consumes, not the caller's full group list (spec.md §4.1, §9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DerivedIdentity {
    pub user_id: String,
    pub groups: Vec<String>,
    pub groups_str: String,
    pub subscription: Option<String>,
}

impl DerivedIdentity {
    #[must_use]
    pub fn new(user_id: impl Into<String>, groups: Vec<String>) -> Self {
        let mut sorted = groups.clone();
        sorted.sort();
        let groups_str = sorted.join(",");
        Self {
            user_id: user_id.into(),
            groups,
            groups_str,
            subscription: None,
        }
    }

    #[must_use]
    pub fn with_subscription(mut self, subscription: impl Into<String>) -> Self {
        self.subscription = Some(subscription.into());
        self
    }
}
