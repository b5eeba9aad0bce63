use serde::{Deserialize, Serialize};

/// One admission rule inside an `AuthDocument`: callers matching `groups` OR
/// `users` are allowed to invoke `model` (spec.md §4.1, §3 "OR semantics").
///
/// `groups`/`users` are kept sorted so two `AuthRule`s built from the same
/// input set in different orders compare equal -- the aggregator's
/// determinism invariant (spec.md §4.1 "Determinism", testable property
/// I-1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthRule {
    pub source_policy: String,
    pub groups: Vec<String>,
    pub users: Vec<String>,
}

impl AuthRule {
    #[must_use]
    pub fn new(source_policy: impl Into<String>, mut groups: Vec<String>, mut users: Vec<String>) -> Self {
        groups.sort();
        groups.dedup();
        users.sort();
        users.dedup();
        Self {
            source_policy: source_policy.into(),
            groups,
            users,
        }
    }
}

/// The generated authorization document for a single model: the union, via
/// OR semantics, of every `AccessPolicy` rule that names it (spec.md §4.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthDocument {
    pub model: String,
    pub rules: Vec<AuthRule>,
}

impl AuthDocument {
    #[must_use]
    pub fn new(model: impl Into<String>, mut rules: Vec<AuthRule>) -> Self {
        rules.sort_by(|a, b| a.source_policy.cmp(&b.source_policy));
        Self {
            model: model.into(),
            rules,
        }
    }

    /// Whether `groups`/`users` are admitted by any rule (OR across rules,
    /// OR within a rule's own subject set).
    #[must_use]
    pub fn allows(&self, groups: &[String], users: &str) -> bool {
        self.rules
            .iter()
            .any(|r| r.users.iter().any(|u| u == users) || groups.iter().any(|g| r.groups.contains(g)))
    }

    /// Evaluates the document against a caller, producing the derived
    /// `groups`/`groups_str` extras the matching rule writes to the request
    /// identity (spec.md §4.1 "Auth document semantics").
    ///
    /// `groups` is the intersection of the caller's groups with the union of
    /// every matched rule's allowed groups; `groups_str` is empty when the
    /// caller was admitted by user identity alone.
    #[must_use]
    pub fn evaluate(&self, caller_groups: &[String], caller_user: &str) -> AuthDecision {
        let mut matched_groups: Vec<String> = Vec::new();
        let mut allowed = false;
        for rule in &self.rules {
            let by_user = rule.users.iter().any(|u| u == caller_user);
            let matching: Vec<String> = caller_groups
                .iter()
                .filter(|g| rule.groups.contains(g))
                .cloned()
                .collect();
            if by_user || !matching.is_empty() {
                allowed = true;
                matched_groups.extend(matching);
            }
        }
        matched_groups.sort();
        matched_groups.dedup();
        let groups_str = matched_groups.join(",");
        AuthDecision {
            allowed,
            groups: matched_groups,
            groups_str,
        }
    }
}

/// Result of evaluating an [`AuthDocument`] against a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub allowed: bool,
    pub groups: Vec<String>,
    pub groups_str: String,
}

/// A single ordered rule in a `RateLimitDocument`'s predicate language.
///
/// `predicate` is a scalar-string expression over the derived identity's
/// `groups_str` (spec.md §4.1, §9): either `inGroups(groups_str, "g1,g2")`
/// or its negation, used to carve higher-priority subscriptions out of a
/// lower-priority catch-all. Rules are evaluated in order; the first match
/// wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RateLimitRule {
    pub predicate: String,
    pub limit: u64,
    pub window_seconds: u64,
    /// The subscription this rule's counter is keyed against, per spec.md
    /// §4.1's `counter(sᵢ) = {key: (userId, model, subscription=sᵢ.name), ...}`.
    /// `None` for the trailing catch-all, which has no subscription to count
    /// against.
    pub subscription: Option<String>,
}

impl RateLimitRule {
    #[must_use]
    pub fn new(predicate: impl Into<String>, limit: u64, window_seconds: u64, subscription: Option<String>) -> Self {
        Self {
            predicate: predicate.into(),
            limit,
            window_seconds,
            subscription,
        }
    }

    #[must_use]
    pub fn in_groups(values: &[String], limit: u64, window_seconds: u64) -> Self {
        Self::new(in_groups_fragment(values), limit, window_seconds, None)
    }

    /// The trailing catch-all: matches anything, denies with `limit=0`
    /// (spec.md §4.1 "catch-all deny rule").
    #[must_use]
    pub fn catch_all_deny() -> Self {
        Self {
            predicate: "true".to_owned(),
            limit: 0,
            window_seconds: 0,
            subscription: None,
        }
    }
}

/// `inGroups(groups_str, "g1,g2")`, with `values` sorted/deduped for a
/// byte-stable predicate string.
#[must_use]
pub fn in_groups_fragment(values: &[String]) -> String {
    let mut sorted = values.to_vec();
    sorted.sort();
    sorted.dedup();
    format!("inGroups(groups_str, \"{}\")", sorted.join(","))
}

/// `!inGroups(groups_str, "g1,g2")`, the negated form used to carve a
/// higher-priority subscription's subjects out of a lower-priority rule.
#[must_use]
pub fn not_in_groups_fragment(values: &[String]) -> String {
    format!("!{}", in_groups_fragment(values))
}

/// ANDs predicate fragments together, e.g. `inGroups(...) ∧ !inGroups(...)`,
/// per spec.md §4.1's rate-limit rule construction.
#[must_use]
pub fn and_fragments(fragments: &[String]) -> String {
    fragments.join(" && ")
}

/// The generated rate-limit document for a single model: an ordered rule
/// list that always ends in a catch-all deny (spec.md §4.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RateLimitDocument {
    pub model: String,
    pub rules: Vec<RateLimitRule>,
}

impl RateLimitDocument {
    /// Builds a document from already-ordered, higher-priority-first rules
    /// and appends the catch-all. Callers are responsible for ordering
    /// (typically by descending `AccessPolicy`/`Subscription` priority then
    /// name, for determinism).
    #[must_use]
    pub fn new(model: impl Into<String>, mut rules: Vec<RateLimitRule>) -> Self {
        rules.push(RateLimitRule::catch_all_deny());
        Self {
            model: model.into(),
            rules,
        }
    }
}
