use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, Phase};
use crate::subject::Subjects;

/// Reference to a `ModelRegistration` by name within the same namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ModelRef {
    pub name: String,
}

/// `AccessPolicy.spec`: grants a subject set access to a set of models
/// (spec.md §3, §4.1).
#[derive(Debug, Clone, CustomResource, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[kube(
    group = "maas.dev",
    version = "v1alpha1",
    kind = "AccessPolicy",
    namespaced,
    status = "AccessPolicyStatus",
    shortname = "map"
)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicySpec {
    pub model_refs: Vec<ModelRef>,
    #[serde(default)]
    pub subjects: Subjects,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicyStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub observed_generation: Option<i64>,
}

/// The window over which a `SubscriptionModelRef`'s `token_limit` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RateLimitWindow {
    Minute,
    Hour,
    Day,
}

impl RateLimitWindow {
    #[must_use]
    pub fn seconds(self) -> u64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
        }
    }
}

/// A single model entitlement within a `Subscription`, per spec.md §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionModelRef {
    pub name: String,
    pub token_limit: u64,
    pub window: RateLimitWindow,
    #[serde(default)]
    pub cost_per_token: Option<f64>,
    /// Hint string callers can pass to disambiguate between overlapping
    /// subscriptions for the same model (spec.md §4.4 Subscription Selector).
    #[serde(default)]
    pub hint: Option<String>,
}

/// `Subscription.spec`: grants an owner a token-budgeted entitlement to one
/// or more models (spec.md §3, §4.4).
#[derive(Debug, Clone, CustomResource, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[kube(
    group = "maas.dev",
    version = "v1alpha1",
    kind = "Subscription",
    namespaced,
    status = "SubscriptionStatus",
    shortname = "msub"
)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    pub owner: Subjects,
    pub model_refs: Vec<SubscriptionModelRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub observed_generation: Option<i64>,
}

impl SubscriptionSpec {
    #[must_use]
    pub fn model_ref(&self, name: &str) -> Option<&SubscriptionModelRef> {
        self.model_refs.iter().find(|m| m.name == name)
    }
}
