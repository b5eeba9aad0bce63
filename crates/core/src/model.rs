use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, Phase};

/// Where a `ModelRegistration` points its traffic.
///
/// `External` is accepted by validation but left `Unsupported` by the
/// reconciler (spec.md §4.2, §7): the backend-kind registry has exactly one
/// entry today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "kind")]
pub enum BackendRef {
    InferenceService { name: String, namespace: String },
    External { name: String, namespace: String },
}

impl BackendRef {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InferenceService { .. } => "InferenceService",
            Self::External { .. } => "External",
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::InferenceService { name, .. } | Self::External { name, .. } => name,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::InferenceService { namespace, .. } | Self::External { namespace, .. } => namespace,
        }
    }
}

/// `ModelRegistration.spec`, per spec.md §3.
#[derive(Debug, Clone, CustomResource, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[kube(
    group = "maas.dev",
    version = "v1alpha1",
    kind = "ModelRegistration",
    namespaced,
    status = "ModelRegistrationStatus",
    shortname = "mreg"
)]
#[serde(rename_all = "camelCase")]
pub struct ModelRegistrationSpec {
    /// Logical model name exposed to callers, e.g. `"gpt-oss-20b"`.
    pub model_name: String,
    pub backend_ref: BackendRef,
}

/// `ModelRegistration.status`, rebuilt on every reconcile (spec.md §4.2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ModelRegistrationStatus {
    #[serde(default)]
    pub phase: Phase,
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub observed_generation: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_ref_inference_service_accessors() {
        let backend = BackendRef::InferenceService {
            name: "llama".into(),
            namespace: "models".into(),
        };
        assert_eq!(backend.kind(), "InferenceService");
        assert_eq!(backend.name(), "llama");
        assert_eq!(backend.namespace(), "models");
    }

    #[test]
    fn backend_ref_external_is_distinguishable() {
        let backend = BackendRef::External {
            name: "openai".into(),
            namespace: "models".into(),
        };
        assert_eq!(backend.kind(), "External");
    }

    #[test]
    fn spec_roundtrips_camel_case() {
        let spec = ModelRegistrationSpec {
            model_name: "gpt-oss-20b".into(),
            backend_ref: BackendRef::InferenceService {
                name: "gpt-oss".into(),
                namespace: "models".into(),
            },
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["modelName"], "gpt-oss-20b");
        let back: ModelRegistrationSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back.model_name, "gpt-oss-20b");
    }

    #[test]
    fn status_defaults_to_pending_no_conditions() {
        let status = ModelRegistrationStatus::default();
        assert_eq!(status.phase, Phase::Pending);
        assert!(status.conditions.is_empty());
    }
}
