use serde::{Deserialize, Serialize};

/// A subject set matched with OR semantics: a caller matches if they belong
/// to any listed group, or are any listed user (spec.md §3).
///
/// Shared between `AccessPolicySpec` and `SubscriptionSpec.owner` so both
/// resource kinds describe "who this applies to" the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Subjects {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

impl Subjects {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(Subjects::default().is_empty());
    }

    #[test]
    fn roundtrip_json() {
        let subjects = Subjects {
            groups: vec!["free-users".into()],
            users: vec!["alice".into()],
        };
        let json = serde_json::to_string(&subjects).unwrap();
        let back: Subjects = serde_json::from_str(&json).unwrap();
        assert_eq!(subjects, back);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let subjects: Subjects = serde_json::from_str("{}").unwrap();
        assert!(subjects.is_empty());
    }
}
