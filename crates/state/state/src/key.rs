use serde::{Deserialize, Serialize};

/// Addresses a generated-policy entry in the `PolicyStore`: one entry per
/// `(namespace, model)` pair (spec.md §4.1, §5).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyKey {
    pub namespace: String,
    pub model: String,
}

impl PolicyKey {
    #[must_use]
    pub fn new(namespace: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}/{}", self.namespace, self.model)
    }
}

impl std::fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_format() {
        let key = PolicyKey::new("models", "gpt-oss-20b");
        assert_eq!(key.canonical(), "models/gpt-oss-20b");
        assert_eq!(key.to_string(), "models/gpt-oss-20b");
    }
}
