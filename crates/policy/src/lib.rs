//! Policy Aggregator (component A): turns a model's `AccessPolicy` and
//! `Subscription` sets into the generated `AuthDocument`/`RateLimitDocument`
//! pair. Pure, deterministic, no I/O.

use maas_core::{
    AccessPolicySpec, AuthDocument, AuthRule, RateLimitDocument, RateLimitRule, SubscriptionSpec,
    and_fragments, in_groups_fragment, not_in_groups_fragment,
};

/// An `AccessPolicy` reduced to what the aggregator needs: its name (used as
/// the `AuthRule`'s `source_policy`) and spec.
#[derive(Debug, Clone)]
pub struct PolicySource {
    pub name: String,
    pub spec: AccessPolicySpec,
}

/// A `Subscription` reduced to what the aggregator needs.
#[derive(Debug, Clone)]
pub struct SubscriptionSource {
    pub name: String,
    pub spec: SubscriptionSpec,
}

/// Aggregates the `AccessPolicy`/`Subscription` sets targeting `model` into
/// the generated policy pair, per spec.md §4.1.
///
/// Both inputs may be supplied in any order; the output is sorted so two
/// calls with the same logical input set produce byte-identical documents
/// (spec.md §4.1 "Determinism").
#[must_use]
pub fn aggregate(
    model: &str,
    policies: &[PolicySource],
    subscriptions: &[SubscriptionSource],
) -> (AuthDocument, RateLimitDocument) {
    let auth_rules: Vec<AuthRule> = policies
        .iter()
        .filter(|p| p.spec.model_refs.iter().any(|r| r.name == model))
        .map(|p| AuthRule::new(p.name.clone(), p.spec.subjects.groups.clone(), p.spec.subjects.users.clone()))
        .collect();
    let auth_doc = AuthDocument::new(model, auth_rules);

    let mut matching: Vec<&SubscriptionSource> = subscriptions
        .iter()
        .filter(|s| s.spec.model_ref(model).is_some())
        .collect();
    // tokenLimit DESC, ties by name ASC, for determinism (spec.md §4.1).
    matching.sort_by(|a, b| {
        let limit_a = a.spec.model_ref(model).expect("filtered above").token_limit;
        let limit_b = b.spec.model_ref(model).expect("filtered above").token_limit;
        limit_b.cmp(&limit_a).then_with(|| a.name.cmp(&b.name))
    });

    let mut rl_rules = Vec::with_capacity(matching.len());
    let mut prior_owner_groups: Vec<Vec<String>> = Vec::new();
    for sub in &matching {
        let model_ref = sub.spec.model_ref(model).expect("filtered above");
        let own = in_groups_fragment(&sub.spec.owner.groups);
        let mut fragments = vec![own];
        for prior in &prior_owner_groups {
            fragments.push(not_in_groups_fragment(prior));
        }
        rl_rules.push(RateLimitRule::new(
            and_fragments(&fragments),
            model_ref.token_limit,
            model_ref.window.seconds(),
            Some(sub.name.clone()),
        ));
        prior_owner_groups.push(sub.spec.owner.groups.clone());
    }
    let rl_doc = RateLimitDocument::new(model, rl_rules);

    (auth_doc, rl_doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maas_core::{ModelRef, RateLimitWindow, Subjects, SubscriptionModelRef};

    fn policy(name: &str, model: &str, groups: &[&str], users: &[&str]) -> PolicySource {
        PolicySource {
            name: name.to_owned(),
            spec: AccessPolicySpec {
                model_refs: vec![ModelRef { name: model.to_owned() }],
                subjects: Subjects {
                    groups: groups.iter().map(|s| (*s).to_owned()).collect(),
                    users: users.iter().map(|s| (*s).to_owned()).collect(),
                },
            },
        }
    }

    fn subscription(name: &str, model: &str, groups: &[&str], token_limit: u64) -> SubscriptionSource {
        SubscriptionSource {
            name: name.to_owned(),
            spec: SubscriptionSpec {
                owner: Subjects {
                    groups: groups.iter().map(|s| (*s).to_owned()).collect(),
                    users: vec![],
                },
                model_refs: vec![SubscriptionModelRef {
                    name: model.to_owned(),
                    token_limit,
                    window: RateLimitWindow::Hour,
                    cost_per_token: None,
                    hint: None,
                }],
            },
        }
    }

    #[test]
    fn no_policies_emits_no_auth_rules() {
        let (auth, _) = aggregate("m", &[], &[]);
        assert!(auth.rules.is_empty());
    }

    #[test]
    fn no_subscriptions_emits_only_catch_all_deny() {
        let (_, rl) = aggregate("m", &[], &[]);
        assert_eq!(rl.rules.len(), 1);
        assert_eq!(rl.rules[0].limit, 0);
        assert_eq!(rl.rules[0].predicate, "true");
    }

    #[test]
    fn unrelated_model_is_filtered_out() {
        let policies = vec![policy("p1", "other-model", &["g"], &[])];
        let (auth, _) = aggregate("m", &policies, &[]);
        assert!(auth.rules.is_empty());
    }

    #[test]
    fn auth_rule_per_policy() {
        let policies = vec![policy("p1", "m", &["gold"], &["alice"])];
        let (auth, _) = aggregate("m", &policies, &[]);
        assert_eq!(auth.rules.len(), 1);
        assert_eq!(auth.rules[0].source_policy, "p1");
        assert!(auth.allows(&["gold".to_string()], "bob"));
        assert!(auth.allows(&[], "alice"));
    }

    #[test]
    fn subscriptions_ordered_by_token_limit_desc_then_name() {
        let subs = vec![
            subscription("sub-b", "m", &["silver"], 500),
            subscription("sub-a", "m", &["gold"], 1_000),
            subscription("sub-c", "m", &["bronze"], 500),
        ];
        let (_, rl) = aggregate("m", &[], &subs);
        // sub-a (1000) first, then sub-b/sub-c tied at 500 ordered by name.
        assert_eq!(rl.rules[0].subscription.as_deref(), Some("sub-a"));
        assert_eq!(rl.rules[1].subscription.as_deref(), Some("sub-b"));
        assert_eq!(rl.rules[2].subscription.as_deref(), Some("sub-c"));
        assert_eq!(rl.rules[3].predicate, "true");
    }

    #[test]
    fn lower_priority_subscription_excludes_higher_priority_owners() {
        let subs = vec![
            subscription("sub-gold", "m", &["gold"], 1_000),
            subscription("sub-any", "m", &[], 100),
        ];
        let (_, rl) = aggregate("m", &[], &subs);
        assert_eq!(
            rl.rules[1].predicate,
            "inGroups(groups_str, \"\") && !inGroups(groups_str, \"gold\")"
        );
    }

    #[test]
    fn determinism_under_reordering() {
        let subs_a = vec![
            subscription("sub-a", "m", &["gold"], 1_000),
            subscription("sub-b", "m", &["silver"], 500),
        ];
        let subs_b = vec![subs_a[1].clone(), subs_a[0].clone()];
        let policies_a = vec![policy("p1", "m", &["g1"], &[]), policy("p2", "m", &["g2"], &[])];
        let policies_b = vec![policies_a[1].clone(), policies_a[0].clone()];

        let (auth_a, rl_a) = aggregate("m", &policies_a, &subs_a);
        let (auth_b, rl_b) = aggregate("m", &policies_b, &subs_b);
        assert_eq!(auth_a, auth_b);
        assert_eq!(rl_a, rl_b);
    }

    #[test]
    fn zero_token_limit_subscription_emitted_like_any_other() {
        let subs = vec![subscription("sub-free", "m", &["free"], 0)];
        let (_, rl) = aggregate("m", &[], &subs);
        assert_eq!(rl.rules[0].limit, 0);
        assert_eq!(rl.rules[0].subscription.as_deref(), Some("sub-free"));
    }
}
