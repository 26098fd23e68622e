//! Policy registries: named rules in, named predicates out.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::compiler::{CompiledPolicy, Decision, PolicyCompiler};
use crate::enforcement::{EnforcementError, Result};
use crate::principal::Principal;
use crate::rule::PolicyRule;

/// Named policy rules, as declared at startup.
///
/// Each name maps to either a rule or `None`. `None` is not an empty rule: it
/// registers the name while granting access to no one. Names are unique;
/// registering a name again replaces the earlier entry.
///
/// # Examples
///
/// ```
/// use warden_policy::registry::PolicySet;
/// use warden_policy::rule::PolicyRule;
///
/// let set = PolicySet::new()
///     .with_policy("reports", PolicyRule::new().allow_role("analyst"))
///     .with_locked("legacy_export");
///
/// assert_eq!(set.len(), 2);
/// assert!(set.get("legacy_export").unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicySet {
    entries: BTreeMap<String, Option<PolicyRule>>,
}

impl PolicySet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a policy with a rule.
    pub fn with_policy(mut self, name: impl Into<String>, rule: PolicyRule) -> Self {
        self.insert(name, Some(rule));
        self
    }

    /// Registers a policy name that grants access to no one.
    pub fn with_locked(mut self, name: impl Into<String>) -> Self {
        self.insert(name, None);
        self
    }

    /// Registers a policy, returning the entry it replaced (if any).
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        rule: Option<PolicyRule>,
    ) -> Option<Option<PolicyRule>> {
        self.entries.insert(name.into(), rule)
    }

    /// Returns the entry for `name`: `None` if unregistered, `Some(None)` if
    /// registered without a rule.
    pub fn get(&self, name: &str) -> Option<Option<&PolicyRule>> {
        self.entries.get(name).map(Option::as_ref)
    }

    /// Iterates over entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&PolicyRule>)> {
        self.entries
            .iter()
            .map(|(name, rule)| (name.as_str(), rule.as_ref()))
    }

    /// Returns the number of registered names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no names are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compiles every entry with the default compiler.
    pub fn compile(&self) -> CompiledPolicies {
        PolicyCompiler::new().compile_all(self)
    }
}

impl FromIterator<(String, Option<PolicyRule>)> for PolicySet {
    fn from_iter<I: IntoIterator<Item = (String, Option<PolicyRule>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Compiled policies keyed by name, ready to hand to a request pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledPolicies {
    policies: BTreeMap<String, CompiledPolicy>,
}

impl CompiledPolicies {
    /// Returns the compiled policy for `name`.
    pub fn get(&self, name: &str) -> Option<&CompiledPolicy> {
        self.policies.get(name)
    }

    /// Returns whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    /// Returns registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    /// Iterates over compiled policies in name order.
    pub fn iter(&self) -> btree_map::Values<'_, String, CompiledPolicy> {
        self.policies.values()
    }

    /// Returns the number of compiled policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns whether there are no compiled policies.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Evaluates the named policy.
    ///
    /// Fails only when `name` was never registered. A name registered
    /// without a rule yields a denying [`Decision`], not an error.
    pub fn authorize<P: Principal + ?Sized>(&self, name: &str, principal: &P) -> Result<Decision> {
        self.get(name)
            .map(|policy| policy.evaluate(principal))
            .ok_or_else(|| EnforcementError::UnknownPolicy(name.to_string()))
    }
}

impl FromIterator<CompiledPolicy> for CompiledPolicies {
    fn from_iter<I: IntoIterator<Item = CompiledPolicy>>(iter: I) -> Self {
        Self {
            policies: iter
                .into_iter()
                .map(|policy| (policy.name().to_string(), policy))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CompiledPolicies {
    type Item = &'a CompiledPolicy;
    type IntoIter = btree_map::Values<'a, String, CompiledPolicy>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Outcome;
    use crate::principal::Identity;

    #[test]
    fn test_insert_replaces() {
        let mut set = PolicySet::new().with_locked("reports");

        let previous = set.insert("reports", Some(PolicyRule::new().allow_role("analyst")));

        assert_eq!(previous, Some(None));
        assert!(set.get("reports").unwrap().is_some());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_get_distinguishes_unregistered_from_locked() {
        let set = PolicySet::new().with_locked("archive");

        assert_eq!(set.get("archive"), Some(None));
        assert_eq!(set.get("missing"), None);
    }

    #[test]
    fn test_compile_preserves_names() {
        let compiled = PolicySet::new()
            .with_policy("b", PolicyRule::new())
            .with_locked("a")
            .compile();

        assert_eq!(compiled.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(compiled.get("a").unwrap().is_locked());
        assert!(!compiled.get("b").unwrap().is_locked());
    }

    #[test]
    fn test_authorize_unknown_policy() {
        let compiled = PolicySet::new().compile();
        let result = compiled.authorize("nope", &Identity::authenticated("a"));

        assert!(matches!(result, Err(EnforcementError::UnknownPolicy(name)) if name == "nope"));
    }

    #[test]
    fn test_authorize_locked_policy_is_a_decision() {
        let compiled = PolicySet::new().with_locked("archive").compile();
        let decision = compiled
            .authorize("archive", &Identity::authenticated("a"))
            .unwrap();

        assert_eq!(decision.policy, "archive");
        assert_eq!(decision.outcome, Outcome::Locked);
    }

    #[test]
    fn test_policy_set_serializes_as_map() {
        let set = PolicySet::new()
            .with_policy("reports", PolicyRule::new().allow_role("analyst"))
            .with_locked("archive");

        let json = serde_json::to_value(&set).unwrap();
        assert!(json["archive"].is_null());
        assert_eq!(json["reports"]["allow_roles"][0], "analyst");

        let back: PolicySet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }
}
