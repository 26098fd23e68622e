//! Policy rules.
//!
//! A [`PolicyRule`] is the declarative content of one named policy: who is
//! allowed, who is denied, and which claims are required. Rules carry no
//! behaviour of their own; [`crate::compiler::PolicyCompiler`] turns them into
//! evaluable predicates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::claims::Claim;

/// Declarative configuration for one named authorization policy.
///
/// No validation is performed. Overlapping allow/deny entries, empty sets,
/// and empty rules are all legal and resolved at evaluation time:
///
/// - a principal matching any allowed role or user is never excluded by the
///   deny lists;
/// - deny lists apply unconditionally when no allow entries exist;
/// - a rule with no content admits every authenticated principal.
///
/// # Examples
///
/// ```
/// use warden_policy::claims::Claim;
/// use warden_policy::rule::PolicyRule;
///
/// let rule = PolicyRule::new()
///     .allow_role("admin")
///     .allow_user("carol")
///     .deny_role("contractor")
///     .require_claim(Claim::new("dept", ["eng"]));
///
/// let identities = rule.combined_allowed_identities();
/// assert!(identities.contains("admin"));
/// assert!(identities.contains("carol"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyRule {
    /// Roles granted access.
    pub allow_roles: BTreeSet<String>,

    /// Users granted access.
    pub allow_users: BTreeSet<String>,

    /// Roles refused access unless they also match an allowed identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny_roles: Option<BTreeSet<String>>,

    /// Users refused access unless they also match an allowed identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny_users: Option<BTreeSet<String>>,

    /// A single claim the principal must carry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_claim: Option<Claim>,

    /// Additional claims the principal must carry, all of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_claims: Option<Vec<Claim>>,
}

impl PolicyRule {
    /// Creates an empty rule (admits any authenticated principal).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an allowed role.
    pub fn allow_role(mut self, role: impl Into<String>) -> Self {
        self.allow_roles.insert(role.into());
        self
    }

    /// Adds an allowed user.
    pub fn allow_user(mut self, user: impl Into<String>) -> Self {
        self.allow_users.insert(user.into());
        self
    }

    /// Adds a denied role, creating the deny-role list if absent.
    pub fn deny_role(mut self, role: impl Into<String>) -> Self {
        self.deny_roles
            .get_or_insert_with(BTreeSet::new)
            .insert(role.into());
        self
    }

    /// Adds a denied user, creating the deny-user list if absent.
    pub fn deny_user(mut self, user: impl Into<String>) -> Self {
        self.deny_users
            .get_or_insert_with(BTreeSet::new)
            .insert(user.into());
        self
    }

    /// Sets the single required claim, replacing any previous one.
    pub fn require_claim(mut self, claim: Claim) -> Self {
        self.allow_claim = Some(claim);
        self
    }

    /// Appends a claim to the required-claims list.
    pub fn also_require_claim(mut self, claim: Claim) -> Self {
        self.allow_claims.get_or_insert_with(Vec::new).push(claim);
        self
    }

    /// Returns the union of allowed roles and allowed users.
    ///
    /// Users and roles share one namespace at evaluation time: a principal
    /// whose user identifier equals an entry satisfies it just like a role.
    pub fn combined_allowed_identities(&self) -> BTreeSet<&str> {
        self.allow_roles
            .iter()
            .chain(&self.allow_users)
            .map(String::as_str)
            .collect()
    }

    /// Returns all required claims: `allow_claim` first, then `allow_claims`
    /// in list order.
    pub fn required_claims(&self) -> impl Iterator<Item = &Claim> {
        self.allow_claim
            .iter()
            .chain(self.allow_claims.iter().flatten())
    }

    /// Returns whether the rule has no allow, deny, or claim content.
    ///
    /// An empty deny list still counts as content, since its presence is
    /// observable in the configuration even though it never rejects anyone.
    pub fn is_empty(&self) -> bool {
        self.allow_roles.is_empty()
            && self.allow_users.is_empty()
            && self.deny_roles.is_none()
            && self.deny_users.is_none()
            && self.allow_claim.is_none()
            && self.allow_claims.is_none()
    }
}
