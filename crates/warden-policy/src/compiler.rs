//! Policy compilation.
//!
//! [`PolicyCompiler`] turns a policy name and an optional [`PolicyRule`] into
//! a [`CompiledPolicy`]: a self-contained predicate over a [`Principal`].
//!
//! # Evaluation order
//!
//! A compiled policy evaluates its whole precedence chain in one pass. The
//! first failing step determines the reported [`Outcome`]; the boolean result
//! is the conjunction of every step.
//!
//! 1. The principal must be authenticated.
//! 2. A name registered without a rule denies everyone ([`Outcome::Locked`]).
//! 3. If the rule allows any roles or users, the principal must be a member
//!    of at least one of them.
//! 4. Deny roles, then deny users: a matching principal is refused unless it
//!    also matched an allowed identity in step 3. With no allowed identities
//!    there is nothing to override the deny lists.
//! 5. Every required claim (`allow_claim`, then `allow_claims` in order) must
//!    be held.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::claims::Claim;
use crate::principal::Principal;
use crate::registry::{CompiledPolicies, PolicySet};
use crate::rule::PolicyRule;

/// A plain function value for hosts that register predicates by name.
pub type Predicate = Arc<dyn Fn(&dyn Principal) -> bool + Send + Sync>;

// ============================================================================
// Outcome / Decision
// ============================================================================

/// Why a compiled policy granted or refused a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every sub-rule passed.
    Granted,
    /// The principal is not authenticated.
    Unauthenticated,
    /// The policy is registered without a rule; nobody is granted access.
    Locked,
    /// The principal matches none of the allowed roles or users.
    NotAllowed,
    /// The principal matches this denied role and no allowed identity.
    DeniedRole(String),
    /// The principal matches this denied user and no allowed identity.
    DeniedUser(String),
    /// The principal lacks a required claim of this type.
    MissingClaim(String),
}

impl Outcome {
    /// Returns whether this outcome grants access.
    pub fn is_granted(&self) -> bool {
        matches!(self, Outcome::Granted)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Granted => f.write_str("granted"),
            Outcome::Unauthenticated => f.write_str("principal is not authenticated"),
            Outcome::Locked => f.write_str("policy grants access to no one"),
            Outcome::NotAllowed => f.write_str("principal matches no allowed role or user"),
            Outcome::DeniedRole(role) => write!(f, "role '{role}' is denied"),
            Outcome::DeniedUser(user) => write!(f, "user '{user}' is denied"),
            Outcome::MissingClaim(claim_type) => write!(f, "missing required claim '{claim_type}'"),
        }
    }
}

/// The result of evaluating one compiled policy for one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Name of the evaluated policy.
    pub policy: String,
    /// What the policy decided, and why.
    pub outcome: Outcome,
}

impl Decision {
    /// Returns whether access is granted.
    pub fn is_granted(&self) -> bool {
        self.outcome.is_granted()
    }
}

// ============================================================================
// CompiledPolicy
// ============================================================================

/// Precomputed form of a [`PolicyRule`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct CompiledRule {
    identities: Vec<String>,
    deny_roles: Option<Vec<String>>,
    deny_users: Option<Vec<String>>,
    claims: Vec<Claim>,
}

impl CompiledRule {
    fn from_rule(rule: &PolicyRule) -> Self {
        Self {
            identities: rule
                .combined_allowed_identities()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            deny_roles: rule.deny_roles.as_ref().map(|s| s.iter().cloned().collect()),
            deny_users: rule.deny_users.as_ref().map(|s| s.iter().cloned().collect()),
            claims: rule.required_claims().cloned().collect(),
        }
    }

    fn evaluate<P: Principal + ?Sized>(&self, principal: &P) -> Outcome {
        let allowed = self
            .identities
            .iter()
            .any(|identity| principal.is_member_of(identity));

        if !self.identities.is_empty() && !allowed {
            return Outcome::NotAllowed;
        }

        // An allowed identity overrides both deny lists.
        if !allowed {
            if let Some(role) = first_member(self.deny_roles.as_deref(), principal) {
                return Outcome::DeniedRole(role.to_owned());
            }
            if let Some(user) = first_member(self.deny_users.as_deref(), principal) {
                return Outcome::DeniedUser(user.to_owned());
            }
        }

        match self.claims.iter().find(|c| !c.is_satisfied_by(principal)) {
            Some(missing) => Outcome::MissingClaim(missing.claim_type.clone()),
            None => Outcome::Granted,
        }
    }
}

fn first_member<'a, P: Principal + ?Sized>(
    names: Option<&'a [String]>,
    principal: &P,
) -> Option<&'a str> {
    names?
        .iter()
        .find(|name| principal.is_member_of(name))
        .map(String::as_str)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Body {
    Locked,
    Rule(CompiledRule),
}

/// A named, evaluable authorization predicate.
///
/// Compiled policies are immutable plain data: they are `Send + Sync` and can
/// be evaluated concurrently without synchronisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPolicy {
    name: String,
    body: Body,
}

impl CompiledPolicy {
    /// Returns the policy name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the policy was registered without a rule.
    pub fn is_locked(&self) -> bool {
        matches!(self.body, Body::Locked)
    }

    /// Evaluates the policy and reports why it decided as it did.
    pub fn evaluate<P: Principal + ?Sized>(&self, principal: &P) -> Decision {
        Decision {
            policy: self.name.clone(),
            outcome: self.outcome(principal),
        }
    }

    /// Evaluates the policy as a boolean predicate.
    pub fn is_satisfied_by<P: Principal + ?Sized>(&self, principal: &P) -> bool {
        self.outcome(principal).is_granted()
    }

    /// Converts the policy into a shareable function value.
    pub fn into_predicate(self) -> Predicate {
        Arc::new(move |principal: &dyn Principal| self.is_satisfied_by(principal))
    }

    fn outcome<P: Principal + ?Sized>(&self, principal: &P) -> Outcome {
        if !principal.is_authenticated() {
            return Outcome::Unauthenticated;
        }

        match &self.body {
            Body::Locked => Outcome::Locked,
            Body::Rule(rule) => rule.evaluate(principal),
        }
    }
}

// ============================================================================
// PolicyCompiler
// ============================================================================

/// Compiles policy rules into [`CompiledPolicy`] predicates.
///
/// Compilation never fails: absent rules, empty rules, and overlapping
/// allow/deny entries all have a defined meaning.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyCompiler;

impl PolicyCompiler {
    /// Creates a compiler.
    pub fn new() -> Self {
        Self
    }

    /// Compiles one named policy. `None` produces a policy that denies every
    /// principal.
    pub fn compile(&self, name: impl Into<String>, rule: Option<&PolicyRule>) -> CompiledPolicy {
        let name = name.into();

        let body = match rule {
            None => {
                debug!(policy = %name, "Compiled locked policy");
                Body::Locked
            }
            Some(rule) => {
                let compiled = CompiledRule::from_rule(rule);
                debug!(
                    policy = %name,
                    identities = compiled.identities.len(),
                    deny_roles = compiled.deny_roles.as_ref().map_or(0, Vec::len),
                    deny_users = compiled.deny_users.as_ref().map_or(0, Vec::len),
                    claims = compiled.claims.len(),
                    "Compiled policy"
                );
                Body::Rule(compiled)
            }
        };

        CompiledPolicy { name, body }
    }

    /// Compiles every policy in the set.
    pub fn compile_all(&self, set: &PolicySet) -> CompiledPolicies {
        let compiled: CompiledPolicies = set
            .iter()
            .map(|(name, rule)| self.compile(name, rule))
            .collect();

        debug!(
            policies = compiled.len(),
            locked = compiled.iter().filter(|p| p.is_locked()).count(),
            "Compiled policy set"
        );

        compiled
    }
}
