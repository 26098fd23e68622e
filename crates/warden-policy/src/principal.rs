//! The principal contract policies are evaluated against.
//!
//! A compiled policy only ever asks a principal four questions: is it
//! authenticated, who is it, which roles does it hold, and which claims does
//! it carry. Hosts with their own identity type implement [`Principal`];
//! everyone else can use [`Identity`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// An identity that can be checked against a compiled policy.
///
/// The trait is object safe, so hosts may hand `&dyn Principal` to a
/// compiled predicate.
pub trait Principal {
    /// Returns whether the identity passed the host's authentication step.
    fn is_authenticated(&self) -> bool;

    /// Returns the user identifier, if the identity has one.
    fn user_id(&self) -> Option<&str>;

    /// Returns whether the identity holds the named role.
    fn has_role(&self, role: &str) -> bool;

    /// Returns whether the identity carries a claim of `claim_type` whose
    /// value is exactly `value`.
    fn has_claim(&self, claim_type: &str, value: &str) -> bool;

    /// Returns whether the identity carries any claim of `claim_type`.
    fn has_claim_type(&self, claim_type: &str) -> bool;

    /// Role-or-user membership test.
    ///
    /// A principal is a member of `name` when it holds a role called `name`
    /// or when its own user identifier is `name`. Every identity-based rule
    /// (allow roles, allow users, deny roles, deny users) goes through this
    /// single test.
    fn is_member_of(&self, name: &str) -> bool {
        self.user_id() == Some(name) || self.has_role(name)
    }
}

impl<P: Principal + ?Sized> Principal for &P {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    fn user_id(&self) -> Option<&str> {
        (**self).user_id()
    }

    fn has_role(&self, role: &str) -> bool {
        (**self).has_role(role)
    }

    fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        (**self).has_claim(claim_type, value)
    }

    fn has_claim_type(&self, claim_type: &str) -> bool {
        (**self).has_claim_type(claim_type)
    }

    fn is_member_of(&self, name: &str) -> bool {
        (**self).is_member_of(name)
    }
}

/// A single claim held by an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeldClaim {
    /// Claim type (e.g. `"dept"`).
    #[serde(rename = "type")]
    pub claim_type: String,

    /// Claim value (e.g. `"eng"`).
    pub value: String,
}

/// Concrete principal built from a user id, roles, and claims.
///
/// Claim types compare ASCII case-insensitively. Claim values and role names
/// compare exactly.
///
/// # Examples
///
/// ```
/// use warden_policy::principal::{Identity, Principal};
///
/// let alice = Identity::authenticated("alice")
///     .with_role("admin")
///     .with_claim("dept", "eng");
///
/// assert!(alice.is_member_of("admin"));
/// assert!(alice.is_member_of("alice"));
/// assert!(alice.has_claim("Dept", "eng"));
/// assert!(!alice.has_claim("dept", "ENG"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    /// User identifier, if known.
    pub user_id: Option<String>,

    /// Whether the host authenticated this identity.
    pub authenticated: bool,

    /// Roles held by the identity.
    pub roles: BTreeSet<String>,

    /// Claims carried by the identity.
    pub claims: Vec<HeldClaim>,
}

impl Identity {
    /// Creates an authenticated identity for the given user.
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            authenticated: true,
            ..Self::default()
        }
    }

    /// Creates an authenticated identity with no user identifier
    /// (e.g. a service credential that only carries roles and claims).
    pub fn service() -> Self {
        Self {
            authenticated: true,
            ..Self::default()
        }
    }

    /// Creates an unauthenticated identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Adds a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Adds a claim.
    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(HeldClaim {
            claim_type: claim_type.into(),
            value: value.into(),
        });
        self
    }

    fn claims_of_type<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a HeldClaim> {
        self.claims
            .iter()
            .filter(move |c| c.claim_type.eq_ignore_ascii_case(claim_type))
    }
}

impl Principal for Identity {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.claims_of_type(claim_type).any(|c| c.value == value)
    }

    fn has_claim_type(&self, claim_type: &str) -> bool {
        self.claims_of_type(claim_type).next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_counts_as_membership() {
        let bob = Identity::authenticated("bob");

        assert!(bob.is_member_of("bob"));
        assert!(!bob.is_member_of("admin"));
        assert!(!bob.has_role("bob"));
    }

    #[test]
    fn test_service_identity_has_no_user_id() {
        let svc = Identity::service().with_role("batch");

        assert!(svc.is_authenticated());
        assert_eq!(svc.user_id(), None);
        assert!(svc.is_member_of("batch"));
    }

    #[test]
    fn test_anonymous_is_not_authenticated() {
        let anon = Identity::anonymous().with_role("admin");

        assert!(!anon.is_authenticated());
        // Membership is still reported; the authentication gate lives in the compiler.
        assert!(anon.is_member_of("admin"));
    }

    #[test]
    fn test_claim_type_is_case_insensitive() {
        let id = Identity::authenticated("alice").with_claim("Department", "eng");

        assert!(id.has_claim("department", "eng"));
        assert!(id.has_claim_type("DEPARTMENT"));
        assert!(!id.has_claim("department", "Eng"));
        assert!(!id.has_claim_type("team"));
    }

    #[test]
    fn test_roles_are_case_sensitive() {
        let id = Identity::authenticated("alice").with_role("Admin");

        assert!(id.has_role("Admin"));
        assert!(!id.has_role("admin"));
    }

    #[test]
    fn test_dyn_principal_forwards() {
        let id = Identity::authenticated("alice").with_role("ops");
        let dynamic: &dyn Principal = &id;

        assert!(dynamic.is_member_of("ops"));
        assert!((&dynamic).is_member_of("alice"));
    }

    #[test]
    fn test_identity_deserializes_with_defaults() {
        let id: Identity = serde_json::from_str(
            r#"{"user_id":"carol","authenticated":true,"claims":[{"type":"mfa","value":"true"}]}"#,
        )
        .unwrap();

        assert_eq!(id.user_id(), Some("carol"));
        assert!(id.roles.is_empty());
        assert!(id.has_claim("mfa", "true"));
    }
}
