//! # warden-policy: declarative authorization policies
//!
//! Compiles named allow/deny/claim rules into predicates that a request
//! pipeline evaluates against an authenticated principal:
//! - **Allow lists** of roles and users (one shared namespace)
//! - **Deny lists** of roles and users, overridden by any allow match
//! - **Required claims**: a single claim plus an ordered list of claims
//! - **Locked policies**: names registered with no rule deny everyone
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  PolicySet  (name → PolicyRule | locked)     │
//! └─────────────────┬───────────────────────────┘
//!                   │  PolicyCompiler (once, at startup)
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  CompiledPolicies (name → CompiledPolicy)    │
//! │  ├─ authentication gate                      │
//! │  ├─ allow gate (roles ∪ users)               │
//! │  ├─ deny roles / deny users                  │
//! │  └─ required claims                          │
//! └─────────────────┬───────────────────────────┘
//!                   │  per request, lock-free
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  PolicyEnforcer → Ok(()) | AccessDenied      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//!
//! ```
//! use warden_policy::{Claim, Identity, PolicyEnforcer, PolicyRule, PolicySet};
//!
//! let policies = PolicySet::new()
//!     .with_policy(
//!         "reports",
//!         PolicyRule::new()
//!             .allow_role("analyst")
//!             .allow_role("admin")
//!             .deny_user("mallory")
//!             .require_claim(Claim::new("dept", ["finance", "eng"])),
//!     )
//!     .with_policy("profile", PolicyRule::new())
//!     .with_locked("legacy_export");
//!
//! let enforcer = PolicyEnforcer::new(policies.compile());
//!
//! let ann = Identity::authenticated("ann")
//!     .with_role("analyst")
//!     .with_claim("dept", "finance");
//!
//! enforcer.enforce("reports", &ann)?;
//! enforcer.enforce("profile", &ann)?;
//! assert!(enforcer.enforce("legacy_export", &ann).is_err());
//! # Ok::<(), warden_policy::EnforcementError>(())
//! ```
//!
//! ## Precedence
//!
//! Allowed identities take precedence over deny lists: a principal matching
//! an allowed role or user is never excluded by `deny_roles`/`deny_users`.
//! When a rule allows nobody explicitly, deny lists apply to everyone. See
//! [`compiler`] for the full evaluation order.

pub mod claims;
pub mod compiler;
pub mod enforcement;
pub mod principal;
pub mod registry;
pub mod rule;

// Re-export commonly used types
pub use claims::Claim;
pub use compiler::{CompiledPolicy, Decision, Outcome, PolicyCompiler, Predicate};
pub use enforcement::{EnforcementError, PolicyEnforcer};
pub use principal::{HeldClaim, Identity, Principal};
pub use registry::{CompiledPolicies, PolicySet};
pub use rule::PolicyRule;
