//! Policy enforcement.
//!
//! [`PolicyEnforcer`] is the gate a request pipeline calls before running a
//! protected handler. It turns a [`Decision`] into `Ok(())` or an
//! [`EnforcementError`] the host maps to a forbidden response.

use thiserror::Error;
use tracing::{info, warn};

use crate::compiler::{Decision, Outcome};
use crate::principal::Principal;
use crate::registry::CompiledPolicies;

/// Error type for policy enforcement.
#[derive(Debug, Error)]
pub enum EnforcementError {
    /// Access denied by policy.
    #[error("Access denied by policy '{policy}': {reason}")]
    AccessDenied { policy: String, reason: Outcome },

    /// The host asked for a policy that was never registered.
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),
}

/// Result type for enforcement operations.
pub type Result<T> = std::result::Result<T, EnforcementError>;

/// Enforces compiled policies and logs every decision.
pub struct PolicyEnforcer {
    policies: CompiledPolicies,

    /// Whether to log access attempts.
    audit_enabled: bool,
}

impl PolicyEnforcer {
    /// Creates a new policy enforcer.
    pub fn new(policies: CompiledPolicies) -> Self {
        Self {
            policies,
            audit_enabled: true,
        }
    }

    /// Sets whether decisions are logged.
    pub fn with_audit(mut self, enabled: bool) -> Self {
        self.audit_enabled = enabled;
        self
    }

    /// Evaluates the named policy and returns the full decision.
    ///
    /// **Audit:** Logs every decision when auditing is enabled.
    pub fn decide<P: Principal + ?Sized>(&self, policy: &str, principal: &P) -> Result<Decision> {
        let decision = match self.policies.authorize(policy, principal) {
            Ok(decision) => decision,
            Err(e) => {
                if self.audit_enabled {
                    warn!(policy = %policy, user = ?principal.user_id(), "Unknown policy requested");
                }
                return Err(e);
            }
        };

        if self.audit_enabled {
            if decision.is_granted() {
                info!(
                    policy = %policy,
                    user = ?principal.user_id(),
                    "Access granted"
                );
            } else {
                warn!(
                    policy = %policy,
                    user = ?principal.user_id(),
                    reason = %decision.outcome,
                    "Access denied"
                );
            }
        }

        Ok(decision)
    }

    /// Enforces the named policy.
    ///
    /// Returns `Ok(())` if access is allowed, `Err` otherwise.
    pub fn enforce<P: Principal + ?Sized>(&self, policy: &str, principal: &P) -> Result<()> {
        let decision = self.decide(policy, principal)?;

        if decision.is_granted() {
            Ok(())
        } else {
            Err(EnforcementError::AccessDenied {
                policy: decision.policy,
                reason: decision.outcome,
            })
        }
    }

    /// Returns the compiled policies.
    pub fn policies(&self) -> &CompiledPolicies {
        &self.policies
    }
}
