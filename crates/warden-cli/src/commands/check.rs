//! Check command - evaluates one policy for a principal described by flags.

use anyhow::{Context, Result};
use warden_policy::{Identity, PolicyEnforcer};

use crate::GlobalArgs;
use crate::style::{print_hint, print_labeled, print_success};

/// Principal description taken from the command line.
pub struct PrincipalArgs {
    pub user: Option<String>,
    pub roles: Vec<String>,
    pub claims: Vec<String>,
    pub anonymous: bool,
}

impl PrincipalArgs {
    /// Builds the identity. Without `--user` the principal is an
    /// authenticated service identity with no user id.
    pub fn to_identity(&self) -> Result<Identity> {
        let mut identity = match (&self.user, self.anonymous) {
            (_, true) => Identity::anonymous(),
            (Some(user), false) => Identity::authenticated(user.clone()),
            (None, false) => Identity::service(),
        };
        if self.anonymous {
            identity.user_id.clone_from(&self.user);
        }

        for role in &self.roles {
            identity = identity.with_role(role.clone());
        }

        for claim in &self.claims {
            let (claim_type, value) = parse_claim(claim)?;
            identity = identity.with_claim(claim_type, value);
        }

        Ok(identity)
    }
}

fn parse_claim(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((claim_type, value)) if !claim_type.is_empty() => Ok((claim_type, value)),
        _ => anyhow::bail!("Invalid claim '{raw}': expected type=value"),
    }
}

pub fn run(global: &GlobalArgs, policy: &str, principal: &PrincipalArgs) -> Result<()> {
    let identity = principal.to_identity()?;

    let config = global.loader().load().context("Failed to load configuration")?;
    let enforcer = PolicyEnforcer::new(config.policy_set()?.compile()).with_audit(config.logging.audit);

    let policies = enforcer.policies();
    if !policies.contains(policy) {
        let declared: Vec<&str> = policies.names().collect();
        if declared.is_empty() {
            print_hint("No policies are declared. Run 'warden init' to write a starter config.");
        } else {
            print_hint(&format!("Declared policies: {}", declared.join(", ")));
        }
    }

    enforcer.enforce(policy, &identity)?;

    print_success(&format!("Access granted by policy '{policy}'"));
    if let Some(user) = &identity.user_id {
        print_labeled("User", user);
    }
    if !identity.roles.is_empty() {
        let roles: Vec<&str> = identity.roles.iter().map(String::as_str).collect();
        print_labeled("Roles", &roles.join(", "));
    }

    Ok(())
}
