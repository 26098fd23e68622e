//! Policies command - lists every declared policy after compiling it.

use anyhow::{Context, Result};
use warden_policy::{CompiledPolicies, PolicyRule, PolicySet};

use crate::GlobalArgs;
use crate::style::print_table;

pub fn run(global: &GlobalArgs) -> Result<()> {
    let config = global.loader().load().context("Failed to load configuration")?;
    let set = config.policy_set()?;
    let compiled = set.compile();

    tracing::info!(policies = compiled.len(), "Compiled policy set");

    print_table(
        &["Policy", "Kind", "Allow", "Deny", "Claims"],
        &rows(&compiled, &set),
        "policy",
    );

    Ok(())
}

fn rows(compiled: &CompiledPolicies, set: &PolicySet) -> Vec<Vec<String>> {
    compiled
        .iter()
        .map(|policy| match set.get(policy.name()).flatten() {
            Some(rule) if !policy.is_locked() => vec![
                policy.name().to_string(),
                kind(rule).to_string(),
                join_or_dash(rule.combined_allowed_identities()),
                deny_summary(rule),
                join_or_dash(rule.required_claims().map(ToString::to_string)),
            ],
            _ => vec![
                policy.name().to_string(),
                "locked".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ],
        })
        .collect()
}

fn kind(rule: &PolicyRule) -> &'static str {
    if rule.is_empty() {
        "authenticated"
    } else {
        "rule"
    }
}

fn deny_summary(rule: &PolicyRule) -> String {
    let roles = rule
        .deny_roles
        .iter()
        .flatten()
        .map(|r| format!("role:{r}"));
    let users = rule
        .deny_users
        .iter()
        .flatten()
        .map(|u| format!("user:{u}"));

    join_or_dash(roles.chain(users))
}

fn join_or_dash<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined.join(", ")
    }
}
