//! Initialize command - writes a starter warden.toml.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use warden_config::{LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE, Paths, WardenConfig};

use crate::style::{
    colors::SemanticStyle, print_code_example, print_hint, print_labeled, print_spacer,
    print_success,
};

const HEADER: &str = "\
# Warden policy configuration.
#
# Each [policies.<name>] table declares one rule. Names listed in `locked`
# are registered with no rule and deny everyone.
#
# Allowed roles/users override the deny lists. With no allowed roles or
# users, the deny lists apply to every principal. An empty table admits any
# authenticated principal.

";

pub fn run(path: &Path) -> Result<()> {
    if Paths::is_initialized(path) {
        anyhow::bail!(
            "Project already initialized in {}. {PROJECT_CONFIG_FILE} already exists.",
            path.display()
        );
    }

    fs::create_dir_all(path).context("Failed to create project directory")?;

    let config = WardenConfig::sample();
    let body = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    let config_path = Paths::project_config_file(path);
    fs::write(&config_path, format!("{HEADER}{body}"))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    print_success(&format!("Wrote {PROJECT_CONFIG_FILE}"));

    let gitignore_path = path.join(".gitignore");
    let existing = fs::read_to_string(&gitignore_path).unwrap_or_default();
    if !existing.lines().any(|line| line.trim() == LOCAL_CONFIG_FILE) {
        let mut content = existing;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(LOCAL_CONFIG_FILE);
        content.push('\n');
        fs::write(&gitignore_path, content).context("Failed to write .gitignore")?;
        print_success(&format!("Ignored {LOCAL_CONFIG_FILE} in .gitignore"));
    }

    print_spacer();
    let location = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    print_labeled("Location", &location.display().to_string());
    print_labeled("Policies", &config.policies.len().to_string());
    print_labeled("Locked", &config.locked.len().to_string());

    print_spacer();
    println!("{}", "Next steps:".header());
    print_spacer();
    print_hint("List the compiled policies:");
    print_code_example(&format!("warden --project {} policies", path.display()));
    print_spacer();
    print_hint("Check a principal against a policy:");
    print_code_example(&format!(
        "warden --project {} check reports --user ann --role analyst --claim dept=finance",
        path.display()
    ));

    Ok(())
}
