//! Configuration management commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use warden_config::{Paths, WardenConfig};

use crate::GlobalArgs;
use crate::style::{colors::SemanticStyle, print_error, print_labeled, print_spacer, print_success};

/// Show the merged configuration.
pub fn show(global: &GlobalArgs, format: &str) -> Result<()> {
    let config = global.loader().load().context("Failed to load configuration")?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        "toml" => {
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{toml_str}");
        }
        "text" => print_text(&config),
        other => anyhow::bail!("Unknown format '{other}'. Expected text, toml, or json."),
    }

    Ok(())
}

fn print_text(config: &WardenConfig) {
    println!("{}", "Warden Configuration".header());
    print_spacer();

    println!("Logging:");
    print_labeled("Level", &config.logging.level);
    print_labeled("Audit", &config.logging.audit.to_string());
    print_spacer();

    println!("Policies:");
    if config.policies.is_empty() && config.locked.is_empty() {
        print_labeled("Declared", "none");
    }
    for (name, rule) in &config.policies {
        let allowed: Vec<&str> = rule.combined_allowed_identities().into_iter().collect();
        let summary = if allowed.is_empty() {
            "any authenticated principal".to_string()
        } else {
            allowed.join(", ")
        };
        print_labeled(name, &summary);
    }
    for name in &config.locked {
        print_labeled(name, "locked");
    }
}

/// Validate configuration files and the declared policy set.
pub fn validate(global: &GlobalArgs) -> Result<()> {
    println!("Validating configuration in {}...", global.project.display());

    for path in candidate_files(global) {
        if !path.exists() {
            continue;
        }
        if let Err(e) = WardenConfig::from_file(&path) {
            print_error("Configuration validation failed:");
            eprintln!("  {e}");
            return Err(e.into());
        }
        print_labeled("Parsed", &path.display().to_string());
    }

    let result = global
        .loader()
        .load()
        .and_then(|config| Ok(config.policy_set()?));

    match result {
        Ok(set) => {
            let compiled = set.compile();
            print_success(&format!(
                "Configuration is valid ({} policies)",
                compiled.len()
            ));
            Ok(())
        }
        Err(e) => {
            print_error("Configuration validation failed:");
            eprintln!("  {e:#}");
            Err(e)
        }
    }
}

fn candidate_files(global: &GlobalArgs) -> Vec<PathBuf> {
    let mut files = vec![
        Paths::project_config_file(&global.project),
        Paths::local_config_file(&global.project),
    ];
    files.extend(global.config.clone());
    files
}
