use std::path::Path;

use clap::ArgMatches;
use serde_json::Value;
use tracing::{error, info};

use heimdall_core::{
    CURRENT_SCHEMA_VERSION, ConfigError, ConfigManager, InitOutcome, IssueSummary, Severity,
    events,
};

pub(crate) fn handle_config_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("init", sub_matches)) => handle_init_command(sub_matches),
        Some(("validate", _)) => handle_validate_command(),
        Some(("migrate", sub_matches)) => handle_migrate_command(sub_matches),
        Some(("inject", _)) => handle_inject_command(),
        Some(("get", sub_matches)) => handle_get_command(sub_matches),
        Some(("set", sub_matches)) => handle_set_command(sub_matches),
        Some(("lock", sub_matches)) => handle_lock_command(sub_matches),
        Some(("unlock", sub_matches)) => handle_unlock_command(sub_matches),
        Some(("export", sub_matches)) => handle_export_command(sub_matches),
        Some(("import", sub_matches)) => handle_import_command(sub_matches),
        Some(("history", sub_matches)) => handle_history_command(sub_matches),
        Some(("rollback", _)) => handle_rollback_command(),
        _ => {
            error!(event = "cli.config.command_unknown");
            Err("Unknown config command".into())
        }
    }
}

/// Report a failed command on stderr and in the log, then hand the error back.
fn fail(
    event: &'static str,
    context: &str,
    e: ConfigError,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("❌ {}: {}", context, e);
    if e.is_not_found() {
        eprintln!("   Run 'heimdall config init' to create one.");
    }
    error!(event = event, error = %e);
    events::log_app_error(&e);
    Err(e.into())
}

fn open_manager() -> Result<ConfigManager, Box<dyn std::error::Error>> {
    ConfigManager::from_env().map_err(|e| {
        eprintln!("❌ Failed to create config manager: {}", e);
        events::log_app_error(&e);
        e.into()
    })
}

fn handle_init_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let profile = matches
        .get_one::<String>("profile")
        .map(String::as_str)
        .unwrap_or("default");
    let force = matches.get_flag("force");

    info!(event = "cli.init_started", profile = profile, force = force);

    let manager = open_manager()?;
    if manager.exists() || force {
        return match manager.write_profile(profile, force) {
            Ok(_) => {
                println!(
                    "✓ Configuration initialized at {} with profile '{}'",
                    manager.config_path().display(),
                    profile
                );
                info!(event = "cli.init_completed", profile = profile);
                Ok(())
            }
            Err(e) => fail("cli.init_failed", "Failed to initialize configuration", e),
        };
    }

    match manager.initialize_with_profile(profile) {
        Ok(InitOutcome::LegacyImported) => {
            println!(
                "✓ Imported legacy configuration from {} into {}",
                manager.paths().legacy_path.display(),
                manager.config_path().display()
            );
            info!(event = "cli.init_completed", imported = true);
            Ok(())
        }
        Ok(_) => {
            println!(
                "✓ Configuration initialized at {} with profile '{}'",
                manager.config_path().display(),
                profile
            );
            info!(event = "cli.init_completed", profile = profile);
            Ok(())
        }
        Err(e) => fail("cli.init_failed", "Failed to initialize configuration", e),
    }
}

fn handle_validate_command() -> Result<(), Box<dyn std::error::Error>> {
    info!(event = "cli.validate_started");

    let manager = open_manager()?;
    let config = match manager.load() {
        Ok(config) => config,
        Err(e) => return fail("cli.validate_failed", "Failed to load configuration", e),
    };

    let issues = manager.validate(&config);
    if issues.is_empty() {
        println!("✓ Configuration is valid");
        info!(event = "cli.validate_completed", issues = 0);
        return Ok(());
    }

    println!("Found {} validation issues:\n", issues.len());
    for issue in &issues {
        let icon = match issue.severity {
            Severity::Critical | Severity::Error => "✗",
            Severity::Warning => "⚠",
        };
        println!("{} {}: {}", icon, issue.path, issue.message);

        if let Some(fix) = &issue.fix
            && !fix.description.is_empty()
        {
            println!("  → {}", fix.description);
            if let Some(command) = &fix.command {
                println!("  → Run: {}", command);
            }
        }
    }

    let summary = IssueSummary::from_issues(&issues);
    println!();
    println!("Summary: {}", summary);

    info!(
        event = "cli.validate_completed",
        critical = summary.critical,
        errors = summary.errors,
        warnings = summary.warnings
    );

    if summary.is_blocking() {
        return Err("validation failed with errors".into());
    }
    Ok(())
}

fn handle_migrate_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let target = matches
        .get_one::<String>("version")
        .map(String::as_str)
        .unwrap_or(CURRENT_SCHEMA_VERSION);

    info!(event = "cli.migrate_started", target = target);

    let manager = open_manager()?;
    let config = match manager.load() {
        Ok(config) => config,
        Err(e) => return fail("cli.migrate_failed", "Failed to load configuration", e),
    };

    if config.version == target {
        println!("Configuration is already at version {}", target);
        info!(event = "cli.migrate_skipped", version = target);
        return Ok(());
    }

    println!(
        "Migrating configuration from {} to {}...",
        config.version, target
    );
    match manager.migrate_to_version(&config, target) {
        Ok(migrated) => {
            println!(
                "✓ Configuration migrated successfully to version {}",
                migrated.version
            );
            println!(
                "  A backup has been created in {}",
                manager.paths().backup_dir.display()
            );
            info!(event = "cli.migrate_completed", version = %migrated.version);
            Ok(())
        }
        Err(e) => fail("cli.migrate_failed", "Migration failed", e),
    }
}

fn handle_inject_command() -> Result<(), Box<dyn std::error::Error>> {
    info!(event = "cli.inject_started");

    let manager = open_manager()?;
    let mut config = match manager.load() {
        Ok(config) => config.as_ref().clone(),
        Err(e) => return fail("cli.inject_failed", "Failed to load configuration", e),
    };

    match manager.inject_defaults(&mut config) {
        Ok(report) => {
            if report.is_noop() {
                println!("✓ Configuration already has every default property");
            } else {
                println!(
                    "✓ Injected {} default properties",
                    report.injected.len()
                );
                for path in &report.injected {
                    println!("  + {}", path);
                }
            }
            if !report.skipped_locked.is_empty() {
                println!("  User-locked paths were preserved:");
                for path in &report.skipped_locked {
                    println!("  = {}", path);
                }
            }
            info!(
                event = "cli.inject_completed",
                injected = report.injected.len()
            );
            Ok(())
        }
        Err(e) => fail("cli.inject_failed", "Failed to inject defaults", e),
    }
}

fn handle_get_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let path = matches
        .get_one::<String>("path")
        .ok_or("Path argument is required")?;
    let json_output = matches.get_flag("json");

    info!(event = "cli.get_started", path = path.as_str());

    let manager = open_manager()?;
    let value = match manager.get(path) {
        Ok(Some(value)) => value,
        Ok(None) => {
            eprintln!("❌ path not found: {}", path);
            error!(event = "cli.get_not_found", path = path.as_str());
            return Err(format!("path not found: {}", path).into());
        }
        Err(e) => return fail("cli.get_failed", "Failed to read configuration", e),
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match &value {
            Value::String(s) => println!("{}", s),
            other => println!("{}", other),
        }
    }

    info!(event = "cli.get_completed", path = path.as_str());
    Ok(())
}

/// JSON when it parses, a plain string otherwise.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn handle_set_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let path = matches
        .get_one::<String>("path")
        .ok_or("Path argument is required")?;
    let raw = matches
        .get_one::<String>("value")
        .ok_or("Value argument is required")?;
    let value = parse_value(raw);

    info!(event = "cli.set_started", path = path.as_str());

    let manager = open_manager()?;
    match manager.set(path, value.clone()) {
        Ok(_) => {
            println!("✓ Set {} = {}", path, value);
            info!(event = "cli.set_completed", path = path.as_str());
            Ok(())
        }
        Err(ConfigError::Validation { issues }) => {
            eprintln!("❌ Value rejected for {}:", path);
            for issue in issues.iter().filter(|i| i.severity.is_blocking()) {
                eprintln!("   ✗ {}: {}", issue.path, issue.message);
            }
            error!(event = "cli.set_rejected", path = path.as_str());
            Err("validation failed with errors".into())
        }
        Err(e) => fail("cli.set_failed", "Failed to set value", e),
    }
}

fn handle_lock_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let path = matches
        .get_one::<String>("path")
        .ok_or("Path argument is required")?;

    info!(event = "cli.lock_started", path = path.as_str());

    let manager = open_manager()?;
    match manager.lock_path(path) {
        Ok(()) => {
            println!("✓ Locked path: {}", path);
            println!("  This path will be preserved during automatic updates");
            info!(event = "cli.lock_completed", path = path.as_str());
            Ok(())
        }
        Err(e) => fail("cli.lock_failed", "Failed to lock path", e),
    }
}

fn handle_unlock_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let path = matches
        .get_one::<String>("path")
        .ok_or("Path argument is required")?;

    info!(event = "cli.unlock_started", path = path.as_str());

    let manager = open_manager()?;
    match manager.unlock_path(path) {
        Ok(()) => {
            println!("✓ Unlocked path: {}", path);
            info!(event = "cli.unlock_completed", path = path.as_str());
            Ok(())
        }
        Err(e) => fail("cli.unlock_failed", "Failed to unlock path", e),
    }
}

fn handle_export_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let output = matches.get_one::<String>("file");

    info!(event = "cli.export_started");

    let manager = open_manager()?;
    let bytes = match manager.export() {
        Ok(bytes) => bytes,
        Err(e) => return fail("cli.export_failed", "Failed to export configuration", e),
    };

    match output {
        Some(file) => {
            if let Err(e) = std::fs::write(file, &bytes) {
                eprintln!("❌ Failed to write file {}: {}", file, e);
                error!(event = "cli.export_failed", path = file.as_str(), error = %e);
                return Err(e.into());
            }
            println!("✓ Configuration exported to {}", file);
        }
        None => print!("{}", String::from_utf8_lossy(&bytes)),
    }

    info!(event = "cli.export_completed");
    Ok(())
}

fn handle_import_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let file = matches
        .get_one::<String>("file")
        .ok_or("File argument is required")?;

    info!(event = "cli.import_started", path = file.as_str());

    let bytes = match std::fs::read(Path::new(file)) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Failed to read file {}: {}", file, e);
            error!(event = "cli.import_failed", path = file.as_str(), error = %e);
            return Err(e.into());
        }
    };

    let manager = open_manager()?;
    match manager.import(&bytes) {
        Ok(_) => {
            println!("✓ Configuration imported from {}", file);
            info!(event = "cli.import_completed", path = file.as_str());
            Ok(())
        }
        Err(ConfigError::Validation { issues }) => {
            eprintln!("❌ Imported configuration has validation errors:");
            for issue in issues.iter().filter(|i| i.severity.is_blocking()) {
                eprintln!("   ✗ {}: {}", issue.path, issue.message);
            }
            error!(event = "cli.import_rejected", path = file.as_str());
            Err("imported configuration has validation errors".into())
        }
        Err(e) => fail("cli.import_failed", "Failed to import configuration", e),
    }
}

fn handle_history_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");

    info!(event = "cli.history_started", json_output = json_output);

    let manager = open_manager()?;
    let history = manager.history();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&history)?);
    } else if history.is_empty() {
        println!("No migrations recorded.");
    } else {
        for record in &history {
            let icon = if record.success { "✓" } else { "✗" };
            println!(
                "{} {} → {}  {}",
                icon,
                record.from,
                record.to,
                record.timestamp.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    info!(event = "cli.history_completed", count = history.len());
    Ok(())
}

fn handle_rollback_command() -> Result<(), Box<dyn std::error::Error>> {
    info!(event = "cli.rollback_started");

    let manager = open_manager()?;
    match manager.rollback() {
        Ok(backup) => {
            println!("✓ Restored configuration from {}", backup.display());
            info!(event = "cli.rollback_completed", backup = %backup.display());
            Ok(())
        }
        Err(e) => fail("cli.rollback_failed", "Rollback failed", e),
    }
}
