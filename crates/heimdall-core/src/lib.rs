//! heimdall-core: Core library for Heimdall shell configuration management
//!
//! This library owns the lifecycle of the shell's JSON configuration: it
//! validates documents, fills in missing defaults, migrates between schema
//! versions and persists the result. It is used by the `heimdall` CLI.
//!
//! # Main Entry Points
//!
//! - [`manager`] - Load, save, migrate and inject through one document on disk
//! - [`validation`] - Schema and business-rule checks
//! - [`injection`] - Default injection honoring user locks
//! - [`migration`] - Versioned schema migrations with backups
//! - [`config`] - The document model, profiles and paths

pub mod config;
pub mod errors;
pub mod events;
pub mod injection;
pub mod logging;
pub mod manager;
pub mod migration;
pub(crate) mod persistence;
pub mod tree;
pub mod validation;

// Re-export commonly used types at crate root for convenience
pub use config::{
    CURRENT_SCHEMA_VERSION, MANAGED_BY, ManagerPaths, ShellConfiguration, available_profiles,
};
pub use errors::{ConfigError, HeimdallError, HeimdallResult};
pub use injection::{InjectionError, InjectionReport, PropertyInjector, Strategy};
pub use manager::{ConfigManager, InitOutcome};
pub use migration::{MigrationError, MigrationRecord, VersionMigrator};
pub use tree::errors::TreeError;
pub use tree::{get_value, set_value};
pub use validation::{IssueSummary, SchemaValidator, Severity, ValidationIssue};

// Re-export logging initialization
pub use logging::init_logging;
