//! The fixed battery of per-section checks.
//!
//! Checks run section by section in document order, then the declarative
//! rules from [`super::rules`]. The output order is deterministic so repeated
//! validation of the same document yields the same list.

use std::collections::HashSet;

use super::rules::{HEX_COLOR, ValidationRule, builtin_rules};
use super::types::{IssueKind, Severity, ValidationIssue};
use crate::config::types::*;
use crate::tree;

const BAR_POSITIONS: &[&str] = &["top", "bottom", "left", "right"];
const BAR_LAYERS: &[&str] = &["background", "bottom", "top", "overlay"];
const WALLPAPER_MODES: &[&str] = &["static", "slideshow", "video", "color"];
const FILL_MODES: &[&str] = &["fill", "contain", "cover", "scale-down", "none"];

/// Volume ceiling assumed when `maxVolume` is absent.
const DEFAULT_MAX_VOLUME: i64 = 100;

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// Validates documents against the shell schema.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    rules: Vec<ValidationRule>,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    /// Produce every issue found in `config`. Never mutates it.
    pub fn validate(&self, config: &ShellConfiguration) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if config.version.trim().is_empty() {
            issues.push(
                ValidationIssue::new(
                    IssueKind::Required,
                    "version",
                    "Version is required",
                    Severity::Error,
                )
                .with_auto_fix(
                    "Set version to current schema version",
                    format!("heimdall config set version {}", CURRENT_SCHEMA_VERSION),
                ),
            );
        }

        check_metadata(&config.metadata, &mut issues);
        check_system(&config.system, &mut issues);
        check_appearance(&config.appearance, &mut issues);
        check_bar(&config.bar, &mut issues);
        check_modules(&config.modules, &mut issues);
        check_services(&config.services, &mut issues);
        check_commands(&config.commands, &mut issues);
        check_wallpaper(&config.wallpaper, &mut issues);
        check_hot_reload(&config.hot_reload, &mut issues);

        match tree::to_tree(config) {
            Ok(tree) => issues.extend(self.rules.iter().filter_map(|rule| rule.evaluate(&tree))),
            Err(e) => {
                tracing::warn!(
                    event = "core.validation.rules_skipped",
                    error = %e,
                    "Declarative rules not evaluated"
                );
            }
        }

        tracing::debug!(
            event = "core.validation.completed",
            issue_count = issues.len()
        );

        issues
    }
}

fn check_metadata(metadata: &ConfigMetadata, issues: &mut Vec<ValidationIssue>) {
    if blank(&metadata.profile) {
        issues.push(
            ValidationIssue::new(
                IssueKind::Required,
                "metadata.profile",
                "Profile name is recommended",
                Severity::Warning,
            )
            .with_auto_fix(
                "Set a profile name",
                "heimdall config set metadata.profile default",
            ),
        );
    }
}

fn check_system(system: &SystemConfig, issues: &mut Vec<ValidationIssue>) {
    if blank(&system.shell) {
        issues.push(ValidationIssue::new(
            IssueKind::Required,
            "system.shell",
            "Shell is required",
            Severity::Error,
        ));
    }

    if blank(&system.terminal) {
        issues.push(ValidationIssue::new(
            IssueKind::Required,
            "system.terminal",
            "Terminal is required",
            Severity::Error,
        ));
    }

    if blank(&system.font.family) {
        issues.push(ValidationIssue::new(
            IssueKind::Required,
            "system.font.family",
            "Font family is required",
            Severity::Warning,
        ));
    }

    if let Some(size) = system.font.size
        && size <= 0
    {
        issues.push(ValidationIssue::new(
            IssueKind::Range,
            "system.font.size",
            "Font size must be positive",
            Severity::Error,
        ));
    }
}

fn check_color(path: String, value: Option<&str>, issues: &mut Vec<ValidationIssue>) {
    if let Some(color) = value
        && !color.is_empty()
        && !HEX_COLOR.is_match(color)
    {
        issues.push(
            ValidationIssue::new(
                IssueKind::Pattern,
                path,
                format!("Invalid color format: {}", color),
                Severity::Error,
            )
            .with_fix("Use hex color format (#RRGGBB or #RRGGBBAA)"),
        );
    }
}

fn check_appearance(appearance: &AppearanceConfig, issues: &mut Vec<ValidationIssue>) {
    if let Some(transparency) = appearance.transparency
        && !(0.0..=1.0).contains(&transparency)
    {
        issues.push(ValidationIssue::new(
            IssueKind::Range,
            "appearance.transparency",
            "Transparency must be between 0 and 1",
            Severity::Error,
        ));
    }

    if let Some(radius) = appearance.blur_radius
        && radius < 0
    {
        issues.push(ValidationIssue::new(
            IssueKind::Range,
            "appearance.blurRadius",
            "Blur radius must be non-negative",
            Severity::Error,
        ));
    }

    check_color(
        "appearance.accentColor".to_string(),
        appearance.accent_color.as_deref(),
        issues,
    );

    for (field, value) in appearance.colors.entries() {
        check_color(format!("appearance.colors.{}", field), value, issues);
    }
}

fn check_bar(bar: &BarConfig, issues: &mut Vec<ValidationIssue>) {
    if let Some(position) = &bar.position
        && !BAR_POSITIONS.contains(&position.as_str())
    {
        issues.push(
            ValidationIssue::new(
                IssueKind::Enum,
                "bar.position",
                format!("Invalid bar position: {}", position),
                Severity::Error,
            )
            .with_fix(format!("Use one of: {}", BAR_POSITIONS.join(", "))),
        );
    }

    if let Some(height) = bar.height
        && height <= 0
    {
        issues.push(ValidationIssue::new(
            IssueKind::Range,
            "bar.height",
            "Bar height must be positive",
            Severity::Error,
        ));
    }

    if let Some(layer) = &bar.layer
        && !layer.is_empty()
        && !BAR_LAYERS.contains(&layer.as_str())
    {
        issues.push(
            ValidationIssue::new(
                IssueKind::Enum,
                "bar.layer",
                format!("Invalid layer: {}", layer),
                Severity::Warning,
            )
            .with_fix(format!("Use one of: {}", BAR_LAYERS.join(", "))),
        );
    }

    check_color("bar.background".to_string(), bar.background.as_deref(), issues);
    check_color("bar.foreground".to_string(), bar.foreground.as_deref(), issues);
}

fn check_modules(modules: &ModulesConfig, issues: &mut Vec<ValidationIssue>) {
    let mut seen: HashSet<&str> = HashSet::new();

    for module in modules.enabled.iter().flatten() {
        if !seen.insert(module.as_str()) {
            issues.push(ValidationIssue::new(
                IssueKind::Duplicate,
                "modules.enabled",
                format!("Duplicate module: {}", module),
                Severity::Warning,
            ));
        }
    }

    for module in modules.disabled.iter().flatten() {
        if seen.contains(module.as_str()) {
            issues.push(ValidationIssue::new(
                IssueKind::Conflict,
                "modules",
                format!("Module {} is both enabled and disabled", module),
                Severity::Error,
            ));
        }
    }
}

fn check_services(services: &ServicesConfig, issues: &mut Vec<ValidationIssue>) {
    if let Some(timeout) = services.notifications.timeout
        && timeout < 0
    {
        issues.push(ValidationIssue::new(
            IssueKind::Range,
            "services.notifications.timeout",
            "Notification timeout must be non-negative",
            Severity::Error,
        ));
    }

    if let Some(volume) = services.audio.volume {
        let max = services.audio.max_volume.unwrap_or(DEFAULT_MAX_VOLUME);
        if volume < 0 || volume > max {
            issues.push(ValidationIssue::new(
                IssueKind::Range,
                "services.audio.volume",
                format!("Volume must be between 0 and {}", max),
                Severity::Error,
            ));
        }
    }

    let power = &services.power;
    if let (Some(low), Some(critical)) = (
        power.battery_low_threshold,
        power.battery_critical_threshold,
    ) && low <= critical
    {
        issues.push(ValidationIssue::new(
            IssueKind::Conflict,
            "services.power",
            "Battery low threshold must be higher than critical threshold",
            Severity::Warning,
        ));
    }
}

fn check_commands(commands: &CommandsConfig, issues: &mut Vec<ValidationIssue>) {
    for (name, command) in commands.custom.iter().flatten() {
        if command.command.trim().is_empty() {
            issues.push(ValidationIssue::new(
                IssueKind::Required,
                format!("commands.custom.{}.command", name),
                "Command cannot be empty",
                Severity::Error,
            ));
        }
    }
}

fn check_wallpaper(wallpaper: &WallpaperConfig, issues: &mut Vec<ValidationIssue>) {
    if let Some(mode) = &wallpaper.mode
        && !WALLPAPER_MODES.contains(&mode.as_str())
    {
        issues.push(
            ValidationIssue::new(
                IssueKind::Enum,
                "wallpaper.mode",
                format!("Invalid wallpaper mode: {}", mode),
                Severity::Error,
            )
            .with_fix(format!("Use one of: {}", WALLPAPER_MODES.join(", "))),
        );
    }

    if let Some(fill_mode) = &wallpaper.fill_mode
        && !fill_mode.is_empty()
        && !FILL_MODES.contains(&fill_mode.as_str())
    {
        issues.push(ValidationIssue::new(
            IssueKind::Enum,
            "wallpaper.fillMode",
            format!("Invalid fill mode: {}", fill_mode),
            Severity::Warning,
        ));
    }

    if wallpaper.mode.as_deref() == Some("slideshow") && wallpaper.interval.unwrap_or(0) <= 0 {
        issues.push(ValidationIssue::new(
            IssueKind::Conditional,
            "wallpaper.interval",
            "Slideshow interval must be positive",
            Severity::Error,
        ));
    }
}

fn check_hot_reload(hot_reload: &HotReloadConfig, issues: &mut Vec<ValidationIssue>) {
    if let Some(debounce) = hot_reload.debounce
        && debounce < 0
    {
        issues.push(ValidationIssue::new(
            IssueKind::Range,
            "hotReload.debounce",
            "Debounce time must be non-negative",
            Severity::Error,
        ));
    }

    if let Some(retries) = hot_reload.max_retries
        && retries < 0
    {
        issues.push(ValidationIssue::new(
            IssueKind::Range,
            "hotReload.maxRetries",
            "Max retries must be non-negative",
            Severity::Error,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile_defaults;
    use crate::validation::types::has_blocking_issues;

    fn issues_at<'a>(issues: &'a [ValidationIssue], path: &str) -> Vec<&'a ValidationIssue> {
        issues.iter().filter(|i| i.path == path).collect()
    }

    #[test]
    fn test_all_profiles_validate_clean() {
        let validator = SchemaValidator::new();
        for name in crate::config::available_profiles() {
            let issues = validator.validate(&profile_defaults(name));
            assert!(issues.is_empty(), "profile {} had issues: {:?}", name, issues);
        }
    }

    #[test]
    fn test_volume_above_max_is_single_error() {
        let mut config = profile_defaults("default");
        config.services.audio.volume = Some(150);
        config.services.audio.max_volume = Some(100);

        let issues = SchemaValidator::new().validate(&config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "services.audio.volume");
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].message, "Volume must be between 0 and 100");
    }

    #[test]
    fn test_validate_is_repeatable_and_pure() {
        let mut config = profile_defaults("default");
        config.bar.position = Some("middle".to_string());
        config.appearance.colors.primary = Some("blue".to_string());
        let before = config.clone();

        let validator = SchemaValidator::new();
        let first = validator.validate(&config);
        let second = validator.validate(&config);

        assert_eq!(first, second);
        assert_eq!(config, before);
    }

    #[test]
    fn test_empty_version_reported_by_battery_and_rule() {
        let mut config = profile_defaults("default");
        config.version = String::new();

        let issues = SchemaValidator::new().validate(&config);
        let version_issues = issues_at(&issues, "version");
        assert_eq!(version_issues.len(), 2);
        assert_eq!(version_issues[0].message, "Version is required");
        assert!(version_issues[0].fix.as_ref().unwrap().auto_fix);
        assert_eq!(version_issues[1].kind, IssueKind::Rule);
    }

    #[test]
    fn test_missing_shell_and_terminal() {
        let mut config = profile_defaults("default");
        config.system.shell = None;
        config.system.terminal = Some(String::new());

        let issues = SchemaValidator::new().validate(&config);
        let shell = issues_at(&issues, "system.shell");
        assert_eq!(shell.len(), 2);
        assert_eq!(shell[0].message, "Shell is required");
        assert_eq!(shell[1].message, "system.shell is required");
        assert_eq!(issues_at(&issues, "system.terminal").len(), 1);
        assert!(has_blocking_issues(&issues));
    }

    #[test]
    fn test_empty_profile_is_auto_fixable_warning() {
        let mut config = profile_defaults("default");
        config.metadata.profile = None;

        let issues = SchemaValidator::new().validate(&config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(issues[0].fix.as_ref().unwrap().auto_fix);
        assert!(!has_blocking_issues(&issues));
    }

    #[test]
    fn test_range_checks() {
        let mut config = profile_defaults("default");
        config.appearance.transparency = Some(1.5);
        config.appearance.blur_radius = Some(-1);
        config.system.font.size = Some(0);
        config.bar.height = Some(0);
        config.services.notifications.timeout = Some(-5);
        config.hot_reload.debounce = Some(-1);
        config.hot_reload.max_retries = Some(-1);

        let issues = SchemaValidator::new().validate(&config);
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "system.font.size",
                "appearance.transparency",
                "appearance.blurRadius",
                "bar.height",
                "services.notifications.timeout",
                "hotReload.debounce",
                "hotReload.maxRetries",
            ]
        );
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
    }

    #[test]
    fn test_enum_checks_and_severities() {
        let mut config = profile_defaults("default");
        config.bar.position = Some("middle".to_string());
        config.bar.layer = Some("sky".to_string());
        config.wallpaper.mode = Some("animated".to_string());
        config.wallpaper.fill_mode = Some("stretch".to_string());

        let issues = SchemaValidator::new().validate(&config);
        assert_eq!(issues_at(&issues, "bar.position")[0].severity, Severity::Error);
        assert_eq!(issues_at(&issues, "bar.layer")[0].severity, Severity::Warning);
        assert_eq!(issues_at(&issues, "wallpaper.mode")[0].severity, Severity::Error);
        assert_eq!(
            issues_at(&issues, "wallpaper.fillMode")[0].severity,
            Severity::Warning
        );
    }

    #[test]
    fn test_empty_layer_and_fill_mode_are_not_checked() {
        let mut config = profile_defaults("default");
        config.bar.layer = Some(String::new());
        config.wallpaper.fill_mode = Some(String::new());

        assert!(SchemaValidator::new().validate(&config).is_empty());
    }

    #[test]
    fn test_module_duplicates_and_conflicts() {
        let mut config = profile_defaults("default");
        config.modules.enabled = Some(vec![
            "clock".to_string(),
            "clock".to_string(),
            "audio".to_string(),
        ]);
        config.modules.disabled = Some(vec!["audio".to_string(), "cpu".to_string()]);

        let issues = SchemaValidator::new().validate(&config);
        let dup = issues_at(&issues, "modules.enabled");
        assert_eq!(dup.len(), 1);
        assert_eq!(dup[0].kind, IssueKind::Duplicate);
        assert_eq!(dup[0].severity, Severity::Warning);

        let conflict = issues_at(&issues, "modules");
        assert_eq!(conflict.len(), 1);
        assert_eq!(conflict[0].message, "Module audio is both enabled and disabled");
        assert_eq!(conflict[0].severity, Severity::Error);
    }

    #[test]
    fn test_battery_thresholds_warning() {
        let mut config = profile_defaults("default");
        config.services.power.battery_low_threshold = Some(10);
        config.services.power.battery_critical_threshold = Some(10);

        let issues = SchemaValidator::new().validate(&config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "services.power");
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_color_patterns() {
        let mut config = profile_defaults("default");
        config.appearance.accent_color = Some("#12345".to_string());
        config.appearance.colors.border = Some("red".to_string());
        config.bar.foreground = Some("#AABBCCDD".to_string());

        let issues = SchemaValidator::new().validate(&config);
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["appearance.accentColor", "appearance.colors.border"]);
        assert!(issues.iter().all(|i| i.kind == IssueKind::Pattern));
    }

    #[test]
    fn test_slideshow_requires_positive_interval() {
        let mut config = profile_defaults("default");
        config.wallpaper.mode = Some("slideshow".to_string());
        config.wallpaper.interval = None;

        let issues = SchemaValidator::new().validate(&config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Conditional);
        assert_eq!(issues[0].path, "wallpaper.interval");
    }

    #[test]
    fn test_empty_custom_command() {
        let mut config = profile_defaults("development");
        if let Some(custom) = config.commands.custom.as_mut() {
            custom.get_mut("ide").unwrap().command = String::new();
        }

        let issues = SchemaValidator::new().validate(&config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "commands.custom.ide.command");
    }
}
