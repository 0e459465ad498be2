//! Shell configuration document definitions.
//!
//! These types are serialized to and from `shell.json`. Every leaf inside a
//! section is optional on disk: a key that is absent is "missing" and is the
//! injector's business, while the validator only range-checks values that are
//! present.
//!
//! # Example Document
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "metadata": { "profile": "default", "userLocked": ["system.shell"] },
//!   "system": { "shell": "zsh", "terminal": "kitty" },
//!   "services": { "audio": { "volume": 50, "maxVolume": 100 } }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Schema version written by this release.
pub const CURRENT_SCHEMA_VERSION: &str = "1.0.0";

/// Identifier stamped into `metadata.managedBy`.
pub const MANAGED_BY: &str = "heimdall-cli";

/// The root configuration document.
///
/// Unknown top-level keys are kept in [`ShellConfiguration::extra`] so that a
/// document written by a newer release survives a load/save cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellConfiguration {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub system: SystemConfig,

    #[serde(default)]
    pub appearance: AppearanceConfig,

    #[serde(default)]
    pub bar: BarConfig,

    #[serde(default)]
    pub modules: ModulesConfig,

    #[serde(default)]
    pub services: ServicesConfig,

    #[serde(default)]
    pub commands: CommandsConfig,

    #[serde(default)]
    pub wallpaper: WallpaperConfig,

    #[serde(default)]
    pub hot_reload: HotReloadConfig,

    /// Top-level keys this release does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bookkeeping about the document itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<String>,

    /// Dotted paths pinned by the user. A trailing `*` locks a whole subtree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_locked: Vec<String>,

    /// Metadata keys written by migrations or newer releases.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// System-level tool choices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polkit_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_picker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clipboard_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launcher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_menu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_screen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_daemon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bluetooth_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_theme: Option<String>,

    #[serde(default)]
    pub font: FontConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

/// Theme, colors, and compositor effects.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    /// Window opacity, 0.0 (invisible) to 1.0 (opaque).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_radius: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadows: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animations: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_speed: Option<String>,

    #[serde(default)]
    pub colors: ColorConfig,
}

/// Palette entries, each `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
}

impl ColorConfig {
    /// Palette entries paired with their field names, in declaration order.
    pub fn entries(&self) -> [(&'static str, Option<&str>); 10] {
        [
            ("background", self.background.as_deref()),
            ("foreground", self.foreground.as_deref()),
            ("primary", self.primary.as_deref()),
            ("secondary", self.secondary.as_deref()),
            ("success", self.success.as_deref()),
            ("warning", self.warning.as_deref()),
            ("error", self.error.as_deref()),
            ("info", self.info.as_deref()),
            ("surface", self.surface.as_deref()),
            ("border", self.border.as_deref()),
        ]
    }
}

/// The status bar (called `panel` before schema 1.0.0).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default)]
    pub margin: EdgeInsets,
    #[serde(default)]
    pub padding: EdgeInsets,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_hide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_zone: Option<bool>,
}

/// Margin or padding around the bar, in pixels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeInsets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<String>>,
    /// Free-form per-module settings, keyed by module name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesConfig {
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub bluetooth: BluetoothConfig,
    #[serde(default)]
    pub power: PowerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Milliseconds before a notification is dismissed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_visible: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_not_disturb: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_on_lock_screen: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_volume: Option<i64>,
    #[serde(default, rename = "showOSD", skip_serializing_if = "Option::is_none")]
    pub show_osd: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_speed: Option<bool>,
    #[serde(default, rename = "showIPAddress", skip_serializing_if = "Option::is_none")]
    pub show_ip_address: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_connect: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BluetoothConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discoverable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_connect: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_devices: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerConfig {
    /// Battery percentage at which the low-battery warning fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_low_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_critical_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lid_close_action: Option<String>,
    /// Seconds of inactivity before the idle action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hibernate_timeout: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night_light: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night_light_temp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_brightness: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpms: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpms_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// User-defined launcher commands keyed by identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<BTreeMap<String, CommandDef>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shortcut: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperConfig {
    /// One of: static, slideshow, video, color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Seconds between slideshow transitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_strength: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim_strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotReloadConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_paths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_patterns: Option<Vec<String>>,
    /// Milliseconds to wait for further writes before reloading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay: Option<i64>,
}
