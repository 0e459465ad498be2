//! Built-in profile catalog.
//!
//! Each profile is a complete document. `default` is what `initialize` writes
//! on first run and what the injector diffs against.

use chrono::Utc;
use serde_json::Map;
use std::collections::BTreeMap;

use crate::config::types::*;

/// Name of the profile used when none is requested.
pub const DEFAULT_PROFILE: &str = "default";

/// Watch path shipped before the document moved out of the quickshell tree.
pub const LEGACY_WATCH_PATH: &str = "~/.config/quickshell/heimdall/shell.json";

/// Watch path shipped since schema 1.0.0.
pub const DEFAULT_WATCH_PATH: &str = "~/.config/heimdall/shell.json";

const PROFILES: &[&str] = &[
    "default",
    "minimal",
    "gaming",
    "productivity",
    "development",
];

/// Names of all built-in profiles.
pub fn available_profiles() -> &'static [&'static str] {
    PROFILES
}

/// Check whether `name` is a built-in profile.
pub fn is_known_profile(name: &str) -> bool {
    PROFILES.contains(&name)
}

/// Return the complete document for a named profile.
///
/// Unknown names fall back to the `default` profile.
pub fn profile_defaults(name: &str) -> ShellConfiguration {
    match name {
        "minimal" => minimal_profile(),
        "gaming" => gaming_profile(),
        "productivity" => productivity_profile(),
        "development" => development_profile(),
        _ => default_profile(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn some(s: &str) -> Option<String> {
    Some(s.to_string())
}

const DEFAULT_MODULES: &[&str] = &[
    "workspaces",
    "taskbar",
    "systray",
    "clock",
    "battery",
    "network",
    "audio",
    "bluetooth",
];

fn default_profile() -> ShellConfiguration {
    let now = Utc::now();

    ShellConfiguration {
        version: CURRENT_SCHEMA_VERSION.to_string(),
        metadata: ConfigMetadata {
            created: Some(now),
            last_modified: Some(now),
            profile: some(DEFAULT_PROFILE),
            managed_by: some(MANAGED_BY),
            user_locked: Vec::new(),
            extra: Map::new(),
        },
        system: SystemConfig {
            shell: some("bash"),
            terminal: some("kitty"),
            file_manager: some("nemo"),
            editor: some("nvim"),
            browser: some("firefox"),
            polkit_agent: some("/usr/lib/polkit-gnome/polkit-gnome-authentication-agent-1"),
            screenshot_tool: some("grim"),
            color_picker: some("hyprpicker"),
            clipboard_tool: some("wl-clipboard"),
            launcher: some("fuzzel"),
            power_menu: some("wlogout"),
            lock_screen: some("hyprlock"),
            notification_daemon: some("dunst"),
            audio_control: some("pavucontrol"),
            network_manager: some("nm-applet"),
            bluetooth_manager: some("blueman-applet"),
            display_manager: some("wdisplays"),
            theme_manager: some("nwg-look"),
            icon_theme: some("Papirus-Dark"),
            cursor_theme: some("Bibata-Modern-Classic"),
            font: FontConfig {
                family: some("JetBrainsMono Nerd Font"),
                size: Some(11),
                weight: some("Regular"),
            },
        },
        appearance: AppearanceConfig {
            theme: some("dark"),
            color_scheme: some("catppuccin-mocha"),
            accent_color: some("#89b4fa"),
            transparency: Some(0.8),
            blur_radius: Some(10),
            border_radius: Some(10),
            border_width: Some(2),
            shadows: Some(true),
            animations: Some(true),
            animation_speed: some("normal"),
            colors: ColorConfig {
                background: some("#1e1e2e"),
                foreground: some("#cdd6f4"),
                primary: some("#89b4fa"),
                secondary: some("#f5c2e7"),
                success: some("#a6e3a1"),
                warning: some("#f9e2af"),
                error: some("#f38ba8"),
                info: some("#89dceb"),
                surface: some("#313244"),
                border: some("#45475a"),
            },
        },
        bar: BarConfig {
            position: some("top"),
            height: Some(30),
            width: some("100%"),
            margin: EdgeInsets {
                top: Some(5),
                right: Some(5),
                bottom: Some(0),
                left: Some(5),
            },
            padding: EdgeInsets {
                top: Some(5),
                right: Some(10),
                bottom: Some(5),
                left: Some(10),
            },
            spacing: Some(10),
            background: some("#1e1e2e"),
            foreground: some("#cdd6f4"),
            transparent: Some(true),
            blur: Some(true),
            shadow: Some(true),
            rounded: Some(true),
            border: Some(true),
            auto_hide: Some(false),
            layer: some("top"),
            exclusive_zone: Some(true),
        },
        modules: ModulesConfig {
            enabled: Some(strings(DEFAULT_MODULES)),
            disabled: Some(Vec::new()),
            order: Some(strings(DEFAULT_MODULES)),
            settings: Some(Map::new()),
        },
        services: ServicesConfig {
            notifications: NotificationConfig {
                enabled: Some(true),
                position: some("top-right"),
                timeout: Some(5000),
                max_visible: Some(5),
                history_size: Some(50),
                do_not_disturb: Some(false),
                show_on_lock_screen: Some(false),
            },
            audio: AudioConfig {
                default_sink: some(""),
                default_source: some(""),
                volume: Some(50),
                muted: Some(false),
                step_size: Some(5),
                max_volume: Some(100),
                show_osd: Some(true),
            },
            network: NetworkConfig {
                interface: some(""),
                show_speed: Some(true),
                show_ip_address: Some(false),
                auto_connect: Some(true),
            },
            bluetooth: BluetoothConfig {
                enabled: Some(true),
                discoverable: Some(false),
                auto_connect: Some(true),
                trusted_devices: Some(Vec::new()),
            },
            power: PowerConfig {
                battery_low_threshold: Some(20),
                battery_critical_threshold: Some(10),
                ac_action: some("performance"),
                battery_action: some("balanced"),
                lid_close_action: some("suspend"),
                idle_timeout: Some(600),
                suspend_timeout: Some(1800),
                hibernate_timeout: Some(3600),
            },
            display: DisplayConfig {
                brightness: Some(100),
                night_light: Some(false),
                night_light_temp: Some(4500),
                auto_brightness: Some(false),
                dpms: Some(true),
                dpms_timeout: Some(600),
                resolution: some("auto"),
                refresh_rate: Some(60),
                scale: Some(1.0),
            },
        },
        commands: CommandsConfig {
            custom: Some(BTreeMap::new()),
        },
        wallpaper: WallpaperConfig {
            mode: some("static"),
            path: some(""),
            directory: some("~/Pictures/Wallpapers"),
            interval: Some(300),
            random: Some(false),
            blur: Some(false),
            blur_strength: Some(10),
            dim: Some(false),
            dim_strength: Some(0.3),
            fill_mode: some("cover"),
            monitors: Some(Vec::new()),
        },
        hot_reload: HotReloadConfig {
            enabled: Some(true),
            watch_paths: Some(strings(&[DEFAULT_WATCH_PATH])),
            ignore_patterns: Some(strings(&["*.tmp", "*.swp", "*.bak"])),
            debounce: Some(100),
            max_retries: Some(3),
            retry_delay: Some(1000),
        },
        extra: Map::new(),
    }
}

/// A sparse but valid document: only what the shell needs to start.
fn minimal_profile() -> ShellConfiguration {
    let now = Utc::now();

    ShellConfiguration {
        version: CURRENT_SCHEMA_VERSION.to_string(),
        metadata: ConfigMetadata {
            created: Some(now),
            last_modified: Some(now),
            profile: some("minimal"),
            managed_by: some(MANAGED_BY),
            ..Default::default()
        },
        system: SystemConfig {
            shell: some("bash"),
            terminal: some("kitty"),
            font: FontConfig {
                family: some("monospace"),
                size: Some(10),
                weight: some("Regular"),
            },
            ..Default::default()
        },
        appearance: AppearanceConfig {
            theme: some("dark"),
            color_scheme: some("default"),
            accent_color: some("#0078d4"),
            transparency: Some(1.0),
            colors: ColorConfig {
                background: some("#000000"),
                foreground: some("#ffffff"),
                primary: some("#0078d4"),
                secondary: some("#00bcf2"),
                success: some("#107c10"),
                warning: some("#ffb900"),
                error: some("#d13438"),
                info: some("#0078d4"),
                surface: some("#1f1f1f"),
                border: some("#3f3f3f"),
            },
            ..Default::default()
        },
        bar: BarConfig {
            position: some("top"),
            height: Some(30),
            width: some("100%"),
            layer: some("top"),
            exclusive_zone: Some(true),
            ..Default::default()
        },
        modules: ModulesConfig {
            enabled: Some(strings(&["clock"])),
            disabled: Some(Vec::new()),
            order: Some(strings(&["clock"])),
            settings: Some(Map::new()),
        },
        services: ServicesConfig {
            notifications: NotificationConfig {
                enabled: Some(true),
                position: some("top-right"),
                timeout: Some(5000),
                ..Default::default()
            },
            audio: AudioConfig {
                volume: Some(50),
                step_size: Some(5),
                max_volume: Some(100),
                ..Default::default()
            },
            network: NetworkConfig {
                auto_connect: Some(true),
                ..Default::default()
            },
            bluetooth: BluetoothConfig {
                enabled: Some(false),
                trusted_devices: Some(Vec::new()),
                ..Default::default()
            },
            power: PowerConfig {
                battery_low_threshold: Some(20),
                battery_critical_threshold: Some(10),
                ..Default::default()
            },
            display: DisplayConfig {
                brightness: Some(100),
                refresh_rate: Some(60),
                scale: Some(1.0),
                ..Default::default()
            },
        },
        commands: CommandsConfig {
            custom: Some(BTreeMap::new()),
        },
        wallpaper: WallpaperConfig {
            mode: some("static"),
            fill_mode: some("cover"),
            monitors: Some(Vec::new()),
            ..Default::default()
        },
        hot_reload: HotReloadConfig {
            enabled: Some(false),
            watch_paths: Some(Vec::new()),
            ignore_patterns: Some(Vec::new()),
            ..Default::default()
        },
        extra: Map::new(),
    }
}

fn gaming_profile() -> ShellConfiguration {
    let mut config = default_profile();
    config.metadata.profile = some("gaming");

    config.appearance.animations = Some(false);
    config.appearance.shadows = Some(false);
    config.appearance.transparency = Some(1.0);
    config.appearance.blur_radius = Some(0);

    config.bar.auto_hide = Some(true);
    config.bar.height = Some(25);
    config.bar.transparent = Some(false);
    config.bar.blur = Some(false);
    config.bar.shadow = Some(false);

    let modules = strings(&["clock", "audio", "network"]);
    config.modules.order = Some(modules.clone());
    config.modules.enabled = Some(modules);

    config.services.power.ac_action = some("performance");
    config.services.power.battery_action = some("performance");
    config.services.display.auto_brightness = Some(false);
    config.services.display.night_light = Some(false);

    config.hot_reload.enabled = Some(false);

    config
}

fn productivity_profile() -> ShellConfiguration {
    let mut config = default_profile();
    config.metadata.profile = some("productivity");

    config.appearance.color_scheme = some("nord");
    config.appearance.transparency = Some(0.95);
    config.appearance.blur_radius = Some(20);
    config.appearance.animation_speed = some("fast");

    let modules = strings(&[
        "workspaces",
        "taskbar",
        "clock",
        "battery",
        "network",
        "audio",
        "notifications",
        "pomodoro",
        "todo",
    ]);
    config.modules.order = Some(modules.clone());
    config.modules.enabled = Some(modules);

    config.services.notifications.do_not_disturb = Some(false);
    config.services.notifications.max_visible = Some(3);
    config.services.notifications.timeout = Some(3000);

    config.services.power.ac_action = some("balanced");
    config.services.power.battery_action = some("powersave");
    config.services.power.idle_timeout = Some(900);

    config.services.display.night_light = Some(true);
    config.services.display.night_light_temp = Some(4000);

    config
}

fn development_profile() -> ShellConfiguration {
    let mut config = default_profile();
    config.metadata.profile = some("development");

    config.appearance.color_scheme = some("dracula");
    config.appearance.transparency = Some(0.9);
    config.system.terminal = some("alacritty");
    config.system.editor = some("code");

    let mut modules = strings(DEFAULT_MODULES);
    modules.extend(strings(&["cpu", "memory", "disk", "docker", "git"]));
    config.modules.order = Some(modules.clone());
    config.modules.enabled = Some(modules);

    config.services.notifications.history_size = Some(100);
    config.services.display.scale = Some(1.25);

    config.hot_reload.enabled = Some(true);
    config.hot_reload.debounce = Some(50);

    let mut custom = BTreeMap::new();
    custom.insert(
        "ide".to_string(),
        CommandDef {
            name: "IDE".to_string(),
            command: "code".to_string(),
            args: strings(&["."]),
            description: "Open VS Code in current directory".to_string(),
            icon: "code".to_string(),
            shortcut: "Super+C".to_string(),
        },
    );
    custom.insert(
        "terminal".to_string(),
        CommandDef {
            name: "Terminal".to_string(),
            command: "alacritty".to_string(),
            args: Vec::new(),
            description: "Open terminal".to_string(),
            icon: "terminal".to_string(),
            shortcut: "Super+Return".to_string(),
        },
    );
    config.commands.custom = Some(custom);

    config
}
