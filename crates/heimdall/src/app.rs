use clap::{Arg, ArgAction, Command};
use clap_complete::Shell;

pub fn build_cli() -> Command {
    Command::new("heimdall")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Manage the Heimdall shell configuration")
        .long_about("Heimdall keeps the shell's JSON configuration valid and up to date: it validates the document, injects missing defaults without touching values you have pinned, and migrates it between schema versions with automatic backups.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("config")
                .about("Manage shell configuration")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("init")
                        .about("Initialize a new configuration")
                        .arg(
                            Arg::new("profile")
                                .help("Profile to start from")
                                .index(1)
                                .default_value("default")
                        )
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .short('f')
                                .help("Overwrite an existing configuration")
                                .action(ArgAction::SetTrue)
                        )
                )
                .subcommand(
                    Command::new("validate").about("Validate the current configuration")
                )
                .subcommand(
                    Command::new("migrate")
                        .about("Migrate configuration to a new version")
                        .arg(
                            Arg::new("version")
                                .help("Target schema version (default: current)")
                                .index(1)
                        )
                )
                .subcommand(
                    Command::new("inject").about("Inject missing default properties")
                )
                .subcommand(
                    Command::new("get")
                        .about("Get a configuration value")
                        .arg(
                            Arg::new("path")
                                .help("Dotted path, e.g. bar.position")
                                .required(true)
                                .index(1)
                        )
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .short('j')
                                .help("Output in JSON format")
                                .action(ArgAction::SetTrue)
                        )
                )
                .subcommand(
                    Command::new("set")
                        .about("Set a configuration value")
                        .arg(
                            Arg::new("path")
                                .help("Dotted path, e.g. bar.position")
                                .required(true)
                                .index(1)
                        )
                        .arg(
                            Arg::new("value")
                                .help("JSON value; anything that is not valid JSON is stored as a string")
                                .required(true)
                                .allow_hyphen_values(true)
                                .index(2)
                        )
                )
                .subcommand(
                    Command::new("lock")
                        .about("Lock a configuration path from automatic updates")
                        .arg(
                            Arg::new("path")
                                .help("Dotted path; a trailing * locks the whole subtree")
                                .required(true)
                                .index(1)
                        )
                )
                .subcommand(
                    Command::new("unlock")
                        .about("Unlock a configuration path")
                        .arg(
                            Arg::new("path")
                                .help("Dotted path previously locked")
                                .required(true)
                                .index(1)
                        )
                )
                .subcommand(
                    Command::new("export")
                        .about("Export configuration to a file (stdout if omitted)")
                        .arg(Arg::new("file").help("Output file").index(1))
                )
                .subcommand(
                    Command::new("import")
                        .about("Import configuration from a file")
                        .arg(
                            Arg::new("file")
                                .help("File to import")
                                .required(true)
                                .index(1)
                        )
                )
                .subcommand(
                    Command::new("history")
                        .about("Show migration history")
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .help("Output in JSON format")
                                .action(ArgAction::SetTrue)
                        )
                )
                .subcommand(
                    Command::new("rollback")
                        .about("Restore the backup taken before the last migration")
                )
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .help("Shell to generate completions for")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(Shell))
                )
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_matches(args: &[&str]) -> clap::ArgMatches {
        let mut argv = vec!["heimdall", "config"];
        argv.extend_from_slice(args);
        let matches = build_cli().try_get_matches_from(argv).unwrap();
        matches.subcommand_matches("config").unwrap().clone()
    }

    #[test]
    fn test_cli_build() {
        let app = build_cli();
        assert_eq!(app.get_name(), "heimdall");
        app.debug_assert();
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(build_cli().try_get_matches_from(vec!["heimdall"]).is_err());
        assert!(
            build_cli()
                .try_get_matches_from(vec!["heimdall", "config"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_init_defaults() {
        let config = config_matches(&["init"]);
        let init = config.subcommand_matches("init").unwrap();
        assert_eq!(init.get_one::<String>("profile").unwrap(), "default");
        assert!(!init.get_flag("force"));
    }

    #[test]
    fn test_cli_init_with_profile_and_force() {
        let config = config_matches(&["init", "gaming", "-f"]);
        let init = config.subcommand_matches("init").unwrap();
        assert_eq!(init.get_one::<String>("profile").unwrap(), "gaming");
        assert!(init.get_flag("force"));
    }

    #[test]
    fn test_cli_get_json_flag() {
        let config = config_matches(&["get", "bar.position", "-j"]);
        let get = config.subcommand_matches("get").unwrap();
        assert_eq!(get.get_one::<String>("path").unwrap(), "bar.position");
        assert!(get.get_flag("json"));
    }

    #[test]
    fn test_cli_get_requires_path() {
        assert!(
            build_cli()
                .try_get_matches_from(vec!["heimdall", "config", "get"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_set_accepts_negative_numbers() {
        let config = config_matches(&["set", "appearance.blurRadius", "-1"]);
        let set = config.subcommand_matches("set").unwrap();
        assert_eq!(set.get_one::<String>("value").unwrap(), "-1");
    }

    #[test]
    fn test_cli_migrate_optional_version() {
        let config = config_matches(&["migrate"]);
        let migrate = config.subcommand_matches("migrate").unwrap();
        assert!(migrate.get_one::<String>("version").is_none());

        let config = config_matches(&["migrate", "1.0.0"]);
        let migrate = config.subcommand_matches("migrate").unwrap();
        assert_eq!(migrate.get_one::<String>("version").unwrap(), "1.0.0");
    }

    #[test]
    fn test_cli_verbose_flag_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(vec!["heimdall", "config", "validate", "-v"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
    }

    #[test]
    fn test_cli_verbose_flag_default_false() {
        let matches = build_cli()
            .try_get_matches_from(vec!["heimdall", "config", "validate"])
            .unwrap();
        assert!(!matches.get_flag("verbose"));
    }

    #[test]
    fn test_cli_completions_shell() {
        let matches = build_cli()
            .try_get_matches_from(vec!["heimdall", "completions", "zsh"])
            .unwrap();
        let completions = matches.subcommand_matches("completions").unwrap();
        assert_eq!(*completions.get_one::<Shell>("shell").unwrap(), Shell::Zsh);
    }

    #[test]
    fn test_cli_completions_rejects_unknown_shell() {
        assert!(
            build_cli()
                .try_get_matches_from(vec!["heimdall", "completions", "tcsh"])
                .is_err()
        );
    }
}
