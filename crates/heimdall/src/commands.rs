use clap::ArgMatches;
use tracing::error;

use heimdall_core::events;

mod completions;
mod config;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup(&command_name(matches));

    let result = match matches.subcommand() {
        Some(("config", sub_matches)) => config::handle_config_command(sub_matches),
        Some(("completions", sub_matches)) => {
            completions::handle_completions_command(sub_matches)
        }
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    };

    events::log_app_shutdown(result.is_ok());
    result
}

/// Space-joined subcommand chain, e.g. `config set`.
fn command_name(matches: &ArgMatches) -> String {
    let mut names = Vec::new();
    let mut current = matches;
    while let Some((name, sub)) = current.subcommand() {
        names.push(name);
        current = sub;
    }
    names.join(" ")
}
