use clap::ArgMatches;
use clap_complete::Shell;

use crate::app::build_cli;

pub(crate) fn handle_completions_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let shell = matches
        .get_one::<Shell>("shell")
        .ok_or("Shell argument is required")?;

    let mut cmd = build_cli();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());

    tracing::info!(event = "cli.completions_completed", shell = %shell);
    Ok(())
}
