use anyhow::Result;
use chrono::Local;
use clap::Parser;

fn main() -> Result<()> {
    let cli = studyplan::cli::Cli::parse();
    studyplan::logging::init_tracing(cli.log_filter.clone())?;

    let config = studyplan::config::from_cli(&cli)?;
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| studyplan::cli::CliCommand::Stats(Default::default()));

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    studyplan::commands::execute(&config, command, &Local::now(), &mut handle)?;

    Ok(())
}
