#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;

use agent_patch::cli::Cli;
use agent_patch::settings::Settings;
use agent_patch::{commands, logging};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::load(cli)?;
    let spec = commands::patch::agent_spec(cli, &settings);

    if let Err(e) = commands::patch::execute(&settings, &spec) {
        tracing::debug!(kind = e.kind(), "patch aborted");
        return Err(e.into());
    }

    Ok(())
}
