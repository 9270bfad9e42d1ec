use crate::cli::Cli;
use crate::document::ConfigDocument;
use crate::error::Result;
use crate::patcher::{self, AgentSpec, PatchReport};
use crate::settings::Settings;
use tracing::debug;

/// Build the agent to register from CLI arguments and resolved settings
pub fn agent_spec(cli: &Cli, settings: &Settings) -> AgentSpec {
    let model = cli.model.as_deref().unwrap_or(&settings.default_model);
    AgentSpec::new(&cli.agent_id, &cli.agent_name, &cli.bot_token).with_model(model)
}

/// Load the config, apply the patch and write it back (or print it on a dry run)
pub fn execute(settings: &Settings, spec: &AgentSpec) -> Result<PatchReport> {
    spec.validate()?;

    let document = ConfigDocument::load(&settings.config_path)?;
    let (document, report) = patcher::patch(document, spec, &settings.home)?;
    debug!(
        agent_added = report.agent_added,
        binding_added = report.binding_added,
        account = ?report.account,
        "upserts applied"
    );

    if settings.dry_run {
        print!("{}", document.to_pretty_string()?);
        eprintln!("Dry run: {} was not modified", settings.config_path.display());
        return Ok(report);
    }

    document.save()?;
    println!("✓ Config patched for agent '{}' (ID: {})", spec.name, spec.id);

    Ok(report)
}
