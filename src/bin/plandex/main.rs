//! plandex CLI entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use plandex_update::{
    check_for_upgrade, conclude, Continuation, Spinner, TerminalPrompter, UpgradeConfig,
    UpgradeSession, CURRENT_VERSION,
};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing on stderr; stdout belongs to the command
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    debug!("plandex v{CURRENT_VERSION}");

    let config = cli.load_config();

    if cli.runs_upgrade_check() {
        upgrade_before_command(config.clone(), cli.skip_upgrade).await;
    }

    cli.command().run(&config).await
}

/// Run the upgrade flow. Exits the process when an upgrade was applied or
/// failed after confirmation.
async fn upgrade_before_command(config: UpgradeConfig, skip: bool) {
    let session = match UpgradeSession::from_env(config, CURRENT_VERSION) {
        Ok(session) => session.with_skip(skip),
        Err(e) => {
            warn!("Skipping upgrade check: {e}");
            return;
        }
    };

    let prompter = TerminalPrompter::new(session.config().tool_name.clone());
    let outcome = check_for_upgrade(&session, &prompter, &mut Spinner::new()).await;

    if let Continuation::Exit(code) = conclude(outcome, &session) {
        std::process::exit(code);
    }
}
