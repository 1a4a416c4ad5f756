//! # plandex-update
//!
//! Self-update subsystem for the plandex command-line tool.
//!
//! Called once, before the requested command runs, it checks whether a newer
//! CLI release exists and, if the user agrees, downloads the platform archive,
//! atomically replaces the running executable, and re-runs the original
//! invocation on the new binary, exiting with that run's status.
//!
//! ```no_run
//! use plandex_update::{check_for_upgrade, conclude, Continuation, Spinner, TerminalPrompter};
//! use plandex_update::{UpgradeConfig, UpgradeSession, CURRENT_VERSION};
//!
//! # async fn run() -> plandex_update::Result<()> {
//! let config = UpgradeConfig::load(None)?;
//! let prompter = TerminalPrompter::new(config.tool_name.clone());
//! let session = UpgradeSession::from_env(config, CURRENT_VERSION)?;
//!
//! let outcome = check_for_upgrade(&session, &prompter, &mut Spinner::new()).await;
//! if let Continuation::Exit(code) = conclude(outcome, &session) {
//!     std::process::exit(code);
//! }
//! // ... run the requested command
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod upgrade;

pub use config::UpgradeConfig;
pub use error::{Error, Result};
pub use upgrade::{
    check_for_upgrade, check_latest, conclude, Continuation, Deadline, ProcessInvocation, Prompter,
    Spinner, TerminalPrompter, UpdateOutcome, UpgradeSession, UpgradeStage, VersionCheck, FATAL_EXIT_CODE,
};

/// Version identifier of this build.
///
/// Release pipelines set `PLANDEX_BUILD_VERSION` at compile time; a value of
/// `development` disables self-update.
pub const CURRENT_VERSION: &str = match option_env!("PLANDEX_BUILD_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
