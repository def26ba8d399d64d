//! The `config` subcommand: show, update, or reset `config.json`.

use anyhow::{Context, Result};

use crate::cli::{ConfigOpts, GlobalOpts};
use crate::logging::Logger;

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the update file is unreadable or not valid JSON, if
/// the merged document is no longer a valid configuration, or if saving
/// fails.
pub fn run(global: &GlobalOpts, opts: &ConfigOpts, log: &Logger) -> Result<()> {
    let store = super::open_store(global)?;

    if opts.show {
        let config = store.load_or_default();
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else if let Some(path) = &opts.update {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let partial: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        if global.dry_run {
            log.dry_run(&format!("merge {} into config.json", path.display()));
            return Ok(());
        }
        store.update(partial)?;
        log.info("configuration updated");
    } else if opts.reset {
        if global.dry_run {
            log.dry_run("rewrite config.json with built-in defaults");
            return Ok(());
        }
        store.reset()?;
        log.info("configuration reset to defaults");
    }

    Ok(())
}
