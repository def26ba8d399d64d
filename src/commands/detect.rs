//! The `detect` subcommand: enumerate devices and print or save them.

use anyhow::{Context, Result};

use crate::cli::{DetectOpts, GlobalOpts};
use crate::detect;
use crate::exec::SystemExecutor;
use crate::logging::Logger;

/// Run the detect command.
///
/// Prints the detected device set as pretty JSON, or writes it to
/// `--save PATH` (relative paths land under the configuration directory).
/// Missing tools produce empty categories, not errors.
///
/// # Errors
///
/// Returns an error only if the save file cannot be written.
pub fn run(global: &GlobalOpts, opts: &DetectOpts, log: &Logger) -> Result<()> {
    let store = super::open_store(global)?;
    let executor = SystemExecutor;

    let devices = detect::detect_and_cache(&executor, &store);
    let json = serde_json::to_string_pretty(&devices).context("serializing device set")?;

    match &opts.save {
        Some(path) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                store.dir().join(path)
            };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(&path, format!("{json}\n"))
                .with_context(|| format!("writing {}", path.display()))?;
            log.info(&format!("device information saved to {}", path.display()));
        }
        None => println!("{json}"),
    }
    Ok(())
}
