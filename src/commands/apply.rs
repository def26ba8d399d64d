//! The `apply` subcommand: realise a macro or saved profile.

use anyhow::Result;

use crate::apply::Applier;
use crate::cli::{ApplyOpts, GlobalOpts};
use crate::config::profiles::ProfileStore;
use crate::detect;
use crate::error::{ApplyError, ProfileError};
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::mapper::Mapping;

/// Run the apply command.
///
/// The name is looked up as a macro first, then as a saved profile. Exit is
/// non-zero if either the display or the audio category fails.
///
/// # Errors
///
/// Returns an error for an unknown target name, an unreadable profile, or a
/// failed apply run.
pub fn run(global: &GlobalOpts, opts: &ApplyOpts, log: &Logger) -> Result<()> {
    let store = super::open_store(global)?;
    let profiles = ProfileStore::new(store.dir());
    let executor = SystemExecutor;

    super::check_dependencies(&executor, log, true, true)?;

    let config = store.load_or_default();
    log.stage(&format!("Applying '{}'", opts.name));
    let devices = detect::detect_and_cache(&executor, &store);
    let applier = Applier::new(&executor, log, global.dry_run);

    let report = if let Some(def) = config.macros.get(&opts.name) {
        if !def.description.is_empty() {
            log.info(&def.description);
        }
        let mapping = Mapping::resolve(&config, &devices);
        applier.apply_macro(def, &mapping, &devices)
    } else {
        match profiles.get(&opts.name) {
            Ok(profile) => {
                if !profile.description.is_empty() {
                    log.info(&profile.description);
                }
                applier.apply_profile(&profile, &devices)
            }
            Err(ProfileError::NotFound(_)) => {
                let available: Vec<String> = config
                    .macros
                    .keys()
                    .cloned()
                    .chain(profiles.list().into_iter().map(|p| p.name))
                    .collect();
                return Err(ApplyError::UnknownTarget {
                    name: opts.name.clone(),
                    available: available.join(", "),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }
    };

    log.print_summary();

    if !report.success() {
        anyhow::bail!("applying '{}' failed", opts.name);
    }
    Ok(())
}
