//! The `profile` subcommand: list, create, delete, or show saved profiles.

use anyhow::Result;

use crate::cli::{GlobalOpts, ProfileOpts};
use crate::config::profiles::{Profile, ProfileStore};
use crate::detect::{self, DeviceSet};
use crate::exec::SystemExecutor;
use crate::logging::Logger;

/// Run the profile command.
///
/// `--create` snapshots the currently detected devices and then applies the
/// optional creation overrides (primary display, extra displays, audio
/// devices, volume) before saving.
///
/// # Errors
///
/// Returns an error when a named profile does not exist or the profile file
/// cannot be written or deleted.
pub fn run(global: &GlobalOpts, opts: &ProfileOpts, log: &Logger) -> Result<()> {
    let store = super::open_store(global)?;
    let profiles = ProfileStore::new(store.dir());

    if opts.list {
        let infos = profiles.list();
        if infos.is_empty() {
            println!("No profiles found.");
            return Ok(());
        }
        println!("Available profiles:");
        for info in infos {
            println!("  {}: {}", info.display_name, info.description);
        }
    } else if let Some(name) = &opts.show {
        let profile = profiles.get(name)?;
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else if let Some(name) = &opts.delete {
        profiles.delete(name)?;
        log.info(&format!("profile '{name}' deleted"));
    } else if let Some(name) = &opts.create {
        let executor = SystemExecutor;
        let devices = detect::detect_and_cache(&executor, &store);

        let description = opts.description.clone().unwrap_or_else(|| {
            format!(
                "Profile created on {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M")
            )
        });
        let mut profile = ProfileStore::build_from_detected(name, &description, &devices);
        apply_creation_overrides(&mut profile, opts, &devices);

        if global.dry_run {
            log.dry_run(&format!(
                "write profile '{name}' to {}",
                profiles.path_for(name).display()
            ));
            return Ok(());
        }
        profiles.create(name, &profile)?;
        log.info(&format!("profile '{name}' created"));
    }

    Ok(())
}

/// Fold the `--primary-display`, `--enable-displays`, `--audio-output`,
/// `--audio-input` and `--volume` overrides into a freshly built profile.
fn apply_creation_overrides(profile: &mut Profile, opts: &ProfileOpts, devices: &DeviceSet) {
    if let Some(primary) = &opts.primary_display {
        let resolved = devices
            .find_display(primary)
            .map_or_else(|| primary.clone(), |d| d.id.clone());
        for (name, display) in &mut profile.displays {
            display.primary = *name == resolved;
            if display.primary {
                display.enabled = true;
            }
        }
    }

    if let Some(extra) = &opts.enable_displays {
        for name in extra.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if let Some(display) = profile.displays.get_mut(name) {
                display.enabled = true;
            }
        }
    }

    if let Some(output) = &opts.audio_output {
        profile.audio.output = Some(output.clone());
    }
    if let Some(input) = &opts.audio_input {
        profile.audio.input = Some(input.clone());
    }
    if let Some(volume) = opts.volume {
        profile.audio.volume = Some(volume);
    }
}
