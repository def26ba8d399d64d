//! The `audio` subcommand: list devices, switch defaults, set volume,
//! mute/unmute.

use anyhow::{Result, bail};
use serde_json::json;

use crate::apply::Applier;
use crate::cli::{AudioOpts, GlobalOpts};
use crate::detect::{self, DetectedDevice, DeviceSet};
use crate::exec::SystemExecutor;
use crate::logging::Logger;

/// Run the audio command.
///
/// Device names are matched exactly first, then by case-insensitive
/// substring over the mixer name and description.
///
/// # Errors
///
/// Returns an error if no audio system is available, the named device is
/// not found, or the mixer invocation fails.
pub fn run(global: &GlobalOpts, opts: &AudioOpts, log: &Logger) -> Result<()> {
    let store = super::open_store(global)?;
    let executor = SystemExecutor;

    if opts.list {
        let devices = detect::detect_and_cache(&executor, &store);
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "audio": devices.audio,
                "backend": devices.backend,
            }))?
        );
        return Ok(());
    }

    super::check_dependencies(&executor, log, false, true)?;
    let devices = detect::detect_and_cache(&executor, &store);
    let applier = Applier::new(&executor, log, global.dry_run);

    let ok = if let Some(name) = &opts.output {
        let device = find_output(&devices, name)?;
        applier.set_default_output(devices.backend, &device.id)
    } else if let Some(name) = &opts.input {
        let device = find_input(&devices, name)?;
        applier.set_default_input(devices.backend, &device.id)
    } else if let Some(volume) = opts.volume {
        let device = volume_target(&devices, opts.device.as_deref())?;
        applier.set_volume(devices.backend, &device.id, volume)
    } else if opts.mute || opts.unmute {
        let device = volume_target(&devices, opts.device.as_deref())?;
        applier.set_mute(devices.backend, &device.id, opts.mute)
    } else {
        true
    };

    if !ok {
        bail!("audio operation failed");
    }
    Ok(())
}

fn find_output<'a>(devices: &'a DeviceSet, name: &str) -> Result<&'a DetectedDevice> {
    match devices.find_output(name) {
        Some(device) => Ok(device),
        None => bail!("audio output '{name}' not found"),
    }
}

fn find_input<'a>(devices: &'a DeviceSet, name: &str) -> Result<&'a DetectedDevice> {
    match devices.find_input(name) {
        Some(device) => Ok(device),
        None => bail!("audio input '{name}' not found"),
    }
}

/// Resolve the device a volume/mute operation targets: the named device,
/// else the current default output.
fn volume_target<'a>(devices: &'a DeviceSet, name: Option<&str>) -> Result<&'a DetectedDevice> {
    match name {
        Some(name) => find_output(devices, name),
        None => match devices.default_output() {
            Some(device) => Ok(device),
            None => bail!("no default audio output detected"),
        },
    }
}
