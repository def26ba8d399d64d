//! The `display` subcommand: list, enable, disable, or set primary.

use anyhow::{Result, bail};

use crate::cli::{DisplayOpts, GlobalOpts};
use crate::detect::{self, DetectedDevice, DeviceSet};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Logger;

/// Run the display command.
///
/// Names are matched against physical outputs exactly first, then by
/// case-insensitive substring, so `avswitch display --enable hdmi` works.
///
/// # Errors
///
/// Returns an error if `xrandr` is missing, the named display is not
/// connected, or the xrandr invocation fails.
pub fn run(global: &GlobalOpts, opts: &DisplayOpts, log: &Logger) -> Result<()> {
    let store = super::open_store(global)?;
    let executor = SystemExecutor;

    if opts.list {
        let devices = detect::detect_and_cache(&executor, &store);
        println!("{}", serde_json::to_string_pretty(&devices.displays)?);
        return Ok(());
    }

    super::check_dependencies(&executor, log, true, false)?;
    let devices = detect::detect_and_cache(&executor, &store);

    if let Some(name) = &opts.enable {
        let device = find(&devices, name)?;
        enable(&executor, log, &devices, device, global.dry_run)?;
        log.info(&format!("enabled {}", device.id));
    } else if let Some(name) = &opts.disable {
        let device = find(&devices, name)?;
        run_xrandr(
            &executor,
            log,
            &["--output", &device.id, "--off"],
            global.dry_run,
        )?;
        log.info(&format!("disabled {}", device.id));
    } else if let Some(name) = &opts.primary {
        let device = find(&devices, name)?;
        run_xrandr(
            &executor,
            log,
            &["--output", &device.id, "--primary"],
            global.dry_run,
        )?;
        log.info(&format!("{} is now primary", device.id));
    }

    Ok(())
}

fn find<'a>(devices: &'a DeviceSet, name: &str) -> Result<&'a DetectedDevice> {
    match devices.find_display(name) {
        Some(device) => Ok(device),
        None => bail!("display '{name}' not found among connected outputs"),
    }
}

/// Enable an output. When other displays are already connected the new one
/// is placed to the right of the first of them, so it does not end up
/// cloned over an existing desktop.
fn enable(
    executor: &dyn Executor,
    log: &Logger,
    devices: &DeviceSet,
    device: &DetectedDevice,
    dry_run: bool,
) -> Result<()> {
    let mut args = vec!["--output", device.id.as_str(), "--auto"];
    let reference = devices
        .connected_displays()
        .find(|d| d.id != device.id)
        .map(|d| d.id.clone());
    if let Some(reference) = &reference {
        args.push("--right-of");
        args.push(reference.as_str());
    }
    run_xrandr(executor, log, &args, dry_run)
}

fn run_xrandr(executor: &dyn Executor, log: &Logger, args: &[&str], dry_run: bool) -> Result<()> {
    let command_line = format!("xrandr {}", args.join(" "));
    if dry_run {
        log.dry_run(&command_line);
        return Ok(());
    }
    log.debug(&command_line);
    executor.run("xrandr", args)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::detect::test_fixtures::display_device;
    use crate::detect::{AudioBackend, AudioDevices};
    use crate::exec::test_support::RecordingExecutor;
    use crate::logging::Logger;

    fn devices() -> DeviceSet {
        DeviceSet {
            displays: vec![
                display_device("DP-1", true, true),
                display_device("HDMI-A-1", true, false),
            ],
            audio: AudioDevices::default(),
            backend: AudioBackend::Unavailable,
        }
    }

    fn test_logger(tmp: &tempfile::TempDir) -> Logger {
        Logger::with_log_file(tmp.path().join("test.log"))
    }

    #[test]
    fn find_rejects_unknown_display() {
        let set = devices();
        assert!(find(&set, "DVI-0").is_err());
    }

    #[test]
    fn enable_positions_relative_to_existing_display() {
        let tmp = tempfile::tempdir().unwrap();
        let log = test_logger(&tmp);
        let exec = RecordingExecutor::new();
        let set = devices();
        let device = set.find_display("HDMI-A-1").unwrap();

        enable(&exec, &log, &set, device, false).unwrap();

        assert_eq!(
            exec.recorded(),
            vec!["xrandr --output HDMI-A-1 --auto --right-of DP-1"]
        );
    }

    #[test]
    fn enable_sole_display_has_no_position() {
        let tmp = tempfile::tempdir().unwrap();
        let log = test_logger(&tmp);
        let exec = RecordingExecutor::new();
        let set = DeviceSet {
            displays: vec![display_device("DP-1", true, true)],
            audio: AudioDevices::default(),
            backend: AudioBackend::Unavailable,
        };
        let device = set.find_display("DP-1").unwrap();

        enable(&exec, &log, &set, device, false).unwrap();

        assert_eq!(exec.recorded(), vec!["xrandr --output DP-1 --auto"]);
    }

    #[test]
    fn dry_run_issues_no_commands() {
        let tmp = tempfile::tempdir().unwrap();
        let log = test_logger(&tmp);
        let exec = RecordingExecutor::new();
        let set = devices();
        let device = set.find_display("DP-1").unwrap();

        enable(&exec, &log, &set, device, true).unwrap();

        assert!(exec.recorded().is_empty());
    }
}
