//! Top-level subcommand orchestration.
//!
//! Each module wires one CLI subcommand to the stores, the detector, the
//! mapper and the applier. Typed component errors are converted to
//! [`anyhow::Error`] here, at the boundary, and become the process exit
//! code.

pub mod apply;
pub mod audio;
pub mod config;
pub mod detect;
pub mod display;
pub mod profile;

use crate::cli::GlobalOpts;
use crate::config::store::ConfigStore;
use crate::error::DetectionError;
use crate::exec::Executor;
use crate::logging::Logger;

/// Resolve the configuration store from CLI options:
/// `--config-dir` wins, then `$AVSWITCH_CONFIG_DIR`, then
/// `~/.config/avswitch`.
pub(crate) fn open_store(global: &GlobalOpts) -> anyhow::Result<ConfigStore> {
    let dir = match &global.config_dir {
        Some(dir) => dir.clone(),
        None => ConfigStore::default_dir()?,
    };
    Ok(ConfigStore::new(dir))
}

/// Verify the external tools a hardware-driving command depends on.
///
/// Display work needs `xrandr`; audio work needs `pactl` or `wpctl`.
/// Listing-only paths skip this check — detection degrades gracefully on
/// its own.
pub(crate) fn check_dependencies(
    executor: &dyn Executor,
    log: &Logger,
    need_display: bool,
    need_audio: bool,
) -> anyhow::Result<()> {
    if need_display && !executor.which("xrandr") {
        log.error("required tool 'xrandr' not found (install xorg-xrandr)");
        return Err(DetectionError::ToolMissing("xrandr".to_string()).into());
    }
    if need_audio && !executor.which("pactl") && !executor.which("wpctl") {
        log.error("no supported audio system found (install pulseaudio-utils or wireplumber)");
        return Err(DetectionError::ToolMissing("pactl or wpctl".to_string()).into());
    }
    Ok(())
}
