//! The applier: ordered external-command sequences that realise a macro or
//! saved profile.
//!
//! Displays and audio are independent failure domains. Within each, the
//! first failing command aborts the remaining steps of that category; there
//! is no rollback, so a mid-sequence failure leaves the hardware partially
//! configured (documented limitation). Display command order is fixed:
//! disables first, then the primary display, then secondaries — relative
//! positioning requires the reference display to be configured already.

use crate::config::MacroDef;
use crate::config::profiles::Profile;
use crate::detect::{AudioBackend, DeviceSet};
use crate::exec::Executor;
use crate::logging::{Logger, StepStatus};
use crate::mapper::Mapping;

/// Per-category outcome of one apply run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub displays_ok: bool,
    pub audio_ok: bool,
}

impl ApplyReport {
    /// True when both categories completed without a failed command.
    #[must_use]
    pub fn success(&self) -> bool {
        self.displays_ok && self.audio_ok
    }
}

/// What one display entry wants, with its references already resolved to
/// physical device ids (`None` = unresolved, leave unchanged).
#[derive(Debug, Clone)]
struct DisplayIntent {
    label: String,
    device: Option<String>,
    enabled: bool,
    primary: bool,
    position: Option<String>,
    relative: Option<String>,
}

/// Desired audio state with resolved device ids.
#[derive(Debug, Clone, Default)]
struct AudioIntent {
    output_label: Option<String>,
    output: Option<String>,
    input_label: Option<String>,
    input: Option<String>,
    volume: Option<u8>,
}

/// One planned `xrandr` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DisplayStep {
    label: String,
    args: Vec<String>,
}

/// Applies macros and profiles through an injected [`Executor`].
pub struct Applier<'a> {
    executor: &'a dyn Executor,
    log: &'a Logger,
    dry_run: bool,
}

impl<'a> Applier<'a> {
    #[must_use]
    pub fn new(executor: &'a dyn Executor, log: &'a Logger, dry_run: bool) -> Self {
        Self {
            executor,
            log,
            dry_run,
        }
    }

    /// Apply a macro: resolve its roles through the keyword mapping, then
    /// drive displays and audio.
    #[must_use]
    pub fn apply_macro(
        &self,
        def: &MacroDef,
        mapping: &Mapping,
        devices: &DeviceSet,
    ) -> ApplyReport {
        let intents: Vec<DisplayIntent> = def
            .displays
            .iter()
            .map(|(role, directive)| DisplayIntent {
                label: role.clone(),
                device: mapping.display(role).map(str::to_string),
                enabled: directive.enabled,
                primary: directive.primary.unwrap_or(false),
                position: directive.position.clone(),
                relative: directive
                    .relative_to
                    .as_deref()
                    .and_then(|r| mapping.display(r))
                    .map(str::to_string),
            })
            .collect();

        let audio = AudioIntent {
            output: def
                .audio
                .output
                .as_deref()
                .and_then(|r| mapping.output(r))
                .map(str::to_string),
            output_label: def.audio.output.clone(),
            input: def
                .audio
                .input
                .as_deref()
                .and_then(|r| mapping.input(r))
                .map(str::to_string),
            input_label: def.audio.input.clone(),
            volume: def.audio.volume,
        };

        self.apply_intents(&intents, &audio, devices)
    }

    /// Apply a saved profile: its entries already hold physical names, so
    /// they are matched directly against the detected devices (exact name
    /// first, keyword fallback for devices that re-enumerated).
    #[must_use]
    pub fn apply_profile(&self, profile: &Profile, devices: &DeviceSet) -> ApplyReport {
        let intents: Vec<DisplayIntent> = profile
            .displays
            .iter()
            .map(|(name, directive)| DisplayIntent {
                label: name.clone(),
                device: devices.find_display(name).map(|d| d.id.clone()),
                enabled: directive.enabled,
                primary: directive.primary,
                position: directive.position.clone(),
                relative: directive
                    .relative_to
                    .as_deref()
                    .and_then(|r| devices.find_display(r))
                    .map(|d| d.id.clone()),
            })
            .collect();

        let audio = AudioIntent {
            output: profile
                .audio
                .output
                .as_deref()
                .and_then(|n| devices.find_output(n))
                .map(|d| d.id.clone()),
            output_label: profile.audio.output.clone(),
            input: profile
                .audio
                .input
                .as_deref()
                .and_then(|n| devices.find_input(n))
                .map(|d| d.id.clone()),
            input_label: profile.audio.input.clone(),
            volume: profile.audio.volume,
        };

        self.apply_intents(&intents, &audio, devices)
    }

    fn apply_intents(
        &self,
        intents: &[DisplayIntent],
        audio: &AudioIntent,
        devices: &DeviceSet,
    ) -> ApplyReport {
        let displays_ok = self.apply_displays(intents);
        let audio_ok = self.apply_audio(audio, devices);
        ApplyReport {
            displays_ok,
            audio_ok,
        }
    }

    fn apply_displays(&self, intents: &[DisplayIntent]) -> bool {
        if intents.is_empty() {
            return true;
        }
        self.log.stage("Configuring displays");

        let steps = plan_display_steps(intents, |intent| {
            self.log.record_step(
                &format!("display '{}'", intent.label),
                StepStatus::Skipped,
                Some("role unmapped, leaving unchanged"),
            );
        });

        for step in &steps {
            let args: Vec<&str> = step.args.iter().map(String::as_str).collect();
            if !self.run_step(&step.label, "xrandr", &args) {
                self.log
                    .error("aborting remaining display steps for this run");
                return false;
            }
        }
        true
    }

    fn apply_audio(&self, audio: &AudioIntent, devices: &DeviceSet) -> bool {
        if audio.output_label.is_none() && audio.input_label.is_none() {
            return true;
        }
        self.log.stage("Configuring audio");

        if devices.backend == AudioBackend::Unavailable {
            for label in [&audio.output_label, &audio.input_label]
                .into_iter()
                .flatten()
            {
                self.log.record_step(
                    &format!("audio '{label}'"),
                    StepStatus::Skipped,
                    Some("no audio system detected"),
                );
            }
            return true;
        }

        if let Some(output) = &audio.output {
            if !self.set_default_output(devices.backend, output) {
                self.log.error("aborting remaining audio steps for this run");
                return false;
            }
        } else if let Some(label) = &audio.output_label {
            self.log.record_step(
                &format!("audio output '{label}'"),
                StepStatus::Skipped,
                Some("no matching device"),
            );
        }

        if let Some(input) = &audio.input {
            if !self.set_default_input(devices.backend, input) {
                self.log.error("aborting remaining audio steps for this run");
                return false;
            }
        } else if let Some(label) = &audio.input_label {
            self.log.record_step(
                &format!("audio input '{label}'"),
                StepStatus::Skipped,
                Some("no matching device"),
            );
        }

        if let (Some(volume), Some(output)) = (audio.volume, &audio.output)
            && !self.set_volume(devices.backend, output, volume)
        {
            return false;
        }

        true
    }

    /// Make `device` the default output. Public so the `audio` subcommand
    /// shares the backend-specific command shapes with macro application.
    #[must_use]
    pub fn set_default_output(&self, backend: AudioBackend, device: &str) -> bool {
        let (program, args): (&str, Vec<&str>) = match backend {
            AudioBackend::PipeWire => ("wpctl", vec!["set-default", device]),
            _ => ("pactl", vec!["set-default-sink", device]),
        };
        if !self.run_step("set default output", program, &args) {
            return false;
        }
        if backend == AudioBackend::PulseAudio && !self.dry_run {
            self.move_playback_streams(device);
        }
        true
    }

    /// Make `device` the default input.
    #[must_use]
    pub fn set_default_input(&self, backend: AudioBackend, device: &str) -> bool {
        let (program, args): (&str, Vec<&str>) = match backend {
            AudioBackend::PipeWire => ("wpctl", vec!["set-default", device]),
            _ => ("pactl", vec!["set-default-source", device]),
        };
        self.run_step("set default input", program, &args)
    }

    /// Set the volume of an output device, clamped to 0-100. PipeWire takes
    /// a linear factor on a 0-1.5 scale, PulseAudio a percentage.
    #[must_use]
    pub fn set_volume(&self, backend: AudioBackend, device: &str, volume: u8) -> bool {
        let volume = volume.min(100);
        let label = format!("set volume {volume}%");
        let (program, args) = match backend {
            AudioBackend::PipeWire => (
                "wpctl",
                vec![
                    "set-volume".to_string(),
                    device.to_string(),
                    format!("{:.2}", f64::from(volume) / 100.0 * 1.5),
                ],
            ),
            _ => (
                "pactl",
                vec![
                    "set-sink-volume".to_string(),
                    device.to_string(),
                    format!("{volume}%"),
                ],
            ),
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_step(&label, program, &args)
    }

    /// Mute or unmute an output device.
    #[must_use]
    pub fn set_mute(&self, backend: AudioBackend, device: &str, mute: bool) -> bool {
        let flag = if mute { "1" } else { "0" };
        let label = if mute { "mute output" } else { "unmute output" };
        let (program, args): (&str, Vec<&str>) = match backend {
            AudioBackend::PipeWire => ("wpctl", vec!["set-mute", device, flag]),
            _ => ("pactl", vec!["set-sink-mute", device, flag]),
        };
        self.run_step(label, program, &args)
    }

    /// Move live playback streams onto the new default sink so the switch
    /// is audible immediately. Failures here are cosmetic and only logged.
    fn move_playback_streams(&self, sink: &str) {
        let Ok(result) = self
            .executor
            .run_unchecked("pactl", &["list", "short", "sink-inputs"])
        else {
            return;
        };
        if !result.success {
            return;
        }
        for line in result.stdout.lines() {
            if let Some(stream_id) = line.split_whitespace().next()
                && let Err(e) =
                    self.executor
                        .run_unchecked("pactl", &["move-sink-input", stream_id, sink])
            {
                self.log.debug(&format!("stream move failed: {e}"));
            }
        }
    }

    /// Execute (or, in dry-run mode, narrate) one external command,
    /// recording the step outcome. Returns false on failure.
    fn run_step(&self, label: &str, program: &str, args: &[&str]) -> bool {
        let command_line = format!("{program} {}", args.join(" "));

        if self.dry_run {
            self.log.dry_run(&command_line);
            self.log.record_step(label, StepStatus::DryRun, None);
            return true;
        }

        self.log.debug(&command_line);
        match self.executor.run_unchecked(program, args) {
            Ok(result) if result.success => {
                self.log.record_step(label, StepStatus::Ok, None);
                true
            }
            Ok(result) => {
                let detail = format!(
                    "{command_line} exited {}: {}",
                    result.code.unwrap_or(-1),
                    result.stderr.trim()
                );
                self.log.error(&detail);
                self.log
                    .record_step(label, StepStatus::Failed, Some(&detail));
                false
            }
            Err(e) => {
                self.log.error(&format!("{command_line}: {e}"));
                self.log
                    .record_step(label, StepStatus::Failed, Some(&e.to_string()));
                false
            }
        }
    }
}

/// Order display intents into the fixed command sequence: disables first,
/// then the primary enable, then secondary enables. Unresolved intents are
/// reported through `on_skip` and produce no step.
fn plan_display_steps(
    intents: &[DisplayIntent],
    mut on_skip: impl FnMut(&DisplayIntent),
) -> Vec<DisplayStep> {
    let mut disables = Vec::new();
    let mut primaries = Vec::new();
    let mut secondaries = Vec::new();

    for intent in intents {
        let Some(device) = &intent.device else {
            on_skip(intent);
            continue;
        };

        if !intent.enabled {
            disables.push(DisplayStep {
                label: format!("disable '{}'", intent.label),
                args: vec!["--output".to_string(), device.clone(), "--off".to_string()],
            });
        } else if intent.primary {
            primaries.push(DisplayStep {
                label: format!("enable '{}' (primary)", intent.label),
                args: vec![
                    "--output".to_string(),
                    device.clone(),
                    "--auto".to_string(),
                    "--primary".to_string(),
                ],
            });
        } else {
            let mut args = vec![
                "--output".to_string(),
                device.clone(),
                "--auto".to_string(),
            ];
            if let (Some(position), Some(relative)) = (&intent.position, &intent.relative) {
                args.push(position.clone());
                args.push(relative.clone());
            }
            secondaries.push(DisplayStep {
                label: format!("enable '{}'", intent.label),
                args,
            });
        }
    }

    let mut steps = disables;
    steps.append(&mut primaries);
    steps.append(&mut secondaries);
    steps
}
