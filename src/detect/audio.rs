//! Audio device enumeration via `pactl` (PulseAudio) or `wpctl` (PipeWire).

use std::collections::BTreeMap;

use crate::detect::{AudioBackend, AudioDevices, DetectedDevice, DeviceKind};
use crate::error::DetectionError;
use crate::exec::Executor;

/// Result of an audio detection pass: the backend that answered plus the
/// devices it reported.
#[derive(Debug, Clone)]
pub struct AudioDetection {
    pub backend: AudioBackend,
    pub devices: AudioDevices,
}

/// Enumerate audio devices, probing PulseAudio first and falling back to
/// PipeWire.
///
/// # Errors
///
/// Returns [`DetectionError::ToolMissing`] when neither `pactl` nor `wpctl`
/// produces output. The caller degrades this to empty audio lists.
pub fn detect_audio(executor: &dyn Executor) -> Result<AudioDetection, DetectionError> {
    if executor.which("pactl")
        && let Ok(info) = executor.run_unchecked("pactl", &["info"])
        && info.success
    {
        return Ok(AudioDetection {
            backend: AudioBackend::PulseAudio,
            devices: detect_pulse(executor, &info.stdout),
        });
    }

    if executor.which("wpctl")
        && let Ok(status) = executor.run_unchecked("wpctl", &["status"])
        && status.success
    {
        let (outputs, inputs) = parse_wpctl_status(&status.stdout);
        return Ok(AudioDetection {
            backend: AudioBackend::PipeWire,
            devices: AudioDevices { outputs, inputs },
        });
    }

    Err(DetectionError::ToolMissing("pactl or wpctl".to_string()))
}

fn detect_pulse(executor: &dyn Executor, info_stdout: &str) -> AudioDevices {
    let (default_sink, default_source) = parse_pactl_defaults(info_stdout);

    let mut outputs = Vec::new();
    if let Ok(result) = executor.run_unchecked("pactl", &["list", "sinks"])
        && result.success
    {
        outputs = parse_pactl_blocks(&result.stdout, DeviceKind::AudioOutput, "Sink #");
    }
    let mut inputs = Vec::new();
    if let Ok(result) = executor.run_unchecked("pactl", &["list", "sources"])
        && result.success
    {
        inputs = parse_pactl_blocks(&result.stdout, DeviceKind::AudioInput, "Source #");
    }

    for device in &mut outputs {
        device.default = default_sink.as_deref() == Some(device.id.as_str());
    }
    for device in &mut inputs {
        device.default = default_source.as_deref() == Some(device.id.as_str());
    }

    AudioDevices { outputs, inputs }
}

/// Pull `Default Sink:` / `Default Source:` out of `pactl info` output.
fn parse_pactl_defaults(stdout: &str) -> (Option<String>, Option<String>) {
    let mut sink = None;
    let mut source = None;
    for line in stdout.lines() {
        if let Some(value) = line.strip_prefix("Default Sink:") {
            sink = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Default Source:") {
            source = Some(value.trim().to_string());
        }
    }
    (sink, source)
}

/// Parse `pactl list sinks` / `pactl list sources` block output.
///
/// Blocks open with `Sink #N` / `Source #N`; the indented fields we care
/// about are `Name:`, `Description:` and the first percentage on the
/// `Volume:` line.
fn parse_pactl_blocks(stdout: &str, kind: DeviceKind, header: &str) -> Vec<DetectedDevice> {
    let mut devices: Vec<DetectedDevice> = Vec::new();

    for line in stdout.lines() {
        if let Some(index) = line.strip_prefix(header) {
            let mut attributes = BTreeMap::new();
            attributes.insert("index".to_string(), index.trim().to_string());
            devices.push(DetectedDevice {
                id: String::new(),
                kind,
                raw_name: String::new(),
                connected: true,
                primary: false,
                default: false,
                attributes,
            });
            continue;
        }

        let Some(current) = devices.last_mut() else {
            continue;
        };
        let trimmed = line.trim();
        if let Some(name) = trimmed.strip_prefix("Name:") {
            current.id = name.trim().to_string();
        } else if let Some(description) = trimmed.strip_prefix("Description:") {
            current.raw_name = description.trim().to_string();
        } else if trimmed.starts_with("Volume:")
            && !current.attributes.contains_key("volume")
            && let Some(percent) = first_percentage(trimmed)
        {
            current
                .attributes
                .insert("volume".to_string(), percent.min(100).to_string());
        }
    }

    devices.retain(|d| !d.id.is_empty());
    devices
}

/// First `NN%` token in a line, as a number.
fn first_percentage(line: &str) -> Option<u32> {
    line.split_whitespace()
        .filter_map(|word| word.strip_suffix('%'))
        .find_map(|n| n.parse().ok())
}

/// Parse the `Audio` section of `wpctl status` output.
///
/// Rows under `Sinks:` / `Sources:` look like:
///
/// ```text
///  │  *   43. Built-in Audio Analog Stereo        [vol: 0.74]
///  │      55. HDMI Audio                          [vol: 1.00]
/// ```
///
/// `*` marks the default device; the numeric id is what `wpctl` commands
/// accept. The `Video` and `Settings` sections have their own `Sources:`
/// lists and are ignored.
fn parse_wpctl_status(stdout: &str) -> (Vec<DetectedDevice>, Vec<DetectedDevice>) {
    let mut outputs = Vec::new();
    let mut inputs = Vec::new();
    let mut in_audio = false;
    let mut section: Option<DeviceKind> = None;

    for line in stdout.lines() {
        match line.trim() {
            "Audio" => {
                in_audio = true;
                section = None;
                continue;
            }
            "Video" | "Settings" => {
                in_audio = false;
                section = None;
                continue;
            }
            _ => {}
        }
        if !in_audio {
            continue;
        }
        if line.contains("Sinks:") {
            section = Some(DeviceKind::AudioOutput);
            continue;
        }
        if line.contains("Sources:") {
            section = Some(DeviceKind::AudioInput);
            continue;
        }
        if line.contains("Devices:") || line.contains("Filters:") || line.contains("Streams:") {
            section = None;
            continue;
        }
        let Some(kind) = section else {
            continue;
        };
        let Some(device) = parse_wpctl_row(line, kind) else {
            continue;
        };
        match kind {
            DeviceKind::AudioOutput => outputs.push(device),
            DeviceKind::AudioInput => inputs.push(device),
            DeviceKind::Display => {}
        }
    }

    (outputs, inputs)
}

fn parse_wpctl_row(line: &str, kind: DeviceKind) -> Option<DetectedDevice> {
    let body = line
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '│' | '├' | '└' | '─'));
    let (is_default, body) = match body.strip_prefix('*') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, body),
    };

    let (id, rest) = body.split_once('.')?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (name, volume) = match rest.split_once("[vol:") {
        Some((name, vol)) => (
            name.trim(),
            vol.trim().trim_end_matches(']').trim().parse::<f64>().ok(),
        ),
        None => (rest.trim(), None),
    };
    if name.is_empty() {
        return None;
    }

    let mut attributes = BTreeMap::new();
    if let Some(vol) = volume {
        // Inverse of the 0-1.5 scale used when setting volume via wpctl.
        let percent = (vol / 1.5 * 100.0).round().clamp(0.0, 100.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        attributes.insert("volume".to_string(), (percent as u8).to_string());
    }

    Some(DetectedDevice {
        id: id.to_string(),
        kind,
        raw_name: name.to_string(),
        connected: true,
        primary: false,
        default: is_default,
        attributes,
    })
}
