//! Device detection: external-tool enumeration parsed into a normalized
//! device list.
//!
//! Displays come from `xrandr --query`; audio devices from `pactl` (with
//! `wpctl` as the PipeWire fallback). Detection is tolerant by design: a
//! missing or failing tool empties the corresponding category instead of
//! failing the whole call. Every successful detection overwrites the
//! advisory `devices_cache.json`.

pub mod audio;
pub mod display;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::store::ConfigStore;
use crate::exec::Executor;
use crate::mapper;

/// What kind of hardware a detected device is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// A display output (xrandr).
    #[serde(rename = "display")]
    Display,
    /// An audio sink.
    #[serde(rename = "audio-output")]
    AudioOutput,
    /// An audio source.
    #[serde(rename = "audio-input")]
    AudioInput,
}

/// A single detected device.
///
/// Ephemeral: produced fresh on every detection call and persisted only to
/// the advisory cache. `id` is the identifier external commands accept
/// (xrandr output name, PulseAudio sink/source name, wpctl numeric id);
/// `raw_name` is the human-readable name keyword matching also runs
/// against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedDevice {
    pub id: String,
    pub kind: DeviceKind,
    pub raw_name: String,
    /// Whether the device is currently connected. Disconnected displays are
    /// recorded with this flag cleared; audio devices are always connected.
    #[serde(default)]
    pub connected: bool,
    /// Display only: parsed from the xrandr `primary` marker.
    #[serde(default)]
    pub primary: bool,
    /// Audio only: whether this is the current default sink/source.
    #[serde(default)]
    pub default: bool,
    /// Free-form extras: current resolution, mixer index, volume percent.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl DetectedDevice {
    /// The device's current volume percentage, when detection could parse
    /// one.
    #[must_use]
    pub fn volume_percent(&self) -> Option<u8> {
        self.attributes.get("volume").and_then(|v| v.parse().ok())
    }
}

/// Which audio system produced the audio half of a [`DeviceSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioBackend {
    #[serde(rename = "pulseaudio")]
    PulseAudio,
    #[serde(rename = "pipewire")]
    PipeWire,
    /// No working audio tool was found; audio lists are empty.
    #[serde(rename = "unavailable")]
    Unavailable,
}

/// Detected audio devices, split by direction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioDevices {
    pub outputs: Vec<DetectedDevice>,
    pub inputs: Vec<DetectedDevice>,
}

/// The complete result of one detection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSet {
    pub displays: Vec<DetectedDevice>,
    pub audio: AudioDevices,
    pub backend: AudioBackend,
}

impl DeviceSet {
    /// Connected displays, in detection order.
    pub fn connected_displays(&self) -> impl Iterator<Item = &DetectedDevice> + Clone {
        self.displays.iter().filter(|d| d.connected)
    }

    /// The currently-primary connected display, if any.
    #[must_use]
    pub fn primary_display(&self) -> Option<&DetectedDevice> {
        self.connected_displays().find(|d| d.primary)
    }

    /// Find a connected display by exact name, falling back to a
    /// case-insensitive keyword match.
    #[must_use]
    pub fn find_display(&self, name: &str) -> Option<&DetectedDevice> {
        self.connected_displays()
            .find(|d| d.id == name)
            .or_else(|| self.connected_displays().find(|d| mapper::matches_keyword(d, name)))
    }

    /// Find an audio output by exact id, falling back to a keyword match.
    #[must_use]
    pub fn find_output(&self, name: &str) -> Option<&DetectedDevice> {
        find_audio(&self.audio.outputs, name)
    }

    /// Find an audio input by exact id, falling back to a keyword match.
    #[must_use]
    pub fn find_input(&self, name: &str) -> Option<&DetectedDevice> {
        find_audio(&self.audio.inputs, name)
    }

    /// The current default audio output, if one was detected.
    #[must_use]
    pub fn default_output(&self) -> Option<&DetectedDevice> {
        self.audio.outputs.iter().find(|d| d.default)
    }

    /// The current default audio input, if one was detected.
    #[must_use]
    pub fn default_input(&self) -> Option<&DetectedDevice> {
        self.audio.inputs.iter().find(|d| d.default)
    }
}

fn find_audio<'a>(devices: &'a [DetectedDevice], name: &str) -> Option<&'a DetectedDevice> {
    devices
        .iter()
        .find(|d| d.id == name)
        .or_else(|| devices.iter().find(|d| mapper::matches_keyword(d, name)))
}

/// Enumerate all devices.
///
/// Failures are degraded per category: a broken display tool yields an
/// empty display list, a broken audio stack yields empty audio lists and
/// [`AudioBackend::Unavailable`]. Never fails as a whole.
#[must_use]
pub fn detect(executor: &dyn Executor) -> DeviceSet {
    let displays = match display::detect_displays(executor) {
        Ok(displays) => displays,
        Err(e) => {
            tracing::warn!("display detection failed: {e}");
            Vec::new()
        }
    };

    let (backend, audio) = match audio::detect_audio(executor) {
        Ok(detection) => (detection.backend, detection.devices),
        Err(e) => {
            tracing::warn!("audio detection failed: {e}");
            (AudioBackend::Unavailable, AudioDevices::default())
        }
    };

    DeviceSet {
        displays,
        audio,
        backend,
    }
}

/// Enumerate all devices and overwrite the advisory cache.
///
/// Cache write failures are logged at debug level and ignored — the cache
/// is never authoritative.
#[must_use]
pub fn detect_and_cache(executor: &dyn Executor, store: &ConfigStore) -> DeviceSet {
    let devices = detect(executor);
    if let Err(e) = store.save_device_cache(&devices) {
        tracing::debug!("device cache not updated: {e}");
    }
    devices
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::test_fixtures::{display_device, output_device};
    use super::*;
    use crate::exec::test_support::ScriptedExecutor;

    fn sample_set() -> DeviceSet {
        DeviceSet {
            displays: vec![
                display_device("DP-1", true, true),
                display_device("HDMI-A-1", true, false),
                display_device("DP-2", false, false),
            ],
            audio: AudioDevices {
                outputs: vec![
                    output_device("alsa_output.pci.analog-stereo", "Built-in Audio", true),
                    output_device("alsa_output.pci.hdmi-stereo", "HDMI Audio", false),
                ],
                inputs: vec![],
            },
            backend: AudioBackend::PulseAudio,
        }
    }

    #[test]
    fn connected_displays_filters_disconnected() {
        let set = sample_set();
        let names: Vec<&str> = set.connected_displays().map(|d| d.id.as_str()).collect();
        assert_eq!(names, vec!["DP-1", "HDMI-A-1"]);
    }

    #[test]
    fn primary_display_found() {
        let set = sample_set();
        assert_eq!(set.primary_display().unwrap().id, "DP-1");
    }

    #[test]
    fn find_display_prefers_exact_match() {
        let set = sample_set();
        assert_eq!(set.find_display("DP-1").unwrap().id, "DP-1");
    }

    #[test]
    fn find_display_falls_back_to_keyword() {
        let set = sample_set();
        assert_eq!(set.find_display("hdmi").unwrap().id, "HDMI-A-1");
    }

    #[test]
    fn find_display_ignores_disconnected() {
        let set = sample_set();
        assert!(set.find_display("DP-2").is_none());
    }

    #[test]
    fn find_output_matches_description_keyword() {
        let set = sample_set();
        assert_eq!(
            set.find_output("built-in").unwrap().id,
            "alsa_output.pci.analog-stereo"
        );
    }

    #[test]
    fn default_output_found() {
        let set = sample_set();
        assert_eq!(
            set.default_output().unwrap().id,
            "alsa_output.pci.analog-stereo"
        );
    }

    #[test]
    fn detect_degrades_to_empty_on_missing_tools() {
        let exec = ScriptedExecutor::new();
        let set = detect(&exec);
        assert!(set.displays.is_empty());
        assert!(set.audio.outputs.is_empty());
        assert_eq!(set.backend, AudioBackend::Unavailable);
    }

    #[test]
    fn detect_and_cache_writes_cache_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(tmp.path().join("avswitch"));
        let exec = ScriptedExecutor::new();
        let _ = detect_and_cache(&exec, &store);
        assert!(store.cache_path().exists());
    }

    #[test]
    fn device_set_serde_roundtrip() {
        let set = sample_set();
        let json = serde_json::to_string_pretty(&set).unwrap();
        let reparsed: DeviceSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, reparsed);
    }

    #[test]
    fn volume_percent_parses_attribute() {
        let mut device = output_device("x", "X", false);
        device
            .attributes
            .insert("volume".to_string(), "70".to_string());
        assert_eq!(device.volume_percent(), Some(70));
        let device = output_device("y", "Y", false);
        assert_eq!(device.volume_percent(), None);
    }
}
