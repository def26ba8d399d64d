// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed configuration directory so each
// integration test runs against an isolated store without touching the real
// `~/.config/avswitch`.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::BTreeMap;

use avswitch::config::store::ConfigStore;
use avswitch::config::profiles::ProfileStore;
use avswitch::detect::{AudioBackend, AudioDevices, DetectedDevice, DeviceKind, DeviceSet};

/// An isolated configuration directory backed by a [`tempfile::TempDir`].
///
/// The directory is deleted when the context is dropped.
pub struct IntegrationTestContext {
    root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create a fresh, empty configuration directory.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// A config store rooted in the isolated directory.
    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(self.root.path().join("avswitch"))
    }

    /// A profile store sharing the same directory.
    pub fn profile_store(&self) -> ProfileStore {
        ProfileStore::new(&self.root.path().join("avswitch"))
    }
}

/// A display device as the detector would report it.
pub fn display(id: &str, connected: bool, primary: bool) -> DetectedDevice {
    DetectedDevice {
        id: id.to_string(),
        kind: DeviceKind::Display,
        raw_name: id.to_string(),
        connected,
        primary,
        default: false,
        attributes: BTreeMap::new(),
    }
}

/// An audio device as the detector would report it.
pub fn audio_device(id: &str, raw_name: &str, kind: DeviceKind, default: bool) -> DetectedDevice {
    DetectedDevice {
        id: id.to_string(),
        kind,
        raw_name: raw_name.to_string(),
        connected: true,
        primary: false,
        default,
        attributes: BTreeMap::new(),
    }
}

/// A device set with two connected displays and a default sink/source pair.
pub fn workstation_devices() -> DeviceSet {
    let mut analog = audio_device(
        "alsa_output.pci.analog-stereo",
        "Built-in Audio Analog Stereo",
        DeviceKind::AudioOutput,
        true,
    );
    analog
        .attributes
        .insert("volume".to_string(), "65".to_string());

    DeviceSet {
        displays: vec![
            display("DP-1", true, true),
            display("HDMI-A-1", true, false),
            display("DP-2", false, false),
        ],
        audio: AudioDevices {
            outputs: vec![
                analog,
                audio_device(
                    "alsa_output.pci.hdmi-stereo",
                    "HDMI Audio",
                    DeviceKind::AudioOutput,
                    false,
                ),
            ],
            inputs: vec![audio_device(
                "alsa_input.pci.analog-stereo",
                "Built-in Audio Microphone",
                DeviceKind::AudioInput,
                true,
            )],
        },
        backend: AudioBackend::PulseAudio,
    }
}
