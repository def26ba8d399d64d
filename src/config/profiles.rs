//! Saved profiles: fully-resolved display/audio snapshots on disk.
//!
//! A profile mirrors the macro shape but addresses physical devices
//! directly, so applying one skips keyword resolution. Files live under
//! `<config dir>/profiles/<name>.json`; the filesystem is the sole owner —
//! there is no long-lived in-memory instance.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detect::DeviceSet;
use crate::error::ProfileError;

/// A saved, fully-resolved configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub description: String,
    /// Physical output name -> desired state.
    pub displays: BTreeMap<String, ProfileDisplay>,
    pub audio: ProfileAudio,
}

/// Desired state for one physical display in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDisplay {
    pub enabled: bool,
    pub primary: bool,
    /// xrandr position flag, carried over when the profile was edited by
    /// hand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Physical output name the position is relative to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_to: Option<String>,
}

/// Desired audio state in a profile. Device fields hold physical ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileAudio {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
}

/// Summary of a stored profile, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileInfo {
    /// Name derived from the file name.
    pub name: String,
    /// Name stored inside the profile, when present.
    pub display_name: String,
    pub description: String,
    pub path: PathBuf,
}

/// Handle to the profiles directory.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    /// Create a store under `<config_dir>/profiles`. The directory is
    /// created lazily on first write.
    #[must_use]
    pub fn new(config_dir: &Path) -> Self {
        Self {
            dir: config_dir.join("profiles"),
        }
    }

    /// The profiles directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a profile name: lower-cased, spaces replaced by
    /// underscores, `.json` suffix.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", name.to_lowercase().replace(' ', "_")))
    }

    /// List all stored profiles. Unreadable entries are logged and skipped.
    #[must_use]
    pub fn list(&self) -> Vec<ProfileInfo> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut profiles = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().replace('_', " "))
                .unwrap_or_default();
            match read_profile(&path) {
                Ok(profile) => profiles.push(ProfileInfo {
                    display_name: if profile.name.is_empty() {
                        stem.clone()
                    } else {
                        profile.name
                    },
                    name: stem,
                    description: profile.description,
                    path,
                }),
                Err(e) => tracing::warn!("skipping unreadable profile: {e}"),
            }
        }
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        profiles
    }

    /// Load a profile by name.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] when no file exists for the name,
    /// or an I/O/parse error for an unreadable file.
    pub fn get(&self, name: &str) -> Result<Profile, ProfileError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(ProfileError::NotFound(name.to_string()));
        }
        read_profile(&path)
    }

    /// Create or overwrite a profile. Name collisions silently overwrite.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the profiles directory cannot be created or
    /// the file cannot be written.
    pub fn create(&self, name: &str, profile: &Profile) -> Result<(), ProfileError> {
        let path = self.path_for(name);
        let mut stored = profile.clone();
        stored.name = name.to_string();

        let io_err = |source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let json = serde_json::to_string_pretty(&stored).map_err(|source| ProfileError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(&path, format!("{json}\n")).map_err(io_err)?;
        tracing::debug!("profile '{name}' saved to {}", path.display());
        Ok(())
    }

    /// Delete a profile by name.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] when the profile does not exist —
    /// a reportable failure, never a panic.
    pub fn delete(&self, name: &str) -> Result<(), ProfileError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(ProfileError::NotFound(name.to_string()));
        }
        fs::remove_file(&path).map_err(|source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Derive a profile from the currently detected devices.
    ///
    /// The currently-primary display (or the first connected display when
    /// none is marked primary) is enabled and primary; every other
    /// connected display is enabled; the current default sink and source
    /// become the audio output/input, at the output's current volume (50
    /// when unknown).
    #[must_use]
    pub fn build_from_detected(name: &str, description: &str, devices: &DeviceSet) -> Profile {
        let primary = devices
            .primary_display()
            .or_else(|| devices.connected_displays().next());

        let mut displays = BTreeMap::new();
        for display in devices.connected_displays() {
            let is_primary = primary.is_some_and(|p| p.id == display.id);
            displays.insert(
                display.id.clone(),
                ProfileDisplay {
                    enabled: true,
                    primary: is_primary,
                    position: None,
                    relative_to: None,
                },
            );
        }

        let output = devices.default_output();
        let audio = ProfileAudio {
            output: output.map(|d| d.id.clone()),
            input: devices.default_input().map(|d| d.id.clone()),
            volume: Some(output.and_then(|d| d.volume_percent()).unwrap_or(50)),
        };

        Profile {
            name: name.to_string(),
            description: description.to_string(),
            displays,
            audio,
        }
    }
}

fn read_profile(path: &Path) -> Result<Profile, ProfileError> {
    let content = fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ProfileError::Parse {
        path: path.display().to_string(),
        source,
    })
}
