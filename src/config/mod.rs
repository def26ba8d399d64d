//! The JSON configuration document and its persistent stores.
//!
//! [`Configuration`] is the typed shape of `config.json`: keyword mappings
//! from logical roles (`desk`, `tv`) to detection keywords, plus named macro
//! definitions. [`store::ConfigStore`] owns the file, [`profiles`] owns the
//! saved profile snapshots next to it.

pub mod profiles;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The full configuration document.
///
/// Role and macro maps are `BTreeMap`s so iteration (and therefore
/// serialization and keyword resolution) is deterministic. Unknown JSON keys
/// are tolerated on read; missing sections fall back to empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Display keyword mappings.
    pub displays: KeywordSection,
    /// Audio keyword mappings.
    pub audio: KeywordSection,
    /// Named macro definitions.
    pub macros: BTreeMap<String, MacroDef>,
}

/// Keyword lists per logical role.
///
/// Keyword order within a role is significant: resolution tries keywords in
/// configured order and the first match wins. A role with an empty list is
/// simply unmapped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSection {
    /// role -> ordered keyword list
    pub keywords: BTreeMap<String, Vec<String>>,
}

/// A named desired display/audio configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroDef {
    /// Human-readable description, shown in listings.
    pub description: String,
    /// Per-role display directives.
    pub displays: BTreeMap<String, DisplayDirective>,
    /// Audio directive.
    pub audio: AudioDirective,
}

/// Desired state for one display role.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayDirective {
    /// Whether the display should be enabled.
    pub enabled: bool,
    /// Whether the display should become primary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    /// xrandr position flag (`--right-of`, `--left-of`, `--above`,
    /// `--below`, `--same-as`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Role the position is relative to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_to: Option<String>,
}

/// Desired audio state for a macro.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioDirective {
    /// Role to make the default output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Volume percentage for the output device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
    /// Role to make the default input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

impl Configuration {
    /// The compiled-in default configuration: `desk`/`tv` keyword lists and
    /// the `desk_mode`, `tv_mode` and `dual_mode` macros.
    ///
    /// Written to disk on first run and substituted whenever the stored file
    /// is unreadable or corrupt.
    #[must_use]
    pub fn built_in() -> Self {
        let keywords = |pairs: &[(&str, &[&str])]| KeywordSection {
            keywords: pairs
                .iter()
                .map(|(role, kws)| {
                    (
                        (*role).to_string(),
                        kws.iter().map(|k| (*k).to_string()).collect(),
                    )
                })
                .collect(),
        };

        let mut macros = BTreeMap::new();
        macros.insert(
            "desk_mode".to_string(),
            MacroDef {
                description: "Desk mode (disable TV, enable desk)".to_string(),
                displays: BTreeMap::from([
                    (
                        "desk".to_string(),
                        DisplayDirective {
                            enabled: true,
                            primary: Some(true),
                            ..DisplayDirective::default()
                        },
                    ),
                    (
                        "tv".to_string(),
                        DisplayDirective {
                            enabled: false,
                            ..DisplayDirective::default()
                        },
                    ),
                ]),
                audio: AudioDirective {
                    output: Some("desk".to_string()),
                    volume: Some(50),
                    input: None,
                },
            },
        );
        macros.insert(
            "tv_mode".to_string(),
            MacroDef {
                description: "TV mode (disable desk, enable TV)".to_string(),
                displays: BTreeMap::from([
                    (
                        "desk".to_string(),
                        DisplayDirective {
                            enabled: false,
                            ..DisplayDirective::default()
                        },
                    ),
                    (
                        "tv".to_string(),
                        DisplayDirective {
                            enabled: true,
                            primary: Some(true),
                            ..DisplayDirective::default()
                        },
                    ),
                ]),
                audio: AudioDirective {
                    output: Some("tv".to_string()),
                    volume: Some(70),
                    input: None,
                },
            },
        );
        macros.insert(
            "dual_mode".to_string(),
            MacroDef {
                description: "Dual mode (enable both, desk primary)".to_string(),
                displays: BTreeMap::from([
                    (
                        "desk".to_string(),
                        DisplayDirective {
                            enabled: true,
                            primary: Some(true),
                            ..DisplayDirective::default()
                        },
                    ),
                    (
                        "tv".to_string(),
                        DisplayDirective {
                            enabled: true,
                            position: Some("--right-of".to_string()),
                            relative_to: Some("desk".to_string()),
                            ..DisplayDirective::default()
                        },
                    ),
                ]),
                audio: AudioDirective {
                    output: Some("desk".to_string()),
                    volume: Some(50),
                    input: None,
                },
            },
        );

        Self {
            displays: keywords(&[
                ("desk", &["DP", "HDMI-0", "primary"]),
                ("tv", &["HDMI-1", "HDMI-2", "living", "TV"]),
            ]),
            audio: keywords(&[
                ("desk", &["built-in", "headphone", "analog", "desk"]),
                ("tv", &["hdmi", "digital", "tv", "living"]),
            ]),
            macros,
        }
    }
}
