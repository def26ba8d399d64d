//! Keyword-based resolution of logical roles to physical devices.
//!
//! Each role (`desk`, `tv`, ...) carries an ordered keyword list in the
//! configuration. Resolution walks keywords in configured order and, per
//! keyword, walks devices in detection order; the first hit wins. The same
//! configuration and device set therefore always produce the same mapping.

use std::collections::BTreeMap;

use crate::config::Configuration;
use crate::detect::{DetectedDevice, DeviceSet};

/// True if `keyword` is a case-insensitive substring of the device's id or
/// raw name.
#[must_use]
pub fn matches_keyword(device: &DetectedDevice, keyword: &str) -> bool {
    let keyword = keyword.to_lowercase();
    device.id.to_lowercase().contains(&keyword)
        || device.raw_name.to_lowercase().contains(&keyword)
}

fn find_by_keywords<'a, I>(devices: I, keywords: &[String]) -> Option<&'a DetectedDevice>
where
    I: Iterator<Item = &'a DetectedDevice> + Clone,
{
    keywords
        .iter()
        .find_map(|keyword| devices.clone().find(|d| matches_keyword(d, keyword)))
}

/// Resolved role → device-id tables for one detection pass.
///
/// Roles whose keyword lists match no device are omitted; the applier
/// treats an omitted role as "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    displays: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
    inputs: BTreeMap<String, String>,
}

impl Mapping {
    /// Resolve every configured role against the detected devices.
    ///
    /// Display roles match connected displays only; audio roles are
    /// resolved independently against outputs and inputs (the same role
    /// name may map to one of each).
    #[must_use]
    pub fn resolve(config: &Configuration, devices: &DeviceSet) -> Self {
        let mut mapping = Self::default();

        for (role, keywords) in &config.displays.keywords {
            if let Some(device) = find_by_keywords(devices.connected_displays(), keywords) {
                mapping.displays.insert(role.clone(), device.id.clone());
            }
        }

        for (role, keywords) in &config.audio.keywords {
            if let Some(device) = find_by_keywords(devices.audio.outputs.iter(), keywords) {
                mapping.outputs.insert(role.clone(), device.id.clone());
            }
            if let Some(device) = find_by_keywords(devices.audio.inputs.iter(), keywords) {
                mapping.inputs.insert(role.clone(), device.id.clone());
            }
        }

        mapping
    }

    /// Physical display id for a role, if the role resolved.
    #[must_use]
    pub fn display(&self, role: &str) -> Option<&str> {
        self.displays.get(role).map(String::as_str)
    }

    /// Audio output id for a role, if the role resolved.
    #[must_use]
    pub fn output(&self, role: &str) -> Option<&str> {
        self.outputs.get(role).map(String::as_str)
    }

    /// Audio input id for a role, if the role resolved.
    #[must_use]
    pub fn input(&self, role: &str) -> Option<&str> {
        self.inputs.get(role).map(String::as_str)
    }

    /// All resolved display roles.
    #[must_use]
    pub fn displays(&self) -> &BTreeMap<String, String> {
        &self.displays
    }
}
