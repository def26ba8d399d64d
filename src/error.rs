//! Domain-specific error types for the switcher.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors (e.g., [`ConfigError`],
//! [`ProfileError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! AvSwitchError
//! ├── Config(ConfigError)       — config.json parsing and I/O
//! ├── Detection(DetectionError) — external enumeration tools
//! ├── Profile(ProfileError)     — saved profile files
//! └── Apply(ApplyError)         — macro/profile application
//! ```

use thiserror::Error;

/// Top-level error type for the switcher.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum AvSwitchError {
    /// Configuration-related error (parsing, I/O).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Device detection error (tool missing, command failed).
    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    /// Profile store error (missing profile, parsing, I/O).
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Apply error (unknown target, external command failure).
    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),
}

/// Errors that arise from loading and saving `config.json`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading or writing a config file.
    #[error("IO error on config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read or written.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file contains invalid JSON or an invalid shape.
    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        /// Path to the file that could not be parsed.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A deep-merged update no longer deserializes as a configuration.
    #[error("Invalid configuration update: {0}")]
    InvalidUpdate(serde_json::Error),
}

/// Errors that arise from external device enumeration.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// A required enumeration tool is not present on PATH.
    #[error("Required tool '{0}' not found on PATH")]
    ToolMissing(String),

    /// An enumeration tool exited non-zero.
    #[error("{tool} failed: {detail}")]
    CommandFailed {
        /// Name of the tool that failed.
        tool: String,
        /// Trimmed stderr or a spawn-failure description.
        detail: String,
    },
}

/// Errors that arise from the profile store.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// No profile file exists for the given name.
    #[error("Profile not found: {0}")]
    NotFound(String),

    /// An I/O error occurred while reading, writing or deleting a profile.
    #[error("IO error on profile {path}: {source}")]
    Io {
        /// Path to the profile file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The profile file contains invalid JSON.
    #[error("Invalid JSON in profile {path}: {source}")]
    Parse {
        /// Path to the profile file.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Errors that arise while applying a macro or profile.
#[derive(Error, Debug)]
pub enum ApplyError {
    /// The requested name matches neither a macro nor a saved profile.
    #[error("'{name}' is neither a macro nor a profile (available: {available})")]
    UnknownTarget {
        /// The requested target name.
        name: String,
        /// Comma-separated list of known macros and profiles.
        available: String,
    },

    /// An external command exited non-zero.
    #[error("{command} failed: {detail}")]
    CommandFailed {
        /// The full command line that failed.
        command: String,
        /// Trimmed stderr or a spawn-failure description.
        detail: String,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn config_error_io_display() {
        let e = ConfigError::Io {
            path: "/home/u/.config/avswitch/config.json".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.to_string().contains("config.json"));
        assert!(e.to_string().contains("IO error"));
    }

    #[test]
    fn config_error_parse_has_source() {
        use std::error::Error as _;
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e = ConfigError::Parse {
            path: "config.json".to_string(),
            source: json_err,
        };
        assert!(e.source().is_some());
    }

    #[test]
    fn detection_error_tool_missing_display() {
        let e = DetectionError::ToolMissing("xrandr".to_string());
        assert_eq!(e.to_string(), "Required tool 'xrandr' not found on PATH");
    }

    #[test]
    fn profile_error_not_found_display() {
        let e = ProfileError::NotFound("tv night".to_string());
        assert_eq!(e.to_string(), "Profile not found: tv night");
    }

    #[test]
    fn apply_error_unknown_target_display() {
        let e = ApplyError::UnknownTarget {
            name: "cinema".to_string(),
            available: "desk_mode, tv_mode".to_string(),
        };
        assert!(e.to_string().contains("cinema"));
        assert!(e.to_string().contains("desk_mode"));
    }

    #[test]
    fn aggregate_from_config_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let e: AvSwitchError = ConfigError::InvalidUpdate(json_err).into();
        assert!(e.to_string().contains("Configuration error"));
    }

    #[test]
    fn aggregate_from_apply_error() {
        let e: AvSwitchError = ApplyError::CommandFailed {
            command: "xrandr --output HDMI-1 --off".to_string(),
            detail: "exit 1".to_string(),
        }
        .into();
        assert!(e.to_string().contains("Apply error"));
    }

    #[test]
    fn errors_convert_to_anyhow() {
        let e = ProfileError::NotFound("x".to_string());
        let _any: anyhow::Error = e.into();
        let e = DetectionError::ToolMissing("pactl".to_string());
        let _any: anyhow::Error = e.into();
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<AvSwitchError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<DetectionError>();
        assert_send_sync::<ProfileError>();
        assert_send_sync::<ApplyError>();
    }
}
