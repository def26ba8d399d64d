//! Display and audio configuration switcher.
//!
//! Switches a Linux workstation between named display/audio configurations
//! ("macros") and saved profiles by shelling out to `xrandr` and to an audio
//! mixer (`pactl`, with `wpctl` as the PipeWire fallback), matching detected
//! hardware names against user-configured keyword lists.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]** — the JSON configuration document, its store, and the
//!   profile store
//! - **[`detect`]** — external-tool device enumeration and output parsing
//! - **[`mapper`]** — keyword-based resolution of logical roles to physical
//!   device identifiers
//! - **[`apply`]** — the ordered command sequences that realise a macro or
//!   profile
//! - **[`commands`]** — top-level subcommand orchestration

pub mod apply;
pub mod cli;
pub mod commands;
pub mod config;
pub mod detect;
pub mod error;
pub mod exec;
pub mod logging;
pub mod mapper;
