use clap::{ArgGroup, Parser, Subcommand};

/// Top-level CLI entry point for the display/audio switcher.
#[derive(Parser, Debug)]
#[command(
    name = "avswitch",
    about = "Display and audio configuration switcher for Linux workstations",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview external commands without executing them
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Override the configuration directory
    #[arg(long, global = true)]
    pub config_dir: Option<std::path::PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a macro or saved profile
    Apply(ApplyOpts),
    /// Detect connected displays and audio devices
    Detect(DetectOpts),
    /// Manage displays
    Display(DisplayOpts),
    /// Manage audio devices
    Audio(AudioOpts),
    /// Manage configuration
    Config(ConfigOpts),
    /// Manage saved profiles
    Profile(ProfileOpts),
}

impl Command {
    /// Subcommand name, used for the per-command log file.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Apply(_) => "apply",
            Self::Detect(_) => "detect",
            Self::Display(_) => "display",
            Self::Audio(_) => "audio",
            Self::Config(_) => "config",
            Self::Profile(_) => "profile",
        }
    }
}

/// Options for the `apply` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ApplyOpts {
    /// Name of the macro (from config) or saved profile to apply
    pub name: String,
}

/// Options for the `detect` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DetectOpts {
    /// Save detection results to a file instead of printing them
    #[arg(short, long)]
    pub save: Option<std::path::PathBuf>,
}

/// Options for the `display` subcommand.
#[derive(Parser, Debug, Clone)]
#[command(group = ArgGroup::new("action").required(true).args(["list", "enable", "disable", "primary"]))]
pub struct DisplayOpts {
    /// List detected displays as JSON
    #[arg(short, long)]
    pub list: bool,

    /// Enable a display (exact name or keyword)
    #[arg(short, long, value_name = "NAME")]
    pub enable: Option<String>,

    /// Disable a display (exact name or keyword)
    #[arg(short = 'D', long, value_name = "NAME")]
    pub disable: Option<String>,

    /// Set a display as primary (exact name or keyword)
    #[arg(short, long, value_name = "NAME")]
    pub primary: Option<String>,
}

/// Options for the `audio` subcommand.
#[derive(Parser, Debug, Clone)]
#[command(group = ArgGroup::new("action").required(true).args(["list", "output", "input", "volume", "mute", "unmute"]))]
pub struct AudioOpts {
    /// List detected audio devices as JSON
    #[arg(short, long)]
    pub list: bool,

    /// Set the default output device (exact name or keyword)
    #[arg(short, long, value_name = "NAME")]
    pub output: Option<String>,

    /// Set the default input device (exact name or keyword)
    #[arg(short, long, value_name = "NAME")]
    pub input: Option<String>,

    /// Set volume as a percentage
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: Option<u8>,

    /// Mute an output device
    #[arg(long)]
    pub mute: bool,

    /// Unmute an output device
    #[arg(long)]
    pub unmute: bool,

    /// Device to apply volume/mute to (defaults to the current default output)
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,
}

/// Options for the `config` subcommand.
#[derive(Parser, Debug, Clone)]
#[command(group = ArgGroup::new("action").required(true).args(["show", "update", "reset"]))]
pub struct ConfigOpts {
    /// Show the current configuration as JSON
    #[arg(short, long)]
    pub show: bool,

    /// Deep-merge updates from a JSON file into the configuration
    #[arg(short, long, value_name = "PATH")]
    pub update: Option<std::path::PathBuf>,

    /// Reset the configuration to compiled-in defaults
    #[arg(short, long)]
    pub reset: bool,
}

/// Options for the `profile` subcommand.
#[derive(Parser, Debug, Clone)]
#[command(group = ArgGroup::new("action").required(true).args(["list", "create", "delete", "show"]))]
pub struct ProfileOpts {
    /// List saved profiles
    #[arg(short, long)]
    pub list: bool,

    /// Create a profile from the currently detected device state
    #[arg(short, long, value_name = "NAME")]
    pub create: Option<String>,

    /// Delete a saved profile
    #[arg(long, value_name = "NAME")]
    pub delete: Option<String>,

    /// Show a saved profile as JSON
    #[arg(short, long, value_name = "NAME")]
    pub show: Option<String>,

    /// Description for the new profile
    #[arg(long, requires = "create")]
    pub description: Option<String>,

    /// Display to mark as primary in the new profile
    #[arg(long, value_name = "NAME", requires = "create")]
    pub primary_display: Option<String>,

    /// Comma-separated list of additional displays to enable
    #[arg(long, value_name = "NAMES", requires = "create")]
    pub enable_displays: Option<String>,

    /// Audio output device for the new profile
    #[arg(long, value_name = "NAME", requires = "create")]
    pub audio_output: Option<String>,

    /// Audio input device for the new profile
    #[arg(long, value_name = "NAME", requires = "create")]
    pub audio_input: Option<String>,

    /// Volume level for the new profile
    #[arg(long, value_name = "N", requires = "create", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: Option<u8>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_apply() {
        let cli = Cli::parse_from(["avswitch", "apply", "tv_mode"]);
        match cli.command {
            Command::Apply(opts) => assert_eq!(opts.name, "tv_mode"),
            _ => panic!("expected apply command"),
        }
    }

    #[test]
    fn parse_apply_dry_run() {
        let cli = Cli::parse_from(["avswitch", "--dry-run", "apply", "desk_mode"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_verbose_short() {
        let cli = Cli::parse_from(["avswitch", "-v", "detect"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_detect_save() {
        let cli = Cli::parse_from(["avswitch", "detect", "--save", "out.json"]);
        match cli.command {
            Command::Detect(opts) => {
                assert_eq!(opts.save, Some(std::path::PathBuf::from("out.json")));
            }
            _ => panic!("expected detect command"),
        }
    }

    #[test]
    fn parse_display_requires_action() {
        assert!(Cli::try_parse_from(["avswitch", "display"]).is_err());
    }

    #[test]
    fn parse_display_enable() {
        let cli = Cli::parse_from(["avswitch", "display", "--enable", "HDMI-1"]);
        match cli.command {
            Command::Display(opts) => assert_eq!(opts.enable.as_deref(), Some("HDMI-1")),
            _ => panic!("expected display command"),
        }
    }

    #[test]
    fn parse_display_actions_exclusive() {
        let result = Cli::try_parse_from(["avswitch", "display", "--list", "--enable", "HDMI-1"]);
        assert!(result.is_err(), "display actions should be mutually exclusive");
    }

    #[test]
    fn parse_audio_volume_with_device() {
        let cli = Cli::parse_from(["avswitch", "audio", "--volume", "70", "--device", "hdmi"]);
        match cli.command {
            Command::Audio(opts) => {
                assert_eq!(opts.volume, Some(70));
                assert_eq!(opts.device.as_deref(), Some("hdmi"));
            }
            _ => panic!("expected audio command"),
        }
    }

    #[test]
    fn parse_audio_volume_out_of_range() {
        let result = Cli::try_parse_from(["avswitch", "audio", "--volume", "150"]);
        assert!(result.is_err(), "volume above 100 should be rejected");
    }

    #[test]
    fn parse_config_reset() {
        let cli = Cli::parse_from(["avswitch", "config", "--reset"]);
        match cli.command {
            Command::Config(opts) => assert!(opts.reset),
            _ => panic!("expected config command"),
        }
    }

    #[test]
    fn parse_profile_create_with_options() {
        let cli = Cli::parse_from([
            "avswitch",
            "profile",
            "--create",
            "Work Desk",
            "--description",
            "dual monitor",
            "--volume",
            "40",
        ]);
        match cli.command {
            Command::Profile(opts) => {
                assert_eq!(opts.create.as_deref(), Some("Work Desk"));
                assert_eq!(opts.description.as_deref(), Some("dual monitor"));
                assert_eq!(opts.volume, Some(40));
            }
            _ => panic!("expected profile command"),
        }
    }

    #[test]
    fn parse_profile_description_requires_create() {
        let result =
            Cli::try_parse_from(["avswitch", "profile", "--list", "--description", "oops"]);
        assert!(result.is_err(), "--description requires --create");
    }

    #[test]
    fn parse_config_dir_override() {
        let cli = Cli::parse_from(["avswitch", "--config-dir", "/tmp/av", "detect"]);
        assert_eq!(
            cli.global.config_dir,
            Some(std::path::PathBuf::from("/tmp/av"))
        );
    }

    #[test]
    fn command_names() {
        let cli = Cli::parse_from(["avswitch", "detect"]);
        assert_eq!(cli.command.name(), "detect");
        let cli = Cli::parse_from(["avswitch", "audio", "--list"]);
        assert_eq!(cli.command.name(), "audio");
    }
}
