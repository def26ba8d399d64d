use anyhow::Result;
use clap::Parser;

use avswitch::cli;
use avswitch::commands;
use avswitch::logging::{self, Logger};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init(args.command.name(), args.verbose);
    let log = Logger::new(args.command.name());

    match args.command {
        cli::Command::Apply(opts) => commands::apply::run(&args.global, &opts, &log),
        cli::Command::Detect(opts) => commands::detect::run(&args.global, &opts, &log),
        cli::Command::Display(opts) => commands::display::run(&args.global, &opts, &log),
        cli::Command::Audio(opts) => commands::audio::run(&args.global, &opts, &log),
        cli::Command::Config(opts) => commands::config::run(&args.global, &opts, &log),
        cli::Command::Profile(opts) => commands::profile::run(&args.global, &opts, &log),
    }
}
