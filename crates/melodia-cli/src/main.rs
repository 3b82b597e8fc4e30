//! Melodia CLI - seed-deterministic melodic line generation
//!
//! This binary provides commands for generating lines, validating configs
//! and auditing many seeds of one config at once.

use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;

use melodia_cli::commands;
use melodia_cli::commands::generate::{GenerateOptions, DEFAULT_TEMPO_BPM};
use melodia_cli::commands::verify::DEFAULT_SEED_COUNT;
use melodia_cli::input::Overrides;
use melodia_cli::logger;

/// Melodia - constraint-driven melodic line generator
#[derive(Parser)]
#[command(name = "melodia")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log search decisions to stderr (-vv for every event)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides shared by every command.
#[derive(Args, Debug, Default)]
struct OverrideArgs {
    /// Seed (replaces the config's seed)
    #[arg(long)]
    seed: Option<u32>,

    /// Number of notes
    #[arg(short, long)]
    length: Option<usize>,

    /// Lowest pitch, as a MIDI number or a note name (e.g. G3)
    #[arg(long)]
    register_min: Option<String>,

    /// Highest pitch, as a MIDI number or a note name (e.g. C5)
    #[arg(long)]
    register_max: Option<String>,
}

impl From<OverrideArgs> for Overrides {
    fn from(args: OverrideArgs) -> Self {
        Overrides {
            seed: args.seed,
            length: args.length,
            register_min: args.register_min,
            register_max: args.register_max,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a melodic line
    Generate {
        /// Path to the config file (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<String>,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Write the line as a Standard MIDI File
        #[arg(short, long)]
        midi: Option<String>,

        /// MIDI tempo in beats per minute
        #[arg(long, default_value_t = DEFAULT_TEMPO_BPM)]
        tempo: f64,

        /// Print every search event
        #[arg(long)]
        trace: bool,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a config without generating
    Validate {
        /// Path to the config file (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<String>,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate consecutive seeds and check every line's invariants
    Verify {
        /// Path to the config file (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<String>,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Number of seeds to check, starting at the config's seed
        #[arg(long, default_value_t = DEFAULT_SEED_COUNT)]
        seeds: u32,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logger::init(logger::level_for(cli.verbose));

    let result = match cli.command {
        Commands::Generate {
            config,
            overrides,
            midi,
            tempo,
            trace,
            json,
        } => {
            let options = GenerateOptions {
                config_path: config,
                overrides: overrides.into(),
                midi_path: midi,
                tempo_bpm: tempo,
                trace,
            };
            commands::generate::run(&options, json)
        }
        Commands::Validate {
            config,
            overrides,
            json,
        } => commands::validate::run(config.as_deref(), &overrides.into(), json),
        Commands::Verify {
            config,
            overrides,
            seeds,
            json,
        } => commands::verify::run(config.as_deref(), &overrides.into(), seeds, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
