//! Main application entry point and high-level flow coordination.
//!
//! The flow of one run:
//! 1. Argument parsing and early exit for help/version
//! 2. Logging switches (`--debug`, `--json` silences the decorated log)
//! 3. Configuration loading and observer resolution (command line, config
//!    file, then the place remembered from the last run)
//! 4. Engine construction from the configured sources
//! 5. Clock selection (`--at` pins it) and command dispatch

use anyhow::{Context, Result};
use std::sync::Arc;

use skyarc::args::{self, CliAction, Command, ParsedArgs, RunOptions};
use skyarc::commands::{self, Session};
use skyarc::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use skyarc::config::{self, Config};
use skyarc::engine::{Engine, Observer};
use skyarc::events::BodyKind;
use skyarc::geo::{self, LocationOverrides};
use skyarc::logger::Log;
use skyarc::monitor::MonitorIntervals;
use skyarc::store::{FileStore, save_last_place};
use skyarc::time::source::parse_datetime_in_tz;
use skyarc::time::{FixedTimeSource, RealTimeSource, TimeSource};
use skyarc::{log_end, log_error_exit, log_indented, log_version, log_warning};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let code = match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            EXIT_SUCCESS
        }
        CliAction::ShowHelp => {
            args::display_help();
            EXIT_SUCCESS
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            EXIT_FAILURE
        }
        CliAction::Run { command, options } => {
            let json = options.json;
            match run(command, options) {
                Ok(()) => EXIT_SUCCESS,
                Err(e) if json => {
                    eprintln!("error: {e:#}");
                    EXIT_FAILURE
                }
                Err(e) => {
                    log_error_exit!("{e}");
                    for cause in e.chain().skip(1) {
                        log_indented!("caused by: {cause}");
                    }
                    log_end!();
                    EXIT_FAILURE
                }
            }
        }
    };

    std::process::exit(code);
}

fn run(command: Command, options: RunOptions) -> Result<()> {
    Log::set_debug(options.debug_enabled);
    Log::set_enabled(!options.json);

    config::set_config_dir(options.config_dir.clone())?;
    log_version!();

    let config = Config::load()?;
    if options.debug_enabled {
        config.log_config();
    }

    let body = match options.body.as_deref() {
        Some(name) => name.parse::<BodyKind>()?,
        None => config.body(),
    };

    let store = FileStore::new(FileStore::default_path()?);
    let overrides = LocationOverrides {
        latitude: options.latitude,
        longitude: options.longitude,
        timezone: options.timezone.as_deref(),
    };
    let place = geo::resolve_place(overrides, &config, &store)?;
    if let Err(e) = save_last_place(&store, &place) {
        log_warning!("Could not remember this place: {e}");
    }

    let tz = geo::parse_timezone(&place.timezone)?;
    let observer = Observer {
        coords: place.coordinates()?,
        tz,
        label: place.label.clone().unwrap_or_else(|| geo::place_label(tz)),
    };
    let engine = Engine::from_config(&config, observer, body)?;

    let clock: Arc<dyn TimeSource> = match options.at.as_deref() {
        Some(at) => {
            let start = parse_datetime_in_tz(at, tz)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid --at value '{at}'"))?;
            Arc::new(FixedTimeSource::new(start))
        }
        None => Arc::new(RealTimeSource),
    };

    let session = Session {
        engine: Arc::new(engine),
        clock,
        intervals: MonitorIntervals::from_config(&config),
        json: options.json,
    };
    commands::dispatch(command, &session)
}
