//! Command-line argument parsing and processing.
//!
//! Arguments are scanned by hand into a [`CliAction`]. Help and version flags
//! win over everything else; any unknown option or malformed value turns the
//! whole invocation into [`CliAction::ShowHelpDueToError`].

/// What to show once the sky has been evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Reconciled rise/set/culmination state for every source (default)
    Now,
    /// Twilight phases of the current local day
    Twilight,
    /// Keep refreshing until interrupted or `ticks` refreshes have run
    Watch { ticks: Option<u64> },
    /// Resolved observer location and timezone
    Place,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "now" | "n" => Some(Command::Now),
            "twilight" | "t" => Some(Command::Twilight),
            "watch" | "w" => Some(Command::Watch { ticks: None }),
            "place" | "p" => Some(Command::Place),
            _ => None,
        }
    }
}

/// Options shared by every command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    pub debug_enabled: bool,
    pub json: bool,
    pub config_dir: Option<String>,
    /// Wall-clock time in the observer's timezone, or RFC 3339
    pub at: Option<String>,
    pub body: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
}

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    Run {
        command: Command,
        options: RunOptions,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or malformed arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first element is the program name and is skipped.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = RunOptions::default();
        let mut command: Option<Command> = None;
        let mut ticks: Option<u64> = None;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = args_vec[i].as_str();
            // Flags that take a value consume the next argument
            let value = args_vec.get(i + 1).cloned();

            match arg {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => options.debug_enabled = true,
                "--json" | "-j" => options.json = true,
                "--config" | "-c" | "--at" | "--body" | "--lat" | "--lon" | "--tz" | "--ticks" => {
                    let Some(value) = value else {
                        log_warning!("Missing value for {arg}");
                        unknown_arg_found = true;
                        i += 1;
                        continue;
                    };
                    if let Err(message) = apply_value(arg, &value, &mut options, &mut ticks) {
                        log_warning!("{message}");
                        unknown_arg_found = true;
                    }
                    i += 1;
                }
                _ if arg.starts_with('-') && arg.parse::<f64>().is_err() => {
                    log_warning!("Unknown option: {arg}");
                    unknown_arg_found = true;
                }
                _ => match (command, Command::from_name(arg)) {
                    (None, Some(parsed)) => command = Some(parsed),
                    (Some(_), _) => {
                        log_warning!("Unexpected argument: {arg}");
                        unknown_arg_found = true;
                    }
                    (None, None) => {
                        log_warning!("Unknown command: {arg}");
                        unknown_arg_found = true;
                    }
                },
            }
            i += 1;
        }

        let command = match (command.unwrap_or(Command::Now), ticks) {
            (Command::Watch { .. }, ticks) => Command::Watch { ticks },
            (_, Some(_)) => {
                log_warning!("--ticks only applies to the watch command");
                unknown_arg_found = true;
                Command::Now
            }
            (command, None) => command,
        };

        let action = if display_version {
            CliAction::ShowVersion
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else if display_help {
            CliAction::ShowHelp
        } else {
            CliAction::Run { command, options }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

fn apply_value(
    flag: &str,
    value: &str,
    options: &mut RunOptions,
    ticks: &mut Option<u64>,
) -> Result<(), String> {
    let number = |name: &str| {
        value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| format!("Invalid {name}: '{value}'"))
    };

    match flag {
        "--config" | "-c" => options.config_dir = Some(value.to_string()),
        "--at" => options.at = Some(value.to_string()),
        "--body" => options.body = Some(value.to_string()),
        "--tz" => options.timezone = Some(value.to_string()),
        "--lat" => options.latitude = Some(number("latitude")?),
        "--lon" => options.longitude = Some(number("longitude")?),
        "--ticks" => match value.parse::<u64>() {
            Ok(n) if n > 0 => *ticks = Some(n),
            _ => return Err(format!("Invalid tick count: '{value}'")),
        },
        _ => return Err(format!("Unknown option: {flag}")),
    }
    Ok(())
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("skyarc [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-j, --json             Print machine-readable JSON instead of logs");
    log_indented!("    --at <time>        Evaluate at \"YYYY-MM-DD HH:MM:SS\" local time or RFC 3339");
    log_indented!("    --body <sun|moon>  Body to track (overrides config)");
    log_indented!("    --lat <deg>        Observer latitude (overrides config)");
    log_indented!("    --lon <deg>        Observer longitude (overrides config)");
    log_indented!("    --tz <name>        IANA timezone (default: inferred from coordinates)");
    log_indented!("    --ticks <n>        Stop watch after n refreshes");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("now, n                 Reconciled rise, set and culminations (default)");
    log_indented!("twilight, t            Twilight phases of the current day");
    log_indented!("watch, w               Refresh continuously until interrupted");
    log_indented!("place, p               Show the resolved observer location");
    log_end!();
}
