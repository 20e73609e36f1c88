//! Command-line interface handling for the essentials tool.
//!
//! Built on the `clap` builder API. [`CliArgs::parse`] reads the process
//! arguments; [`CliArgs::try_parse_from`] takes any argument list and is
//! what the tests use.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use plugin_essentials::{DimensionRef, Location, PlayerId, Position};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the data directory
    pub data_dir: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    pub command: CliCommand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Validate the configuration and load every enabled store
    Check,
    Warp(WarpCommand),
    Home { player: PlayerId, command: HomeCommand },
    Hub(HubCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WarpCommand {
    List,
    Add { name: String, location: Location },
    Remove { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HomeCommand {
    List,
    Add { name: String, location: Location },
    Remove { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HubCommand {
    Show,
    Set { location: Location },
    Clear,
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        let matches = command().get_matches();
        Self::from_matches(&matches)
    }

    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = command().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let command = match matches.subcommand() {
            Some(("warp", sub)) => CliCommand::Warp(match sub.subcommand() {
                Some(("add", add)) => WarpCommand::Add {
                    name: name_of(add),
                    location: location_of(add),
                },
                Some(("remove", remove)) => WarpCommand::Remove { name: name_of(remove) },
                _ => WarpCommand::List,
            }),
            Some(("home", sub)) => CliCommand::Home {
                player: required::<PlayerId>(sub, "player"),
                command: match sub.subcommand() {
                    Some(("add", add)) => HomeCommand::Add {
                        name: name_of(add),
                        location: location_of(add),
                    },
                    Some(("remove", remove)) => HomeCommand::Remove { name: name_of(remove) },
                    _ => HomeCommand::List,
                },
            },
            Some(("hub", sub)) => CliCommand::Hub(match sub.subcommand() {
                Some(("set", set)) => HubCommand::Set { location: location_of(set) },
                Some(("clear", _)) => HubCommand::Clear,
                _ => HubCommand::Show,
            }),
            _ => CliCommand::Check,
        };

        Self {
            config_path: matches
                .get_one::<PathBuf>("config")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("essentials.toml")),
            data_dir: matches.get_one::<PathBuf>("data-dir").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            command,
        }
    }
}

/// The full command tree.
pub fn command() -> Command {
    Command::new("essentials")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and edit warps, homes and the hub of an essentials data directory")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .value_parser(value_parser!(PathBuf))
                .default_value("essentials.toml")
                .global(true),
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .help("Data directory (overrides storage.data_dir)")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .global(true),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("check").about("Validate the configuration and data files"))
        .subcommand(
            Command::new("warp")
                .about("Server-wide warps")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List all warps"))
                .subcommand(with_location(
                    Command::new("add").about("Add a warp").arg(name_arg()),
                ))
                .subcommand(Command::new("remove").about("Remove a warp").arg(name_arg())),
        )
        .subcommand(
            Command::new("home")
                .about("Homes of one player")
                .subcommand_required(true)
                .arg(
                    Arg::new("player")
                        .short('p')
                        .long("player")
                        .value_name("UUID")
                        .help("Player the homes belong to")
                        .value_parser(value_parser!(PlayerId))
                        .required(true),
                )
                .subcommand(Command::new("list").about("List the player's homes"))
                .subcommand(with_location(
                    Command::new("add").about("Add a home").arg(name_arg()),
                ))
                .subcommand(Command::new("remove").about("Remove a home").arg(name_arg())),
        )
        .subcommand(
            Command::new("hub")
                .about("The server hub")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Show the hub location"))
                .subcommand(with_location(Command::new("set").about("Set the hub location")))
                .subcommand(Command::new("clear").about("Unset the hub")),
        )
}

fn name_arg() -> Arg {
    Arg::new("name").value_name("NAME").help("Location name").required(true)
}

fn with_location(command: Command) -> Command {
    let coordinate = |id: &'static str, help: &'static str| {
        Arg::new(id)
            .long(id)
            .value_name("N")
            .help(help)
            .value_parser(value_parser!(f64))
            .allow_negative_numbers(true)
    };

    command
        .arg(
            Arg::new("world")
                .short('w')
                .long("world")
                .value_name("WORLD")
                .help("World name")
                .required(true),
        )
        .arg(
            Arg::new("dimension")
                .long("dimension")
                .value_name("ID")
                .help("Dimension id within the world")
                .value_parser(value_parser!(i32))
                .allow_negative_numbers(true)
                .default_value("0"),
        )
        .arg(coordinate("x", "X coordinate").required(true))
        .arg(coordinate("y", "Y coordinate").required(true))
        .arg(coordinate("z", "Z coordinate").required(true))
        .arg(coordinate("pitch", "Pitch in degrees").default_value("0"))
        .arg(coordinate("yaw", "Yaw in degrees").default_value("0"))
}

/// Value of an argument that is required or has a default value.
fn required<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> T {
    matches
        .get_one::<T>(id)
        .cloned()
        .unwrap_or_else(|| panic!("--{id} is required or defaulted by the command definition"))
}

fn name_of(matches: &ArgMatches) -> String {
    required(matches, "name")
}

fn location_of(matches: &ArgMatches) -> Location {
    let number = |id: &str| required::<f64>(matches, id);
    Location::new(
        DimensionRef::new(required::<String>(matches, "world"), required::<i32>(matches, "dimension")),
        Position::new(number("x"), number("y"), number("z")),
        number("pitch"),
        number("yaw"),
    )
}
