use crate::network::inference::evidence::InferenceMode;
use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueEnum, builder::EnumValueParser, value_parser};
use env_logger::{Builder, Env};
use serde::Deserialize;
use std::io::Write;

/// Where the scenario's records are stored before the engine snapshots them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, ValueEnum)]
pub enum StorageType {
    /// Plain in-memory record set.
    #[serde(rename = "in-memory")]
    InMemory,

    /// SQLite graph database in a file.
    #[serde(rename = "persistent")]
    Persistent,
}

/// These options define the inputs from the user.
#[derive(Deserialize, Clone, Debug)]
pub struct CommandLineOptions {
    pub scenario_name: String,
    /// Entity name or trace name to query.
    pub query: Option<String>,
    /// Label of the query site whose probability is reported.
    pub target: Option<String>,
    /// `(entity or trace name, label)` pairs.
    pub evidence: Vec<(String, String)>,
    pub mode: InferenceMode,
    pub samples: usize,
    pub seed: Option<u64>,
    pub workers: usize,
    pub registry: Option<String>,
    pub storage_type: StorageType,
    pub db_path: Option<String>,
    pub json: bool,
}

/// Installs the `LEVEL [file:line] message` logger; `RUST_LOG` overrides the
/// `info` default.
pub fn init_logging() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let file = record.file().unwrap_or("unknown");
            let line = record.line().unwrap_or(0);
            writeln!(buf, "{} [{}:{}] {}", record.level(), file, line, record.args())
        })
        .try_init();
}

/// Splits `NAME=LABEL`.
pub fn parse_binding(raw: &str) -> Result<(String, String)> {
    let (name, label) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("evidence '{}' must look like NAME=LABEL", raw))?;
    let (name, label) = (name.trim(), label.trim());
    if name.is_empty() || label.is_empty() {
        return Err(anyhow!("evidence '{}' must look like NAME=LABEL", raw));
    }
    Ok((name.to_string(), label.to_string()))
}

pub fn command() -> Command {
    Command::new("SOCIALBAYES")
        .version("0.1")
        .about("Likelihood-weighted inference over a social network of people, posts and comments.")
        .arg(
            Arg::new("scenario_name")
                .long("scenario_name")
                .value_name("STRING")
                .help("Sets the scenario name")
                .required(true),
        )
        .arg(
            Arg::new("query")
                .long("query")
                .value_name("NAME")
                .help("Entity or trace name whose marginal is estimated"),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .value_name("LABEL")
                .help("Domain label whose probability is reported"),
        )
        .arg(
            Arg::new("evidence")
                .long("evidence")
                .value_name("NAME=LABEL")
                .help("Evidence binding; may be repeated")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_parser(EnumValueParser::<InferenceMode>::new())
                .help("How evidence is applied: 'condition' or 'intervention'")
                .default_value("condition"),
        )
        .arg(
            Arg::new("samples")
                .long("samples")
                .value_name("NUMBER")
                .value_parser(value_parser!(usize))
                .help("Number of realizations per estimate")
                .default_value("10000"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("NUMBER")
                .value_parser(value_parser!(u64))
                .help("Base seed for reproducible runs (optional)"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .value_name("NUMBER")
                .value_parser(value_parser!(usize))
                .help("Worker threads sharing the realizations")
                .default_value("1"),
        )
        .arg(
            Arg::new("registry")
                .long("registry")
                .value_name("FILE")
                .help("JSON file replacing the standard probability tables"),
        )
        .arg(
            Arg::new("storage_type")
                .long("storage_type")
                .value_parser(EnumValueParser::<StorageType>::new())
                .help("Type of record storage to use: 'in-memory' or 'persistent'")
                .default_value("in-memory"),
        )
        .arg(
            Arg::new("db_path")
                .long("db_path")
                .value_name("PATH")
                .help("Path to SQLite database file (only used with persistent storage)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the estimate as JSON")
                .action(ArgAction::SetTrue),
        )
}

pub fn options_from_matches(matches: &ArgMatches) -> Result<CommandLineOptions> {
    let scenario_name = matches
        .get_one::<String>("scenario_name")
        .context("scenario_name is required")?
        .to_string();
    let evidence = matches
        .get_many::<String>("evidence")
        .map(|values| values.map(|raw| parse_binding(raw)).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    Ok(CommandLineOptions {
        scenario_name,
        query: matches.get_one::<String>("query").cloned(),
        target: matches.get_one::<String>("target").cloned(),
        evidence,
        mode: matches
            .get_one::<InferenceMode>("mode")
            .copied()
            .unwrap_or(InferenceMode::Condition),
        samples: matches.get_one::<usize>("samples").copied().unwrap_or(10_000),
        seed: matches.get_one::<u64>("seed").copied(),
        workers: matches.get_one::<usize>("workers").copied().unwrap_or(1),
        registry: matches.get_one::<String>("registry").cloned(),
        storage_type: matches
            .get_one::<StorageType>("storage_type")
            .copied()
            .unwrap_or(StorageType::InMemory),
        db_path: matches.get_one::<String>("db_path").cloned(),
        json: matches.get_flag("json"),
    })
}

/// Initialises logging and reads the process arguments.
pub fn parse_configuration_options() -> Result<CommandLineOptions> {
    init_logging();
    options_from_matches(&command().get_matches())
}
