use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use habitat_cli::find::{apply_overrides, run_find, FindArgs};
use habitat_cli::load_config;
use habitat_cli::validate::{run_validate, ValidateArgs};
use habitat_scoring::config::{FinderConfig, ValidationConfig};
use habitat_scoring::geo::BoundingBox;
use habitat_scoring::io::parse_grid_shape;

fn input_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("embeddings")
            .short('e')
            .long("embeddings")
            .help("Embedding grid TSV (row, col, one column per feature)")
            .required(true)
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
    )
    .arg(
        Arg::new("occurrences")
            .short('d')
            .long("occurrences")
            .help("Occurrence TSV (species, taxon_key, lon, lat)")
            .required(true)
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
    )
    .arg(
        Arg::new("output_dir")
            .short('o')
            .long("output")
            .help("Directory the outputs are written to")
            .default_value("output")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::DirPath),
    )
    .arg(
        Arg::new("shape")
            .long("shape")
            .help("Raster shape ROWSxCOLS; needed when trailing rows or columns are no-data")
            .value_parser(parse_grid_shape),
    )
    .arg(
        Arg::new("config")
            .short('c')
            .long("config")
            .help("JSON configuration file; missing fields use defaults")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
    )
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("HABITAT_LOG", "error,habitat=info"))
        .init();

    let matches = Command::new("habitat")
        .version(clap::crate_version!())
        .about("Habitat candidate search from environmental embeddings")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            input_args(
                Command::new("find")
                    .about("Score every pixel of a region for one species")
                    .arg(
                        Arg::new("species")
                            .help("Species name, e.g. \"Quercus robur\"")
                            .required(true)
                            .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                    )
                    .arg(
                        Arg::new("region")
                            .short('r')
                            .long("region")
                            .help("Predefined region name (e.g. cambridge)")
                            .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                    )
                    .arg(
                        Arg::new("bbox")
                            .short('b')
                            .long("bbox")
                            .help("Bounding box: min_lon,min_lat,max_lon,max_lat")
                            .allow_hyphen_values(true)
                            .value_parser(clap::value_parser!(BoundingBox)),
                    )
                    .arg(
                        Arg::new("method")
                            .short('m')
                            .long("method")
                            .help("Scoring method. Overrides the method in the configuration file.")
                            .value_parser(["auto", "similarity", "classifier"]),
                    )
                    .arg(
                        Arg::new("metric")
                            .long("metric")
                            .help("Similarity metric. Also used when auto falls back to similarity.")
                            .value_parser(["cosine", "euclidean"]),
                    ),
            ),
        )
        .subcommand(
            input_args(
                Command::new("validate")
                    .about("Measure AUC against the number of training positives")
                    .arg(
                        Arg::new("species")
                            .short('s')
                            .long("species")
                            .help("Species to validate (repeatable). Overrides the configuration file.")
                            .action(ArgAction::Append)
                            .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                    )
                    .arg(
                        Arg::new("region")
                            .short('r')
                            .long("region")
                            .help("Predefined region name")
                            .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                    )
                    .arg(
                        Arg::new("no_report")
                            .long("no-report")
                            .help("Disable HTML report generation.")
                            .action(ArgAction::SetTrue),
                    ),
            ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("find", sub_m)) => handle_find(sub_m),
        Some(("validate", sub_m)) => handle_validate(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn config_or_default<T>(matches: &ArgMatches) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            log::info!("[Habitat] Using config: {:?}", path);
            load_config(path)
        }
        None => Ok(T::default()),
    }
}

fn required_path(matches: &ArgMatches, id: &str) -> PathBuf {
    // clap enforces `required(true)` / `default_value` for these ids
    matches.get_one::<PathBuf>(id).cloned().unwrap_or_default()
}

fn handle_find(matches: &ArgMatches) -> Result<()> {
    let mut config: FinderConfig = config_or_default(matches)?;
    apply_overrides(
        &mut config,
        matches.get_one::<String>("method").map(String::as_str),
        matches.get_one::<String>("metric").map(String::as_str),
    )?;

    let args = FindArgs {
        species: matches.get_one::<String>("species").cloned().unwrap_or_default(),
        region: matches.get_one::<String>("region").cloned(),
        bbox: matches.get_one::<BoundingBox>("bbox").copied(),
        embeddings: required_path(matches, "embeddings"),
        occurrences: required_path(matches, "occurrences"),
        output_dir: required_path(matches, "output_dir"),
        shape: matches.get_one::<(usize, usize)>("shape").copied(),
        config,
    };

    match run_find(&args) {
        Ok((result, _)) => {
            log::info!(
                "[Habitat] {} scored with {}",
                result.species_name,
                result.method_description
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Candidate search failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_validate(matches: &ArgMatches) -> Result<()> {
    let mut config: ValidationConfig = config_or_default(matches)?;
    if let Some(species) = matches.get_many::<String>("species") {
        config.species = species.cloned().collect();
    }
    if let Some(region) = matches.get_one::<String>("region") {
        config.region = region.clone();
    }

    let args = ValidateArgs {
        embeddings: required_path(matches, "embeddings"),
        occurrences: required_path(matches, "occurrences"),
        output_dir: required_path(matches, "output_dir"),
        shape: matches.get_one::<(usize, usize)>("shape").copied(),
        config,
        report: !matches.get_flag("no_report"),
    };

    match run_validate(&args) {
        Ok(run) => {
            log::info!(
                "[Habitat] Validated {} species",
                run.experiments.len()
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Validation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
