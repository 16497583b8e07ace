use std::{num::NonZeroUsize, path::PathBuf};

use clap::{command, value_parser, Arg, ArgAction, Command};

use super::{config::Accuracy, utils::LogLevel};

pub fn cli_model() -> Command {
    command!()
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("info")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .help("Threads for the database search [default: available cores]"),
        )
        .arg(
            Arg::new("sample")
                .short('s')
                .long("sample")
                .value_parser(value_parser!(String))
                .value_name("NAME")
                .required(true)
                .help("Name of the sample"),
        )
        .arg(
            Arg::new("pod5")
                .short('p')
                .long("pod5")
                .value_parser(value_parser!(PathBuf))
                .value_name("DIR")
                .required(true)
                .help("Directory containing pod5 files"),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .value_parser(value_parser!(PathBuf))
                .value_name("DIR")
                .required(true)
                .help("Directory where output files are written"),
        )
        .arg(
            Arg::new("accuracy")
                .short('a')
                .long("accuracy")
                .value_parser(value_parser!(Accuracy))
                .ignore_case(true)
                .value_name("MODEL")
                .default_value("fast")
                .help("Basecalling accuracy (fast, hac or sup)"),
        )
        .arg(
            Arg::new("dorado")
                .long("dorado")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .default_value("dorado")
                .help("Path to the dorado executable"),
        )
        .arg(
            Arg::new("kraken_db")
                .long("kraken-db")
                .value_parser(value_parser!(PathBuf))
                .value_name("DIR")
                .default_value("dependencies/kraken2_leishmania")
                .help("Path to the kraken2 database"),
        )
        .arg(
            Arg::new("logo")
                .long("logo")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .default_value("dependencies/nuqta.jpg")
                .help("JPEG logo shown in the report header"),
        )
}
