use clap::{Arg, Command};
use std::path::PathBuf;

use snspd_bench::bench;
use snspd_bench::config::BenchConfig;

fn main() {
    let matches = Command::new("snspd-bench")
        .about("Run SNSPD measurements configured in a YAML file")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the configuration file"),
        )
        .get_matches();

    if let Err(e) = simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("Could not create logger: {e}");
    }

    let Some(path) = matches.get_one::<String>("path") else {
        log::error!("No configuration path given");
        return;
    };
    let config_path = PathBuf::from(path);

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        match BenchConfig::make_template_config(&config_path) {
            Ok(()) => log::info!("Done."),
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        }
        return;
    }

    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match BenchConfig::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Sample: {}", config.sample);
    log::info!("Experiment: {}", config.experiment.name());
    log::info!("Output directory: {}", config.output_dir.to_string_lossy());

    match bench::run(&config) {
        Ok(stem) => log::info!("Measurement done, data in {}.*", stem.to_string_lossy()),
        Err(e) => {
            log::error!("Measurement failed: {e}");
            std::process::exit(1);
        }
    }
}
