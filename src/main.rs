use cigarpad::cli::{run, Cli};
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Malformed input aborts the whole run
    if let Err(e) = run(&cli) {
        log::error!("{}", e);
        std::process::exit(2);
    }
}
