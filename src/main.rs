use clap::ArgMatches;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use config::PorterConfigBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

mod cli;
mod cmds;
mod config;
mod errors;
mod export;
mod logs;
mod materialize;
mod record;
mod resolve;
mod stub;
#[cfg(test)]
mod tests;
mod utils;

fn main() {
    // Initialize color_eyre
    color_eyre::install().unwrap_or_else(|e| panic!("Failed to initialize color_eyre: {:?}", e));

    let cli_matches = cli::build_cli().get_matches();

    let porter_config = match init_config(&cli_matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to initialize config. Exiting");
            eprintln!("{:?}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let logger = match logs::LoggerBuilder::default()
        .with_verbosity(cli_matches.get_count("verbosity").min(2))
        .with_log_dir(&porter_config.logs_dir)
        .with_max_logs(porter_config.logs_max)
        .build()
    {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to setup logging. Exiting");
            eprintln!("{:?}", e);
            std::process::exit(1);
        }
    };
    let log_guard = match logger.start() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging. Exiting");
            eprintln!("{:?}", e);
            std::process::exit(1);
        }
    };

    debug!("Config initialized:\n{:#?}", &porter_config);

    let code = match run(porter_config, &cli_matches) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("{:?}", e);
            1
        }
    };

    // Flush the log file before exiting
    drop(log_guard);
    std::process::exit(code);
}

/// Initializes the configuration by:
///
/// 1. Loading configuration from file (if present)
/// 2. Merging CLI arguments with file configuration
/// 3. Returning the final configuration
///
/// # Errors
///
/// Returns an error if the configuration file cannot be read or parsed, or a default directory
/// cannot be determined.
fn init_config(cli: &ArgMatches) -> Result<config::PorterConfig> {
    let porter_config = PorterConfigBuilder::default()
        .with_config_file(cli.get_one::<PathBuf>("config_file").cloned())
        .with_base_path(cli.get_one::<PathBuf>("base_path").cloned())
        .with_default_module(cli.get_one::<String>("default_module").cloned())
        .with_logs_dir(cli.get_one::<PathBuf>("logs_dir").cloned())
        .with_logs_max(cli.get_one::<usize>("logs_max").copied())
        .build(cli.get_count("verbosity").min(2))?;

    Ok(porter_config)
}

#[tokio::main(flavor = "current_thread")]
async fn run(config: config::PorterConfig, arg_matches: &ArgMatches) -> Result<bool> {
    // Wrap config in an Arc as it is shared with the materializer
    let config = Arc::new(config);

    match cli::Commands::parse_command(arg_matches) {
        cli::Commands::Reports { mode, export_file } => {
            cmds::reports::reports(Arc::clone(&config), mode, export_file).await
        }
        cli::Commands::PrintFormats { mode, export_file } => {
            cmds::print_formats::print_formats(Arc::clone(&config), mode, export_file).await
        }
        cli::Commands::Completions { shell, out } => {
            let mut cmd = cli::build_cli();
            let name = cmd.get_name().to_string();
            if let Some(out) = out {
                clap_complete::generate_to(shell, &mut cmd, name, &out).wrap_err_with(|| {
                    format!(
                        "Failed to build completions for {} and write them to {}",
                        shell,
                        out.display()
                    )
                })?;
            } else {
                clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            }
            Ok(true)
        }
    }
}
