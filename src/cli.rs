//! This module defines the command-line interface (CLI) structure using clap's builder pattern

use crate::materialize::MaterializeMode;
use clap::{Arg, ArgAction, ArgMatches, Command, crate_name, crate_version, value_parser};
use clap_complete::Shell;
use std::path::PathBuf;

// -------------------------------------------------------------------------------------------------
// CLI builder
// -------------------------------------------------------------------------------------------------

/// Options shared by the record commands.
fn record_command_args(cmd: Command, export_help: &'static str) -> Command {
    cmd.arg(
        Arg::new("update_only")
            .long("update-only")
            .action(ArgAction::SetTrue)
            .help("Only rewrite definitions that already exist, create nothing"),
    )
    .arg(
        Arg::new("export_file")
            .long("export-file")
            .short('e')
            .value_name("PATH")
            .value_parser(value_parser!(PathBuf))
            .help(export_help),
    )
}

/// Constructs the CLI application definition using clap's builder pattern
///
/// Defines all commands, arguments, and help documentation.
pub(crate) fn build_cli() -> Command {
    let cmd = Command::new(crate_name!())
        .version(crate_version!())
        .about("Frappe Porter - Materialize exported Frappe reports and print formats into an app")
        .subcommand_required(true)
        // --
        // * Main and global options
        .arg(
            Arg::new("config_file")
                .long("config-file")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Read configuration from this file"),
        )
        .arg(
            Arg::new("base_path")
                .long("base-path")
                .short('b')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Root of the app package the records are written to"),
        )
        .arg(
            Arg::new("default_module")
                .long("default-module")
                .global(true)
                .value_parser(value_parser!(String))
                .help("Module of records which do not declare one [default: Selling]"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Verbosity level (-v = debug, -vv = trace)"),
        )
        .arg(
            Arg::new("logs_dir")
                .long("logs-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("logs_max")
                .long("logs-max")
                .global(true)
                .value_parser(value_parser!(usize)),
        );

    // --
    // * Add subcommands

    cmd
    // --
    // * reports
       .subcommand(record_command_args(
           Command::new("reports").about("Write exported reports into the app package"),
           "Read the reports export from PATH [default: surgishop_reports_export.json]",
       ))
    // --
    // * print-formats
       .subcommand(record_command_args(
           Command::new("print-formats")
               .about("Write exported print formats into the app package"),
           "Read the print formats export from PATH [default: surgishop_print_formats_export.json]",
       ))
    // --
    // * completions
       .subcommand(
           Command::new("completions")
               .about("Generate shell completions")
               .arg(
                   Arg::new("shell")
                       .required(true)
                       .long("shell")
                       .short('s')
                       .value_parser(value_parser!(Shell))
                       .help("Set the shell for generating completions [values: bash, elvish, fish, powerShell, zsh]"),
               )
               .arg(
                   Arg::new("out")
                       .long("out")
                       .value_parser(value_parser!(PathBuf))
                       .help("Set the out directory for writing completions file"),
               ),
       )
}

// -------------------------------------------------------------------------------------------------
// CLI Commands
// -------------------------------------------------------------------------------------------------

/// Represents parsed command-line subcommands and their arguments
///
/// Produced by parsing raw CLI arguments using clap's ArgMatches structure.
#[derive(Debug, PartialEq)]
pub(crate) enum Commands {
    Reports {
        mode: MaterializeMode,
        export_file: Option<PathBuf>,
    },
    PrintFormats {
        mode: MaterializeMode,
        export_file: Option<PathBuf>,
    },
    Completions {
        shell: Shell,
        out: Option<PathBuf>,
    },
}

fn parse_mode(matches: &ArgMatches) -> MaterializeMode {
    if matches.get_flag("update_only") {
        MaterializeMode::UpdateOnly
    } else {
        MaterializeMode::Create
    }
}

impl Commands {
    /// Converts raw CLI matches into structured Commands enum
    ///
    /// Acts as bridge between clap's ArgMatches structure and application logic.
    pub(crate) fn parse_command(matches: &ArgMatches) -> Self {
        match matches.subcommand() {
            Some(("reports", reports_matches)) => Commands::Reports {
                mode: parse_mode(reports_matches),
                export_file: reports_matches.get_one::<PathBuf>("export_file").cloned(),
            },
            Some(("print-formats", pf_matches)) => Commands::PrintFormats {
                mode: parse_mode(pf_matches),
                export_file: pf_matches.get_one::<PathBuf>("export_file").cloned(),
            },
            Some(("completions", completions_matches)) => Commands::Completions {
                shell: *completions_matches
                    .get_one::<Shell>("shell")
                    .unwrap_or(&Shell::Bash),
                out: completions_matches.get_one::<PathBuf>("out").cloned(),
            },
            // Default case, should never happen with clap validation
            _ => unreachable!(),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
