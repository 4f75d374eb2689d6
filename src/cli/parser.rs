use crate::export::{ExportFormat, SyncTarget};
use crate::models::calendar_event::EventKind;
use clap::{Parser, Subcommand};

/// Command-line interface definition for untiscal
#[derive(Parser)]
#[command(
    name = "untiscal",
    version = env!("CARGO_PKG_VERSION"),
    about = "Turn a WebUntis timetable into calendar events: lessons, school-day blocks, homework and exams",
    long_about = None
)]
pub struct Cli {
    /// Override configuration file path
    #[arg(global = true, long = "config", value_name = "FILE")]
    pub config: Option<String>,

    /// Verbose diagnostics on stderr (same as RUST_LOG=debug)
    #[arg(global = true, long, short = 'v')]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Show, validate or edit the configuration
    Config {
        #[arg(long = "print", help = "Print the effective configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Validate the configuration and show window and scope")]
        check: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Editor to use with --edit")]
        editor: Option<String>,
    },

    /// Fetch the timetable, build the event set and publish it
    Sync {
        /// Read lessons from a JSON dump instead of WebUntis
        #[arg(long, value_name = "FILE")]
        input: Option<String>,

        /// Publish to a file or to a CalDAV calendar
        #[arg(long, value_enum, default_value = "file")]
        target: SyncTarget,

        #[arg(long, value_enum, default_value = "ics")]
        format: ExportFormat,

        /// Output file (defaults to `output` from the configuration)
        #[arg(long, value_name = "FILE")]
        file: Option<String>,

        /// Overwrite output file without confirmation
        #[arg(long, short = 'f')]
        force: bool,

        /// Build the event set and print a summary, write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the event set as a table
    List {
        /// Read lessons from a JSON dump instead of WebUntis
        #[arg(long, value_name = "FILE")]
        input: Option<String>,

        /// Only show events of this kind
        #[arg(long, value_enum)]
        kind: Option<EventKind>,
    },
}
