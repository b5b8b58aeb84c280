// fcheck - review before/after work-verification uploads from the terminal

mod exit_codes;
mod review;
mod util;

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use fieldcheck_config::ConfigError;
use fieldcheck_engine::ReviewError;
use fieldcheck_io::IoError;

use exit_codes::{
    config_exit_code, io_exit_code, review_exit_code, EXIT_ERROR, EXIT_EXPORT, EXIT_STORE,
    EXIT_SUCCESS, EXIT_USAGE,
};
use review::{DataArgs, ExportArgs, FilterArgs, PageArgs};

#[derive(Parser)]
#[command(name = "fcheck")]
#[command(about = "Review before/after evidence rows and record a verdict per project")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate an upload, then print what was found
    #[command(after_help = "\
Examples:
  fcheck check ward4.xlsx
  fcheck check batch.csv --json")]
    Check {
        #[command(flatten)]
        data: DataArgs,

        /// Output JSON instead of the human report
        #[arg(long)]
        json: bool,
    },

    /// List the values available for each filter column
    #[command(after_help = "\
Examples:
  fcheck options ward4.xlsx
  fcheck options ward4.xlsx --json")]
    Options {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long)]
        json: bool,
    },

    /// Show one page of rows with their current verdicts
    #[command(after_help = "\
Examples:
  fcheck page ward4.xlsx                      # resume where you left off
  fcheck page ward4.xlsx --zone North --ward 12
  fcheck page ward4.xlsx --filter 'Organisation=Roads Dept' --page 3
  fcheck page ward4.xlsx --next
  fcheck page ward4.xlsx --zone All           # clear the zone filter")]
    Page {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        paging: PageArgs,

        #[arg(long)]
        json: bool,
    },

    /// Record a verdict for one project id
    #[command(after_help = "\
Verdicts: correct, incorrect, not_reviewed, not_yet_updated (reverts).
Incorrect requires --reason; see `fcheck reasons`.

Examples:
  fcheck mark ward4.xlsx 5001 correct
  fcheck mark ward4.xlsx 5002 incorrect --reason 'After Photo-Missing'
  fcheck mark ward4.xlsx 5002 not_yet_updated")]
    Mark {
        #[command(flatten)]
        data: DataArgs,

        /// Project id of the row
        id: String,

        /// Verdict (label or snake_case name)
        verdict: String,

        /// Disapproval reason (Incorrect only)
        #[arg(long, short = 'r')]
        reason: Option<String>,
    },

    /// Count verdicts over the filtered rows
    #[command(after_help = "\
Examples:
  fcheck summary ward4.xlsx
  fcheck summary ward4.xlsx --zone North --json")]
    Summary {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long)]
        json: bool,
    },

    /// Write the reviewed sheet with green/red verdict fills
    #[command(after_help = "\
Examples:
  fcheck export ward4.xlsx
  fcheck export ward4.xlsx -o reviewed.xlsx --filtered --zone North
  fcheck export ward4.xlsx --fill verdict")]
    Export {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        export: ExportArgs,

        #[arg(long)]
        json: bool,
    },

    /// List the configured disapproval reasons
    Reasons {
        /// Review profile (TOML)
        #[arg(long, env = "FCHECK_CONFIG")]
        config: Option<std::path::PathBuf>,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  fieldcheck-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
            "\nstore_format: 1",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  fieldcheck-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
            "\nstore_format: 1",
        )
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { data, json } => review::cmd_check(data, json),
        Commands::Options { data, json } => review::cmd_options(data, json),
        Commands::Page { data, filters, paging, json } => review::cmd_page(data, filters, paging, json),
        Commands::Mark { data, id, verdict, reason } => review::cmd_mark(data, id, verdict, reason),
        Commands::Summary { data, filters, json } => review::cmd_summary(data, filters, json),
        Commands::Export { data, filters, export, json } => review::cmd_export(data, filters, export, json),
        Commands::Reasons { config } => review::cmd_reasons(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Read { .. } => None,
            _ => Some(format!(
                "fix the profile or pass --config; default location is {}",
                fieldcheck_config::ReviewProfile::default_path().display()
            )),
        };
        Self { code: config_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn review(err: ReviewError) -> Self {
        let hint = match &err {
            ReviewError::MissingReason { .. } | ReviewError::UnknownReason { .. } => {
                Some("run `fcheck reasons` to list the disapproval reasons".to_string())
            }
            ReviewError::UnknownFilterColumn(_) => {
                Some("filter columns are set by `filter_columns` in the profile".to_string())
            }
            _ => None,
        };
        Self { code: review_exit_code(&err), message: err.to_string(), hint }
    }

    /// Reading the upload.
    pub fn dataset(err: IoError) -> Self {
        match err {
            IoError::Review(e) => Self::review(e),
            other => Self { code: io_exit_code(&other), message: other.to_string(), hint: None },
        }
    }

    /// Reading or writing the verdict side file.
    pub fn store(err: IoError) -> Self {
        let hint = match &err {
            IoError::StoreVersion { .. } => Some("upgrade fcheck to read this file".to_string()),
            IoError::Store { .. } => Some("pass --store to use a different side file".to_string()),
            _ => None,
        };
        Self { code: EXIT_STORE, message: err.to_string(), hint }
    }

    /// Building or writing the export.
    pub fn export(err: IoError) -> Self {
        Self { code: EXIT_EXPORT, message: err.to_string(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
