use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cutoff::Category;
use crate::storage::UserStatus;

#[derive(Parser)]
#[command(name = "cet-select")]
#[command(about = "College cutoff explorer and rank-based college predictor")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (extension optional)
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Column filters shared by `explore` and `predict`
#[derive(clap::Args, Debug, Default)]
pub struct FilterArgs {
    /// Branch code; repeat for several branches
    #[arg(short, long = "branch")]
    pub branches: Vec<String>,

    /// College code
    #[arg(long)]
    pub college: Option<String>,

    /// Location; repeat for several locations
    #[arg(short, long = "location")]
    pub locations: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the user database and a default configuration file
    Init,

    /// Register a new (inactive) account
    Register {
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Log in and remember the session
    Login {
        username: String,

        #[arg(short, long)]
        password: String,

        /// Log in with the configured admin credentials
        #[arg(long)]
        admin: bool,
    },

    /// End the current session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Browse cutoffs by branch, college, category and location
    Explore {
        #[command(flatten)]
        filters: FilterArgs,

        /// Category code (e.g. GM, 2AG, SCR)
        #[arg(short = 'k', long, value_parser = parse_category)]
        category: Option<Category>,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Show at most this many rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Find colleges whose cutoff is within reach of a rank
    Predict {
        /// Your rank
        #[arg(allow_negative_numbers = true)]
        rank: i64,

        /// Your category code (e.g. GM, 2AG, SCR)
        #[arg(short = 'k', long, value_parser = parse_category)]
        category: Category,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Show at most this many rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// List the values accepted by the filters
    Options {
        #[arg(value_enum)]
        kind: OptionKind,
    },

    /// Tag computer-science branches in a cutoff file
    LabelCs {
        input: PathBuf,
        output: PathBuf,
    },

    /// Re-read the cutoff dataset and print a summary
    Reload,

    /// User management (admin session required)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OptionKind {
    Colleges,
    Branches,
    Locations,
    Categories,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// List registered users
    Users {
        /// all, active or inactive
        #[arg(short, long, default_value = "all")]
        status: UserStatus,
    },

    /// Activate an account after payment
    Activate { username: String },

    /// Deactivate an account
    Deactivate { username: String },

    /// Export users as CSV
    Export {
        /// active or inactive
        #[arg(short, long, default_value = "active")]
        status: UserStatus,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show user counts
    Stats,
}

fn parse_category(value: &str) -> Result<Category, String> {
    value.parse::<Category>().map_err(|e| e.to_string())
}
