//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use super::validation::{parse_sort_field, validate_config_file_path, validate_json_file_path};
use crate::listing::SortField;

/// Multi-tenant billing backend tools
#[derive(Parser, Debug)]
#[command(name = "tenant-billing")]
#[command(about = "Filter, search, sort and page billing entities from the command line")]
#[command(long_about = "
tenant-billing runs the billing use cases (authorization, validation,
translated errors and the list data processor) against entities loaded from
a JSON file, and prints the result as JSON on stdout. Logs go to stderr.

EXAMPLES:
    # First page of subscriptions, newest period first
    tenant-billing list subscription --data subs.json --sort current_period_start:desc

    # Search licenses by product, as a school workspace would see it
    tenant-billing list license --data licenses.json --search analytics --business-type education

    # Full list request from a file, next page by cursor
    tenant-billing list invoice --data invoices.json --request request.json \
        --cursor eyJ2IjoxLCJvIjoyMH0

    # One item with its neighbours and field values
    tenant-billing item workspace --data workspaces.json --id ws-1

    # Validate configuration and provider wiring
    tenant-billing --env production check
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    ///
    /// Loads this single TOML file instead of the layered configuration
    /// directory. `BILLING_*` environment variables still apply on top.
    #[arg(short, long, value_name = "FILE", value_parser = validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection (`BILLING_APP_ENV`)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Debug-level logging. Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Error-level logging only. Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a list request against entities loaded from a JSON file
    List(ListArgs),
    /// Show one entity with its position, neighbours and field values
    Item(ItemArgs),
    /// Validate configuration and resolve every configured provider
    Check {
        /// Also print the effective settings as JSON
        #[arg(long)]
        show: bool,
    },
}

/// Where the entities come from and who is asking.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Entity type
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// JSON array of entities to load before running the request
    #[arg(short, long, value_name = "FILE", value_parser = validate_json_file_path)]
    pub data: PathBuf,

    /// Acting user id
    #[arg(short, long, default_value = "admin")]
    pub user: String,

    /// Business type selecting the message catalog; defaults to
    /// `i18n.default_business_type`
    #[arg(short, long)]
    pub business_type: Option<String>,

    /// Single-line JSON output
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// JSON list request (pagination, filter, sort, search). Flags below
    /// override the matching parts.
    #[arg(short, long, value_name = "FILE", value_parser = validate_json_file_path)]
    pub request: Option<PathBuf>,

    /// 1-based page number
    #[arg(long)]
    pub page: Option<i64>,

    /// Page size, clamped to the configured maximum
    #[arg(long)]
    pub limit: Option<i64>,

    /// Opaque cursor from a previous page; takes precedence over --page
    #[arg(long)]
    pub cursor: Option<String>,

    /// Search query
    #[arg(short, long)]
    pub search: Option<String>,

    /// Fields to search, comma separated
    #[arg(long, value_delimiter = ',')]
    pub search_fields: Vec<String>,

    /// Sort key as `field[:asc|desc]`; repeat for composite sorts
    #[arg(long, value_parser = parse_sort_field)]
    pub sort: Vec<SortField>,
}

#[derive(Args, Debug, Clone)]
pub struct ItemArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Entity id
    #[arg(long)]
    pub id: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Subscription,
    License,
    Invoice,
    Balance,
    #[value(name = "payment-method", alias = "payment_method")]
    PaymentMethod,
    Workspace,
    Role,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
