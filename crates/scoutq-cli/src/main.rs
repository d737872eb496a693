//! scoutq command-line interface.
//!
//! Loads items into a local store and runs index-aware searches against it.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scoutq_core::config::{DEFAULT_LIMIT, MAX_LIMIT};
use scoutq_core::store::DEFAULT_TABLE;
use scoutq_core::{Cursor, Pagination, SearchConfig, SearchFilters, StoreConfig};

use commands::Session;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// scoutq - search athlete profiles in a wide-column store
#[derive(Parser, Debug)]
#[command(name = "scoutq")]
#[command(version, about = "Load and search athlete profiles in a local scoutq store")]
pub struct Args {
    /// Path to the database directory.
    #[arg(short, long, default_value = "./scoutq_data")]
    pub data_path: PathBuf,

    /// Table name.
    #[arg(short, long, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Page size when a search gives none.
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub default_limit: usize,

    /// Largest accepted page size.
    #[arg(long, default_value_t = MAX_LIMIT)]
    pub max_limit: usize,

    /// Print search metrics in Prometheus format after the command.
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Convert command-line arguments to store and search configuration.
    pub fn into_config(self) -> (StoreConfig, SearchConfig, Command, bool) {
        let store = StoreConfig::new(self.data_path).with_table(self.table);
        let search = SearchConfig::new()
            .with_default_limit(self.default_limit)
            .with_max_limit(self.max_limit);
        (store, search, self.command, self.metrics)
    }
}

/// Filter flags shared by `search` and `explain`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Exact category.
    #[arg(long)]
    pub category: Option<String>,

    /// Sub-category prefix.
    #[arg(long)]
    pub sub_category: Option<String>,

    /// Exact graduation year.
    #[arg(long)]
    pub cohort: Option<i64>,

    /// Exact region.
    #[arg(long)]
    pub region: Option<String>,

    /// Minimum GPA.
    #[arg(long)]
    pub gpa_min: Option<f64>,

    /// Minimum height.
    #[arg(long)]
    pub height_min: Option<f64>,
}

impl From<FilterArgs> for SearchFilters {
    fn from(args: FilterArgs) -> Self {
        SearchFilters {
            category: args.category,
            sub_category: args.sub_category,
            cohort: args.cohort,
            region: args.region,
            gpa_min: args.gpa_min,
            height_min: args.height_min,
        }
    }
}

/// Paging flags.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// Page size.
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Cursor from a previous page.
    #[arg(short, long)]
    pub cursor: Option<String>,
}

impl From<PageArgs> for Pagination {
    fn from(args: PageArgs) -> Self {
        Pagination {
            limit: args.limit,
            cursor: args.cursor.map(Cursor::from),
        }
    }
}

/// Commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Store items from a JSON file (an object or an array); `-` reads stdin.
    Put {
        /// JSON file.
        file: PathBuf,
    },

    /// Fetch one item.
    Get {
        /// Partition key.
        pk: String,
        /// Sort key.
        sk: String,
    },

    /// Remove one item.
    Delete {
        /// Partition key.
        pk: String,
        /// Sort key.
        sk: String,
    },

    /// Atomically add to a numeric attribute of an existing item.
    Incr {
        /// Partition key.
        pk: String,
        /// Sort key.
        sk: String,
        /// Attribute to increment.
        attribute: String,
        /// Amount to add.
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        by: i64,
    },

    /// Search by filters.
    Search {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Free-text search (always a full scan).
    Text {
        /// Text to look for.
        query: String,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show the strategy a search would use without reading the store.
    Explain {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scoutq=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), commands::CliError> {
    let (store_config, search_config, command, print_metrics) = args.into_config();

    tracing::debug!(
        data_path = %store_config.path.display(),
        table = %store_config.table,
        "configuration loaded"
    );

    // Planning alone never needs the store
    if let Command::Explain { filters } = command {
        let output = commands::explain(filters.into())?;
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let session = Session::open(store_config, search_config)?;
    let output = session.run(command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if print_metrics {
        print!("{}", session.metrics());
    }

    session.flush()
}
