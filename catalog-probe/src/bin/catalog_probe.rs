//! catalog-probe command line
//!
//! Runs one catalog operation and prints its JSON result to stdout.
//! Logs go to stderr so the output stays machine-readable.

use anyhow::{anyhow, Context, Result};
use catalog_probe::catalog::RelationalQuery;
use catalog_probe::config::ProbeConfig;
use catalog_probe::logging::setup::{init_logging, LoggingConfig};
use catalog_probe::logging::LogConfig;
use catalog_probe::tools::{
    CatalogService, CurrentUser, Diagnostics, TenantInfo, DEFAULT_MAX_ASSETS_PER_SPACE,
    DEFAULT_MAX_SPACES, DEFAULT_PREVIEW_TOP, DEFAULT_PROFILE_TOP, DEFAULT_QUERY_TOP,
    DEFAULT_SCHEMA_TOP, DEFAULT_SEARCH_LIMIT, DEFAULT_SUMMARY_ASSETS,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Use the built-in demo catalog instead of a live tenant
    #[arg(long, global = true)]
    mock: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Enable debug logging for catalog-probe
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the spaces visible to the client
    ListSpaces,
    /// List the assets of a space
    ListAssets { space: String },
    /// Asset counts by type plus the first assets of a space
    SpaceSummary {
        space: String,
        #[arg(long, default_value_t = DEFAULT_SUMMARY_ASSETS)]
        max_assets: usize,
    },
    /// Case-insensitive search over asset ids, names and descriptions
    SearchAssets {
        query: String,
        #[arg(long)]
        space: Option<String>,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Catalog metadata of one asset
    AssetMetadata { space: String, asset: String },
    /// Column names and types of one asset
    ListColumns { space: String, asset: String },
    /// First rows of an asset
    Preview {
        space: String,
        asset: String,
        #[arg(long, default_value_t = DEFAULT_PREVIEW_TOP)]
        top: usize,
    },
    /// Filtered and projected rows of an asset
    Query {
        space: String,
        asset: String,
        /// Comma-separated column list
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        order_by: Option<String>,
        #[arg(long, default_value_t = DEFAULT_QUERY_TOP)]
        top: usize,
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },
    /// Per-column type summary over a preview sample
    DescribeSchema {
        space: String,
        asset: String,
        #[arg(long, default_value_t = DEFAULT_SCHEMA_TOP)]
        top: usize,
    },
    /// Statistical profile of one column
    ProfileColumn {
        space: String,
        asset: String,
        column: String,
        #[arg(long, default_value_t = DEFAULT_PROFILE_TOP)]
        top: usize,
    },
    /// Assets exposing a column with the given name
    FindAssetsByColumn {
        column: String,
        #[arg(long)]
        space: Option<String>,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
        #[arg(long, default_value_t = DEFAULT_MAX_SPACES)]
        max_spaces: usize,
        #[arg(long, default_value_t = DEFAULT_MAX_ASSETS_PER_SPACE)]
        max_assets_per_space: usize,
    },
    /// Connectivity checks against the catalog
    Diagnostics,
    /// Active configuration without secrets
    TenantInfo,
    /// Identity behind the configured credentials
    CurrentUser,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logging = if args.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default()
    }
    .with_json_format(args.json_logs);
    init_logging(logging).map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    let mut config = ProbeConfig::from_env().context("invalid configuration")?;
    if args.mock {
        config = config.with_mock_mode(true);
    }

    let log = if args.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    if let Err(e) = run(args.command, config, log).await {
        error!(error = %e, "Command failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, config: ProbeConfig, log: LogConfig) -> Result<()> {
    // these two must answer even when the client cannot be built
    match command {
        Command::TenantInfo => return print_json(&TenantInfo::from_config(&config)),
        Command::CurrentUser => return print_json(&CurrentUser::from_config(&config)),
        Command::Diagnostics => {
            let report = match CatalogService::from_config(config.clone()) {
                Ok(service) => service.with_log_config(log).diagnostics().await,
                Err(e) => Diagnostics::init_failure(&config, &e),
            };
            print_json(&report)?;
            if !report.ok {
                return Err(anyhow!("diagnostics reported failures"));
            }
            return Ok(());
        }
        _ => {}
    }

    let service = CatalogService::from_config(config)?.with_log_config(log);

    match command {
        Command::ListSpaces => print_json(&service.list_spaces().await?),
        Command::ListAssets { space } => print_json(&service.list_assets(&space).await?),
        Command::SpaceSummary { space, max_assets } => {
            print_json(&service.space_summary(&space, max_assets).await?)
        }
        Command::SearchAssets {
            query,
            space,
            limit,
        } => print_json(
            &service
                .search_assets(&query, space.as_deref(), limit)
                .await?,
        ),
        Command::AssetMetadata { space, asset } => {
            print_json(&service.get_asset_metadata(&space, &asset).await?)
        }
        Command::ListColumns { space, asset } => {
            print_json(&service.list_columns(&space, &asset).await?)
        }
        Command::Preview { space, asset, top } => {
            print_json(&service.preview_asset(&space, &asset, top).await?)
        }
        Command::Query {
            space,
            asset,
            select,
            filter,
            order_by,
            top,
            skip,
        } => {
            let mut query = RelationalQuery::new(top).with_skip(skip);
            if !select.is_empty() {
                query = query.with_select(select);
            }
            if let Some(filter) = filter {
                query = query.with_filter(filter);
            }
            if let Some(order_by) = order_by {
                query = query.with_order_by(order_by);
            }
            print_json(&service.query_relational(&space, &asset, query).await?)
        }
        Command::DescribeSchema { space, asset, top } => {
            print_json(&service.describe_asset_schema(&space, &asset, top).await?)
        }
        Command::ProfileColumn {
            space,
            asset,
            column,
            top,
        } => print_json(&service.profile_column(&space, &asset, &column, top).await?),
        Command::FindAssetsByColumn {
            column,
            space,
            limit,
            max_spaces,
            max_assets_per_space,
        } => print_json(
            &service
                .find_assets_by_column(
                    &column,
                    space.as_deref(),
                    limit,
                    max_spaces,
                    max_assets_per_space,
                )
                .await?,
        ),
        Command::TenantInfo | Command::CurrentUser | Command::Diagnostics => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
