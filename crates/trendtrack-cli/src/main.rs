use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod collect;
mod report;

/// Exit status when a collection halts on quota or retry exhaustion.
const HALTED_EXIT_CODE: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "trendtrack")]
#[command(about = "Daily YouTube keyword trend collector")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect daily snapshots for one keyword or every enabled keyword
    Collect(CollectArgs),
    /// Print stored snapshots
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Args)]
struct CollectArgs {
    /// Keyword to collect; defaults to every enabled keyword in the keywords file
    #[arg(long)]
    keyword: Option<String>,

    /// First upload date to collect (YYYY-MM-DD)
    #[arg(long, requires = "end", conflicts_with = "lookback_days")]
    start: Option<NaiveDate>,

    /// Last upload date to collect (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,

    /// Collect the N days ending yesterday
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Date stamped on the snapshots (defaults to today, UTC)
    #[arg(long)]
    collected_date: Option<NaiveDate>,

    /// Process days oldest first instead of newest first
    #[arg(long)]
    oldest_first: bool,

    /// API key to use; repeat for several. Overrides YOUTUBE_API_KEY_n
    #[arg(long = "api-key")]
    api_keys: Vec<String>,

    /// Print the plan and quota estimate, then collect into memory only
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Subcommand)]
enum ReportCommands {
    /// History of one upload date across collection dates
    Timeline {
        #[arg(long)]
        keyword: String,
        #[arg(long)]
        observed_date: NaiveDate,
    },
    /// Most recent snapshots for a keyword
    Latest {
        #[arg(long)]
        keyword: String,
        #[arg(long, default_value_t = 14, value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,
    },
    /// Totals per collection date with change against the previous one
    Summary {
        #[arg(long)]
        keyword: String,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// List recent collection runs
    Runs {
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = trendtrack_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(env = %config.env, "configuration loaded");

    match cli.command {
        Some(Commands::Collect(args)) => {
            let halted = collect::run_collect(&config, &args).await?;
            if halted {
                return Ok(ExitCode::from(HALTED_EXIT_CODE));
            }
        }
        Some(Commands::Report { command }) => {
            let pool = trendtrack_db::connect_pool_from_config(&config).await?;
            match command {
                ReportCommands::Timeline {
                    keyword,
                    observed_date,
                } => report::run_timeline(&pool, &keyword, observed_date).await?,
                ReportCommands::Latest { keyword, limit } => {
                    report::run_latest(&pool, &keyword, limit).await?;
                }
                ReportCommands::Summary { keyword } => report::run_summary(&pool, &keyword).await?,
            }
        }
        Some(Commands::Db { command }) => {
            let pool = trendtrack_db::connect_pool_from_config(&config).await?;
            match command {
                DbCommands::Ping => {
                    trendtrack_db::ping(&pool).await?;
                    println!("database connection ok");
                }
                DbCommands::Migrate => {
                    let applied = trendtrack_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
                DbCommands::Runs { limit } => report::run_collection_runs(&pool, limit).await?,
            }
        }
        None => {
            println!("trendtrack: no command given; see --help");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Mark a run failed, logging instead of propagating if that also fails.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = trendtrack_db::fail_collection_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark collection run as failed"
        );
    }
}

#[cfg(test)]
mod tests;
