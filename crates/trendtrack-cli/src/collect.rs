//! `collect` command: plan the date range per keyword, run the tracker and
//! record each keyword run in `collection_runs`.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use trendtrack_collector::{
    days_in_range, estimate_quota, lookback_range, since_range, ApiCallCounts,
    CollectorSettings, CredentialPool, TrackReport, Tracker,
};
use trendtrack_core::{load_keywords, AppConfig, KeywordsFile};
use trendtrack_db::{
    MemorySnapshotStore, NewCollectionRun, PgSnapshotStore, RunCounts, SnapshotStore,
};
use trendtrack_youtube::YoutubeClient;

use crate::{fail_run_best_effort, CollectArgs};

/// One keyword and the upload dates to collect for it, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CollectTarget {
    pub keyword: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<NaiveDate>,
}

impl CollectTarget {
    fn new(keyword: &str, start: NaiveDate, end: NaiveDate, oldest_first: bool) -> Self {
        Self {
            keyword: keyword.to_owned(),
            start,
            end,
            days: days_in_range(start, end, oldest_first),
        }
    }
}

/// Runs the `collect` command. Returns `true` when the run halted on quota or
/// retry exhaustion.
///
/// # Errors
///
/// Returns an error if no credentials or dates are available, the keywords
/// file cannot be loaded, the API client cannot be built, or the snapshot
/// store fails.
pub(crate) async fn run_collect(config: &AppConfig, args: &CollectArgs) -> anyhow::Result<bool> {
    let keys = if args.api_keys.is_empty() {
        config.youtube_api_keys.clone()
    } else {
        args.api_keys.clone()
    };
    if keys.is_empty() {
        anyhow::bail!("no API keys: set YOUTUBE_API_KEY_1 (and _2, _3, ...) or pass --api-key");
    }

    let today = Utc::now().date_naive();
    let collected_date = args.collected_date.unwrap_or(today);
    let range = explicit_range(args.start, args.end, args.lookback_days, today)?;

    let keywords = if args.keyword.is_none() || range.is_none() {
        let file = load_keywords(&config.keywords_path).with_context(|| {
            format!(
                "loading keywords file {}",
                config.keywords_path.display()
            )
        })?;
        Some(file)
    } else {
        None
    };

    let targets = plan_targets(
        args.keyword.as_deref(),
        range,
        keywords.as_ref(),
        today,
        args.oldest_first,
    )?;

    let client = YoutubeClient::from_config(config)?;
    let credentials = CredentialPool::new(keys)?;
    let settings = CollectorSettings::from_app_config(config);

    if args.dry_run {
        print_plan(&targets, collected_date, &settings);
        let store = MemorySnapshotStore::new();
        let mut tracker = Tracker::new(&client, credentials, &store, settings);
        let halted = run_targets(&mut tracker, &targets, collected_date, None).await?;
        println!("dry run kept {} snapshot row(s) in memory", store.len());
        return Ok(halted);
    }

    let pool = trendtrack_db::connect_pool_from_config(config).await?;
    let store = PgSnapshotStore::new(pool.clone());
    let mut tracker = Tracker::new(&client, credentials, &store, settings);
    run_targets(&mut tracker, &targets, collected_date, Some(&pool)).await
}

/// Resolves `--start/--end` or `--lookback-days` into a date span.
pub(crate) fn explicit_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    lookback_days: Option<u32>,
    today: NaiveDate,
) -> anyhow::Result<Option<(NaiveDate, NaiveDate)>> {
    match (start, end, lookback_days) {
        (Some(start), Some(end), _) => {
            if start > end {
                anyhow::bail!("--start {start} is after --end {end}");
            }
            Ok(Some((start, end)))
        }
        (_, _, Some(days)) => lookback_range(today, days)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("--lookback-days must be at least 1")),
        _ => Ok(None),
    }
}

/// Builds the per-keyword work list.
///
/// An explicit range applies to every keyword; otherwise each keyword runs
/// from its `since` date through yesterday.
pub(crate) fn plan_targets(
    keyword: Option<&str>,
    range: Option<(NaiveDate, NaiveDate)>,
    keywords: Option<&KeywordsFile>,
    today: NaiveDate,
    oldest_first: bool,
) -> anyhow::Result<Vec<CollectTarget>> {
    if let Some(keyword) = keyword {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            anyhow::bail!("--keyword must not be blank");
        }
        let (start, end) = match range {
            Some(span) => span,
            None => {
                let entry = keywords.and_then(|k| k.find(keyword)).ok_or_else(|| {
                    anyhow::anyhow!(
                        "no date range for '{keyword}': pass --start/--end or \
                         --lookback-days, or add it to the keywords file"
                    )
                })?;
                since_range(entry.since, today).ok_or_else(|| {
                    anyhow::anyhow!("'{keyword}' has no completed days since {}", entry.since)
                })?
            }
        };
        return Ok(vec![CollectTarget::new(keyword, start, end, oldest_first)]);
    }

    let file = keywords.ok_or_else(|| anyhow::anyhow!("keywords file not loaded"))?;
    let mut targets = Vec::new();
    for entry in file.enabled() {
        let span = range.or_else(|| since_range(entry.since, today));
        match span {
            Some((start, end)) => {
                targets.push(CollectTarget::new(&entry.keyword, start, end, oldest_first));
            }
            None => tracing::info!(
                keyword = %entry.keyword,
                since = %entry.since,
                "no completed days to collect, skipping"
            ),
        }
    }

    if targets.is_empty() {
        anyhow::bail!("no enabled keywords with days to collect");
    }
    Ok(targets)
}

/// Runs every target in order on one tracker, so keys spent by one keyword
/// are not retried for the next. Stops after the first halted target and
/// returns whether the run halted.
async fn run_targets<A, S>(
    tracker: &mut Tracker<'_, A, S>,
    targets: &[CollectTarget],
    collected_date: NaiveDate,
    runs_pool: Option<&sqlx::PgPool>,
) -> anyhow::Result<bool>
where
    A: trendtrack_youtube::MetricsApi,
    S: SnapshotStore,
{
    let mut totals = ApiCallCounts::default();
    for (index, target) in targets.iter().enumerate() {
        let report = match runs_pool {
            Some(pool) => run_recorded(pool, tracker, target, collected_date).await?,
            None => tracker
                .run(&target.keyword, &target.days, collected_date)
                .await?,
        };
        print_report(&report);
        totals.add(report.calls);

        if report.is_halted() {
            let skipped: Vec<&str> = targets[index + 1..]
                .iter()
                .map(|t| t.keyword.as_str())
                .collect();
            if !skipped.is_empty() {
                println!("not started: {}", skipped.join(", "));
            }
            print_totals(targets.len(), &totals);
            return Ok(true);
        }
    }
    print_totals(targets.len(), &totals);
    Ok(false)
}

fn print_totals(target_count: usize, totals: &ApiCallCounts) {
    if target_count > 1 {
        println!(
            "total: {} search, {} statistics, ~{} quota units",
            totals.search_calls,
            totals.stats_calls,
            totals.quota_units()
        );
    }
}

/// Wraps one tracker run in a `collection_runs` row:
/// create → start → succeeded | halted | failed.
async fn run_recorded<A, S>(
    pool: &sqlx::PgPool,
    tracker: &mut Tracker<'_, A, S>,
    target: &CollectTarget,
    collected_date: NaiveDate,
) -> anyhow::Result<TrackReport>
where
    A: trendtrack_youtube::MetricsApi,
    S: SnapshotStore,
{
    let run = trendtrack_db::create_collection_run(
        pool,
        &NewCollectionRun {
            keyword: Some(&target.keyword),
            trigger_source: "cli",
            range_start: target.start,
            range_end: target.end,
            collected_date,
            days_requested: saturating_i32(target.days.len()),
        },
    )
    .await?;

    if let Err(e) = trendtrack_db::start_collection_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let report = match tracker
        .run(&target.keyword, &target.days, collected_date)
        .await
    {
        Ok(report) => report,
        Err(e) => {
            fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
            return Err(e.into());
        }
    };

    let counts = RunCounts {
        days_completed: saturating_i32(report.days_completed()),
        rows_saved: saturating_i32(report.rows_saved()),
    };
    let finished = match &report.halted {
        Some(reason) => trendtrack_db::halt_collection_run(pool, run.id, counts, reason).await,
        None => trendtrack_db::complete_collection_run(pool, run.id, counts).await,
    };
    if let Err(e) = finished {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    Ok(report)
}

fn saturating_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn print_plan(targets: &[CollectTarget], collected_date: NaiveDate, settings: &CollectorSettings) {
    println!(
        "dry run: {} keyword(s), collected date {collected_date}",
        targets.len()
    );
    let mut min_total = 0u64;
    let mut max_total = 0u64;
    for target in targets {
        let estimate = estimate_quota(target.days.len(), settings);
        min_total += estimate.min_units;
        max_total += estimate.max_units;
        println!(
            "  {}: {}..{} ({} days), {}-{} quota units",
            target.keyword,
            target.start,
            target.end,
            target.days.len(),
            estimate.min_units,
            estimate.max_units
        );
    }
    println!("estimated quota: {min_total}-{max_total} units");
}

fn print_report(report: &TrackReport) {
    println!(
        "{}: {}/{} days, saved {}, skipped {}, no data {}, failed {}",
        report.keyword,
        report.days_completed(),
        report.days_requested,
        report.saved_days(),
        report.skipped_days(),
        report.no_data_days(),
        report.failed_days()
    );

    let undercount = report.undercount_days();
    if !undercount.is_empty() {
        let dates: Vec<String> = undercount.iter().map(NaiveDate::to_string).collect();
        println!("  lower-bound estimates: {}", dates.join(", "));
    }

    println!(
        "  API calls: {} search, {} statistics (~{} quota units), {} refused for quota",
        report.calls.search_calls,
        report.calls.stats_calls,
        report.calls.quota_units(),
        report.calls.quota_rejections
    );

    if let Some(reason) = &report.halted {
        println!("  halted: {reason}");
        if let Some((start, end)) = report.resume_range() {
            println!(
                "  resume with: collect --keyword '{}' --start {start} --end {end} --collected-date {}",
                report.keyword, report.collected_date
            );
        }
    }
}
