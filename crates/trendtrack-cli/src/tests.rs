use super::*;
use crate::collect::{explicit_range, plan_targets};
use trendtrack_core::{KeywordConfig, KeywordsFile};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d).unwrap()
}

fn collect_args(args: &[&str]) -> CollectArgs {
    let mut argv = vec!["trendtrack", "collect"];
    argv.extend_from_slice(args);
    match Cli::try_parse_from(argv).expect("expected valid cli args").command {
        Some(Commands::Collect(args)) => args,
        other => panic!("expected collect command, got {other:?}"),
    }
}

fn keywords_file() -> KeywordsFile {
    KeywordsFile {
        keywords: vec![
            KeywordConfig {
                keyword: "mukbang".to_string(),
                since: date(1, 18),
                enabled: true,
                notes: None,
            },
            KeywordConfig {
                keyword: "asmr".to_string(),
                since: date(1, 1),
                enabled: false,
                notes: None,
            },
            KeywordConfig {
                keyword: "vlog".to_string(),
                since: date(1, 21),
                enabled: true,
                notes: None,
            },
        ],
    }
}

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["trendtrack", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["trendtrack", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["trendtrack"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn collect_with_explicit_range() {
    let args = collect_args(&[
        "--keyword",
        "mukbang",
        "--start",
        "2026-01-01",
        "--end",
        "2026-01-19",
    ]);
    assert_eq!(args.keyword.as_deref(), Some("mukbang"));
    assert_eq!(args.start, Some(date(1, 1)));
    assert_eq!(args.end, Some(date(1, 19)));
    assert!(!args.dry_run);
    assert!(!args.oldest_first);
}

#[test]
fn collect_accepts_repeated_api_keys() {
    let args = collect_args(&["--lookback-days", "7", "--api-key", "a", "--api-key", "b"]);
    assert_eq!(args.api_keys, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(args.lookback_days, Some(7));
}

#[test]
fn collect_start_requires_end() {
    let result = Cli::try_parse_from(["trendtrack", "collect", "--start", "2026-01-01"]);
    assert!(result.is_err());
}

#[test]
fn collect_range_conflicts_with_lookback() {
    let result = Cli::try_parse_from([
        "trendtrack",
        "collect",
        "--start",
        "2026-01-01",
        "--end",
        "2026-01-02",
        "--lookback-days",
        "3",
    ]);
    assert!(result.is_err());
}

#[test]
fn collect_rejects_malformed_date() {
    let result = Cli::try_parse_from(["trendtrack", "collect", "--collected-date", "01/20/2026"]);
    assert!(result.is_err());
}

#[test]
fn parses_report_timeline() {
    let cli = Cli::try_parse_from([
        "trendtrack",
        "report",
        "timeline",
        "--keyword",
        "mukbang",
        "--observed-date",
        "2026-01-19",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Report {
            command:
                ReportCommands::Timeline {
                    keyword,
                    observed_date,
                },
        }) => {
            assert_eq!(keyword, "mukbang");
            assert_eq!(observed_date, date(1, 19));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn report_latest_defaults_limit() {
    let cli = Cli::try_parse_from(["trendtrack", "report", "latest", "--keyword", "x"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            command: ReportCommands::Latest { limit: 14, .. }
        })
    ));
}

#[test]
fn report_latest_rejects_non_positive_limit() {
    for limit in ["--limit=0", "--limit=-1"] {
        let result =
            Cli::try_parse_from(["trendtrack", "report", "latest", "--keyword", "x", limit]);
        assert!(result.is_err(), "{limit} should be rejected");
    }
}

#[test]
fn db_runs_limit_must_be_positive() {
    let cli = Cli::try_parse_from(["trendtrack", "db", "runs", "--limit", "5"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Runs { limit: 5 }
        })
    ));
    assert!(Cli::try_parse_from(["trendtrack", "db", "runs", "--limit=-3"]).is_err());
}

#[test]
fn help_is_handled_by_the_parser() {
    let err = Cli::try_parse_from(["trendtrack", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}

#[test]
fn explicit_range_rejects_inverted_dates() {
    assert!(explicit_range(Some(date(1, 5)), Some(date(1, 4)), None, date(1, 21)).is_err());
}

#[test]
fn explicit_range_from_lookback() {
    let range = explicit_range(None, None, Some(3), date(1, 21)).unwrap();
    assert_eq!(range, Some((date(1, 18), date(1, 20))));
    assert!(explicit_range(None, None, Some(0), date(1, 21)).is_err());
    assert_eq!(explicit_range(None, None, None, date(1, 21)).unwrap(), None);
}

#[test]
fn single_keyword_uses_explicit_range_newest_first() {
    let targets = plan_targets(
        Some("mukbang"),
        Some((date(1, 18), date(1, 20))),
        None,
        date(1, 21),
        false,
    )
    .unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].days, vec![date(1, 20), date(1, 19), date(1, 18)]);
}

#[test]
fn single_keyword_falls_back_to_since_date() {
    let file = keywords_file();
    let targets = plan_targets(Some("MUKBANG"), None, Some(&file), date(1, 21), true).unwrap();
    assert_eq!(targets[0].keyword, "MUKBANG");
    assert_eq!(targets[0].days, vec![date(1, 18), date(1, 19), date(1, 20)]);
}

#[test]
fn unknown_keyword_without_range_is_an_error() {
    let file = keywords_file();
    assert!(plan_targets(Some("unknown"), None, Some(&file), date(1, 21), false).is_err());
}

#[test]
fn all_enabled_keywords_skip_those_without_completed_days() {
    let file = keywords_file();
    let targets = plan_targets(None, None, Some(&file), date(1, 21), false).unwrap();
    let names: Vec<&str> = targets.iter().map(|t| t.keyword.as_str()).collect();
    assert_eq!(names, vec!["mukbang"], "disabled and future keywords are left out");
}

#[test]
fn explicit_range_applies_to_every_enabled_keyword() {
    let file = keywords_file();
    let targets = plan_targets(
        None,
        Some((date(1, 10), date(1, 11))),
        Some(&file),
        date(1, 21),
        false,
    )
    .unwrap();
    let names: Vec<&str> = targets.iter().map(|t| t.keyword.as_str()).collect();
    assert_eq!(names, vec!["mukbang", "vlog"]);
    assert!(targets.iter().all(|t| t.days.len() == 2));
}
