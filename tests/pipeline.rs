use std::fs;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use noc_scrape::{
    Cli, FailureReason, Gazetteer, GamesFilter, MemoryFetcher, Medal, Pipeline, RetryPolicy,
    ScrapeControls, Season, Sex, LBS_PER_KG, OUTPUT_COLUMNS,
};
use pretty_assertions::assert_eq;

const BASE: &str = "https://site.test/olympics/";

const ENTRY: &str = include_str!("fixtures/html/kor_entry.html");
const SUMMER_1976: &str = include_str!("fixtures/html/kor_summer_1976.html");
const SUMMER_1988: &str = include_str!("fixtures/html/kor_summer_1988.html");
const KIM: &str = include_str!("fixtures/html/athlete_kim.html");
const LEE: &str = include_str!("fixtures/html/athlete_lee.html");
const PARK: &str = include_str!("fixtures/html/athlete_park.html");
const KIM_WITHOUT_RESULTS: &str = r#"
    <h1>Kim Min-Su</h1>
    <div id="info_box"><p>Gender: Male<br>Born: June 15, 1950 in Seoul, South Korea</p></div>
    <div id="div_results"><table><tbody></tbody></table></div>
"#;

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

/// Saved KOR pages; `choi-1.html` is never served.
fn fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .with_page(url("countries/KOR/"), ENTRY)
        .with_page(url("countries/KOR/summer/1976"), SUMMER_1976)
        .with_page(url("countries/KOR/summer/1988"), SUMMER_1988)
        .with_page(url("athletes/ki/kim-1.html"), KIM)
        .with_page(url("athletes/le/lee-1.html"), LEE)
        .with_page(url("athletes/pa/park-1.html"), PARK)
}

fn controls(out_dir: &std::path::Path) -> ScrapeControls {
    ScrapeControls::new(vec!["KOR".to_string()], out_dir)
        .with_base_url(BASE)
        .with_retry_policy(RetryPolicy::new(2, Duration::ZERO))
        .with_games_filter(GamesFilter {
            include_winter: false,
            ..GamesFilter::default()
        })
}

#[test]
fn scrapes_joins_and_normalizes_one_noc() {
    let dir = tempfile::tempdir().unwrap();
    let controls = controls(dir.path());
    let fetcher = fetcher();
    let pipeline = Pipeline::new(&fetcher, &controls, Gazetteer::builtin()).unwrap();

    let outcome = pipeline.scrape_noc("KOR").unwrap();

    assert_eq!(outcome.report.games_pages, 2);
    assert_eq!(outcome.report.athlete_links, 4);
    assert!(!fetcher
        .requests()
        .iter()
        .any(|request| request.contains("winter")));
    assert_eq!(
        fetcher
            .requests()
            .iter()
            .filter(|request| request.ends_with("choi-1.html"))
            .count(),
        2
    );
    assert_eq!(
        outcome
            .failed_links
            .iter()
            .map(|link| link.as_str().to_string())
            .collect::<Vec<_>>(),
        vec![url("athletes/ch/choi-1.html")]
    );
    assert!(outcome
        .report
        .failures
        .iter()
        .any(|failure| failure.reason == FailureReason::Infobox
            && failure.link.as_str().ends_with("lee-1.html")));

    let rows = &outcome.rows;
    let names: Vec<_> = rows.iter().map(|row| row.name.as_deref()).collect();
    assert_eq!(
        names,
        vec![Some("Kim Min-Su"), Some("Kim Min-Su"), None, Some("Park Sung-Soo")]
    );

    let gold = &rows[0];
    assert_eq!(gold.year, Some(1976));
    assert_eq!(gold.season, Some(Season::Summer));
    assert_eq!(gold.city.as_deref(), Some("Montreal"));
    assert_eq!(gold.event.as_deref(), Some("Featherweight, Freestyle, Men"));
    assert_eq!(gold.noc.as_deref(), Some("KOR"));
    assert_eq!(gold.sex, Some(Sex::Male));
    assert_eq!(gold.age, Some(26));
    assert_eq!(gold.height_cm, Some(175.0));
    assert_eq!(gold.weight_kg, Some(70.0));
    assert_eq!(gold.medal, Some(Medal::Gold));
    assert_eq!(gold.birth_date, NaiveDate::from_ymd_opt(1950, 6, 15));
    assert_eq!(gold.birth_city.as_deref(), Some("Seoul"));
    assert_eq!(gold.birth_country.as_deref(), Some("South Korea"));
    assert_eq!(
        gold.affiliations.as_deref(),
        Some("Korea National Sport University, Seoul (KOR)")
    );

    let home = &rows[1];
    assert_eq!(home.age, None);
    assert_eq!(home.medal, None);

    let no_bio = &rows[2];
    assert_eq!(no_bio.event.as_deref(), Some("epee, Individual, Men"));
    assert_eq!(no_bio.sex, None);
    assert_eq!(no_bio.link.as_deref(), Some(url("athletes/le/lee-1.html").as_str()));

    let short = &rows[3];
    assert_eq!(short.sport.as_deref(), Some("Archery"));
    assert_eq!(short.noc, None);
    assert_eq!(short.medal, None);
    assert_eq!(short.weight_kg, Some(121.0 / LBS_PER_KG));
    assert_eq!(short.birth_date, NaiveDate::from_ymd_opt(1960, 4, 21));
    assert_eq!(short.birth_city, None);

    assert!(outcome.report.normalization.cell_failures.is_empty());
    assert!(outcome.report.normalization.warnings.is_empty());
}

#[test]
fn run_writes_table_and_sidecars() {
    let dir = tempfile::tempdir().unwrap();
    let controls = controls(dir.path());
    let fetcher = fetcher();

    let metrics = noc_scrape::run_scrape(&fetcher, &controls, Gazetteer::builtin()).unwrap();
    assert_eq!(metrics.nocs, 1);
    assert_eq!(metrics.rows_written, 4);
    assert_eq!(metrics.transport_failures, 1);
    assert_eq!(metrics.infobox_failures, 1);

    let mut table = csv::Reader::from_path(dir.path().join("KOR.csv")).unwrap();
    let header: Vec<String> = table.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(header, OUTPUT_COLUMNS.to_vec());
    assert_eq!(table.records().count(), 4);

    let missing = fs::read_to_string(dir.path().join("missing").join("KOR_missing.txt")).unwrap();
    assert_eq!(missing, format!("{}\n", url("athletes/ch/choi-1.html")));

    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("reports").join("KOR_report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["noc"], "KOR");
    assert_eq!(report["normalization"]["rows"], 4);
    assert_eq!(report["failures"][0]["kind"], "transport");
}

#[test]
fn keep_policy_emits_rows_for_athletes_without_results() {
    let cli = Cli::parse_from([
        "noc-scrape",
        "--nocs",
        "kor",
        "--no-winter",
        "--keep-athletes-without-results",
        "--retry-cooldown-secs",
        "0",
        "--base-url",
        BASE,
    ]);
    let controls = cli.build_controls();
    let fetcher = fetcher().with_page(url("athletes/ki/kim-1.html"), KIM_WITHOUT_RESULTS);
    let pipeline = Pipeline::new(&fetcher, &controls, Gazetteer::builtin()).unwrap();

    let outcome = pipeline.scrape_noc("KOR").unwrap();
    let kim: Vec<_> = outcome
        .rows
        .iter()
        .filter(|row| row.name.as_deref() == Some("Kim Min-Su"))
        .collect();
    assert_eq!(kim.len(), 1);
    assert_eq!(kim[0].year, None);
    assert_eq!(kim[0].medal, None);
    assert_eq!(kim[0].birth_city.as_deref(), Some("Seoul"));
}

#[test]
fn missing_entry_page_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let controls = controls(dir.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&fetcher, &controls, Gazetteer::builtin()).unwrap();
    let err = pipeline.scrape_noc("KOR").unwrap_err();
    assert!(err.to_string().contains("KOR"));
}
