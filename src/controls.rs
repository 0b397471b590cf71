//! Scrape filters and run settings, parsed from the command line or the environment.

use crate::discovery::{AthleteFilter, GamesFilter};
use crate::fetch::RetryPolicy;
use crate::join::JoinPolicy;
use crate::site::DEFAULT_BASE_URL;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for one scrape run over a list of NOCs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeControls {
    nocs: Vec<String>,
    games: GamesFilter,
    athletes: AthleteFilter,
    join: JoinPolicy,
    retry: RetryPolicy,
    timeout: Duration,
    base_url: String,
    out_dir: PathBuf,
    gazetteer: Option<PathBuf>,
}

impl ScrapeControls {
    /// Controls for `nocs` with default filters and policies, writing under `out_dir`.
    pub fn new(nocs: Vec<String>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            nocs,
            games: GamesFilter::default(),
            athletes: AthleteFilter::default(),
            join: JoinPolicy::default(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
            base_url: DEFAULT_BASE_URL.to_string(),
            out_dir: out_dir.into(),
            gazetteer: None,
        }
    }

    /// Replaces the Games filter.
    pub fn with_games_filter(mut self, games: GamesFilter) -> Self {
        self.games = games;
        self
    }

    /// Replaces the athlete filter.
    pub fn with_athlete_filter(mut self, athletes: AthleteFilter) -> Self {
        self.athletes = athletes;
        self
    }

    /// Replaces the join policy.
    pub fn with_join_policy(mut self, join: JoinPolicy) -> Self {
        self.join = join;
        self
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Points the scrape at another copy of the site.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// NOC codes to scrape, uppercased, in order.
    pub fn nocs(&self) -> &[String] {
        &self.nocs
    }

    /// Year and season filter for Games pages.
    pub fn games_filter(&self) -> &GamesFilter {
        &self.games
    }

    /// Sex and sport filter for athlete rows.
    pub fn athlete_filter(&self) -> &AthleteFilter {
        &self.athletes
    }

    /// Handling of athletes without results.
    pub fn join_policy(&self) -> JoinPolicy {
        self.join
    }

    /// Retry policy for athlete page fetches.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// HTTP request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Site root all page URLs are built from.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Directory receiving tables and sidecars.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Extra gazetteer file, if any.
    pub fn gazetteer(&self) -> Option<&Path> {
        self.gazetteer.as_deref()
    }
}

/// Command-line interface of the scraper binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "noc-scrape",
    about = "Scrape Olympic athlete records for national Olympic committees"
)]
pub struct Cli {
    /// NOC codes, comma separated
    #[arg(long, env = "NOC_SCRAPE_NOCS", default_value = "AFG")]
    pub nocs: String,

    /// Earliest Games year to include
    #[arg(long, env = "NOC_SCRAPE_MIN_YEAR", default_value_t = 1890)]
    pub min_year: i32,

    /// Latest Games year to include
    #[arg(long, env = "NOC_SCRAPE_MAX_YEAR", default_value_t = 2050)]
    pub max_year: i32,

    /// Skip Summer Games
    #[arg(long, env = "NOC_SCRAPE_NO_SUMMER", default_value_t = false)]
    pub no_summer: bool,

    /// Skip Winter Games
    #[arg(long, env = "NOC_SCRAPE_NO_WINTER", default_value_t = false)]
    pub no_winter: bool,

    /// Skip male athletes
    #[arg(long, env = "NOC_SCRAPE_NO_MALE", default_value_t = false)]
    pub no_male: bool,

    /// Skip female athletes
    #[arg(long, env = "NOC_SCRAPE_NO_FEMALE", default_value_t = false)]
    pub no_female: bool,

    /// Only athletes listed under this sport
    #[arg(long, env = "NOC_SCRAPE_SPORT")]
    pub sport: Option<String>,

    /// Emit a row with empty results for athletes without any results
    #[arg(long, env = "NOC_SCRAPE_KEEP_EMPTY", default_value_t = false)]
    pub keep_athletes_without_results: bool,

    /// Seconds to wait before retrying a failed page fetch
    #[arg(long, env = "NOC_SCRAPE_RETRY_COOLDOWN", default_value_t = 60)]
    pub retry_cooldown_secs: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "NOC_SCRAPE_TIMEOUT", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Site root
    #[arg(long, env = "NOC_SCRAPE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Output directory
    #[arg(long, env = "NOC_SCRAPE_OUT_DIR", default_value = "data")]
    pub out_dir: PathBuf,

    /// Extra gazetteer JSON file with cities, countries and codes
    #[arg(long, env = "NOC_SCRAPE_GAZETTEER")]
    pub gazetteer: Option<PathBuf>,
}

impl Cli {
    /// Converts the parsed CLI into `ScrapeControls`.
    pub fn build_controls(&self) -> ScrapeControls {
        ScrapeControls {
            nocs: self.nocs_vec(),
            games: GamesFilter {
                min_year: self.min_year,
                max_year: self.max_year,
                include_summer: !self.no_summer,
                include_winter: !self.no_winter,
            },
            athletes: AthleteFilter {
                include_male: !self.no_male,
                include_female: !self.no_female,
                sport: self
                    .sport
                    .as_deref()
                    .map(str::trim)
                    .filter(|sport| !sport.is_empty())
                    .map(str::to_string),
            },
            join: JoinPolicy {
                keep_athletes_without_results: self.keep_athletes_without_results,
            },
            retry: RetryPolicy::new(2, Duration::from_secs(self.retry_cooldown_secs)),
            timeout: Duration::from_secs(self.timeout_secs),
            base_url: self.base_url.clone(),
            out_dir: self.out_dir.clone(),
            gazetteer: self.gazetteer.clone(),
        }
    }

    fn nocs_vec(&self) -> Vec<String> {
        self.nocs
            .split(',')
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
