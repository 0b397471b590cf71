//! Per-NOC orchestration: discover → collect → join → normalize → validate → write.

use crate::collector::{collect, FailedLink, FailureReason};
use crate::controls::ScrapeControls;
use crate::discovery::{discover_athlete_links, discover_games_links};
use crate::error::{DiscoveryError, OutputError, StructuralInvariantError};
use crate::fetch::Fetcher;
use crate::frame::Frame;
use crate::join::join;
use crate::normalizer::{NormalizationConfig, NormalizationReport, Normalizer};
use crate::output::{write_noc_outputs, OutputPaths};
use crate::places::PlaceRecognizer;
use crate::records::{AthleteLink, NormalizedRow};
use crate::site::Site;
use crate::validate::validate_editions;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// A run had to stop.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Link discovery failed for an NOC.
    #[error("discovery failed for {noc}: {source}")]
    Discovery {
        /// NOC being scraped.
        noc: String,
        /// Underlying failure.
        #[source]
        source: DiscoveryError,
    },
    /// Collected records lost their alignment.
    #[error(transparent)]
    Structure(#[from] StructuralInvariantError),
    /// Outputs could not be written.
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Sidecar written next to each NOC table.
#[derive(Debug, Clone, Serialize)]
pub struct NocReport {
    /// NOC code.
    pub noc: String,
    /// Games pages visited.
    pub games_pages: usize,
    /// Athlete links discovered.
    pub athlete_links: usize,
    /// Links that yielded less than a full record.
    pub failures: Vec<FailedLink>,
    /// Normalization outcome, including edition warnings.
    pub normalization: NormalizationReport,
}

/// Everything produced for one NOC.
#[derive(Debug, Clone)]
pub struct NocOutcome {
    /// Normalized table.
    pub rows: Vec<NormalizedRow>,
    /// Links abandoned after every fetch attempt failed.
    pub failed_links: Vec<AthleteLink>,
    /// Structured report.
    pub report: NocReport,
}

impl NocOutcome {
    fn count_failures(&self, wanted: fn(&FailureReason) -> bool) -> usize {
        self.report
            .failures
            .iter()
            .filter(|failure| wanted(&failure.reason))
            .count()
    }
}

/// Totals across a run, printed at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunMetrics {
    /// NOCs completed.
    pub nocs: usize,
    /// Games pages visited.
    pub games_pages: usize,
    /// Athlete links discovered.
    pub athlete_links: usize,
    /// Athlete pages fetched.
    pub pages_fetched: usize,
    /// Links abandoned after retries.
    pub transport_failures: usize,
    /// Pages without an info box.
    pub infobox_failures: usize,
    /// Pages without a results table.
    pub results_failures: usize,
    /// Normalized rows written.
    pub rows_written: usize,
    /// Cells nulled during normalization.
    pub cell_failures: usize,
    /// Transforms that failed as a whole.
    pub transform_errors: usize,
    /// Edition warnings.
    pub warnings: usize,
}

impl RunMetrics {
    fn record(&mut self, outcome: &NocOutcome) {
        let report = &outcome.report;
        self.nocs += 1;
        self.games_pages += report.games_pages;
        self.athlete_links += report.athlete_links;
        self.pages_fetched += report.athlete_links - outcome.failed_links.len();
        self.transport_failures += outcome.failed_links.len();
        self.infobox_failures +=
            outcome.count_failures(|reason| matches!(reason, FailureReason::Infobox));
        self.results_failures +=
            outcome.count_failures(|reason| matches!(reason, FailureReason::Results));
        self.rows_written += outcome.rows.len();
        self.cell_failures += report.normalization.cell_failures.len();
        self.transform_errors += report.normalization.transform_errors.len();
        self.warnings += report.normalization.warnings.len();
    }

    /// Prints the end-of-run summary.
    pub fn report(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f32().max(f32::EPSILON);
        println!("--- scrape metrics ({secs:.2}s) ---");
        println!("nocs scraped: {}", self.nocs);
        println!("games pages: {}", self.games_pages);
        println!("athlete links: {}", self.athlete_links);
        println!("pages fetched: {}", self.pages_fetched);
        println!("pages/sec: {:.2}", self.pages_fetched as f32 / secs);
        println!("transport failures: {}", self.transport_failures);
        println!(
            "missing info boxes / results: {} / {}",
            self.infobox_failures, self.results_failures
        );
        println!("rows written: {}", self.rows_written);
        println!(
            "cell failures: {} (transform errors {})",
            self.cell_failures, self.transform_errors
        );
        println!("edition warnings: {}", self.warnings);
    }
}

/// Runs the scrape for every NOC in `controls`.
pub struct Pipeline<'a, F: ?Sized, P> {
    fetcher: &'a F,
    site: Site,
    controls: &'a ScrapeControls,
    normalizer: Normalizer<P>,
}

impl<'a, F, P> Pipeline<'a, F, P>
where
    F: Fetcher + ?Sized,
    P: PlaceRecognizer,
{
    /// Builds a pipeline fetching through `fetcher` and resolving places through `places`.
    pub fn new(
        fetcher: &'a F,
        controls: &'a ScrapeControls,
        places: P,
    ) -> Result<Self, DiscoveryError> {
        Ok(Self {
            fetcher,
            site: Site::new(controls.base_url())?,
            controls,
            normalizer: Normalizer::new(NormalizationConfig::default(), places),
        })
    }

    /// Scrapes and normalizes one NOC without touching the filesystem.
    pub fn scrape_noc(&self, noc: &str) -> Result<NocOutcome, PipelineError> {
        let discovery_error = |source| PipelineError::Discovery {
            noc: noc.to_string(),
            source,
        };
        let games = discover_games_links(
            self.fetcher,
            &self.site,
            noc,
            self.controls.games_filter(),
        )
        .map_err(discovery_error)?;
        let links = discover_athlete_links(
            self.fetcher,
            &self.site,
            &games,
            self.controls.athlete_filter(),
        )
        .map_err(discovery_error)?;
        let athlete_links = links.len();

        let collection = collect(self.fetcher, links, self.controls.retry_policy())?;
        let joined = join(&collection, self.controls.join_policy())?;
        info!(%noc, rows = joined.len(), "joined records");

        let mut frame = Frame::from_joined(&joined);
        let mut normalization = self.normalizer.normalize(&mut frame);
        let rows = frame.to_rows();
        normalization.warnings = validate_editions(&rows);
        for warning in &normalization.warnings {
            warn!(%noc, "{warning}");
        }

        Ok(NocOutcome {
            rows,
            failed_links: collection.transport_failures().cloned().collect(),
            report: NocReport {
                noc: noc.to_string(),
                games_pages: games.len(),
                athlete_links,
                failures: collection.failures,
                normalization,
            },
        })
    }

    /// Scrapes every NOC in order, writing each one's outputs before moving on.
    pub fn run(&self) -> Result<RunMetrics, PipelineError> {
        let mut metrics = RunMetrics::default();
        for noc in self.controls.nocs() {
            info!(%noc, "scraping NOC");
            let outcome = self.scrape_noc(noc)?;
            let paths = OutputPaths::for_noc(self.controls.out_dir(), noc);
            write_noc_outputs(&paths, &outcome.rows, &outcome.failed_links, &outcome.report)?;
            info!(
                %noc,
                rows = outcome.rows.len(),
                failed = outcome.failed_links.len(),
                table = %paths.table.display(),
                "wrote NOC table"
            );
            metrics.record(&outcome);
        }
        Ok(metrics)
    }
}

/// Runs the pipeline and prints the metrics block.
pub fn run<F, P>(
    fetcher: &F,
    controls: &ScrapeControls,
    places: P,
) -> Result<RunMetrics, PipelineError>
where
    F: Fetcher + ?Sized,
    P: PlaceRecognizer,
{
    let start = Instant::now();
    let pipeline = Pipeline::new(fetcher, controls, places).map_err(|source| {
        PipelineError::Discovery {
            noc: controls.nocs().join(","),
            source,
        }
    })?;
    let metrics = pipeline.run()?;
    metrics.report(start.elapsed());
    Ok(metrics)
}
