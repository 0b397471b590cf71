#![warn(missing_docs)]
//! Core library entry points for the Olympic NOC athlete scraper.

pub mod collector;
pub mod combine;
pub mod controls;
pub mod dates;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod frame;
pub mod join;
pub mod normalizer;
pub mod output;
pub mod pipeline;
pub mod places;
pub mod records;
pub mod site;
pub mod validate;

pub use collector::{collect, Collection, FailedLink, FailureReason};
pub use combine::{combine, Combined};
pub use controls::{Cli, ScrapeControls};
pub use dates::{DateParseError, DateParser};
pub use discovery::{discover_athlete_links, discover_games_links, AthleteFilter, GamesFilter};
pub use error::{
    DiscoveryError, ExtractError, FieldTransformError, OutputError, StructuralInvariantError,
    TransportError,
};
pub use extract::{extract_biography, extract_results, AthletePage};
pub use fetch::{fetch_with_retry, Fetcher, HttpFetcher, MemoryFetcher, RetryPolicy};
pub use frame::{Frame, Value};
pub use join::{join, JoinPolicy, JoinedRow};
pub use normalizer::{
    FieldFailure, NormalizationConfig, NormalizationReport, Normalizer, LBS_PER_KG,
};
pub use pipeline::{run as run_scrape, NocOutcome, NocReport, Pipeline, PipelineError, RunMetrics};
pub use places::{Gazetteer, GazetteerError, PlaceRecognizer, Places};
pub use records::{
    AthleteLink, BiographyRecord, GamesPageRef, Medal, NormalizedRow, ResultRow, Season, Sex,
    OUTPUT_COLUMNS, RESULT_COLUMNS,
};
pub use site::{Site, DEFAULT_BASE_URL};
