//! Error taxonomy shared by the scrape, join and normalize stages.

use serde::Serialize;
use thiserror::Error;

/// A page could not be retrieved.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client failed before a response arrived.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The transport has no page for this URL (used by offline fetchers).
    #[error("{url} unavailable: {message}")]
    Unavailable {
        /// Requested URL.
        url: String,
        /// Human readable cause.
        message: String,
    },
}

impl TransportError {
    /// URL the failed request targeted.
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::Status { url, .. }
            | Self::Unavailable { url, .. } => url,
        }
    }
}

/// Expected structure was absent from a fetched athlete page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// `div#info_box` (or its paragraph) is missing.
    #[error("info box not found")]
    MissingInfobox,
    /// `div#div_results` is missing.
    #[error("results container not found")]
    MissingResults,
}

/// Link discovery could not complete.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A listing page could not be fetched.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A listing page had no table body to read links from.
    #[error("no listing table on {url}")]
    MissingTable {
        /// Listing page URL.
        url: String,
    },
    /// A URL could not be built from the site base.
    #[error("invalid url {url}: {source}")]
    Url {
        /// Offending URL text.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
}

/// A single field transform could not run over its column.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("transform for column `{column}` failed: {reason}")]
pub struct FieldTransformError {
    /// Source column of the transform.
    pub column: String,
    /// Why the transform gave up.
    pub reason: String,
}

impl FieldTransformError {
    pub(crate) fn new(column: &str, reason: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Positional alignment between links, biographies and results was broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "record lists out of alignment: {links} links, {biographies} biographies, {results} result tables"
)]
pub struct StructuralInvariantError {
    /// Number of athlete links.
    pub links: usize,
    /// Number of biography slots.
    pub biographies: usize,
    /// Number of result-table slots.
    pub results: usize,
}

/// Writing a table or sidecar file failed.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Filesystem failure.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Target path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Table encoding or decoding failed.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Report encoding failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Tables being combined disagree on their columns.
    #[error("{path} has columns {found:?}, expected {expected:?}")]
    HeaderMismatch {
        /// Offending table.
        path: String,
        /// Header of the first table.
        expected: Vec<String>,
        /// Header of the offending table.
        found: Vec<String>,
    },
}

impl OutputError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
