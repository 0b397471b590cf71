//! Sequential fetch-and-extract pass over athlete links.

use crate::error::{ExtractError, StructuralInvariantError};
use crate::extract::AthletePage;
use crate::fetch::{fetch_with_retry, Fetcher, RetryPolicy};
use crate::records::{AthleteLink, BiographyRecord, ResultRow};
use serde::Serialize;
use tracing::{info, warn};

/// Why a link contributed less than a full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Every fetch attempt failed; both slots are null.
    Transport {
        /// Last transport error.
        message: String,
    },
    /// Page fetched but its info box was missing.
    Infobox,
    /// Page fetched but its results container was missing.
    Results,
}

/// A link together with the reason it is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedLink {
    /// Athlete page that failed.
    pub link: AthleteLink,
    /// What went wrong.
    #[serde(flatten)]
    pub reason: FailureReason,
}

/// Output of [`collect`]: three index-aligned lists plus the failure log.
///
/// `biographies[i]` and `results[i]` always describe `links[i]`.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Athlete links in collection order.
    pub links: Vec<AthleteLink>,
    /// Biography per link, `None` when the page or its info box was unavailable.
    pub biographies: Vec<Option<BiographyRecord>>,
    /// Result rows per link, `None` when the page or its results table was unavailable.
    pub results: Vec<Option<Vec<ResultRow>>>,
    /// Every incomplete link with its reason.
    pub failures: Vec<FailedLink>,
}

impl Collection {
    /// Checks that the three lists have one slot per link.
    pub fn verify_alignment(&self) -> Result<(), StructuralInvariantError> {
        let (links, biographies, results) =
            (self.links.len(), self.biographies.len(), self.results.len());
        if links == biographies && links == results {
            Ok(())
        } else {
            Err(StructuralInvariantError {
                links,
                biographies,
                results,
            })
        }
    }

    /// Links abandoned after every fetch attempt failed.
    pub fn transport_failures(&self) -> impl Iterator<Item = &AthleteLink> + '_ {
        self.failures
            .iter()
            .filter(|failure| matches!(failure.reason, FailureReason::Transport { .. }))
            .map(|failure| &failure.link)
    }

    /// Number of links whose page was fetched.
    pub fn pages_fetched(&self) -> usize {
        self.links.len() - self.transport_failures().count()
    }

    fn push(
        &mut self,
        link: AthleteLink,
        biography: Option<BiographyRecord>,
        results: Option<Vec<ResultRow>>,
    ) {
        self.links.push(link);
        self.biographies.push(biography);
        self.results.push(results);
    }

    fn record_failure(&mut self, link: &AthleteLink, reason: FailureReason) {
        self.failures.push(FailedLink {
            link: link.clone(),
            reason,
        });
    }
}

/// Fetches and extracts every link in order.
///
/// A link whose fetch fails `policy.attempts()` times gets a null biography and null results.
/// An extraction failure nulls only the affected slot. The only error is a broken alignment
/// invariant, which means the pass itself is wrong.
pub fn collect<F>(
    fetcher: &F,
    links: Vec<AthleteLink>,
    policy: &RetryPolicy,
) -> Result<Collection, StructuralInvariantError>
where
    F: Fetcher + ?Sized,
{
    let total = links.len();
    let mut collection = Collection {
        links: Vec::with_capacity(total),
        biographies: Vec::with_capacity(total),
        results: Vec::with_capacity(total),
        failures: Vec::new(),
    };

    for (index, link) in links.into_iter().enumerate() {
        info!("[{}/{}] {}", index + 1, total, link);
        let html = match fetch_with_retry(fetcher, link.as_str(), policy) {
            Ok(html) => html,
            Err(err) => {
                warn!(%link, error = %err, "giving up on page");
                collection.record_failure(
                    &link,
                    FailureReason::Transport {
                        message: err.to_string(),
                    },
                );
                collection.push(link, None, None);
                continue;
            }
        };

        let page = AthletePage::parse(link.clone(), &html);
        let biography = match page.biography() {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(%link, error = %err, "no biography");
                collection.record_failure(&link, reason_for(err));
                None
            }
        };
        let results = match page.results() {
            Ok(rows) => Some(rows),
            Err(err) => {
                warn!(%link, error = %err, "no results table");
                collection.record_failure(&link, reason_for(err));
                None
            }
        };
        collection.push(link, biography, results);
    }

    collection.verify_alignment()?;
    Ok(collection)
}

fn reason_for(err: ExtractError) -> FailureReason {
    match err {
        ExtractError::MissingInfobox => FailureReason::Infobox,
        ExtractError::MissingResults => FailureReason::Results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use std::time::Duration;

    const FULL: &str = r#"<h1>A</h1><div id="info_box"><p>Gender: Male</p></div>
        <div id="div_results"><table><tbody><tr><td>2016 Summer</td></tr></tbody></table></div>"#;
    const NO_RESULTS: &str = r#"<div id="info_box"><p>Gender: Female</p></div>"#;

    fn link(name: &str) -> AthleteLink {
        AthleteLink::new(format!("https://site.test/olympics/athletes/xx/{name}.html"))
    }

    fn no_wait() -> RetryPolicy {
        RetryPolicy::new(2, Duration::ZERO)
    }

    #[test]
    fn keeps_slots_aligned_across_failures() {
        let links = vec![link("ok"), link("down"), link("partial"), link("flaky")];
        let fetcher = MemoryFetcher::new()
            .with_page(links[0].as_str(), FULL)
            .with_page(links[2].as_str(), NO_RESULTS)
            .with_page(links[3].as_str(), FULL)
            .failing(links[3].as_str(), 1);

        let collection = collect(&fetcher, links.clone(), &no_wait()).expect("aligned");

        assert_eq!(collection.links, links);
        assert_eq!(collection.biographies.len(), 4);
        assert_eq!(collection.results.len(), 4);
        assert!(collection.biographies[1].is_none() && collection.results[1].is_none());
        assert!(collection.biographies[2].is_some() && collection.results[2].is_none());
        assert!(collection.results[3].is_some());
        assert_eq!(
            collection.transport_failures().collect::<Vec<_>>(),
            vec![&links[1]]
        );
        assert_eq!(collection.pages_fetched(), 3);
        assert_eq!(collection.failures.len(), 2);
    }

    #[test]
    fn transport_failure_retries_once() {
        let links = vec![link("down")];
        let fetcher = MemoryFetcher::new();
        collect(&fetcher, links, &no_wait()).expect("aligned");
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[test]
    fn misaligned_collection_is_rejected() {
        let collection = Collection {
            links: vec![link("a"), link("b")],
            biographies: vec![None],
            results: vec![None, None],
            failures: Vec::new(),
        };
        let err = collection.verify_alignment().unwrap_err();
        assert_eq!(err.biographies, 1);
        assert_eq!(err.links, 2);
    }
}
