//! One-biography-to-many-results join.

use crate::collector::Collection;
use crate::error::StructuralInvariantError;
use crate::records::{AthleteLink, BiographyRecord, ResultRow};

/// What to do with athletes that have no result rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinPolicy {
    /// Emit one row with an all-null result instead of dropping the athlete.
    pub keep_athletes_without_results: bool,
}

/// One (athlete, result) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    /// Athlete page the row came from.
    pub link: AthleteLink,
    /// `None` when the info box could not be read.
    pub biography: Option<BiographyRecord>,
    /// One result, or an all-null row under the keep policy.
    pub result: ResultRow,
}

/// Pairs `biographies[i]` with every row of `results[i]`.
///
/// Slots whose fetch failed outright (no biography and no results) never produce rows.
pub fn join(
    collection: &Collection,
    policy: JoinPolicy,
) -> Result<Vec<JoinedRow>, StructuralInvariantError> {
    collection.verify_alignment()?;

    let mut rows = Vec::new();
    let slots = collection
        .links
        .iter()
        .zip(&collection.biographies)
        .zip(&collection.results);
    for ((link, biography), results) in slots {
        if biography.is_none() && results.is_none() {
            continue;
        }
        let results = results.as_deref().unwrap_or_default();
        if results.is_empty() {
            if policy.keep_athletes_without_results {
                rows.push(JoinedRow {
                    link: link.clone(),
                    biography: biography.clone(),
                    result: ResultRow::default(),
                });
            }
            continue;
        }
        for result in results {
            rows.push(JoinedRow {
                link: link.clone(),
                biography: biography.clone(),
                result: result.clone(),
            });
        }
    }
    Ok(rows)
}
