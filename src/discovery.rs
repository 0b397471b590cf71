//! Two-level link discovery: NOC entry page → Games pages → athlete pages.
//!
//! Every function returns a fresh value; nothing is retained between calls.

use crate::error::DiscoveryError;
use crate::fetch::Fetcher;
use crate::records::{AthleteLink, GamesPageRef, Season, Sex};
use crate::site::Site;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Year and season bounds applied to an NOC's Games list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamesFilter {
    /// Earliest year kept, inclusive.
    pub min_year: i32,
    /// Latest year kept, inclusive.
    pub max_year: i32,
    /// Keep Summer Games.
    pub include_summer: bool,
    /// Keep Winter Games.
    pub include_winter: bool,
}

impl GamesFilter {
    /// True when a Games appearance passes the year range and season flags.
    pub fn accepts(&self, season: Season, year: i32) -> bool {
        if year < self.min_year || year > self.max_year {
            return false;
        }
        match season {
            Season::Summer => self.include_summer,
            Season::Winter => self.include_winter,
        }
    }
}

impl Default for GamesFilter {
    fn default() -> Self {
        Self {
            min_year: 1890,
            max_year: 2050,
            include_summer: true,
            include_winter: true,
        }
    }
}

/// Sex and sport filters applied to athlete rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AthleteFilter {
    /// Keep male athletes.
    pub include_male: bool,
    /// Keep female athletes.
    pub include_female: bool,
    /// Keep only athletes listed under this sport (exact match).
    pub sport: Option<String>,
}

impl AthleteFilter {
    /// Rows with an unrecognised sex label pass the sex filters.
    pub fn accepts(&self, sex: Option<Sex>, sport: Option<&str>) -> bool {
        match sex {
            Some(Sex::Male) if !self.include_male => return false,
            Some(Sex::Female) if !self.include_female => return false,
            _ => {}
        }
        match &self.sport {
            Some(wanted) => sport.is_some_and(|sport| sport == wanted),
            None => true,
        }
    }
}

impl Default for AthleteFilter {
    fn default() -> Self {
        Self {
            include_male: true,
            include_female: true,
            sport: None,
        }
    }
}

struct ListingSelectors {
    table: Selector,
    body: Selector,
    row: Selector,
    cell: Selector,
    anchor: Selector,
}

fn selectors() -> &'static ListingSelectors {
    static SELECTORS: OnceLock<ListingSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| ListingSelectors {
        table: Selector::parse("table").expect("table selector"),
        body: Selector::parse("tbody").expect("tbody selector"),
        row: Selector::parse("tr").expect("tr selector"),
        cell: Selector::parse("td").expect("td selector"),
        anchor: Selector::parse("a[href]").expect("anchor selector"),
    })
}

/// Fetches the NOC entry page and lists the Games appearances that pass `filter`.
///
/// Transport failures propagate; retrying is the caller's concern.
pub fn discover_games_links<F>(
    fetcher: &F,
    site: &Site,
    noc: &str,
    filter: &GamesFilter,
) -> Result<Vec<GamesPageRef>, DiscoveryError>
where
    F: Fetcher + ?Sized,
{
    let entry = site.entry_url(noc);
    info!(%noc, url = %entry, "collecting Games links");
    let html = fetcher.fetch(&entry)?;
    let games = parse_games_listing(&html, site, noc, filter)
        .ok_or(DiscoveryError::MissingTable { url: entry })?;
    info!(%noc, games = games.len(), "collected Games links");
    Ok(games)
}

/// Parses an NOC entry page. Returns `None` when the page has no table body.
pub fn parse_games_listing(
    html: &str,
    site: &Site,
    noc: &str,
    filter: &GamesFilter,
) -> Option<Vec<GamesPageRef>> {
    let document = Html::parse_document(html);
    let sel = selectors();
    let body = listing_body(&document)?;

    let mut games = Vec::new();
    for row in body.select(&sel.row) {
        let Some(href) = row
            .select(&sel.cell)
            .nth(1)
            .and_then(|cell| cell.select(&sel.anchor).next())
            .and_then(|anchor| anchor.value().attr("href"))
        else {
            debug!("games row without a link; skipping");
            continue;
        };
        let Some((season_segment, year)) = season_and_year(site, noc, href) else {
            debug!(%href, "games link without season/year segments; skipping");
            continue;
        };
        let Some(season) = Season::from_label(&season_segment) else {
            debug!(%href, season = %season_segment, "unknown season; skipping");
            continue;
        };
        if !filter.accepts(season, year) {
            continue;
        }
        games.push(GamesPageRef {
            season,
            year,
            url: site.games_url(noc, &season_segment, year),
        });
    }
    Some(games)
}

/// Fetches every Games page and returns the deduplicated, sorted athlete links passing `filter`.
///
/// A failed page aborts discovery.
pub fn discover_athlete_links<F>(
    fetcher: &F,
    site: &Site,
    games: &[GamesPageRef],
    filter: &AthleteFilter,
) -> Result<Vec<AthleteLink>, DiscoveryError>
where
    F: Fetcher + ?Sized,
{
    let mut links = BTreeSet::new();
    for page in games {
        let html = fetcher.fetch(&page.url)?;
        let found = parse_athlete_listing(&html, site, filter).ok_or_else(|| {
            DiscoveryError::MissingTable {
                url: page.url.clone(),
            }
        })?;
        debug!(url = %page.url, athletes = found.len(), "parsed Games page");
        links.extend(found);
    }
    info!(athletes = links.len(), "collected athlete links");
    Ok(links.into_iter().collect())
}

/// Parses one NOC/Games page into athlete links (not yet deduplicated).
pub fn parse_athlete_listing(
    html: &str,
    site: &Site,
    filter: &AthleteFilter,
) -> Option<Vec<AthleteLink>> {
    let document = Html::parse_document(html);
    let sel = selectors();
    let body = listing_body(&document)?;

    let mut links = Vec::new();
    for row in body.select(&sel.row) {
        let cells: Vec<ElementRef<'_>> = row.select(&sel.cell).collect();
        let Some(href) = cells
            .get(1)
            .and_then(|cell| cell.select(&sel.anchor).next())
            .and_then(|anchor| anchor.value().attr("href"))
        else {
            debug!("athlete row without a link; skipping");
            continue;
        };
        let sex = cells
            .get(2)
            .and_then(|cell| first_text(*cell))
            .and_then(|label| Sex::from_label(&label));
        let sport = cells
            .get(4)
            .and_then(|cell| cell.select(&sel.anchor).next())
            .map(|anchor| anchor.text().collect::<String>().trim().to_string());
        if !filter.accepts(sex, sport.as_deref()) {
            continue;
        }
        let Some((bucket, page)) = trailing_segments(site, href) else {
            debug!(%href, "athlete link too short; skipping");
            continue;
        };
        links.push(AthleteLink::new(site.athlete_url(&bucket, &page)));
    }
    Some(links)
}

fn listing_body(document: &Html) -> Option<ElementRef<'_>> {
    let sel = selectors();
    document
        .select(&sel.table)
        .next()?
        .select(&sel.body)
        .next()
}

fn path_segments(site: &Site, href: &str) -> Option<Vec<String>> {
    let url = site.resolve(href)?;
    let segments = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    Some(segments)
}

/// Season and year are the two segments after the NOC code: `/olympics/countries/AFG/summer/1936/`.
fn season_and_year(site: &Site, noc: &str, href: &str) -> Option<(String, i32)> {
    let segments = path_segments(site, href)?;
    let at = segments
        .iter()
        .position(|segment| segment.eq_ignore_ascii_case(noc.trim()))?;
    let season = segments.get(at + 1)?.to_ascii_lowercase();
    let year = segments.get(at + 2)?.parse().ok()?;
    Some((season, year))
}

/// `/olympics/athletes/ab/abdul-wahab-1.html` → (`ab`, `abdul-wahab-1.html`).
fn trailing_segments(site: &Site, href: &str) -> Option<(String, String)> {
    let mut segments = path_segments(site, href)?;
    let page = segments.pop()?;
    let bucket = segments.pop()?;
    Some((bucket, page))
}

fn first_text(cell: ElementRef<'_>) -> Option<String> {
    cell.descendants().find_map(|node| match node.value() {
        Node::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    })
}
