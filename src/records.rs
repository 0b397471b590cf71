//! Record types flowing between the pipeline stages.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Olympic season as it appears in link paths and the normalized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    /// Summer Games (including the 1956 equestrian events held in Stockholm).
    Summer,
    /// Winter Games.
    Winter,
}

impl Season {
    /// Parses a season label, case-insensitively.
    ///
    /// `Equestrian` maps to `Summer`: the 1956 equestrian events were held apart from the
    /// Melbourne Games but belong to that edition.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "summer" | "equestrian" => Some(Self::Summer),
            "winter" => Some(Self::Winter),
            _ => None,
        }
    }

    /// Capitalized label used in output tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summer => "Summer",
            Self::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Athlete sex as published in the info box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    /// Male.
    Male,
    /// Female.
    Female,
}

impl Sex {
    /// Parses `Male` / `Female` (case-insensitive, `M` / `F` accepted).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            _ => None,
        }
    }

    /// Label used in output tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

/// Medal won for a result, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Medal {
    /// First place.
    Gold,
    /// Second place.
    Silver,
    /// Third place.
    Bronze,
}

impl Medal {
    /// Parses a medal label. Blank input is not a medal and yields `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Gold" => Some(Self::Gold),
            "Silver" => Some(Self::Silver),
            "Bronze" => Some(Self::Bronze),
            _ => None,
        }
    }

    /// Label used in output tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "Gold",
            Self::Silver => "Silver",
            Self::Bronze => "Bronze",
        }
    }
}

/// One Games appearance of an NOC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamesPageRef {
    /// Season segment of the link.
    pub season: Season,
    /// Year segment of the link.
    pub year: i32,
    /// Absolute URL of the NOC/Games page.
    pub url: String,
}

/// Canonical athlete page URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AthleteLink(String);

impl AthleteLink {
    /// Wraps an absolute athlete URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AthleteLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Info box contents for one athlete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BiographyRecord {
    /// Page heading.
    pub name: Option<String>,
    /// `Gender:` line.
    pub sex: Option<Sex>,
    /// Centimetres from the `(NNN cm)` suffix of the height line.
    pub height_cm: Option<i64>,
    /// Raw weight text, e.g. `154 lbs (70 kg)`.
    pub weight: Option<String>,
    /// Raw birth text, e.g. `June 15, 1950 in Seoul, South Korea`.
    pub birth: Option<String>,
    /// Raw death text, same shape as `birth`.
    pub death: Option<String>,
    /// Clubs and schools, as published.
    pub affiliations: Option<String>,
    /// Related Olympians, as published.
    pub relatives: Option<String>,
    /// Page the record came from.
    pub source_link: String,
}

impl BiographyRecord {
    /// Empty record for `source_link`; every field starts out null.
    pub fn new(source_link: impl Into<String>) -> Self {
        Self {
            source_link: source_link.into(),
            ..Self::default()
        }
    }
}

/// Column names of a raw results row, in extraction order.
pub const RESULT_COLUMNS: [&str; 9] = [
    "Games", "Age", "City", "Sport", "Event", "Team", "NOC", "Rank", "Medal",
];

/// One row of an athlete's results table, bound by position at extraction time.
///
/// Cells beyond the ninth are ignored; missing trailing cells stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    /// `1976 Summer`.
    pub games: Option<String>,
    /// Age at the Games.
    pub age: Option<String>,
    /// Host city.
    pub city: Option<String>,
    /// Sport.
    pub sport: Option<String>,
    /// Event.
    pub event: Option<String>,
    /// Team name.
    pub team: Option<String>,
    /// NOC code.
    pub noc: Option<String>,
    /// Finishing position.
    pub rank: Option<String>,
    /// Medal label, blank when none.
    pub medal: Option<String>,
}

impl ResultRow {
    /// Binds cells positionally to `[Games, Age, City, Sport, Event, Team, NOC, Rank, Medal]`.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut cells = cells.into_iter().fuse();
        let mut next = || cells.next();
        Self {
            games: next(),
            age: next(),
            city: next(),
            sport: next(),
            event: next(),
            team: next(),
            noc: next(),
            rank: next(),
            medal: next(),
        }
    }

    /// Fields in [`RESULT_COLUMNS`] order.
    pub fn fields(&self) -> [Option<&str>; 9] {
        [
            self.games.as_deref(),
            self.age.as_deref(),
            self.city.as_deref(),
            self.sport.as_deref(),
            self.event.as_deref(),
            self.team.as_deref(),
            self.noc.as_deref(),
            self.rank.as_deref(),
            self.medal.as_deref(),
        ]
    }

    /// Number of leading cells that were present at extraction.
    pub fn width(&self) -> usize {
        self.fields().iter().take_while(|field| field.is_some()).count()
    }
}

/// Final typed row written to the output table.
///
/// Every column is nullable: a failed transform nulls its outputs rather than discarding the row.
/// Field names follow the output header given by the serde renames.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Season")]
    pub season: Option<Season>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Sport")]
    pub sport: Option<String>,
    #[serde(rename = "Event")]
    pub event: Option<String>,
    #[serde(rename = "NOC")]
    pub noc: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Sex")]
    pub sex: Option<Sex>,
    #[serde(rename = "Age")]
    pub age: Option<i64>,
    #[serde(rename = "Height_cm")]
    pub height_cm: Option<f64>,
    #[serde(rename = "Weight_kg")]
    pub weight_kg: Option<f64>,
    #[serde(rename = "Medal")]
    pub medal: Option<Medal>,
    #[serde(rename = "BirthDate")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "BirthCity")]
    pub birth_city: Option<String>,
    #[serde(rename = "BirthCountry")]
    pub birth_country: Option<String>,
    #[serde(rename = "DeathDate")]
    pub death_date: Option<NaiveDate>,
    #[serde(rename = "DeathCity")]
    pub death_city: Option<String>,
    #[serde(rename = "DeathCountry")]
    pub death_country: Option<String>,
    /// Passed through unchanged.
    pub affiliations: Option<String>,
    /// Passed through unchanged.
    pub relatives: Option<String>,
    /// Athlete page.
    pub link: Option<String>,
}

/// Output column order of [`NormalizedRow`].
pub const OUTPUT_COLUMNS: [&str; 21] = [
    "Year",
    "Season",
    "City",
    "Sport",
    "Event",
    "NOC",
    "Name",
    "Sex",
    "Age",
    "Height_cm",
    "Weight_kg",
    "Medal",
    "BirthDate",
    "BirthCity",
    "BirthCountry",
    "DeathDate",
    "DeathCity",
    "DeathCountry",
    "affiliations",
    "relatives",
    "link",
];
