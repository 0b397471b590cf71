//! Sanity check of normalized rows against the list of Olympic editions.

use crate::records::{NormalizedRow, Season};
use std::collections::BTreeSet;

const SUMMER_EDITIONS: &[i32] = &[
    1896, 1900, 1904, 1906, 1908, 1912, 1920, 1924, 1928, 1932, 1936, 1948, 1952, 1956, 1960,
    1964, 1968, 1972, 1976, 1980, 1984, 1988, 1992, 1996, 2000, 2004, 2008, 2012, 2016, 2020,
    2024, 2028, 2032,
];

const WINTER_EDITIONS: &[i32] = &[
    1924, 1928, 1932, 1936, 1948, 1952, 1956, 1960, 1964, 1968, 1972, 1976, 1980, 1984, 1988,
    1992, 1994, 1998, 2002, 2006, 2010, 2014, 2018, 2022, 2026, 2030,
];

/// Whether `year` hosted Games of `season`.
pub fn is_known_edition(year: i32, season: Season) -> bool {
    let editions = match season {
        Season::Summer => SUMMER_EDITIONS,
        Season::Winter => WINTER_EDITIONS,
    };
    editions.binary_search(&year).is_ok()
}

/// One warning per distinct (year, season) pair that is not a known edition.
///
/// Rows without a year are not checked; a year without a season passes if either season
/// had Games that year.
pub fn validate_editions(rows: &[NormalizedRow]) -> Vec<String> {
    let mut unknown = BTreeSet::new();
    for row in rows {
        let Some(year) = row.year else {
            continue;
        };
        let known = match row.season {
            Some(season) => is_known_edition(year, season),
            None => {
                is_known_edition(year, Season::Summer) || is_known_edition(year, Season::Winter)
            }
        };
        if !known {
            unknown.insert((year, row.season));
        }
    }

    unknown
        .into_iter()
        .map(|(year, season)| match season {
            Some(season) => format!("{year} {season} is not a known Olympic edition"),
            None => format!("{year} is not a known Olympic year"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: Option<i32>, season: Option<Season>) -> NormalizedRow {
        NormalizedRow {
            year,
            season,
            city: None,
            sport: None,
            event: None,
            noc: None,
            name: None,
            sex: None,
            age: None,
            height_cm: None,
            weight_kg: None,
            medal: None,
            birth_date: None,
            birth_city: None,
            birth_country: None,
            death_date: None,
            death_city: None,
            death_country: None,
            affiliations: None,
            relatives: None,
            link: None,
        }
    }

    #[test]
    fn knows_intercalated_and_offset_games() {
        assert!(is_known_edition(1906, Season::Summer));
        assert!(is_known_edition(1994, Season::Winter));
        assert!(!is_known_edition(1994, Season::Summer));
        assert!(!is_known_edition(1940, Season::Summer));
    }

    #[test]
    fn warns_once_per_unknown_edition() {
        let rows = vec![
            row(Some(1956), Some(Season::Summer)),
            row(Some(1996), Some(Season::Winter)),
            row(Some(1996), Some(Season::Winter)),
            row(Some(1917), None),
            row(None, Some(Season::Summer)),
        ];
        assert_eq!(
            validate_editions(&rows),
            vec![
                "1917 is not a known Olympic year".to_string(),
                "1996 Winter is not a known Olympic edition".to_string(),
            ]
        );
    }
}
