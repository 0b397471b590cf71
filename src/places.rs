//! Place-name recognition for birth and death places.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;

const BUILTIN_CITIES: &str = include_str!("gazetteer/cities.txt");
const BUILTIN_COUNTRIES: &str = include_str!("gazetteer/countries.txt");
const BUILTIN_CODES: &str = include_str!("gazetteer/codes.txt");

/// Recognised names, in the order they appear in the text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Places {
    /// Recognised city names.
    pub cities: Vec<String>,
    /// Recognised country names, including ones resolved from codes.
    pub countries: Vec<String>,
}

impl Places {
    /// First recognised city.
    pub fn city(&self) -> Option<&str> {
        self.cities.first().map(String::as_str)
    }

    /// First recognised country.
    pub fn country(&self) -> Option<&str> {
        self.countries.first().map(String::as_str)
    }
}

/// Classifies free text into city and country names.
pub trait PlaceRecognizer {
    /// Recognised cities and countries in `text`.
    fn recognize(&self, text: &str) -> Places;
}

/// Loading an extra gazetteer file failed.
#[derive(Debug, Error)]
pub enum GazetteerError {
    /// The file could not be read.
    #[error("failed to read gazetteer {path}: {source}")]
    Io {
        /// Gazetteer path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid gazetteer document.
    #[error("invalid gazetteer {path}: {source}")]
    Json {
        /// Gazetteer path.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
struct GazetteerFile {
    #[serde(default)]
    cities: Vec<String>,
    #[serde(default)]
    countries: Vec<String>,
    /// NOC/ISO style three-letter codes mapped to country names.
    #[serde(default)]
    codes: BTreeMap<String, String>,
}

/// Dictionary-backed recogniser.
///
/// Scans comma and parenthesis separated segments for the longest known phrase at each word.
/// Matching is case-insensitive; three-letter codes such as `(KOR)` resolve to their country.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    cities: HashMap<String, String>,
    countries: HashMap<String, String>,
    codes: HashMap<String, String>,
    longest_phrase: usize,
}

impl Gazetteer {
    /// Gazetteer seeded with the bundled lists.
    pub fn builtin() -> Self {
        let mut gazetteer = Self::default();
        for city in non_blank_lines(BUILTIN_CITIES) {
            gazetteer.add_city(city);
        }
        for country in non_blank_lines(BUILTIN_COUNTRIES) {
            gazetteer.add_country(country);
        }
        for line in non_blank_lines(BUILTIN_CODES) {
            if let Some((code, country)) = line.split_once('\t') {
                gazetteer.add_code(code, country);
            }
        }
        gazetteer
    }

    /// Gazetteer containing only the given names.
    pub fn from_lists<C, K>(cities: C, countries: K) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        let mut gazetteer = Self::default();
        for city in cities {
            gazetteer.add_city(city.as_ref());
        }
        for country in countries {
            gazetteer.add_country(country.as_ref());
        }
        gazetteer
    }

    /// Adds names from a JSON file shaped `{ "cities": [], "countries": [], "codes": {} }`.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<(), GazetteerError> {
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| GazetteerError::Io {
            path: display.clone(),
            source,
        })?;
        let file: GazetteerFile =
            serde_json::from_str(&raw).map_err(|source| GazetteerError::Json {
                path: display,
                source,
            })?;
        for city in &file.cities {
            self.add_city(city);
        }
        for country in &file.countries {
            self.add_country(country);
        }
        for (code, country) in &file.codes {
            self.add_code(code, country);
        }
        Ok(())
    }

    /// Registers a city name.
    pub fn add_city(&mut self, name: &str) {
        self.add_phrase(name, PhraseKind::City);
    }

    /// Registers a country name.
    pub fn add_country(&mut self, name: &str) {
        self.add_phrase(name, PhraseKind::Country);
    }

    /// Maps a three-letter code to a country name.
    pub fn add_code(&mut self, code: &str, country: &str) {
        let code = code.trim();
        let country = country.trim();
        if code.is_empty() || country.is_empty() {
            return;
        }
        self.codes
            .insert(code.to_ascii_uppercase(), country.to_string());
    }

    fn add_phrase(&mut self, name: &str, kind: PhraseKind) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let key = phrase_key(name);
        self.longest_phrase = self.longest_phrase.max(key.split(' ').count());
        let table = match kind {
            PhraseKind::City => &mut self.cities,
            PhraseKind::Country => &mut self.countries,
        };
        table.entry(key).or_insert_with(|| name.to_string());
    }

    fn scan_segment(&self, segment: &str, places: &mut Places) {
        let words: Vec<&str> = segment.split_whitespace().collect();
        let mut start = 0;
        while start < words.len() {
            let longest = self.longest_phrase.min(words.len() - start);
            let mut matched = 0;
            for len in (1..=longest).rev() {
                let phrase = words[start..start + len].join(" ");
                if self.classify(&phrase, places) {
                    matched = len;
                    break;
                }
            }
            start += matched.max(1);
        }
    }

    fn classify(&self, phrase: &str, places: &mut Places) -> bool {
        let key = phrase_key(phrase);
        let mut found = false;
        if let Some(city) = self.cities.get(&key) {
            places.cities.push(city.clone());
            found = true;
        }
        if let Some(country) = self.countries.get(&key) {
            places.countries.push(country.clone());
            found = true;
        }
        if !found && is_code(phrase) {
            if let Some(country) = self.codes.get(phrase) {
                places.countries.push(country.clone());
                found = true;
            }
        }
        found
    }
}

impl PlaceRecognizer for Gazetteer {
    fn recognize(&self, text: &str) -> Places {
        let mut places = Places::default();
        for segment in text.split([',', ';', '(', ')']) {
            self.scan_segment(segment, &mut places);
        }
        places
    }
}

#[derive(Clone, Copy)]
enum PhraseKind {
    City,
    Country,
}

fn phrase_key(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_code(phrase: &str) -> bool {
    phrase.len() == 3 && phrase.chars().all(|c| c.is_ascii_uppercase())
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}
