//! Field-by-field normalization of the joined frame into the output schema.
//!
//! Every transform is registered against one source column and runs in a fixed order. A
//! transform either fails as a whole (the frame is left untouched for that field) or succeeds
//! with per-cell failures (the failed cells become null). Nothing here aborts a run; all
//! outcomes land in the [`NormalizationReport`].

use crate::dates::DateParser;
use crate::error::FieldTransformError;
use crate::frame::{Frame, Value};
use crate::places::PlaceRecognizer;
use crate::records::{Medal, Season, Sex};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Pounds per kilogram used for pounds-only weights.
pub const LBS_PER_KG: f64 = 2.2046;

static KG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?(?:\s*[-\x{2013}]\s*\d+(?:\.\d+)?)*)\s*kg")
        .expect("kilogram pattern")
});
static LBS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?(?:\s*[-\x{2013}]\s*\d+(?:\.\d+)?)*)\s*lbs?\b")
        .expect("pound pattern")
});
static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern"));

/// Mis-decoded event spellings and their replacements, applied as substring rewrites.
const EVENT_FIXES: [(&str, &str); 5] = [
    ("\u{c3}\u{89}p\u{c3}\u{a9}e", "epee"),
    ("\u{c9}p\u{e9}e", "epee"),
    ("\u{c3}\u{97}", "x"),
    ("\u{c3}\u{2014}", "x"),
    ("\u{d7}", "x"),
];

/// Host city spellings mapped to their English names, matched against the whole cell.
const CITY_FIXES: [(&str, &str); 6] = [
    ("M\u{c3}\u{bc}nchen", "Munich"),
    ("M\u{fc}nchen", "Munich"),
    ("Montr\u{c3}\u{a9}al", "Montreal"),
    ("Montr\u{e9}al", "Montreal"),
    ("Ciudad de M\u{c3}\u{a9}xico", "Mexico City"),
    ("Ciudad de M\u{e9}xico", "Mexico City"),
];

/// Normalization tuning knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizationConfig {
    /// Date parser used for birth and death phrases.
    pub dates: DateParser,
}

/// One cell a transform could not convert; the cell is null in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    /// Source column.
    pub column: String,
    /// Zero-based row index.
    pub row: usize,
    /// Original cell text.
    pub value: String,
    /// Why conversion failed.
    pub reason: String,
}

/// Outcome of a normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizationReport {
    /// Rows in the frame.
    pub rows: usize,
    /// Source columns whose transform ran.
    pub applied: Vec<String>,
    /// Registered source columns absent from the frame.
    pub skipped: Vec<String>,
    /// Frame columns no transform knows about.
    pub unmatched: Vec<String>,
    /// Transforms that failed as a whole.
    pub transform_errors: Vec<FieldTransformError>,
    /// Individual cells that could not be converted.
    pub cell_failures: Vec<FieldFailure>,
    /// Row-level observations that are not failures, e.g. unknown Olympic editions.
    pub warnings: Vec<String>,
}

impl NormalizationReport {
    /// Cell failures recorded against `column`.
    pub fn failures_for<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a FieldFailure> {
        self.cell_failures
            .iter()
            .filter(move |failure| failure.column == column)
    }

    /// Whether nothing failed and nothing was flagged.
    pub fn is_clean(&self) -> bool {
        self.transform_errors.is_empty()
            && self.cell_failures.is_empty()
            && self.warnings.is_empty()
    }
}

/// What a transform wants written back into the frame.
struct Patch {
    outputs: Vec<(&'static str, Vec<Value>)>,
    consume: bool,
    failures: Vec<FieldFailure>,
}

impl Patch {
    fn new(consume: bool) -> Self {
        Self {
            outputs: Vec::new(),
            consume,
            failures: Vec::new(),
        }
    }

    fn output(mut self, column: &'static str, values: Vec<Value>) -> Self {
        self.outputs.push((column, values));
        self
    }
}

/// Collaborators a transform may call.
struct Tools<'a> {
    dates: &'a DateParser,
    places: &'a dyn PlaceRecognizer,
}

type TransformFn = fn(&Tools<'_>, &str, &[Value]) -> Result<Patch, FieldTransformError>;

struct FieldTransform {
    column: &'static str,
    outputs: &'static [&'static str],
    apply: TransformFn,
}

const REGISTRY: &[FieldTransform] = &[
    FieldTransform {
        column: "name",
        outputs: &["Name"],
        apply: name,
    },
    FieldTransform {
        column: "sex",
        outputs: &["Sex"],
        apply: sex,
    },
    FieldTransform {
        column: "Games",
        outputs: &["Year", "Season"],
        apply: games,
    },
    FieldTransform {
        column: "Age",
        outputs: &["Age"],
        apply: age,
    },
    FieldTransform {
        column: "City",
        outputs: &["City"],
        apply: city,
    },
    FieldTransform {
        column: "Sport",
        outputs: &["Sport"],
        apply: passthrough,
    },
    FieldTransform {
        column: "Event",
        outputs: &["Event"],
        apply: event,
    },
    FieldTransform {
        column: "Team",
        outputs: &[],
        apply: drop_column,
    },
    FieldTransform {
        column: "NOC",
        outputs: &["NOC"],
        apply: passthrough,
    },
    FieldTransform {
        column: "Rank",
        outputs: &[],
        apply: drop_column,
    },
    FieldTransform {
        column: "Medal",
        outputs: &["Medal"],
        apply: medal,
    },
    FieldTransform {
        column: "height",
        outputs: &["Height_cm"],
        apply: height,
    },
    FieldTransform {
        column: "weight",
        outputs: &["Weight_kg"],
        apply: weight,
    },
    FieldTransform {
        column: "birth",
        outputs: &["BirthDate", "BirthCity", "BirthCountry"],
        apply: birth,
    },
    FieldTransform {
        column: "death",
        outputs: &["DeathDate", "DeathCity", "DeathCountry"],
        apply: death,
    },
    FieldTransform {
        column: "affiliations",
        outputs: &["affiliations"],
        apply: passthrough,
    },
    FieldTransform {
        column: "relatives",
        outputs: &["relatives"],
        apply: passthrough,
    },
    FieldTransform {
        column: "link",
        outputs: &["link"],
        apply: passthrough,
    },
];

/// Registry-driven frame normalizer.
pub struct Normalizer<P> {
    config: NormalizationConfig,
    places: P,
}

impl<P: PlaceRecognizer> Normalizer<P> {
    /// Builds a normalizer resolving places through `places`.
    pub fn new(config: NormalizationConfig, places: P) -> Self {
        Self { config, places }
    }

    /// Returns the underlying config reference.
    pub fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    /// Source columns with a registered transform, in application order.
    pub fn registered_columns() -> impl Iterator<Item = &'static str> {
        REGISTRY.iter().map(|transform| transform.column)
    }

    /// Runs every registered transform over `frame`.
    ///
    /// Re-running over an already normalized frame is a no-op: consumed columns are gone and
    /// the kept ones are stable under their own transform.
    pub fn normalize(&self, frame: &mut Frame) -> NormalizationReport {
        let mut report = NormalizationReport {
            rows: frame.len(),
            ..NormalizationReport::default()
        };

        let known: HashSet<&str> = REGISTRY
            .iter()
            .flat_map(|transform| {
                std::iter::once(transform.column).chain(transform.outputs.iter().copied())
            })
            .collect();
        report.unmatched = frame
            .column_names()
            .filter(|column| !known.contains(column))
            .map(str::to_string)
            .collect();
        if !report.unmatched.is_empty() {
            warn!(columns = ?report.unmatched, "columns without a transform");
        }

        let tools = Tools {
            dates: &self.config.dates,
            places: &self.places,
        };
        for transform in REGISTRY {
            let Some(cells) = frame.column(transform.column) else {
                debug!(column = transform.column, "no such column, skipping");
                report.skipped.push(transform.column.to_string());
                continue;
            };
            let outcome = match (transform.apply)(&tools, transform.column, cells) {
                Ok(patch) => commit(frame, transform.column, patch),
                Err(err) => Err(err),
            };
            match outcome {
                Ok(failures) => {
                    if !failures.is_empty() {
                        debug!(
                            column = transform.column,
                            failed = failures.len(),
                            "cells nulled"
                        );
                    }
                    report.cell_failures.extend(failures);
                    report.applied.push(transform.column.to_string());
                }
                Err(err) => {
                    warn!(error = %err, "transform failed");
                    report.transform_errors.push(err);
                }
            }
        }

        info!(
            rows = report.rows,
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            cell_failures = report.cell_failures.len(),
            "normalized frame"
        );
        report
    }
}

/// Writes a patch into the frame. Either every output lands or nothing changes.
fn commit(
    frame: &mut Frame,
    column: &str,
    patch: Patch,
) -> Result<Vec<FieldFailure>, FieldTransformError> {
    for (output, values) in &patch.outputs {
        if values.len() != frame.len() {
            return Err(FieldTransformError::new(
                column,
                format!("{output} has {} cells, frame has {} rows", values.len(), frame.len()),
            ));
        }
        if *output != column && frame.has_column(output) {
            return Err(FieldTransformError::new(
                column,
                format!("output column {output} already exists"),
            ));
        }
    }

    let keeps_input = patch.outputs.iter().any(|(output, _)| *output == column);
    for (output, values) in patch.outputs {
        // Lengths were checked above.
        let _ = frame.set(output, values);
    }
    if patch.consume && !keeps_input {
        frame.take(column);
    }
    Ok(patch.failures)
}

fn cell_failure(
    column: &str,
    row: usize,
    value: &Value,
    reason: impl Into<String>,
) -> FieldFailure {
    FieldFailure {
        column: column.to_string(),
        row,
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Maps text cells through `convert`; nulls stay null, other cell kinds fail.
fn map_text<F>(column: &str, cells: &[Value], mut convert: F) -> (Vec<Value>, Vec<FieldFailure>)
where
    F: FnMut(&str) -> Result<Value, String>,
{
    let mut failures = Vec::new();
    let values = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Value::Null => Value::Null,
            Value::Text(text) => convert(text).unwrap_or_else(|reason| {
                failures.push(cell_failure(column, row, cell, reason));
                Value::Null
            }),
            other => {
                failures.push(cell_failure(column, row, other, "expected text"));
                Value::Null
            }
        })
        .collect();
    (values, failures)
}

fn passthrough(_: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    let output = REGISTRY
        .iter()
        .find(|transform| transform.column == column)
        .and_then(|transform| transform.outputs.first().copied())
        .ok_or_else(|| FieldTransformError::new(column, "no output column registered"))?;
    Ok(Patch::new(false).output(output, cells.to_vec()))
}

fn drop_column(_: &Tools<'_>, _: &str, _: &[Value]) -> Result<Patch, FieldTransformError> {
    Ok(Patch::new(true))
}

fn name(_: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    let (values, failures) = map_text(column, cells, |text| {
        let trimmed = text.trim();
        Ok(if trimmed.is_empty() {
            Value::Null
        } else {
            Value::Text(trimmed.to_string())
        })
    });
    let mut patch = Patch::new(true).output("Name", values);
    patch.failures = failures;
    Ok(patch)
}

fn sex(_: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    let (values, failures) = map_text(column, cells, |text| {
        Sex::from_label(text)
            .map(|sex| Value::Text(sex.as_str().to_string()))
            .ok_or_else(|| format!("unknown sex `{text}`"))
    });
    let mut patch = Patch::new(true).output("Sex", values);
    patch.failures = failures;
    Ok(patch)
}

fn games(_: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    let mut years = Vec::with_capacity(cells.len());
    let mut seasons = Vec::with_capacity(cells.len());
    let mut failures = Vec::new();
    for (row, cell) in cells.iter().enumerate() {
        let Some(text) = cell.as_text() else {
            if !cell.is_null() {
                failures.push(cell_failure(column, row, cell, "expected text"));
            }
            years.push(Value::Null);
            seasons.push(Value::Null);
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            years.push(Value::Null);
            seasons.push(Value::Null);
            continue;
        }
        let (year, season) = text.split_once(' ').unwrap_or((text, ""));
        match year.parse::<i64>() {
            Ok(year) => years.push(Value::Int(year)),
            Err(_) => {
                failures.push(cell_failure(column, row, cell, format!("bad year `{year}`")));
                years.push(Value::Null);
            }
        }
        match Season::from_label(season) {
            Some(season) => seasons.push(Value::Text(season.as_str().to_string())),
            None => {
                failures.push(cell_failure(column, row, cell, format!("bad season `{season}`")));
                seasons.push(Value::Null);
            }
        }
    }
    let mut patch = Patch::new(true)
        .output("Year", years)
        .output("Season", seasons);
    patch.failures = failures;
    Ok(patch)
}

fn age(_: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    let mut failures = Vec::new();
    let values = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Value::Null | Value::Int(_) => cell.clone(),
            Value::Text(text) if text.trim().is_empty() => Value::Null,
            Value::Text(text) => text.trim().parse().map(Value::Int).unwrap_or_else(|_| {
                failures.push(cell_failure(column, row, cell, "not a whole number"));
                Value::Null
            }),
            other => {
                failures.push(cell_failure(column, row, other, "not a whole number"));
                Value::Null
            }
        })
        .collect();
    let mut patch = Patch::new(false).output("Age", values);
    patch.failures = failures;
    Ok(patch)
}

fn city(_: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    let (values, failures) = map_text(column, cells, |text| {
        let fixed = CITY_FIXES
            .iter()
            .find(|(from, _)| *from == text.trim())
            .map_or(text, |(_, to)| *to);
        Ok(Value::Text(fixed.to_string()))
    });
    let mut patch = Patch::new(false).output("City", values);
    patch.failures = failures;
    Ok(patch)
}

fn event(_: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    let (values, failures) = map_text(column, cells, |text| {
        let fixed = EVENT_FIXES
            .iter()
            .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to));
        Ok(Value::Text(fixed))
    });
    let mut patch = Patch::new(false).output("Event", values);
    patch.failures = failures;
    Ok(patch)
}

fn medal(_: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    let (values, failures) = map_text(column, cells, |text| {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Medal::from_label(text)
            .map(|medal| Value::Text(medal.as_str().to_string()))
            .ok_or_else(|| format!("unknown medal `{text}`"))
    });
    let mut patch = Patch::new(false).output("Medal", values);
    patch.failures = failures;
    Ok(patch)
}

fn height(_: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    let mut failures = Vec::new();
    let values = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Value::Null => Value::Null,
            Value::Int(cm) => Value::Float(*cm as f64),
            Value::Float(_) => cell.clone(),
            Value::Text(text) => text.trim().parse().map(Value::Float).unwrap_or_else(|_| {
                failures.push(cell_failure(column, row, cell, "not a number"));
                Value::Null
            }),
            Value::Date(_) => {
                failures.push(cell_failure(column, row, cell, "not a number"));
                Value::Null
            }
        })
        .collect();
    let mut patch = Patch::new(true).output("Height_cm", values);
    patch.failures = failures;
    Ok(patch)
}

fn weight(_: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    let (values, failures) = map_text(column, cells, |text| {
        parse_weight_kg(text)
            .map(Value::Float)
            .ok_or_else(|| format!("no weight in `{text}`"))
    });
    let mut patch = Patch::new(true).output("Weight_kg", values);
    patch.failures = failures;
    Ok(patch)
}

fn birth(tools: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    life_event(tools, column, cells, ["BirthDate", "BirthCity", "BirthCountry"])
}

fn death(tools: &Tools<'_>, column: &str, cells: &[Value]) -> Result<Patch, FieldTransformError> {
    life_event(tools, column, cells, ["DeathDate", "DeathCity", "DeathCountry"])
}

/// Splits `Date in Place` cells into a date, a city and a country.
fn life_event(
    tools: &Tools<'_>,
    column: &str,
    cells: &[Value],
    outputs: [&'static str; 3],
) -> Result<Patch, FieldTransformError> {
    let mut dates = Vec::with_capacity(cells.len());
    let mut cities = Vec::with_capacity(cells.len());
    let mut countries = Vec::with_capacity(cells.len());
    let mut failures = Vec::new();

    for (row, cell) in cells.iter().enumerate() {
        let Some(text) = cell.as_text() else {
            if !cell.is_null() {
                failures.push(cell_failure(column, row, cell, "expected text"));
            }
            dates.push(Value::Null);
            cities.push(Value::Null);
            countries.push(Value::Null);
            continue;
        };
        let (date_phrase, place_phrase) = match text.split_once(" in ") {
            Some((date, place)) => (date.trim(), Some(place.trim())),
            None => (text.trim(), None),
        };

        if date_phrase.is_empty() {
            dates.push(Value::Null);
        } else {
            match tools.dates.parse(date_phrase) {
                Ok(date) => dates.push(Value::Date(date)),
                Err(err) => {
                    failures.push(cell_failure(column, row, cell, err.to_string()));
                    dates.push(Value::Null);
                }
            }
        }

        let places = place_phrase
            .map(|phrase| tools.places.recognize(phrase))
            .unwrap_or_default();
        cities.push(Value::text(places.city()));
        countries.push(Value::text(places.country()));
    }

    let [date_column, city_column, country_column] = outputs;
    let mut patch = Patch::new(true)
        .output(date_column, dates)
        .output(city_column, cities)
        .output(country_column, countries);
    patch.failures = failures;
    Ok(patch)
}

/// Kilograms from a free-text weight.
///
/// Prefers an explicit `kg` figure, then converts a `lb`/`lbs` figure, then falls back to the
/// whole text. A figure written as a range (`65-70 kg`) counts as the mean of its numbers,
/// so `70-75` gives 72.5.
pub fn parse_weight_kg(text: &str) -> Option<f64> {
    let segment = |pattern: &Regex| {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|figure| mean_of_numbers(figure.as_str()))
    };
    if let Some(kg) = segment(&*KG_PATTERN) {
        return Some(kg);
    }
    if let Some(lbs) = segment(&*LBS_PATTERN) {
        return Some(lbs / LBS_PER_KG);
    }
    mean_of_numbers(text)
}

fn mean_of_numbers(text: &str) -> Option<f64> {
    let numbers: Vec<f64> = NUMBER_PATTERN
        .find_iter(text)
        .filter_map(|number| number.as_str().parse().ok())
        .collect();
    if numbers.is_empty() {
        return None;
    }
    Some(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::Gazetteer;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn normalizer() -> Normalizer<Gazetteer> {
        Normalizer::new(NormalizationConfig::default(), Gazetteer::builtin())
    }

    fn text(value: &str) -> Value {
        Value::Text(value.to_string())
    }

    fn frame(columns: &[(&str, Vec<Value>)]) -> Frame {
        let rows = columns.first().map_or(0, |(_, cells)| cells.len());
        let mut frame = Frame::with_rows(rows);
        for (name, cells) in columns {
            frame.set(name, cells.clone()).unwrap();
        }
        frame
    }

    #[test]
    fn games_splits_year_and_season() {
        let mut frame = frame(&[(
            "Games",
            vec![text("1956 Equestrian"), text("1988 Winter"), Value::Null],
        )]);
        let report = normalizer().normalize(&mut frame);
        assert!(!frame.has_column("Games"));
        assert_eq!(
            frame.column("Year").unwrap(),
            &[Value::Int(1956), Value::Int(1988), Value::Null]
        );
        assert_eq!(
            frame.column("Season").unwrap(),
            &[text("Summer"), text("Winter"), Value::Null]
        );
        assert!(report.cell_failures.is_empty());
    }

    #[test]
    fn medal_blank_is_null_and_unknown_fails() {
        let mut frame = frame(&[("Medal", vec![text(""), text("Gold"), text("Tin")])]);
        let report = normalizer().normalize(&mut frame);
        assert_eq!(
            frame.column("Medal").unwrap(),
            &[Value::Null, text("Gold"), Value::Null]
        );
        let failures: Vec<_> = report.failures_for("Medal").collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].row, 2);
        assert_eq!(failures[0].value, "Tin");
    }

    #[test]
    fn age_blank_is_null_and_garbage_fails() {
        let mut frame = frame(&[("Age", vec![text("26"), text(""), text("old")])]);
        let report = normalizer().normalize(&mut frame);
        assert_eq!(
            frame.column("Age").unwrap(),
            &[Value::Int(26), Value::Null, Value::Null]
        );
        assert_eq!(report.failures_for("Age").count(), 1);
    }

    #[test]
    fn weight_prefers_kilograms() {
        assert_eq!(parse_weight_kg("154 lbs (70 kg)"), Some(70.0));
        assert_eq!(parse_weight_kg("154 lbs"), Some(154.0 / LBS_PER_KG));
        assert_eq!(parse_weight_kg("70-75"), Some(72.5));
        assert_eq!(parse_weight_kg("65-70 kg"), Some(67.5));
        assert_eq!(parse_weight_kg("143-154 lbs"), Some(148.5 / LBS_PER_KG));
        assert_eq!(parse_weight_kg("143-154 lbs (65-70 kg)"), Some(67.5));
        assert_eq!(parse_weight_kg("unknown"), None);
    }

    #[test]
    fn weight_without_numbers_is_a_cell_failure() {
        let mut frame = frame(&[("weight", vec![text("heavy"), text("70 kg")])]);
        let report = normalizer().normalize(&mut frame);
        assert_eq!(
            frame.column("Weight_kg").unwrap(),
            &[Value::Null, Value::Float(70.0)]
        );
        assert_eq!(report.failures_for("weight").count(), 1);
    }

    #[test]
    fn birth_splits_date_and_place() {
        let mut frame = frame(&[(
            "birth",
            vec![text("June 15, 1950 in Seoul, South Korea"), text("1950")],
        )]);
        let report = normalizer().normalize(&mut frame);
        assert!(report.cell_failures.is_empty());
        assert_eq!(
            frame.column("BirthDate").unwrap(),
            &[
                Value::Date(NaiveDate::from_ymd_opt(1950, 6, 15).unwrap()),
                Value::Date(NaiveDate::from_ymd_opt(1950, 4, 21).unwrap()),
            ]
        );
        assert_eq!(
            frame.column("BirthCity").unwrap(),
            &[text("Seoul"), Value::Null]
        );
        assert_eq!(
            frame.column("BirthCountry").unwrap(),
            &[text("South Korea"), Value::Null]
        );
        assert!(!frame.has_column("birth"));
    }

    #[test]
    fn unparsable_death_date_keeps_place() {
        let mut frame = frame(&[("death", vec![text("sometime in Kabul, Afghanistan")])]);
        let report = normalizer().normalize(&mut frame);
        assert_eq!(frame.column("DeathDate").unwrap(), &[Value::Null]);
        assert_eq!(frame.column("DeathCity").unwrap(), &[text("Kabul")]);
        assert_eq!(report.failures_for("death").count(), 1);
    }

    #[test]
    fn repairs_event_and_city_spellings() {
        let mut frame = frame(&[
            (
                "Event",
                vec![
                    text("\u{c3}\u{89}p\u{c3}\u{a9}e, Individual"),
                    text("4 \u{d7} 100 metres Relay"),
                ],
            ),
            (
                "City",
                vec![text("M\u{c3}\u{bc}nchen"), text("Montr\u{e9}al")],
            ),
        ]);
        normalizer().normalize(&mut frame);
        assert_eq!(
            frame.column("Event").unwrap(),
            &[text("epee, Individual"), text("4 x 100 metres Relay")]
        );
        assert_eq!(
            frame.column("City").unwrap(),
            &[text("Munich"), text("Montreal")]
        );
    }

    #[test]
    fn drops_team_and_rank_and_reports_unknown_columns() {
        let mut frame = frame(&[
            ("Team", vec![text("Korea")]),
            ("Rank", vec![text("1")]),
            ("Flag", vec![text("x")]),
        ]);
        let report = normalizer().normalize(&mut frame);
        assert_eq!(frame.column_names().collect::<Vec<_>>(), vec!["Flag"]);
        assert_eq!(report.unmatched, vec!["Flag".to_string()]);
        assert!(report.skipped.contains(&"Games".to_string()));
    }

    #[test]
    fn conflicting_output_leaves_frame_unchanged() {
        let mut frame = frame(&[
            ("Games", vec![text("2000 Summer")]),
            ("Year", vec![Value::Int(1999)]),
        ]);
        let report = normalizer().normalize(&mut frame);
        assert_eq!(report.transform_errors.len(), 1);
        assert_eq!(report.transform_errors[0].column, "Games");
        assert_eq!(frame.column("Games").unwrap(), &[text("2000 Summer")]);
        assert_eq!(frame.column("Year").unwrap(), &[Value::Int(1999)]);
        assert!(!frame.has_column("Season"));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut frame = frame(&[
            ("name", vec![text("Kim Min-Su")]),
            ("sex", vec![text("Male")]),
            ("height", vec![Value::Int(175)]),
            ("weight", vec![text("154 lbs (70 kg)")]),
            ("birth", vec![text("June 15, 1950 in Seoul, South Korea")]),
            ("death", vec![Value::Null]),
            ("affiliations", vec![Value::Null]),
            ("relatives", vec![Value::Null]),
            ("link", vec![text("https://site.test/athletes/ki/kim-1.html")]),
            ("Games", vec![text("1976 Summer")]),
            ("Age", vec![text("26")]),
            ("City", vec![text("Montr\u{c3}\u{a9}al")]),
            ("Sport", vec![text("Wrestling")]),
            ("Event", vec![text("Featherweight")]),
            ("Team", vec![text("South Korea")]),
            ("NOC", vec![text("KOR")]),
            ("Rank", vec![text("1")]),
            ("Medal", vec![text("Gold")]),
        ]);
        let normalizer = normalizer();
        let first = normalizer.normalize(&mut frame);
        assert!(first.is_clean(), "{first:?}");
        assert!(first.unmatched.is_empty());
        let snapshot = frame.clone();

        let second = normalizer.normalize(&mut frame);
        assert_eq!(frame, snapshot);
        assert!(second.is_clean());
        assert!(second.unmatched.is_empty());
        assert!(second.skipped.contains(&"Games".to_string()));
        assert!(second.applied.contains(&"Medal".to_string()));

        let row = &frame.to_rows()[0];
        assert_eq!(row.year, Some(1976));
        assert_eq!(row.season, Some(Season::Summer));
        assert_eq!(row.city.as_deref(), Some("Montreal"));
        assert_eq!(row.name.as_deref(), Some("Kim Min-Su"));
        assert_eq!(row.sex, Some(Sex::Male));
        assert_eq!(row.age, Some(26));
        assert_eq!(row.height_cm, Some(175.0));
        assert_eq!(row.weight_kg, Some(70.0));
        assert_eq!(row.medal, Some(Medal::Gold));
        assert_eq!(row.birth_city.as_deref(), Some("Seoul"));
        assert_eq!(row.death_date, None);
    }
}
