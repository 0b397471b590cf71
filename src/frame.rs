//! Column-oriented table the field normalizer works on.

use crate::join::JoinedRow;
use crate::records::{Medal, NormalizedRow, Season, Sex};
use chrono::NaiveDate;
use std::fmt;

/// Source columns of a freshly joined frame, in order.
pub const SOURCE_COLUMNS: [&str; 18] = [
    "name",
    "sex",
    "height",
    "weight",
    "birth",
    "death",
    "affiliations",
    "relatives",
    "link",
    "Games",
    "Age",
    "City",
    "Sport",
    "Event",
    "Team",
    "NOC",
    "Rank",
    "Medal",
];

/// A single cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Missing or failed value.
    #[default]
    Null,
    /// Free text.
    Text(String),
    /// Whole number.
    Int(i64),
    /// Real number.
    Float(f64),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Text cell, or null for `None`.
    pub fn text(value: Option<&str>) -> Self {
        value.map_or(Self::Null, |text| Self::Text(text.to_string()))
    }

    /// Whether the cell is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text contents, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integer contents, if this is an integer cell.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric contents; integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Date contents, if this is a date cell.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Date(date) => write!(f, "{date}"),
        }
    }
}

/// Named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<(String, Vec<Value>)>,
    rows: usize,
}

impl Frame {
    /// Empty frame with `rows` rows and no columns.
    pub fn with_rows(rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            rows,
        }
    }

    /// Builds the source frame: biography columns first, then the nine result columns.
    pub fn from_joined(rows: &[JoinedRow]) -> Self {
        let mut columns: Vec<Vec<Value>> =
            vec![Vec::with_capacity(rows.len()); SOURCE_COLUMNS.len()];
        for row in rows {
            let bio = row.biography.as_ref();
            let cells = [
                Value::text(bio.and_then(|b| b.name.as_deref())),
                Value::text(bio.and_then(|b| b.sex).map(|sex| sex.as_str())),
                bio.and_then(|b| b.height_cm).map_or(Value::Null, Value::Int),
                Value::text(bio.and_then(|b| b.weight.as_deref())),
                Value::text(bio.and_then(|b| b.birth.as_deref())),
                Value::text(bio.and_then(|b| b.death.as_deref())),
                Value::text(bio.and_then(|b| b.affiliations.as_deref())),
                Value::text(bio.and_then(|b| b.relatives.as_deref())),
                Value::Text(row.link.as_str().to_string()),
            ];
            let results = row.result.fields().map(Value::text);
            for (column, cell) in columns.iter_mut().zip(cells.into_iter().chain(results)) {
                column.push(cell);
            }
        }

        Self {
            columns: SOURCE_COLUMNS
                .iter()
                .map(|name| name.to_string())
                .zip(columns)
                .collect(),
            rows: rows.len(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in frame order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Whether `name` is a column.
    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Cells of column `name`.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.position(name).map(|at| self.columns[at].1.as_slice())
    }

    /// Cell at `row` of column `name`; out-of-range lookups are null.
    pub fn cell(&self, name: &str, row: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.column(name).and_then(|cells| cells.get(row)).unwrap_or(&NULL)
    }

    /// Replaces column `name` in place, or appends it.
    ///
    /// Returns the values back when their length does not match the frame.
    pub fn set(&mut self, name: &str, values: Vec<Value>) -> Result<(), Vec<Value>> {
        if values.len() != self.rows {
            return Err(values);
        }
        match self.position(name) {
            Some(at) => self.columns[at].1 = values,
            None => self.columns.push((name.to_string(), values)),
        }
        Ok(())
    }

    /// Removes and returns column `name`.
    pub fn take(&mut self, name: &str) -> Option<Vec<Value>> {
        let at = self.position(name)?;
        Some(self.columns.remove(at).1)
    }

    /// Converts every row into the output record. Absent columns read as null.
    pub fn to_rows(&self) -> Vec<NormalizedRow> {
        (0..self.rows).map(|row| self.row(row)).collect()
    }

    fn row(&self, row: usize) -> NormalizedRow {
        let text = |name: &str| self.cell(name, row).as_text().map(str::to_string);
        NormalizedRow {
            year: self
                .cell("Year", row)
                .as_int()
                .and_then(|year| i32::try_from(year).ok()),
            season: self
                .cell("Season", row)
                .as_text()
                .and_then(Season::from_label),
            city: text("City"),
            sport: text("Sport"),
            event: text("Event"),
            noc: text("NOC"),
            name: text("Name"),
            sex: self.cell("Sex", row).as_text().and_then(Sex::from_label),
            age: self.cell("Age", row).as_int(),
            height_cm: self.cell("Height_cm", row).as_float(),
            weight_kg: self.cell("Weight_kg", row).as_float(),
            medal: self.cell("Medal", row).as_text().and_then(Medal::from_label),
            birth_date: self.cell("BirthDate", row).as_date(),
            birth_city: text("BirthCity"),
            birth_country: text("BirthCountry"),
            death_date: self.cell("DeathDate", row).as_date(),
            death_city: text("DeathCity"),
            death_country: text("DeathCountry"),
            affiliations: text("affiliations"),
            relatives: text("relatives"),
            link: text("link"),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(column, _)| column == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{AthleteLink, BiographyRecord, ResultRow};
    use pretty_assertions::assert_eq;

    fn joined() -> Vec<JoinedRow> {
        let link = AthleteLink::new("https://site.test/athletes/ki/kim-1.html");
        let mut bio = BiographyRecord::new(link.as_str());
        bio.name = Some("Kim".into());
        bio.sex = Some(Sex::Male);
        bio.height_cm = Some(175);
        vec![
            JoinedRow {
                link: link.clone(),
                biography: Some(bio),
                result: ResultRow::from_cells(
                    ["1988 Summer", "20", "Seoul", "Judo", "Lightweight"]
                        .into_iter()
                        .map(String::from),
                ),
            },
            JoinedRow {
                link,
                biography: None,
                result: ResultRow::default(),
            },
        ]
    }

    #[test]
    fn builds_source_columns_in_order() {
        let frame = Frame::from_joined(&joined());
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.column_names().collect::<Vec<_>>(), SOURCE_COLUMNS.to_vec());
        assert_eq!(frame.cell("height", 0), &Value::Int(175));
        assert_eq!(frame.cell("Event", 0), &Value::Text("Lightweight".into()));
        assert_eq!(frame.cell("Team", 0), &Value::Null);
        assert_eq!(frame.cell("name", 1), &Value::Null);
        assert_eq!(
            frame.cell("link", 1),
            &Value::Text("https://site.test/athletes/ki/kim-1.html".into())
        );
    }

    #[test]
    fn set_rejects_wrong_length() {
        let mut frame = Frame::with_rows(2);
        assert!(frame.set("Year", vec![Value::Int(1)]).is_err());
        assert!(frame.set("Year", vec![Value::Int(1), Value::Null]).is_ok());
        assert_eq!(frame.take("Year").map(|cells| cells.len()), Some(2));
        assert!(!frame.has_column("Year"));
    }

    #[test]
    fn unnormalized_frame_reads_as_nulls() {
        let rows = Frame::from_joined(&joined()).to_rows();
        assert_eq!(rows[0].year, None);
        assert_eq!(rows[0].city.as_deref(), Some("Seoul"));
        assert_eq!(rows[0].name, None);
        assert_eq!(rows[1].link.as_deref(), Some("https://site.test/athletes/ki/kim-1.html"));
    }
}
