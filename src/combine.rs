//! Concatenation of per-NOC tables into one deduplicated dataset.

use crate::error::OutputError;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Rows gathered from several tables sharing one header.
#[derive(Debug, Clone, Default)]
pub struct Combined {
    /// Header shared by every input.
    pub header: csv::StringRecord,
    /// Distinct rows in first-seen order.
    pub rows: Vec<csv::StringRecord>,
    /// Exact duplicates that were dropped.
    pub duplicates: usize,
}

impl Combined {
    /// Appends the rows of one table, checking its header against the first one seen.
    pub fn extend_from_reader<R: Read>(
        &mut self,
        source: &str,
        reader: R,
    ) -> Result<(), OutputError> {
        let mut csv = csv::Reader::from_reader(reader);
        let header = csv.headers()?.clone();
        if self.header.is_empty() {
            self.header = header;
        } else if !header.iter().eq(self.header.iter()) {
            return Err(OutputError::HeaderMismatch {
                path: source.to_string(),
                expected: self.header.iter().map(str::to_string).collect(),
                found: header.iter().map(str::to_string).collect(),
            });
        }

        let mut seen: HashSet<Vec<String>> = self.rows.iter().map(row_key).collect();
        let mut added = 0;
        for record in csv.records() {
            let record = record?;
            if seen.insert(row_key(&record)) {
                self.rows.push(record);
                added += 1;
            } else {
                self.duplicates += 1;
            }
        }
        debug!(source, added, "combined table");
        Ok(())
    }

    /// Writes the header and the distinct rows.
    pub fn write<W: Write>(&self, writer: W) -> Result<(), OutputError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.header)?;
        for row in &self.rows {
            csv.write_record(row)?;
        }
        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

fn row_key(record: &csv::StringRecord) -> Vec<String> {
    record.iter().map(str::to_string).collect()
}

/// Reads every table in `paths`, in order, dropping exact duplicate rows.
pub fn combine<P: AsRef<Path>>(paths: &[P]) -> Result<Combined, OutputError> {
    let mut combined = Combined::default();
    for path in paths {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| OutputError::io(path, err))?;
        combined.extend_from_reader(&path.display().to_string(), file)?;
    }
    info!(
        tables = paths.len(),
        rows = combined.rows.len(),
        duplicates = combined.duplicates,
        "combined tables"
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn drops_duplicates_across_tables() {
        let dir = tempfile::tempdir().unwrap();
        let afg = dir.path().join("AFG.csv");
        let zim = dir.path().join("ZIM.csv");
        fs::write(&afg, "Year,Name\n1936,A\n1948,B\n1936,A\n").unwrap();
        fs::write(&zim, "Year,Name\n1948,B\n1980,C\n").unwrap();

        let combined = combine(&[afg, zim]).unwrap();
        assert_eq!(combined.duplicates, 2);
        let mut out = Vec::new();
        combined.write(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Year,Name\n1936,A\n1948,B\n1980,C\n"
        );
    }

    #[test]
    fn rejects_mismatched_headers() {
        let mut combined = Combined::default();
        combined
            .extend_from_reader("a", "Year,Name\n1936,A\n".as_bytes())
            .unwrap();
        let err = combined
            .extend_from_reader("b", "Name,Year\nA,1936\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, OutputError::HeaderMismatch { .. }));
    }
}
