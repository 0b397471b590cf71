//! Flat-file persistence: the normalized table and its sidecar files.

use crate::error::OutputError;
use crate::records::{AthleteLink, NormalizedRow, OUTPUT_COLUMNS};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Where one NOC's outputs land under an output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// `{out}/{NOC}.csv`
    pub table: PathBuf,
    /// `{out}/missing/{NOC}_missing.txt`
    pub missing: PathBuf,
    /// `{out}/reports/{NOC}_report.json`
    pub report: PathBuf,
}

impl OutputPaths {
    /// Paths for `noc` under `out_dir`.
    pub fn for_noc(out_dir: &Path, noc: &str) -> Self {
        Self {
            table: out_dir.join(format!("{noc}.csv")),
            missing: out_dir.join("missing").join(format!("{noc}_missing.txt")),
            report: out_dir.join("reports").join(format!("{noc}_report.json")),
        }
    }
}

/// Writes `rows` as CSV with a header row, even when there are no rows.
pub fn write_table<W: Write>(writer: W, rows: &[NormalizedRow]) -> Result<(), OutputError> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(OUTPUT_COLUMNS)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes one link per line.
pub fn write_failed_links<'a, W, I>(mut writer: W, links: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a AthleteLink>,
{
    for link in links {
        writeln!(writer, "{link}")?;
    }
    writer.flush()
}

/// Writes `report` as pretty-printed JSON.
pub fn write_report<W: Write, T: Serialize>(mut writer: W, report: &T) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer).map_err(serde_json::Error::io)?;
    Ok(())
}

/// Writes the table and report for one NOC, plus the failed-link file when any link failed.
pub fn write_noc_outputs<T: Serialize>(
    paths: &OutputPaths,
    rows: &[NormalizedRow],
    failed_links: &[AthleteLink],
    report: &T,
) -> Result<(), OutputError> {
    write_table(create(&paths.table)?, rows)?;
    write_report(create(&paths.report)?, report)?;
    if !failed_links.is_empty() {
        write_failed_links(create(&paths.missing)?, failed_links)
            .map_err(|err| OutputError::io(&paths.missing, err))?;
    }
    Ok(())
}

/// Buffered file at `path`, creating parent directories as needed.
pub(crate) fn create(path: &Path) -> Result<BufWriter<File>, OutputError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| OutputError::io(parent, err))?;
    }
    let file = File::create(path).map_err(|err| OutputError::io(path, err))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Medal, Season, Sex};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn row() -> NormalizedRow {
        NormalizedRow {
            year: Some(1988),
            season: Some(Season::Summer),
            city: Some("Seoul".into()),
            sport: Some("Judo".into()),
            event: Some("Lightweight, Men".into()),
            noc: Some("KOR".into()),
            name: Some("Kim Jae-Yeop".into()),
            sex: Some(Sex::Male),
            age: Some(24),
            height_cm: Some(168.0),
            weight_kg: Some(60.0),
            medal: Some(Medal::Gold),
            birth_date: NaiveDate::from_ymd_opt(1965, 5, 17),
            birth_city: None,
            birth_country: Some("South Korea".into()),
            death_date: None,
            death_city: None,
            death_country: None,
            affiliations: None,
            relatives: None,
            link: Some("https://site.test/athletes/ki/kim-1.html".into()),
        }
    }

    #[test]
    fn empty_table_still_has_header() {
        let mut out = Vec::new();
        write_table(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", OUTPUT_COLUMNS.join(",")));
    }

    #[test]
    fn table_rows_follow_header_order() {
        let mut out = Vec::new();
        write_table(&mut out, &[row()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "1988,Summer,Seoul,Judo,\"Lightweight, Men\",KOR,Kim Jae-Yeop,Male,24,168.0,60.0,Gold,\
             1965-05-17,,South Korea,,,,,,https://site.test/athletes/ki/kim-1.html"
        );
    }

    #[test]
    fn failed_links_are_newline_delimited() {
        let links = vec![
            AthleteLink::new("https://site.test/a"),
            AthleteLink::new("https://site.test/b"),
        ];
        let mut out = Vec::new();
        write_failed_links(&mut out, &links).unwrap();
        assert_eq!(out, b"https://site.test/a\nhttps://site.test/b\n");
    }

    #[test]
    fn writes_outputs_under_directory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::for_noc(dir.path(), "KOR");
        write_noc_outputs(&paths, &[row()], &[], &serde_json::json!({"rows": 1})).unwrap();
        assert!(paths.table.exists());
        assert!(paths.report.exists());
        assert!(!paths.missing.exists());

        let links = [AthleteLink::new("https://site.test/a")];
        write_noc_outputs(&paths, &[], &links, &serde_json::json!({})).unwrap();
        assert_eq!(
            fs::read_to_string(&paths.missing).unwrap(),
            "https://site.test/a\n"
        );
    }
}
