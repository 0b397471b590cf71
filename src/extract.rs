//! Athlete page extraction: the info box and the results table.
//!
//! The two extractions are independent. A page missing its info box still yields results and
//! vice versa.

use crate::error::ExtractError;
use crate::records::{AthleteLink, BiographyRecord, ResultRow, Sex, RESULT_COLUMNS};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::debug;

struct PageSelectors {
    info_box: Selector,
    paragraph: Selector,
    heading: Selector,
    results: Selector,
    result_rows: Selector,
    cells: Selector,
}

fn selectors() -> &'static PageSelectors {
    static SELECTORS: OnceLock<PageSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| PageSelectors {
        info_box: Selector::parse("div#info_box").expect("info box selector"),
        paragraph: Selector::parse("p").expect("paragraph selector"),
        heading: Selector::parse("h1").expect("heading selector"),
        results: Selector::parse("div#div_results").expect("results selector"),
        result_rows: Selector::parse("tbody tr").expect("result row selector"),
        cells: Selector::parse("th, td").expect("cell selector"),
    })
}

/// A fetched athlete page, parsed once and queried for both record kinds.
pub struct AthletePage {
    link: AthleteLink,
    document: Html,
}

impl AthletePage {
    /// Parses the page body. Malformed markup is tolerated by the HTML parser.
    pub fn parse(link: AthleteLink, html: &str) -> Self {
        Self {
            link,
            document: Html::parse_document(html),
        }
    }

    /// Link the page was fetched from.
    pub fn link(&self) -> &AthleteLink {
        &self.link
    }

    /// Biography from the info box.
    pub fn biography(&self) -> Result<BiographyRecord, ExtractError> {
        extract_biography(&self.document, self.link.as_str())
    }

    /// Raw results rows.
    pub fn results(&self) -> Result<Vec<ResultRow>, ExtractError> {
        extract_results(&self.document)
    }
}

/// Reads the labelled lines of `div#info_box` into a [`BiographyRecord`].
///
/// Only a missing info box is an error; each absent or malformed field is simply null.
pub fn extract_biography(
    document: &Html,
    source_link: &str,
) -> Result<BiographyRecord, ExtractError> {
    let sel = selectors();
    let paragraph = document
        .select(&sel.info_box)
        .next()
        .and_then(|info_box| info_box.select(&sel.paragraph).next())
        .ok_or(ExtractError::MissingInfobox)?;
    let lines = block_lines(paragraph);

    let mut record = BiographyRecord::new(source_link);
    record.name = document
        .select(&sel.heading)
        .next()
        .map(|heading| collapse_whitespace(&heading.text().collect::<String>()))
        .filter(|name| !name.is_empty());
    record.sex = labelled(&lines, "Gender:")
        .or_else(|| labelled(&lines, "Sex:"))
        .and_then(Sex::from_label);
    record.height_cm = labelled(&lines, "Height:").and_then(|height| {
        let parsed = parse_height_cm(height);
        if parsed.is_none() {
            debug!(link = %source_link, %height, "unparsable height");
        }
        parsed
    });
    record.weight = labelled(&lines, "Weight:").map(str::to_string);
    record.birth = labelled(&lines, "Born:").map(str::to_string);
    record.death = labelled(&lines, "Died:").map(str::to_string);
    record.affiliations = labelled(&lines, "Affiliations:").map(str::to_string);
    record.relatives = labelled(&lines, "Relatives:").map(str::to_string);
    Ok(record)
}

/// Reads `div#div_results` body rows, binding the first nine cells of each row positionally.
pub fn extract_results(document: &Html) -> Result<Vec<ResultRow>, ExtractError> {
    let sel = selectors();
    let container = document
        .select(&sel.results)
        .next()
        .ok_or(ExtractError::MissingResults)?;

    let rows = container
        .select(&sel.result_rows)
        .map(|row| {
            let cells = row
                .select(&sel.cells)
                .take(RESULT_COLUMNS.len())
                .map(|cell| collapse_whitespace(&cell.text().collect::<String>()));
            ResultRow::from_cells(cells)
        })
        .collect();
    Ok(rows)
}

/// Value after `label` on the first line containing it; blank values count as absent.
fn labelled<'a>(lines: &'a [String], label: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| {
        let at = line.find(label)?;
        let value = line[at + label.len()..].trim();
        (!value.is_empty()).then_some(value)
    })
}

/// `5-9 (175 cm)` → 175.
fn parse_height_cm(value: &str) -> Option<i64> {
    let open = value.rfind('(')?;
    let inner = &value[open + 1..];
    let end = inner.find("cm")?;
    inner[..end].trim().parse().ok()
}

/// Splits an element's text into trimmed lines, treating `<br>` and newlines as breaks.
fn block_lines(element: ElementRef<'_>) -> Vec<String> {
    let mut raw = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(child) if child.name() == "br" => raw.push('\n'),
            _ => {}
        }
    }
    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space && !buf.is_empty() {
                buf.push(' ');
            }
            last_space = true;
        } else {
            buf.push(ch);
            last_space = false;
        }
    }
    buf.trim().to_string()
}
