//! Turns the rink conditions page into borough listings.
//!
//! The page is a sequence of `<h2>` borough headers, each followed by a
//! table with one row per rink:
//! `[type, name (code)] [open] [cleared] [sprayed] [resurfaced] [condition]`.

use crate::common::constants::{MISSING_STATUS, UNKNOWN_RINK_TYPE};
use crate::common::types::{BoroughListing, Rink, RinkStatus};
use crate::geocode::normalize::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

static SECTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2, table").expect("valid selector"));
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));

/// A trailing "(CODE)" group after the rink name.
static CODE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>.*?)\s*\((?P<code>[^()]*)\)$").expect("valid regex"));

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Splits the first cell into (type, name, code).
fn split_name_cell(cell: &str) -> (String, String, String) {
    let (kind, name) = match cell.split_once(',') {
        Some((kind, name)) => (kind.trim(), name.trim()),
        None => (UNKNOWN_RINK_TYPE, cell.trim()),
    };
    match CODE_SUFFIX.captures(name) {
        Some(caps) => (
            kind.to_string(),
            caps["name"].trim().to_string(),
            caps["code"].trim().to_string(),
        ),
        None => (kind.to_string(), name.to_string(), String::new()),
    }
}

/// Builds a rink from the text of one table row. Rows without cells (the
/// header row uses `<th>`) yield `None`.
pub fn parse_rink_row(cells: &[String]) -> Option<Rink> {
    let first = cells.first()?;
    let (kind, name, code) = split_name_cell(first);
    let cell = |index: usize| {
        cells
            .get(index)
            .cloned()
            .unwrap_or_else(|| MISSING_STATUS.to_string())
    };

    Some(Rink {
        kind,
        name,
        code,
        status: RinkStatus {
            open: cell(1),
            cleared: cell(2),
            sprayed: cell(3),
            resurfaced: cell(4),
            condition: cell(5),
        },
    })
}

/// Parses the whole page. Tables before the first borough header are ignored.
pub fn parse_listing(html: &str) -> Vec<BoroughListing> {
    let document = Html::parse_document(html);
    let mut boroughs: Vec<BoroughListing> = Vec::new();

    for element in document.select(&SECTION_SELECTOR) {
        match element.value().name() {
            "h2" => {
                let name = element_text(element);
                debug!("Found borough header: {}", name);
                boroughs.push(BoroughListing {
                    name,
                    rinks: Vec::new(),
                });
            }
            "table" => {
                let Some(borough) = boroughs.last_mut() else {
                    debug!("Skipping table before the first borough header");
                    continue;
                };
                for row in element.select(&ROW_SELECTOR) {
                    let cells: Vec<String> = row.select(&CELL_SELECTOR).map(element_text).collect();
                    if let Some(rink) = parse_rink_row(&cells) {
                        borough.rinks.push(rink);
                    }
                }
            }
            _ => {}
        }
    }

    info!(
        "Parsed {} boroughs with {} rinks",
        boroughs.len(),
        boroughs.iter().map(|b| b.rinks.len()).sum::<usize>()
    );
    boroughs
}
