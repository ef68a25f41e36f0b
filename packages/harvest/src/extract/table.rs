//! Extraction from HTML tables via CSS selectors.
//!
//! Two consumers: whole-table snapshots (every `<table>` parsed into
//! headers plus text rows) and fixed-position row extraction driven by a
//! [`RowSchema`]. Short rows leave trailing fields empty; rows that fail a
//! mapping are skipped with a reason, never aborting the document.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::record::{ExtractReport, Record};

/// One parsed HTML table: headers plus cell text rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse every `<table>` in a document. Headers come from `<th>` cells
/// when present, otherwise from the first row. Tables with no rows at all
/// are dropped.
pub fn parse_tables(html: &str) -> Vec<Table> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table").unwrap();
    let tr_sel = Selector::parse("tr").unwrap();
    let th_sel = Selector::parse("th").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let mut tables = Vec::new();
    for table in document.select(&table_sel) {
        let mut headers: Vec<String> = table.select(&th_sel).map(cell_text).collect();

        let mut rows: Vec<Vec<String>> = table
            .select(&tr_sel)
            .filter_map(|tr| {
                let cells: Vec<String> = tr.select(&td_sel).map(cell_text).collect();
                (!cells.is_empty()).then_some(cells)
            })
            .collect();

        if headers.is_empty() && !rows.is_empty() {
            headers = rows.remove(0);
        }
        if headers.is_empty() && rows.is_empty() {
            continue;
        }
        tables.push(Table { headers, rows });
    }
    tables
}

/// How one fixed-position cell maps into record fields.
#[derive(Debug, Clone)]
pub enum CellField {
    /// Plain cell text.
    Text { field: String },
    /// The cell's first anchor href, resolved against the base URL.
    /// A present cell without an anchor skips the whole row.
    Href { field: String },
    /// Compound `Name (ID)` cell, split on the first parenthesis pair.
    NameWithId { name_field: String, id_field: String },
}

/// Fixed-position mapping from table-row cells to record fields.
#[derive(Debug, Clone)]
pub struct RowSchema {
    /// Rows with fewer cells than this are not data rows and are ignored.
    pub min_cells: usize,
    /// `(cell index, mapping)` pairs. Indexes past the row's end leave
    /// the mapped fields empty.
    pub columns: Vec<(usize, CellField)>,
}

impl RowSchema {
    pub fn new(min_cells: usize) -> Self {
        Self {
            min_cells,
            columns: Vec::new(),
        }
    }

    pub fn text(mut self, index: usize, field: impl Into<String>) -> Self {
        self.columns.push((
            index,
            CellField::Text {
                field: field.into(),
            },
        ));
        self
    }

    pub fn href(mut self, index: usize, field: impl Into<String>) -> Self {
        self.columns.push((
            index,
            CellField::Href {
                field: field.into(),
            },
        ));
        self
    }

    pub fn name_with_id(
        mut self,
        index: usize,
        name_field: impl Into<String>,
        id_field: impl Into<String>,
    ) -> Self {
        self.columns.push((
            index,
            CellField::NameWithId {
                name_field: name_field.into(),
                id_field: id_field.into(),
            },
        ));
        self
    }
}

/// Extract one record per qualifying `<tr>` in the document. Rows below
/// `min_cells` are layout rows and are ignored outright; rows that fail a
/// mapping land in the skip list with a reason.
pub fn extract_rows(html: &str, schema: &RowSchema, base_url: Option<&Url>) -> ExtractReport {
    let document = Html::parse_document(html);
    let tr_sel = Selector::parse("tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let mut report = ExtractReport::default();
    for (index, tr) in document.select(&tr_sel).enumerate() {
        let cells: Vec<ElementRef> = tr.select(&td_sel).collect();
        if cells.len() < schema.min_cells {
            continue;
        }
        match extract_row(&cells, schema, base_url) {
            Ok(record) => report.records.push(record),
            Err(reason) => report.skip(index, reason),
        }
    }
    report
}

fn extract_row(
    cells: &[ElementRef],
    schema: &RowSchema,
    base_url: Option<&Url>,
) -> std::result::Result<Record, String> {
    let mut record = Record::new();
    for (index, mapping) in &schema.columns {
        let cell = cells.get(*index).copied();
        match mapping {
            CellField::Text { field } => {
                record.insert(field.clone(), cell.map(cell_text).unwrap_or_default());
            }
            CellField::NameWithId {
                name_field,
                id_field,
            } => {
                let text = cell.map(cell_text).unwrap_or_default();
                let (name, id) = split_name_id(&text);
                record.insert(name_field.clone(), name);
                record.insert(id_field.clone(), id.unwrap_or_default());
            }
            CellField::Href { field } => match cell {
                Some(cell) => {
                    let href = first_href(cell, base_url)
                        .ok_or_else(|| format!("cell {index} has no link"))?;
                    record.insert(field.clone(), href);
                }
                None => {
                    record.insert(field.clone(), String::new());
                }
            },
        }
    }
    Ok(record)
}

/// Split a compound `Name (ID)` cell on its first parenthesis pair.
/// Without a complete pair the whole text is the name.
pub fn split_name_id(text: &str) -> (String, Option<String>) {
    if let Some(open) = text.find('(') {
        if let Some(close) = text[open + 1..].find(')') {
            let name = text[..open].trim().to_string();
            let id = text[open + 1..open + 1 + close].trim().to_string();
            return (name, Some(id));
        }
    }
    (text.trim().to_string(), None)
}

/// Collapsed whitespace text content of a cell.
fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First anchor href in a cell, resolved against the base URL when one is
/// given and the href is relative.
fn first_href(cell: ElementRef, base_url: Option<&Url>) -> Option<String> {
    let a_sel = Selector::parse("a[href]").unwrap();
    let href = cell.select(&a_sel).next()?.value().attr("href")?;
    match base_url {
        Some(base) => match base.join(href) {
            Ok(resolved) => Some(resolved.to_string()),
            Err(_) => Some(href.to_string()),
        },
        None => Some(href.to_string()),
    }
}
