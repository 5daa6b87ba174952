//! Result Presentation
//!
//! Rewrites SQLite column names into display labels and renders a
//! `QueryResult` as a text table, JSON or CSV. Row data and ordering are
//! never touched.

use crate::error::Result;
use crate::store::{CellValue, QueryResult};
use itertools::Itertools;
use serde_json::{Map, Value};

/// Aggregate call prefixes and the label each one becomes
const AGGREGATE_LABELS: [(&str, &str); 5] = [
    ("sum(", "Total"),
    ("count(", "Number of"),
    ("avg(", "Average"),
    ("max(", "Maximum"),
    ("min(", "Minimum"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Display label for a column name.
///
/// `SUM(stock_quantity)` becomes `Total Stock Quantity`; plain names only have
/// underscores turned into spaces and each word capitalized.
pub fn display_column_name(column: &str) -> String {
    for (prefix, label) in AGGREGATE_LABELS {
        let matches_prefix = column
            .get(..prefix.len())
            .map_or(false, |head| head.eq_ignore_ascii_case(prefix));
        if matches_prefix && column.ends_with(')') {
            let field = &column[prefix.len()..column.len() - 1];
            return format!("{} {}", label, humanize(field)).trim_end().to_string();
        }
    }
    humanize(column)
}

fn humanize(name: &str) -> String {
    title_case(&name.replace('_', " "))
}

/// Upper-case the first letter of every run of letters and lower-case the rest
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// A query result with display labels, ready to print
#[derive(Debug, Clone)]
pub struct ResultTable<'a> {
    headers: Vec<String>,
    result: &'a QueryResult,
}

impl<'a> ResultTable<'a> {
    pub fn new(result: &'a QueryResult) -> Self {
        let headers = result.columns.iter().map(|c| display_column_name(c)).collect();
        Self { headers, result }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Table => Ok(self.to_text()),
            OutputFormat::Json => self.to_json(),
            OutputFormat::Csv => self.to_csv(),
        }
    }

    /// Fixed-width text table with a row count footer
    pub fn to_text(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .result
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let format_row = |values: &[String]| {
            values
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!("{:<width$}", value, width = *width))
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut lines = Vec::with_capacity(cells.len() + 3);
        lines.push(format_row(self.headers.as_slice()));
        lines.push(widths.iter().map(|w| "-".repeat(*w)).join("-+-"));
        for row in &cells {
            lines.push(format_row(row.as_slice()));
        }

        let count = self.result.row_count();
        lines.push(format!("({} row{})", count, if count == 1 { "" } else { "s" }));
        lines.join("\n")
    }

    /// `{"columns": [...], "rows": [{label: value}, ...]}`
    pub fn to_json(&self) -> Result<String> {
        let rows: Vec<Value> = self
            .result
            .rows
            .iter()
            .map(|row| {
                let mut object = Map::new();
                for (header, value) in self.headers.iter().zip(row) {
                    object.insert(header.clone(), cell_to_json(value));
                }
                Value::Object(object)
            })
            .collect();

        let document = serde_json::json!({
            "columns": self.headers,
            "rows": rows,
        });
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.result.rows {
            writer.write_record(row.iter().map(|v| match v {
                CellValue::Null => String::new(),
                other => other.to_string(),
            }))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| crate::error::Nl2SqlError::Csv(e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn cell_to_json(value: &CellValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
