use log::warn;
use std::collections::HashMap;

/// Index of a resolved column. Only obtainable from a [`Schema`], so a
/// `Column` is always inside the table it was resolved against.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Column(usize);

impl Column {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Header-name lookup built once from a table's header row.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    by_name: HashMap<String, usize>,
    width: usize,
}

impl Schema {
    pub fn new(headers: &[String]) -> Self {
        let mut by_name = HashMap::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            // First occurrence wins for duplicated headers.
            by_name.entry(name.clone()).or_insert(idx);
        }
        Self {
            by_name,
            width: headers.len(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn column(&self, name: &str) -> Option<Column> {
        self.by_name.get(name).copied().map(Column)
    }

    /// Resolve by name, else fall back to a known position if the table is
    /// wide enough to hold it.
    pub fn column_or(&self, name: &str, fallback: usize) -> Option<Column> {
        if let Some(col) = self.column(name) {
            return Some(col);
        }
        if fallback < self.width {
            warn!("column '{name}' missing, falling back to position {fallback}");
            Some(Column(fallback))
        } else {
            warn!("column '{name}' missing and no usable fallback; field left as is");
            None
        }
    }

    /// All columns from `names` that exist, in the order given.
    pub fn columns(&self, names: &[&str]) -> Vec<Column> {
        names.iter().filter_map(|n| self.column(n)).collect()
    }
}

/// One fixed-width tab-delimited table: header names plus string cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows.into_iter().map(|r| normalize_row(r, width)).collect();
        Self { headers, rows }
    }

    /// Parse tab-delimited text. Accepts LF, CRLF and bare CR line endings,
    /// skips blank lines and pads/truncates every row to the header width.
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut lines = normalized.split('\n');

        let headers: Vec<String> = match lines.next() {
            Some(line) if !line.is_empty() => line.split('\t').map(str::to_string).collect(),
            _ => Vec::new(),
        };

        let rows = lines
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.split('\t').map(str::to_string).collect())
            .collect();

        Self::new(headers, rows)
    }

    /// Serialize with CRLF line endings and a trailing CRLF.
    pub fn to_text(&self) -> String {
        let width = self.headers.len();
        let mut out = self.headers.join("\t");
        out.push_str("\r\n");
        for row in &self.rows {
            let cells: Vec<&str> = (0..width)
                .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
                .collect();
            out.push_str(&cells.join("\t"));
            out.push_str("\r\n");
        }
        out
    }

    pub fn schema(&self) -> Schema {
        Schema::new(&self.headers)
    }

    pub fn get(&self, row: usize, col: Column) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col.0))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, row: usize, col: Column, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col.0)) {
            *cell = value.into();
        }
    }

    /// Append a row built by name, every other cell empty.
    pub fn push_named(&mut self, values: &[(&str, String)]) {
        let schema = self.schema();
        let mut row = vec![String::new(); self.headers.len()];
        for (name, value) in values {
            if let Some(col) = schema.column(name) {
                row[col.0] = value.clone();
            }
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn normalize_row(mut row: Vec<String>, width: usize) -> Vec<String> {
    if row.len() > width {
        row.truncate(width);
    } else {
        row.resize(width, String::new());
    }
    row
}

/// Cell helpers shared by the numeric rewriters.
pub(crate) fn cell_int(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// Scale a positive integer cell, rounding to nearest. Empty, unparseable
/// and non-positive values are sentinels and come back unchanged.
pub(crate) fn scale_cell(value: &str, factor: f64) -> Option<String> {
    let n = cell_int(value)?;
    if n <= 0 {
        return None;
    }
    Some(((n as f64) * factor).round().max(0.0).to_string())
}
