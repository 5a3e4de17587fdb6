//! In-memory tabular frame and delimited-file persistence.
//!
//! RULE: Only frame.rs touches the on-disk format.
//! Stages mutate the frame through its methods; they never parse or
//! serialize rows themselves.
//!
//! Cells are loosely typed: empty input parses to null, numeric input
//! to a number, everything else to text. This mirrors the dataset as
//! the dashboards consume it: a header row plus delimited rows.

use crate::error::{AdjustError, AdjustResult};
use serde_json::Value;
use std::path::Path;

/// A single cell. Null, number, or text; nothing else is produced by
/// the reader.
pub type Cell = Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Load a frame from a delimited file. The first line is the header.
    pub fn read_path(path: &Path) -> AdjustResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content).map_err(|e| match e {
            AdjustError::NoHeader { .. } => AdjustError::NoHeader {
                path: path.display().to_string(),
            },
            other => other,
        })
    }

    /// Parse a frame from delimited text. Empty cells become null,
    /// numeric cells become numbers, everything else stays text.
    pub fn parse_str(content: &str) -> AdjustResult<Self> {
        let mut lines = content.lines();
        let header = lines.next().ok_or_else(|| AdjustError::NoHeader {
            path: "<string>".into(),
        })?;
        let columns: Vec<String> = header
            .split(',')
            .map(|s| s.trim().trim_matches('"').to_string())
            .collect();

        let mut rows = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let mut row: Vec<Cell> = line.split(',').map(parse_cell).collect();
            // Ragged lines are padded to the header width so every
            // column index stays valid; surplus cells are dropped.
            row.resize(columns.len(), Cell::Null);
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    /// Serialize the whole frame back to delimited text.
    pub fn to_csv_string(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.columns.join(","));
        out.push('\n');
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(write_cell).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }

    /// Write the frame to a file. Callers run every transform first so
    /// a failed run never leaves a partial output behind.
    pub fn write_path(&self, path: &Path) -> AdjustResult<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(path, self.to_csv_string())?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of a column that must exist. Errors name the column so a
    /// failed run says exactly what the input was missing.
    pub fn require_column(&self, name: &str) -> AdjustResult<usize> {
        self.column_index(name)
            .ok_or_else(|| AdjustError::MissingColumn { name: name.into() })
    }

    /// Index of a column, appending it (null-filled) if absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Cell::Null);
        }
        self.columns.len() - 1
    }

    /// Numeric view of a cell. Null and text read as None.
    pub fn number(&self, row: usize, col: usize) -> Option<f64> {
        self.rows[row].get(col).and_then(Value::as_f64)
    }

    /// Text view of a cell: numbers are rendered, null reads as None.
    /// Used for key columns (member, zip) that may parse numerically.
    pub fn key(&self, row: usize, col: usize) -> Option<String> {
        match self.rows[row].get(col) {
            Some(Value::Null) | None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    pub fn set_number(&mut self, row: usize, col: usize, value: f64) {
        self.rows[row][col] = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }

    pub fn set_text(&mut self, row: usize, col: usize, value: &str) {
        self.rows[row][col] = Value::String(value.to_string());
    }

    pub fn set_null(&mut self, row: usize, col: usize) {
        self.rows[row][col] = Value::Null;
    }
}

fn parse_cell(raw: &str) -> Cell {
    let s = raw.trim().trim_matches('"');
    if s.is_empty() {
        return Cell::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Cell::from(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            if let Some(n) = serde_json::Number::from_f64(f) {
                return Cell::Number(n);
            }
        }
    }
    Cell::String(s.to_string())
}

fn write_cell(cell: &Cell) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) if s.contains(',') || s.contains('"') => {
            format!("\"{}\"", s.replace('"', "'"))
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_numbers_nulls_and_text() {
        let frame = Frame::parse_str("member,zip,risk_full\nM-1,10001,2.15\nM-2,,not a number\n")
            .expect("parse");
        assert_eq!(frame.columns, vec!["member", "zip", "risk_full"]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.number(0, 2), Some(2.15));
        assert_eq!(frame.key(0, 1).as_deref(), Some("10001"));
        assert_eq!(frame.key(1, 1), None);
        assert_eq!(frame.key(1, 2).as_deref(), Some("not a number"));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            Frame::parse_str(""),
            Err(AdjustError::NoHeader { .. })
        ));
    }

    #[test]
    fn missing_column_names_the_column() {
        let frame = Frame::parse_str("a,b\n1,2\n").unwrap();
        let err = frame.require_column("risk_full").unwrap_err();
        assert!(err.to_string().contains("risk_full"), "got: {err}");
    }

    #[test]
    fn ensure_column_backfills_null() {
        let mut frame = Frame::parse_str("a\n1\n2\n").unwrap();
        let idx = frame.ensure_column("sdoh_lift_level");
        assert_eq!(idx, 1);
        assert_eq!(frame.rows[0][1], Cell::Null);
        // Idempotent: asking again returns the same index.
        assert_eq!(frame.ensure_column("sdoh_lift_level"), 1);
    }

    #[test]
    fn csv_roundtrip_preserves_cells() {
        let src = "member,zip,risk_full,note\nM-1,10001,2.15,ok\nM-2,,1.9,\n";
        let frame = Frame::parse_str(src).unwrap();
        let back = Frame::parse_str(&frame.to_csv_string()).unwrap();
        assert_eq!(frame, back);
    }
}
