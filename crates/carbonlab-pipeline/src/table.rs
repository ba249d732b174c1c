//! In-memory CSV tables with named column access.

use std::path::Path;

use crate::error::PipelineError;

/// A CSV table held as rows of raw string cells.
///
/// Rows shorter than the header are treated as having empty trailing cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates table from headers and rows.
    pub fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    /// Reads table from CSV file with header row. The table is named after the file.
    pub fn read(path: &Path) -> Result<Self, PipelineError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| PipelineError::csv(path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| PipelineError::csv(path, e))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| PipelineError::csv(path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self::new(&name, headers, rows))
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the named column.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Returns true if the table has the named column.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Position of the named column, or an error naming the table and column.
    pub fn require_column(&self, column: &str) -> Result<usize, PipelineError> {
        self.column_index(column).ok_or_else(|| PipelineError::MissingColumn {
            table: self.name.clone(),
            column: column.to_string(),
        })
    }

    /// Trimmed cell value, empty for cells past the end of a short row.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows[row].get(column).map_or("", |c| c.trim())
    }

    /// Iterates over the cells of a column.
    pub fn column(&self, column: usize) -> impl Iterator<Item = &str> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, column))
    }

    /// Appends a column, `values` must have one entry per row.
    pub fn push_column(&mut self, column: &str, values: Vec<String>) -> Result<(), PipelineError> {
        if values.len() != self.rows.len() {
            return Err(PipelineError::ColumnLength {
                table: self.name.clone(),
                column: column.to_string(),
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        let width = self.headers.len();
        self.headers.push(column.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.resize(width, String::new());
            row.push(value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            "t.csv",
            vec!["id".to_string(), "x".to_string()],
            vec![
                vec!["1".to_string(), " 2.5 ".to_string()],
                vec!["2".to_string()],
            ],
        )
    }

    #[test]
    fn test_cells() {
        let t = table();
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(0, 1), "2.5");
        assert_eq!(t.cell(1, 1), "");
        assert_eq!(t.column(0).collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_require_column() {
        let t = table();
        assert_eq!(t.require_column("x").unwrap(), 1);
        match t.require_column("y") {
            Err(PipelineError::MissingColumn { table, column }) => {
                assert_eq!(table, "t.csv");
                assert_eq!(column, "y");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_push_column() {
        let mut t = table();
        t.push_column("target", vec!["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(t.cell(1, 2), "b");
        assert_eq!(t.cell(1, 1), "");
    }

    #[test]
    fn test_push_column_length_mismatch() {
        let mut t = table();
        let result = t.push_column("target", vec!["a".to_string()]);
        assert!(matches!(
            result,
            Err(PipelineError::ColumnLength { expected: 2, actual: 1, .. })
        ));
        assert_eq!(t.headers().len(), 2);
    }
}
