use tracing::debug;

use crate::error::{Result, ServiceError};
use crate::xlsx::{self, Cell};

static EMPTY: Cell = Cell::Empty;

/// Column names are compared after trimming and lowercasing.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The first worksheet of an upload, with its first row as the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Header names are normalized and every row is padded to the header width.
    pub fn new(header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let columns: Vec<String> = header.iter().map(|name| normalize(name)).collect();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < columns.len() {
                    row.resize(columns.len(), Cell::Empty);
                }
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn from_xlsx(bytes: &[u8]) -> Result<Self> {
        let sheets = xlsx::read_workbook(bytes).map_err(|e| ServiceError::ExtractionFailed(format!("{:#}", e)))?;
        let sheet = sheets
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::ExtractionFailed("workbook has no worksheet".to_string()))?;

        let mut rows = sheet.rows.into_iter();
        let header = rows
            .next()
            .map(|row| row.iter().map(Cell::to_string).collect())
            .unwrap_or_default();
        let table = Self::new(header, rows.collect());
        debug!("Loaded sheet {} with columns {:?}", sheet.name, table.columns);
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Position of `name`, normalized before lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = normalize(name);
        self.columns.iter().position(|column| *column == name)
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| row.get(index).unwrap_or(&EMPTY))
    }
}
