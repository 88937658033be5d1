//! Typed tabular dataset and the row materializer.

use std::collections::HashMap;

use crate::error::{ConvertError, Result};
use crate::grid::{CellValue, RawGrid, format_number};
use crate::schema::{ColumnKind, Schema, infer_schema};

/// One materialized cell, encoded under its column's resolved kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellData {
    /// Numeric value; NaN marks a missing value.
    Number(f64),
    /// Index into the column's sorted label set.
    Label(usize),
    /// Reference into the dataset string pool.
    Text(usize),
}

pub type Row = Vec<CellData>;

/// Interning table for text-column cell values.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    strings: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl StringPool {
    pub fn intern(&mut self, value: &str) -> usize {
        if let Some(&idx) = self.lookup.get(value) {
            return idx;
        }
        let idx = self.strings.len();
        self.strings.push(value.to_string());
        self.lookup.insert(value.to_string(), idx);
        idx
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.strings.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// A decoded dataset: relation name, typed schema, rows, string pool.
/// Every row holds exactly `schema.len()` cells.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    pub name: String,
    pub schema: Schema,
    pub rows: Vec<Row>,
    pub pool: StringPool,
}

impl TabularDataset {
    /// Profiles the grid, builds the schema, and materializes every row.
    /// Schema and rows are always computed together; there is no
    /// schema-only path.
    pub fn from_grid(name: impl Into<String>, grid: &RawGrid, max_nominal: i32) -> Result<Self> {
        let schema = infer_schema(grid, max_nominal);
        Self::materialize(name, grid, schema)
    }

    /// Like [`from_grid`](Self::from_grid) but keeps caller-supplied
    /// column names (CSV import).
    pub fn from_grid_with_names(
        name: impl Into<String>,
        grid: &RawGrid,
        max_nominal: i32,
        names: &[String],
    ) -> Result<Self> {
        let kinds = (0..grid.cols())
            .map(|col| crate::schema::profile_column(grid.column(col), max_nominal))
            .collect();
        let schema = Schema::with_names(names, kinds);
        Self::materialize(name, grid, schema)
    }

    fn materialize(name: impl Into<String>, grid: &RawGrid, schema: Schema) -> Result<Self> {
        let mut pool = StringPool::default();
        let mut rows = Vec::with_capacity(grid.rows());
        for r in 0..grid.rows() {
            let mut row = Vec::with_capacity(schema.len());
            for (c, def) in schema.columns.iter().enumerate() {
                let cell = grid.cell(r, c);
                row.push(encode_cell(cell, def.name.as_str(), &def.kind, &mut pool)?);
            }
            rows.push(row);
        }
        Ok(Self {
            name: name.into(),
            schema,
            rows,
            pool,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// String rendering of one cell: the numeric display form, the label
    /// string (never the index), or the pooled text.
    pub fn cell_display(&self, row: usize, col: usize) -> String {
        match (&self.rows[row][col], &self.schema.columns[col].kind) {
            (CellData::Number(value), _) => {
                if value.is_nan() {
                    String::new()
                } else {
                    format_number(*value)
                }
            }
            (CellData::Label(idx), ColumnKind::Categorical(labels)) => labels[*idx].clone(),
            (CellData::Text(idx), _) => self
                .pool
                .get(*idx)
                .expect("pool reference created during materialization")
                .to_string(),
            (cell, kind) => panic!("cell {cell:?} inconsistent with column kind {kind:?}"),
        }
    }
}

fn encode_cell(
    cell: &CellValue,
    column: &str,
    kind: &ColumnKind,
    pool: &mut StringPool,
) -> Result<CellData> {
    match kind {
        ColumnKind::Numeric => match cell {
            CellValue::Number(value) => Ok(CellData::Number(*value)),
            CellValue::Text(text) => Err(ConvertError::TypeMismatch {
                column: column.to_string(),
                value: text.clone(),
            }),
        },
        ColumnKind::Categorical(labels) => {
            let rendered = cell.display();
            // The label set is exactly the distinct values the profiler
            // observed; a miss here is an internal-consistency bug.
            let idx = labels
                .binary_search(&rendered)
                .expect("label observed during profiling");
            Ok(CellData::Label(idx))
        }
        ColumnKind::Text => Ok(CellData::Text(pool.intern(&cell.display()))),
    }
}
