//! Uniform rows x cols grid extraction and per-cell value classification.

use crate::error::{ConvertError, Result};
use crate::mat5::{NumericArray, RawArray};

/// One raw grid cell: either a number or free text. Classification is
/// final; a cell never changes kind after extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    /// The display rendering used for label sets and text columns.
    pub fn display(&self) -> String {
        match self {
            CellValue::Number(value) => format_number(*value),
            CellValue::Text(text) => text.clone(),
        }
    }
}

/// Renders a number the way it appears in label sets and CSV output:
/// integral values without a trailing fraction, everything else via the
/// shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Immutable rectangular grid of classified cells, row-major.
#[derive(Debug, Clone)]
pub struct RawGrid {
    rows: usize,
    cols: usize,
    cells: Vec<CellValue>,
}

impl RawGrid {
    /// Builds a grid from already-classified rows (CSV import path).
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let cells = rows.into_iter().flatten().collect();
        Self {
            rows: nrows,
            cols: ncols,
            cells,
        }
    }

    /// Extracts a grid from a decoded container array, classifying every
    /// cell. The caller has already rejected >2-D and unsupported kinds.
    pub fn from_array(array: &RawArray) -> Result<Self> {
        let rows = array.rows();
        let cols = array.cols();
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(extract_cell(array, r, c)?);
            }
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        &self.cells[row * self.cols + col]
    }

    /// Iterates one column top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &CellValue> {
        (0..self.rows).map(move |row| self.cell(row, col))
    }
}

fn extract_cell(array: &RawArray, row: usize, col: usize) -> Result<CellValue> {
    match array {
        RawArray::Matrix(matrix) => {
            let value = matrix
                .get(row, col)
                .ok_or_else(|| ConvertError::format("numeric data length mismatch"))?;
            Ok(CellValue::Number(value))
        }
        RawArray::Char(chars) => {
            let unit = chars
                .unit(row, col)
                .ok_or_else(|| ConvertError::format("char data length mismatch"))?;
            Ok(CellValue::Text(String::from_utf16_lossy(&[unit])))
        }
        RawArray::Cell(cells) => {
            let element = cells
                .get(row, col)
                .ok_or_else(|| ConvertError::format("cell data length mismatch"))?;
            classify_cell_element(element)
        }
        RawArray::Other { class, .. } => Err(ConvertError::UnsupportedArrayKind {
            class: class.clone(),
        }),
    }
}

/// Classifies one embedded cell-array element. Char leaves are text with
/// their string content, even when that content would parse as a number.
/// A 1x1 numeric leaf is a number; any other leaf renders to a placeholder
/// and becomes text. Falling back to text is a signal, never an error.
fn classify_cell_element(element: &RawArray) -> Result<CellValue> {
    match element {
        RawArray::Char(chars) => Ok(CellValue::Text(chars.text())),
        RawArray::Matrix(matrix) => match matrix.as_scalar() {
            Some(value) => Ok(CellValue::Number(value)),
            None => Ok(CellValue::Text(render_non_scalar(matrix))),
        },
        RawArray::Cell(_) => Err(ConvertError::UnsupportedArrayKind {
            class: "nested cell".to_string(),
        }),
        RawArray::Other { class, .. } => Err(ConvertError::UnsupportedArrayKind {
            class: class.clone(),
        }),
    }
}

/// Classifies one raw text field (CSV import path): the same parse-or-text
/// fallback applied to embedded cell values.
pub fn classify_text(field: &str) -> CellValue {
    match field.parse::<f64>() {
        Ok(value) => CellValue::Number(value),
        Err(_) => CellValue::Text(field.to_string()),
    }
}

fn render_non_scalar(matrix: &NumericArray) -> String {
    let rows = matrix.dims.first().copied().unwrap_or(0);
    let cols = matrix.dims.get(1).copied().unwrap_or(0);
    format!("[{rows}x{cols} double]")
}
