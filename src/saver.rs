//! Batch saver: serializes a dataset into header and data cell grids.
//!
//! A saver moves through `Uninitialized -> Writing -> Done`. The container
//! is fully serialized in memory before anything touches the output path,
//! so a failed encode never leaves a partial file behind. Batch and
//! incremental writing are mutually exclusive for the lifetime of one
//! saver, and incremental writing is not supported at all.

use std::fs;
use std::path::PathBuf;

use log::info;

use crate::dataset::{CellData, TabularDataset};
use crate::error::{ConvertError, Result};
use crate::mat5::{CellArray, CharArray, MatContainer, NumericArray, RawArray};

pub const DEFAULT_ENTRY_NAME_HEADER: &str = "header";
pub const DEFAULT_ENTRY_NAME_DATA: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaverState {
    Uninitialized,
    Writing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    None,
    Batch,
    Incremental,
}

#[derive(Debug)]
pub struct MatSaver {
    output: Option<PathBuf>,
    entry_name_header: String,
    entry_name_data: String,
    state: SaverState,
    mode: WriteMode,
}

impl Default for MatSaver {
    fn default() -> Self {
        Self::new()
    }
}

impl MatSaver {
    pub fn new() -> Self {
        Self {
            output: None,
            entry_name_header: DEFAULT_ENTRY_NAME_HEADER.to_string(),
            entry_name_data: DEFAULT_ENTRY_NAME_DATA.to_string(),
            state: SaverState::Uninitialized,
            mode: WriteMode::None,
        }
    }

    pub fn set_entry_name_header(&mut self, name: impl Into<String>) {
        self.entry_name_header = name.into();
    }

    pub fn entry_name_header(&self) -> &str {
        &self.entry_name_header
    }

    pub fn set_entry_name_data(&mut self, name: impl Into<String>) {
        self.entry_name_data = name.into();
    }

    pub fn entry_name_data(&self) -> &str {
        &self.entry_name_data
    }

    pub fn set_output(&mut self, path: impl Into<PathBuf>) {
        self.output = Some(path.into());
    }

    pub fn state(&self) -> SaverState {
        self.state
    }

    /// Resets the write mode so the saver can be reused for a new file.
    pub fn reset_writer(&mut self) {
        self.state = SaverState::Uninitialized;
        self.mode = WriteMode::None;
    }

    /// Incremental writing is not supported; this always fails, and also
    /// marks the saver incremental so a later batch call is rejected too.
    pub fn write_incremental(&mut self, _row: &[CellData]) -> Result<()> {
        if self.mode == WriteMode::Batch {
            return Err(ConvertError::incompatible_mode(
                "cannot mix incremental and batch writing on one saver",
            ));
        }
        self.mode = WriteMode::Incremental;
        Err(ConvertError::incompatible_mode(
            "incremental saving is not supported",
        ))
    }

    /// Writes the whole dataset as one container: a 2 x C header cell grid
    /// (names and short type tags) and an R x C data cell grid.
    pub fn write_batch(&mut self, dataset: &TabularDataset) -> Result<()> {
        if dataset.is_empty() {
            return Err(ConvertError::NoData);
        }
        if self.mode == WriteMode::Incremental {
            return Err(ConvertError::incompatible_mode(
                "cannot mix incremental and batch writing on one saver",
            ));
        }
        self.mode = WriteMode::Batch;
        self.state = SaverState::Writing;

        let path = self
            .output
            .clone()
            .ok_or_else(|| ConvertError::source_unavailable("no output file set".to_string()))?;

        let mut container = MatContainer::new();
        container.add_entry(self.entry_name_header.as_str(), header_grid(dataset));
        container.add_entry(self.entry_name_data.as_str(), data_grid(dataset));
        let bytes = container.to_bytes()?;
        fs::write(&path, bytes)?;

        info!(
            "Wrote {} row(s), {} column(s) to {:?}",
            dataset.num_rows(),
            dataset.num_columns(),
            path
        );
        self.state = SaverState::Done;
        Ok(())
    }
}

fn header_grid(dataset: &TabularDataset) -> RawArray {
    let names = dataset
        .schema
        .columns
        .iter()
        .map(|c| RawArray::Char(CharArray::from_str(&c.name)))
        .collect();
    let tags = dataset
        .schema
        .columns
        .iter()
        .map(|c| RawArray::Char(CharArray::from_str(c.kind.short_tag())))
        .collect();
    RawArray::Cell(CellArray::from_rows(vec![names, tags]))
}

fn data_grid(dataset: &TabularDataset) -> RawArray {
    let rows = (0..dataset.num_rows())
        .map(|r| {
            (0..dataset.num_columns())
                .map(|c| match &dataset.rows[r][c] {
                    CellData::Number(value) => RawArray::Matrix(NumericArray::scalar(*value)),
                    _ => RawArray::Char(CharArray::from_str(&dataset.cell_display(r, c))),
                })
                .collect()
        })
        .collect();
    RawArray::Cell(CellArray::from_rows(rows))
}
