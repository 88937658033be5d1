//! Batch loader: container entry selection and the decode pipeline.
//!
//! A loader moves through `Uninitialized -> StructureKnown -> DataRead`.
//! The structure (schema) cannot be computed without a full decode, so the
//! first structure query reads the whole entry and caches both schema and
//! rows; a later data read recomputes them together from the source.
//! Batch and incremental retrieval are mutually exclusive for the lifetime
//! of one loader, and incremental retrieval is not supported at all.

use std::path::{Path, PathBuf};

use log::debug;

use crate::dataset::TabularDataset;
use crate::error::{ConvertError, Result};
use crate::grid::RawGrid;
use crate::mat5::{MatContainer, RawArray};
use crate::schema::{DEFAULT_MAX_NOMINAL_VALUES, Schema, clamp_threshold};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Uninitialized,
    StructureKnown,
    DataRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retrieval {
    None,
    Batch,
    Incremental,
}

#[derive(Debug)]
pub struct MatLoader {
    source: Option<PathBuf>,
    entry_name: String,
    max_nominal_values: i32,
    state: LoaderState,
    retrieval: Retrieval,
    structure: Option<Schema>,
}

impl Default for MatLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MatLoader {
    pub fn new() -> Self {
        Self {
            source: None,
            entry_name: String::new(),
            max_nominal_values: DEFAULT_MAX_NOMINAL_VALUES,
            state: LoaderState::Uninitialized,
            retrieval: Retrieval::None,
            structure: None,
        }
    }

    /// Sets the entry to retrieve; the first entry when empty.
    pub fn set_entry_name(&mut self, name: impl Into<String>) {
        self.entry_name = name.into();
    }

    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    /// Sets the maximum distinct values for categorical columns; -1 for
    /// always categorical, 0 for always text. Values below -1 clamp.
    pub fn set_max_nominal_values(&mut self, value: i32) {
        self.max_nominal_values = clamp_threshold(value);
    }

    pub fn max_nominal_values(&self) -> i32 {
        self.max_nominal_values
    }

    /// Points the loader at a container file and resets any cached state.
    pub fn set_source(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if !path.is_file() {
            return Err(ConvertError::source_unavailable(format!(
                "no such file: {path:?}"
            )));
        }
        self.source = Some(path);
        self.reset();
        Ok(())
    }

    /// Clears cached structure and data and returns to `Uninitialized`.
    pub fn reset(&mut self) {
        self.structure = None;
        self.state = LoaderState::Uninitialized;
        self.retrieval = Retrieval::None;
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// Returns the dataset schema, decoding the source if it has not been
    /// read yet. A repeated query returns the cached schema unchanged.
    pub fn get_structure(&mut self) -> Result<Schema> {
        if let Some(schema) = &self.structure {
            return Ok(schema.clone());
        }
        let dataset = self.read_source()?;
        let schema = dataset.schema.clone();
        self.structure = Some(schema.clone());
        self.state = LoaderState::StructureKnown;
        Ok(schema)
    }

    /// Returns the full dataset, always re-reading the source; schema and
    /// rows are recomputed together.
    pub fn get_dataset(&mut self) -> Result<TabularDataset> {
        let dataset = self.read_source()?;
        self.structure = Some(dataset.schema.clone());
        self.state = LoaderState::DataRead;
        Ok(dataset)
    }

    /// Incremental retrieval is not supported; this always fails, and also
    /// marks the loader incremental so a later batch call is rejected too.
    pub fn get_next_row(&mut self) -> Result<Row> {
        if self.retrieval == Retrieval::Batch {
            return Err(ConvertError::incompatible_mode(
                "cannot mix incremental and batch retrieval on one loader",
            ));
        }
        self.retrieval = Retrieval::Incremental;
        Err(ConvertError::incompatible_mode(
            "incremental loading is not supported",
        ))
    }

    fn read_source(&mut self) -> Result<TabularDataset> {
        if self.retrieval == Retrieval::Incremental {
            return Err(ConvertError::incompatible_mode(
                "cannot mix incremental and batch retrieval on one loader",
            ));
        }
        self.retrieval = Retrieval::Batch;
        let path = self
            .source
            .clone()
            .ok_or_else(|| ConvertError::source_unavailable("no source file set".to_string()))?;
        let container = MatContainer::read_path(&path)?;
        decode_entry(
            &container,
            &path,
            &self.entry_name,
            self.max_nominal_values,
        )
    }
}

type Row = Vec<crate::dataset::CellData>;

/// Selects the requested entry (first when the name is empty) and runs the
/// full decode pipeline: grid extraction, profiling, schema, rows.
pub fn decode_entry(
    container: &MatContainer,
    source: &Path,
    entry_name: &str,
    max_nominal: i32,
) -> Result<TabularDataset> {
    debug!("Entries in {source:?}:");
    let mut selected = None;
    for (idx, entry) in container.entries.iter().enumerate() {
        debug!("{}: {}", idx + 1, entry.name);
        if selected.is_none() && (entry.name == entry_name || entry_name.is_empty()) {
            selected = Some(entry);
        }
    }
    let entry = selected.ok_or_else(|| ConvertError::entry_not_found(entry_name))?;

    let array = &entry.array;
    if array.num_dims() > 2 {
        return Err(ConvertError::UnsupportedDimensionality {
            ndims: array.num_dims(),
        });
    }
    if let RawArray::Other { class, .. } = array {
        return Err(ConvertError::UnsupportedArrayKind {
            class: class.clone(),
        });
    }

    let grid = RawGrid::from_array(array)?;
    let name = if entry.name.is_empty() {
        source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string())
    } else {
        entry.name.clone()
    };
    TabularDataset::from_grid(name, &grid, max_nominal)
}
