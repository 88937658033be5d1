//! Column kinds, schema model, and the column profiler.
//!
//! A column's kind is decided once from a full scan of its grid cells and
//! is immutable afterward. Classification is all-or-nothing per column: a
//! single cell that failed numeric classification demotes the whole column
//! to categorical or text, regardless of how many cells parsed cleanly.

use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::grid::{CellValue, RawGrid};

/// Default maximum distinct values before a non-numeric column becomes
/// free text instead of categorical.
pub const DEFAULT_MAX_NOMINAL_VALUES: i32 = 25;

/// Clamps a configured threshold into the supported range; anything below
/// -1 means the same as -1 (always categorical).
pub fn clamp_threshold(value: i32) -> i32 {
    value.max(-1)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    /// Distinct labels observed in the column, lexicographically sorted.
    Categorical(Vec<String>),
    Text,
}

impl ColumnKind {
    /// Short tag persisted in container headers. Categorical and text are
    /// not distinguished there; both carry the generic non-numeric tag.
    pub fn short_tag(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "NUM",
            ColumnKind::Categorical(_) | ColumnKind::Text => "STR",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ColumnKind::Numeric => "numeric".to_string(),
            ColumnKind::Categorical(labels) => format!("categorical({})", labels.len()),
            ColumnKind::Text => "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
}

impl Schema {
    /// Builds a schema with synthesized `col-N` names (1-based, matching
    /// source column positions).
    pub fn from_kinds(kinds: Vec<ColumnKind>) -> Self {
        let columns = kinds
            .into_iter()
            .enumerate()
            .map(|(idx, kind)| ColumnDef {
                name: format!("col-{}", idx + 1),
                kind,
            })
            .collect();
        Schema { columns }
    }

    /// Builds a schema with caller-supplied names (CSV import keeps header
    /// names); missing names fall back to the synthesized form.
    pub fn with_names(names: &[String], kinds: Vec<ColumnKind>) -> Self {
        let columns = kinds
            .into_iter()
            .enumerate()
            .map(|(idx, kind)| ColumnDef {
                name: names
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| format!("col-{}", idx + 1)),
                kind,
            })
            .collect();
        Schema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating meta file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing schema JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening meta file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema = serde_json::from_reader(reader).context("Parsing schema JSON")?;
        Ok(schema)
    }
}

/// Profiles one column of classified cells into its final kind.
///
/// The distinct set is collected in a single pass and sorted only when the
/// labels are finalized. A zero-row column profiles as numeric: the
/// all-numeric check holds vacuously, which is the defined behavior rather
/// than a special case.
pub fn profile_column<'a>(
    cells: impl Iterator<Item = &'a CellValue>,
    max_nominal: i32,
) -> ColumnKind {
    let mut all_numeric = true;
    let mut distinct: HashSet<String> = HashSet::new();
    for cell in cells {
        if !cell.is_number() {
            all_numeric = false;
        }
        distinct.insert(cell.display());
    }
    if all_numeric {
        return ColumnKind::Numeric;
    }
    if max_nominal == -1 || distinct.len() <= max_nominal as usize {
        ColumnKind::Categorical(distinct.into_iter().sorted().collect())
    } else {
        ColumnKind::Text
    }
}

/// Profiles every grid column and assembles the schema.
pub fn infer_schema(grid: &RawGrid, max_nominal: i32) -> Schema {
    let kinds = (0..grid.cols())
        .map(|col| profile_column(grid.column(col), max_nominal))
        .collect();
    Schema::from_kinds(kinds)
}
