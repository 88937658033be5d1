#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use mat_tabular::mat5::{CellArray, CharArray, MatContainer, NumericArray, RawArray};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Serializes a container into the workspace and returns the path.
    pub fn write_container(&self, name: &str, container: &MatContainer) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, container.to_bytes().expect("serialize container"))
            .expect("write container");
        path
    }
}

/// A 3x2 numeric matrix entry named "m".
pub fn numeric_container() -> MatContainer {
    let mut container = MatContainer::new();
    container.add_entry(
        "m",
        RawArray::Matrix(NumericArray::from_rows(vec![
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 6.0],
        ])),
    );
    container
}

/// A 4x1 cell column of color strings, entry named "colors".
pub fn color_container() -> MatContainer {
    let rows = ["red", "blue", "red", "green"]
        .iter()
        .map(|s| vec![RawArray::Char(CharArray::from_str(s))])
        .collect();
    let mut container = MatContainer::new();
    container.add_entry("colors", RawArray::Cell(CellArray::from_rows(rows)));
    container
}
