mod common;

use mat_tabular::dataset::TabularDataset;
use mat_tabular::grid::{CellValue, RawGrid};
use mat_tabular::loader::MatLoader;
use mat_tabular::mat5::{MatContainer, NumericArray, RawArray};
use mat_tabular::saver::MatSaver;
use mat_tabular::schema::ColumnKind;
use proptest::prelude::*;

use common::TestWorkspace;

proptest! {
    /// Finite doubles survive the container byte format exactly.
    #[test]
    fn numeric_values_round_trip_bit_exact(values in prop::collection::vec(-1e300f64..1e300, 1..64)) {
        let mut container = MatContainer::new();
        container.add_entry(
            "v",
            RawArray::Matrix(NumericArray::from_rows(values.iter().map(|v| vec![*v]).collect())),
        );
        let bytes = container.to_bytes().expect("serialize");
        let parsed = MatContainer::from_bytes(&bytes).expect("parse");
        let RawArray::Matrix(matrix) = &parsed.entries[0].array else {
            panic!("expected matrix");
        };
        let decoded: Vec<f64> = (0..values.len())
            .map(|r| matrix.get(r, 0).expect("value"))
            .collect();
        prop_assert_eq!(decoded, values);
    }

    /// A column where every raw value parses as a number is numeric for
    /// every threshold.
    #[test]
    fn numeric_columns_ignore_threshold(
        values in prop::collection::vec(-1e6f64..1e6, 1..32),
        threshold in -1i32..40,
    ) {
        let grid = RawGrid::from_rows(
            values.iter().map(|v| vec![CellValue::Number(*v)]).collect(),
        );
        let dataset = TabularDataset::from_grid("p", &grid, threshold).expect("dataset");
        prop_assert_eq!(&dataset.schema.columns[0].kind, &ColumnKind::Numeric);
    }

    /// Categorical-vs-text follows the distinct-count rule exactly.
    #[test]
    fn threshold_rule_matches_distinct_count(
        labels in prop::collection::vec("[a-z]{1,6}", 1..20),
        threshold in 1i32..10,
    ) {
        let grid = RawGrid::from_rows(
            labels.iter().map(|l| vec![CellValue::Text(l.clone())]).collect(),
        );
        let distinct = labels.iter().collect::<std::collections::HashSet<_>>().len();
        let dataset = TabularDataset::from_grid("p", &grid, threshold).expect("dataset");
        match &dataset.schema.columns[0].kind {
            ColumnKind::Categorical(observed) => {
                prop_assert!(distinct <= threshold as usize);
                prop_assert_eq!(observed.len(), distinct);
            }
            ColumnKind::Text => prop_assert!(distinct > threshold as usize),
            ColumnKind::Numeric => prop_assert!(false, "text column cannot be numeric"),
        }
    }
}

/// Lossy round-trip: shape and numeric values survive; categorical kinds
/// degrade per the persisted header's generic non-numeric tag.
#[test]
fn dataset_round_trip_is_documented_lossy() {
    let workspace = TestWorkspace::new();
    let grid = RawGrid::from_rows(vec![
        vec![CellValue::Number(0.25), CellValue::Text("alpha".to_string())],
        vec![CellValue::Number(-3.0), CellValue::Text("beta".to_string())],
    ]);
    let original = TabularDataset::from_grid("pair", &grid, 25).expect("dataset");

    let path = workspace.path().join("pair.mat");
    let mut saver = MatSaver::new();
    saver.set_output(&path);
    saver.write_batch(&original).expect("write");

    let mut loader = MatLoader::new();
    loader.set_source(&path).expect("source");
    loader.set_entry_name("data");
    let decoded = loader.get_dataset().expect("decode");

    assert_eq!(decoded.num_rows(), original.num_rows());
    assert_eq!(decoded.num_columns(), original.num_columns());
    assert_eq!(decoded.schema.columns[0].kind, ColumnKind::Numeric);
    assert_eq!(decoded.cell_display(0, 0), "0.25");
    assert_eq!(decoded.cell_display(1, 1), "beta");
}
