use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use mat_tabular::dataset::TabularDataset;
use mat_tabular::grid::RawGrid;
use mat_tabular::mat5::{CellArray, CharArray, MatContainer, NumericArray, RawArray};

fn numeric_container(rows: usize, cols: usize) -> Vec<u8> {
    let data = (0..rows)
        .map(|r| (0..cols).map(|c| (r * cols + c) as f64).collect())
        .collect();
    let mut container = MatContainer::new();
    container.add_entry("m", RawArray::Matrix(NumericArray::from_rows(data)));
    container.to_bytes().expect("serialize")
}

fn cell_container(rows: usize) -> Vec<u8> {
    let labels = ["red", "green", "blue", "cyan", "magenta"];
    let data = (0..rows)
        .map(|r| {
            vec![
                RawArray::Matrix(NumericArray::scalar(r as f64)),
                RawArray::Char(CharArray::from_str(labels[r % labels.len()])),
            ]
        })
        .collect();
    let mut container = MatContainer::new();
    container.add_entry("cells", RawArray::Cell(CellArray::from_rows(data)));
    container.to_bytes().expect("serialize")
}

fn bench_decode(c: &mut Criterion) {
    let numeric = numeric_container(1000, 20);
    c.bench_function("decode_numeric_1000x20", |b| {
        b.iter(|| {
            let container = MatContainer::from_bytes(black_box(&numeric)).expect("parse");
            let grid = RawGrid::from_array(&container.entries[0].array).expect("grid");
            TabularDataset::from_grid("bench", &grid, 25).expect("dataset")
        })
    });

    let cells = cell_container(2000);
    c.bench_function("decode_cells_2000x2", |b| {
        b.iter(|| {
            let container = MatContainer::from_bytes(black_box(&cells)).expect("parse");
            let grid = RawGrid::from_array(&container.entries[0].array).expect("grid");
            TabularDataset::from_grid("bench", &grid, 25).expect("dataset")
        })
    });
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
