use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ImportArgs,
    dataset::TabularDataset,
    grid::{RawGrid, classify_text},
    io_utils,
    saver::MatSaver,
};

pub fn execute(args: &ImportArgs) -> Result<()> {
    let delimiter = io_utils::resolve_delimiter(&args.input, args.delimiter);
    let has_headers = !args.no_headers;
    let mut reader = io_utils::open_csv_reader(&args.input, delimiter, has_headers)?;

    let names: Vec<String> = if has_headers {
        reader
            .headers()
            .context("Reading CSV header")?
            .iter()
            .map(|h| h.to_string())
            .collect()
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 1))?;
        rows.push(record.iter().map(classify_text).collect::<Vec<_>>());
    }

    // Zero-row input is rejected by the saver, not here.
    let grid = RawGrid::from_rows(rows);
    let name = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let dataset = if has_headers {
        TabularDataset::from_grid_with_names(name, &grid, args.max_nominal_values, &names)?
    } else {
        TabularDataset::from_grid(name, &grid, args.max_nominal_values)?
    };

    let mut saver = MatSaver::new();
    saver.set_output(args.output.clone());
    saver.set_entry_name_header(args.entry_name_header.clone());
    saver.set_entry_name_data(args.entry_name_data.clone());
    saver
        .write_batch(&dataset)
        .with_context(|| format!("Writing container {:?}", args.output))?;

    info!(
        "Imported {} row(s), {} column(s) into {:?}",
        dataset.num_rows(),
        dataset.num_columns(),
        args.output
    );
    Ok(())
}
