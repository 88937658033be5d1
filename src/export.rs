use anyhow::{Context, Result};
use log::info;

use crate::{cli::ExportArgs, io_utils, loader::MatLoader};

pub fn execute(args: &ExportArgs) -> Result<()> {
    let mut loader = MatLoader::new();
    loader.set_source(args.input.clone())?;
    loader.set_entry_name(args.entry_name.clone());
    loader.set_max_nominal_values(args.max_nominal_values);
    let dataset = loader
        .get_dataset()
        .with_context(|| format!("Decoding {:?}", args.input))?;

    let delimiter = args
        .output
        .as_deref()
        .map(|path| io_utils::resolve_delimiter(path, args.delimiter))
        .unwrap_or(args.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER));
    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), delimiter)?;

    let names: Vec<&str> = dataset
        .schema
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    writer.write_record(&names).context("Writing CSV header")?;
    for r in 0..dataset.num_rows() {
        let row: Vec<String> = (0..dataset.num_columns())
            .map(|c| dataset.cell_display(r, c))
            .collect();
        writer
            .write_record(&row)
            .with_context(|| format!("Writing row {}", r + 1))?;
    }
    writer.flush().context("Flushing CSV output")?;

    info!(
        "Exported {} row(s), {} column(s) from '{}'",
        dataset.num_rows(),
        dataset.num_columns(),
        dataset.name
    );
    Ok(())
}
