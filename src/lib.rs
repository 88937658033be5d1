pub mod cli;
pub mod dataset;
pub mod error;
pub mod export;
pub mod grid;
pub mod import;
pub mod io_utils;
pub mod loader;
pub mod mat5;
pub mod saver;
pub mod schema;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};
use crate::loader::MatLoader;
use crate::mat5::MatContainer;
use crate::schema::ColumnKind;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("mat_tabular", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::List(args) => handle_list(&args),
        Commands::Probe(args) => handle_probe(&args),
        Commands::Export(args) => export::execute(&args),
        Commands::Import(args) => import::execute(&args),
    }
}

fn handle_list(args: &cli::ListArgs) -> Result<()> {
    let container = MatContainer::read_path(&args.input)
        .with_context(|| format!("Reading container {:?}", args.input))?;
    let headers = ["#", "entry", "class", "rows", "cols"]
        .map(String::from)
        .to_vec();
    let rows: Vec<Vec<String>> = container
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            vec![
                (idx + 1).to_string(),
                entry.name.clone(),
                entry.array.class_name().to_string(),
                entry.array.rows().to_string(),
                entry.array.cols().to_string(),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
    info!(
        "Listed {} entr(ies) from {:?}",
        container.entries.len(),
        args.input
    );
    Ok(())
}

fn handle_probe(args: &cli::ProbeArgs) -> Result<()> {
    let mut loader = MatLoader::new();
    loader.set_source(args.input.clone())?;
    loader.set_entry_name(args.entry_name.clone());
    loader.set_max_nominal_values(args.max_nominal_values);
    let schema = loader
        .get_structure()
        .with_context(|| format!("Inferring schema from {:?}", args.input))?;

    let headers = ["column", "kind", "labels"].map(String::from).to_vec();
    let rows: Vec<Vec<String>> = schema
        .columns
        .iter()
        .map(|col| {
            let labels = match &col.kind {
                ColumnKind::Categorical(labels) => labels.join(", "),
                _ => String::new(),
            };
            vec![col.name.clone(), col.kind.describe(), labels]
        })
        .collect();
    table::print_table(&headers, &rows);

    if let Some(meta) = &args.meta {
        schema
            .save(meta)
            .with_context(|| format!("Writing metadata to {meta:?}"))?;
        info!(
            "Inferred schema for {} column(s) written to {:?}",
            schema.len(),
            meta
        );
    } else {
        info!("Inferred schema for {} column(s)", schema.len());
    }
    Ok(())
}
