use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::schema::DEFAULT_MAX_NOMINAL_VALUES;

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert MATLAB .mat containers to and from typed tabular datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the entries stored in a container
    List(ListArgs),
    /// Infer and display the tabular schema of a container entry
    Probe(ProbeArgs),
    /// Decode a container entry into a CSV file
    Export(ExportArgs),
    /// Encode a CSV file into a container
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Input container file (.mat, optionally .mat.gz)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input container file (.mat, optionally .mat.gz)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Entry to retrieve; first entry if empty
    #[arg(long = "entry-name", default_value = "")]
    pub entry_name: String,
    /// Maximum distinct values for a categorical column; -1 = always
    /// categorical, 0 = always text
    #[arg(long = "max-nominal-values", default_value_t = DEFAULT_MAX_NOMINAL_VALUES, allow_hyphen_values = true)]
    pub max_nominal_values: i32,
    /// Optional destination for the schema preview as JSON
    #[arg(short = 'o', long = "meta")]
    pub meta: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Input container file (.mat, optionally .mat.gz)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted or '-')
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Entry to retrieve; first entry if empty
    #[arg(long = "entry-name", default_value = "")]
    pub entry_name: String,
    /// Maximum distinct values for a categorical column; -1 = always
    /// categorical, 0 = always text
    #[arg(long = "max-nominal-values", default_value_t = DEFAULT_MAX_NOMINAL_VALUES, allow_hyphen_values = true)]
    pub max_nominal_values: i32,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Input CSV file ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output container file (.mat)
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Entry name for the header cell grid
    #[arg(long = "entry-name-header", default_value = crate::saver::DEFAULT_ENTRY_NAME_HEADER)]
    pub entry_name_header: String,
    /// Entry name for the data cell grid
    #[arg(long = "entry-name-data", default_value = crate::saver::DEFAULT_ENTRY_NAME_DATA)]
    pub entry_name_data: String,
    /// Maximum distinct values for a categorical column; -1 = always
    /// categorical, 0 = always text
    #[arg(long = "max-nominal-values", default_value_t = DEFAULT_MAX_NOMINAL_VALUES, allow_hyphen_values = true)]
    pub max_nominal_values: i32,
    /// Treat the first CSV row as data, synthesizing col-N column names
    #[arg(long = "no-headers")]
    pub no_headers: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_aliases_resolve() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("x").unwrap(), b'x');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("xy").is_err());
    }
}
