//! # xlrobot-cli
//!
//! Command-line access to the xlrobot spreadsheet keywords.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use xlrobot_keywords::{CellPairs, CellValue, ExcelLibrary, FormatConfig, WriteValue};
use xlrobot_primitives::{column_letters_to_index, excel_name_to_coord};

/// xlrobot - read and write .xls and .xlsx workbooks
#[derive(Parser)]
#[command(name = "xlrobot")]
#[command(author, version, about = "Spreadsheet keywords from the shell", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    formats: FormatArgs,

    /// Output format (table, json)
    #[arg(short = 'f', long = "format", default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Format settings; flags override values from `--config`.
#[derive(Args, Default)]
struct FormatArgs {
    /// JSON file with format settings
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Date pattern, e.g. yyyy-mm-dd
    #[arg(long, global = true)]
    date_format: Option<String>,

    /// Time pattern, e.g. "HH:MM:SS AM/PM"
    #[arg(long, global = true)]
    time_format: Option<String>,

    /// Date-time pattern, e.g. "yyyy-mm-dd HH:MM"
    #[arg(long, global = true)]
    datetime_format: Option<String>,

    #[arg(long, global = true)]
    decimal_separator: Option<String>,

    #[arg(long, global = true)]
    thousand_separator: Option<String>,

    /// Digits after the decimal separator
    #[arg(long, global = true)]
    precision: Option<usize>,

    /// True/false labels, e.g. Yes/No
    #[arg(long, global = true)]
    bool_format: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List sheet names
    Sheets {
        file: PathBuf,
    },
    /// Show row and column counts of a sheet
    Dims {
        file: PathBuf,
        sheet: String,
    },
    /// Read one cell
    Read {
        file: PathBuf,
        sheet: String,
        /// Cell name such as B3
        cell: String,
        /// Type to read the cell as (TEXT, NUMBER, DATE, ...)
        #[arg(short = 't', long = "type")]
        data_type: Option<String>,
        /// Return the stored value instead of the formatted text
        #[arg(long)]
        raw: bool,
    },
    /// List cell values of a column, a row, a sheet or the whole workbook
    Values {
        file: PathBuf,
        /// Sheet to list; all sheets when omitted
        sheet: Option<String>,
        /// Column letters, e.g. C
        #[arg(long, conflicts_with = "row", requires = "sheet")]
        column: Option<String>,
        /// 1-based row number
        #[arg(long, requires = "sheet")]
        row: Option<u32>,
        /// Keep empty and falsy cells
        #[arg(long)]
        include_empty: bool,
    },
    /// Check that a cell holds a given type
    Check {
        file: PathBuf,
        sheet: String,
        cell: String,
        data_type: String,
    },
    /// Write one cell and save
    Write {
        file: PathBuf,
        sheet: String,
        cell: String,
        value: String,
        /// Type to write the value as; inferred when omitted
        #[arg(short = 't', long = "type")]
        data_type: Option<String>,
        #[command(flatten)]
        target: SaveTarget,
    },
    /// Add an empty sheet and save
    CreateSheet {
        file: PathBuf,
        sheet: String,
        #[command(flatten)]
        target: SaveTarget,
    },
    /// Remove a sheet and save
    RemoveSheet {
        file: PathBuf,
        sheet: String,
        #[command(flatten)]
        target: SaveTarget,
    },
}

/// Where a modifying command saves.
#[derive(Args)]
struct SaveTarget {
    /// Save to this file instead of updating FILE in place
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Replace OUTPUT if it already exists
    #[arg(long)]
    force: bool,
}

/// Output format for results.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// Pretty table output (default)
    #[default]
    Table,
    /// JSON output
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let config = load_config(&cli.formats)?;
    let mut library = ExcelLibrary::new(&config).context("Invalid format settings")?;
    run(&mut library, cli.command, cli.format)
}

/// Merge the config file (if any) with flag overrides.
fn load_config(args: &FormatArgs) -> Result<FormatConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&source)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        }
        None => FormatConfig::default(),
    };

    if let Some(v) = &args.date_format {
        config.date_format.clone_from(v);
    }
    if let Some(v) = &args.time_format {
        config.time_format.clone_from(v);
    }
    if let Some(v) = &args.datetime_format {
        config.datetime_format.clone_from(v);
    }
    if let Some(v) = &args.decimal_separator {
        config.decimal_separator.clone_from(v);
    }
    if let Some(v) = &args.thousand_separator {
        config.thousand_separator.clone_from(v);
    }
    if let Some(v) = args.precision {
        config.precision = v;
    }
    if let Some(v) = &args.bool_format {
        config.bool_format.clone_from(v);
    }
    tracing::debug!("Format settings: {:?}", config);
    Ok(config)
}

fn run(library: &mut ExcelLibrary, command: Command, output: OutputFormat) -> Result<()> {
    match command {
        Command::Sheets { file } => {
            open(library, &file)?;
            for name in library.get_sheet_names()? {
                println!("{name}");
            }
        }
        Command::Dims { file, sheet } => {
            open(library, &file)?;
            let rows = library.get_row_count(&sheet)?;
            let cols = library.get_column_count(&sheet)?;
            match output {
                OutputFormat::Table => println!("{rows} rows x {cols} columns"),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "sheet": sheet, "rows": rows, "columns": cols })
                ),
            }
        }
        Command::Read {
            file,
            sheet,
            cell,
            data_type,
            raw,
        } => {
            open(library, &file)?;
            let value = library
                .read_cell_data_by_name(&sheet, &cell, data_type.as_deref(), !raw)
                .with_context(|| format!("Failed to read {sheet}!{cell}"))?;
            match output {
                OutputFormat::Table => println!("{value}"),
                OutputFormat::Json => println!("{}", cell_to_json(&value)),
            }
        }
        Command::Values {
            file,
            sheet,
            column,
            row,
            include_empty,
        } => {
            open(library, &file)?;
            let listings = list_values(library, sheet, column, row, include_empty)?;
            print_listings(&listings, output)?;
        }
        Command::Check {
            file,
            sheet,
            cell,
            data_type,
        } => {
            open(library, &file)?;
            let (column, row) = excel_name_to_coord(&cell)?;
            let matches = library.check_cell_type(&sheet, column, row, &data_type)?;
            println!("{matches}");
        }
        Command::Write {
            file,
            sheet,
            cell,
            value,
            data_type,
            target,
        } => {
            open_to_write(library, &file, &target)?;
            let value = match data_type {
                Some(_) => WriteValue::Text(value),
                None => WriteValue::infer(&value),
            };
            library
                .write_to_cell_by_name(&sheet, &cell, value, data_type.as_deref())
                .with_context(|| format!("Failed to write {sheet}!{cell}"))?;
            save(library)?;
        }
        Command::CreateSheet {
            file,
            sheet,
            target,
        } => {
            open_to_write(library, &file, &target)?;
            library.create_sheet(&sheet)?;
            save(library)?;
        }
        Command::RemoveSheet {
            file,
            sheet,
            target,
        } => {
            open_to_write(library, &file, &target)?;
            library.remove_sheet(&sheet)?;
            save(library)?;
        }
    }
    Ok(())
}

fn open(library: &mut ExcelLibrary, file: &Path) -> Result<()> {
    library
        .open_excel(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    if let Some(session) = library.session() {
        tracing::info!(
            "Reading {} as {}",
            session.path().display(),
            session.reader().format()
        );
    }
    Ok(())
}

fn open_to_write(library: &mut ExcelLibrary, file: &Path, target: &SaveTarget) -> Result<()> {
    tracing::debug!(
        "Opening {} for writing (output: {:?}, force: {})",
        file.display(),
        target.output,
        target.force
    );
    library
        .open_excel_to_write(file, target.output.as_deref(), target.force)
        .with_context(|| format!("Failed to open {} for writing", file.display()))
}

fn save(library: &mut ExcelLibrary) -> Result<()> {
    let path = library.save_excel().context("Failed to save workbook")?;
    tracing::info!("Workbook written to {}", path.display());
    eprintln!("Saved {}", path.display());
    Ok(())
}

/// Collect the listing a `values` invocation asks for, tagged by sheet.
fn list_values(
    library: &ExcelLibrary,
    sheet: Option<String>,
    column: Option<String>,
    row: Option<u32>,
    include_empty: bool,
) -> Result<Vec<(String, CellPairs)>> {
    let Some(sheet) = sheet else {
        return Ok(library.get_workbook_values(include_empty)?);
    };
    let pairs = if let Some(letters) = column {
        let column = column_letters_to_index(&letters)?;
        library.get_column_values(&sheet, column, include_empty)?
    } else if let Some(row) = row {
        let row = row
            .checked_sub(1)
            .context("Row numbers start at 1")?;
        library.get_row_values(&sheet, row, include_empty)?
    } else {
        library.get_sheet_values(&sheet, include_empty)?
    };
    Ok(vec![(sheet, pairs)])
}

fn print_listings(listings: &[(String, CellPairs)], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Table => {
            let multiple = listings.len() > 1;
            for (sheet, pairs) in listings {
                if multiple {
                    println!("[{sheet}]");
                }
                for (name, value) in pairs {
                    println!("{name}\t{value}");
                }
            }
        }
        OutputFormat::Json => {
            let mut map = serde_json::Map::new();
            for (sheet, pairs) in listings {
                map.insert(sheet.clone(), pairs_to_json(pairs));
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(map))?
            );
        }
    }
    Ok(())
}

fn pairs_to_json(pairs: &CellPairs) -> serde_json::Value {
    serde_json::Value::Array(
        pairs
            .iter()
            .map(|(name, value)| serde_json::json!({ "cell": name, "value": cell_to_json(value) }))
            .collect(),
    )
}

fn cell_to_json(value: &CellValue) -> serde_json::Value {
    match value {
        CellValue::Empty => serde_json::Value::Null,
        CellValue::Bool(b) => serde_json::Value::Bool(*b),
        CellValue::Number(n) => serde_json::Value::from(*n),
        CellValue::Text(s) => serde_json::Value::String(s.clone()),
        other => serde_json::Value::String(other.to_string()),
    }
}
