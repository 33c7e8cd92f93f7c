//! Extract command - apply a template to a single PDF.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use plx_core::models::{CellValue, Extraction, FieldValue, Record};
use plx_core::TemplateExtractor;

use super::{load_config, load_template};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Template JSON file
    #[arg(short, long)]
    template: PathBuf,

    /// Scan for repeated records regardless of the template flag
    #[arg(long)]
    repeated: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV, one row per record
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let template = load_template(&args.template, args.repeated)?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Extracting fields...");

    let data = fs::read(&args.input)?;
    let extraction = TemplateExtractor::new(config).extract_pdf(&data, &template)?;
    pb.finish_and_clear();

    let output = format_extraction(&extraction, args.format, args.pretty)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

/// Render an extraction in the requested format.
pub fn format_extraction(
    extraction: &Extraction,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(extraction)?),
        OutputFormat::Json => Ok(serde_json::to_string(extraction)?),
        OutputFormat::Csv => format_csv(extraction),
        OutputFormat::Text => Ok(format_text(extraction)),
    }
}

/// Records to render as rows: the products in repeated mode, else the single data record.
fn rows(extraction: &Extraction) -> Vec<&Record> {
    match &extraction.products {
        Some(products) => products.iter().collect(),
        None => vec![&extraction.data],
    }
}

fn format_csv(extraction: &Extraction) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let header: Vec<&str> = extraction.data.iter().map(|(name, _)| name).collect();
    wtr.write_record(&header)?;

    for record in rows(extraction) {
        let cells: Vec<String> = header
            .iter()
            .map(|name| record.get(name).map(cell_text).unwrap_or_default())
            .collect();
        wtr.write_record(&cells)?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(extraction: &Extraction) -> String {
    let mut output = String::new();

    match &extraction.products {
        Some(products) => {
            output.push_str(&format!("Records: {}\n", products.len()));
            for (i, record) in products.iter().enumerate() {
                output.push_str(&format!("\nRecord {}:\n", i + 1));
                for (name, value) in record.iter() {
                    output.push_str(&format!("  {}: {}\n", name, cell_text(value)));
                }
            }
        }
        None => {
            for (name, value) in extraction.data.iter() {
                output.push_str(&format!("{}: {}\n", name, cell_text(value)));
            }
        }
    }

    output
}

/// Flat text form of a value for CSV cells and text output.
fn cell_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Text(text) => text.clone(),
        FieldValue::SizeGrid(grid) => grid
            .labels()
            .map(|label| format!("{}:{}", label, grid.get(label).unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(" "),
        FieldValue::Table(rows) => rows
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|col| match row.get(col) {
                        Some(CellValue::Integer(n)) => n.to_string(),
                        Some(CellValue::Decimal(d)) => d.to_string(),
                        Some(CellValue::Text(s)) => s.clone(),
                        Some(CellValue::Null) | None => String::new(),
                    })
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("; "),
        FieldValue::List(values) => values
            .iter()
            .map(cell_text)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plx_core::models::SizeGrid;
    use pretty_assertions::assert_eq;

    fn record(code: &str, grid: &[(&str, u64)]) -> Record {
        let mut record = Record::new();
        record.insert("code", FieldValue::Text(code.to_string()));
        record.insert(
            "sizes",
            FieldValue::SizeGrid(grid.iter().map(|(l, q)| (l.to_string(), *q)).collect::<SizeGrid>()),
        );
        record
    }

    #[test]
    fn test_csv_for_repeated_records() {
        let extraction = Extraction::repeated(
            &["code", "sizes"],
            vec![record("A1", &[("S", 3), ("M", 5)]), record("B2", &[("L", 1)])],
        );
        let csv = format_extraction(&extraction, OutputFormat::Csv, false).unwrap();
        assert_eq!(csv, "code,sizes\nA1,S:3 M:5\nB2,L:1\n");
    }

    #[test]
    fn test_text_for_single_record() {
        let mut data = Record::new();
        data.insert("po", FieldValue::Text("4411".to_string()));
        data.insert("notes", FieldValue::Null);
        let text = format_extraction(&Extraction::single(data), OutputFormat::Text, false).unwrap();
        assert_eq!(text, "po: 4411\nnotes: \n");
    }

    #[test]
    fn test_table_cell_text() {
        let value = FieldValue::Table(vec![plx_core::models::TableRow::new(vec![
            CellValue::Text("A1".to_string()),
            CellValue::Integer(3),
            CellValue::Null,
        ])]);
        assert_eq!(cell_text(&value), "A1 | 3 | ");
    }
}
