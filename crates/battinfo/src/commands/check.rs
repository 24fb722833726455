use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use battinfo_core::ConversionReport;
use clap::{Args, ValueEnum};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::Table;

use crate::utils::file::load_settings;

#[derive(ValueEnum, Debug, Clone, Default)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Table => write!(f, "table"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Args, Debug, Clone)]
#[command(about = "Report how every schema row of a workbook is handled")]
pub struct CheckArgs {
    /// Directory holding the workbook sheets as CSV files
    #[arg(value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Converter settings (TOML)
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value_t = ReportFormat::Table)]
    pub format: ReportFormat,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    let conversion = battinfo_core::convert_dir(&args.dir, &settings)
        .with_context(|| format!("Failed to convert {}", args.dir.display()))?;

    let mut writer = io::stdout().lock();
    match args.format {
        ReportFormat::Json => writeln!(
            writer,
            "{}",
            serde_json::to_string_pretty(&conversion.report)?
        )?,
        ReportFormat::Table => write_report_table(&conversion.report, writer)?,
    };

    Ok(())
}

fn write_report_table<W: Write>(report: &ConversionReport, mut writer: W) -> io::Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);
    table.set_header(vec!["Line", "Metadata", "Ontology link", "Outcome"]);

    for row in &report.rows {
        let outcome = if row.outcome.is_written() {
            row.outcome.as_str().normal()
        } else {
            row.outcome.as_str().dimmed()
        };
        table.add_row(vec![
            row.line.to_string(),
            row.metadata.clone(),
            row.link.clone(),
            outcome.to_string(),
        ]);
    }

    writeln!(writer, "{table}")?;
    writeln!(
        writer,
        "{} of {} rows written",
        report.written().to_string().as_str().bold(),
        report.rows.len()
    )?;
    Ok(())
}
