use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::utils::file::{default_output_path, load_settings};

/// Indentation of the written JSON-LD.
const OUTPUT_INDENT: usize = 4;

#[derive(Args, Debug, Clone)]
#[command(about = "Convert a metadata workbook into a BattINFO JSON-LD document")]
pub struct ConvertArgs {
    /// Directory holding the workbook sheets as CSV files
    #[arg(value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Output file [default: BattINFO_converter_<DIR name>.json]
    #[arg(short, long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Converter settings (TOML)
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Print the document to stdout instead of writing a file
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,
}

pub fn execute(args: ConvertArgs) -> Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    let conversion = battinfo_core::convert_dir(&args.dir, &settings)
        .with_context(|| format!("Failed to convert {}", args.dir.display()))?;
    let json = conversion
        .document
        .to_json_pretty(OUTPUT_INDENT)
        .context("Failed to serialise the JSON-LD document")?;

    if args.stdout {
        let mut writer = io::stdout().lock();
        writeln!(writer, "{json}")?;
        return Ok(());
    }

    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&args.dir));
    std::fs::write(&output, &json)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!("Wrote {}", output.display());
    eprintln!(
        "{} {} ({} of {} rows written)",
        "Converted".green().bold(),
        output.display(),
        conversion.report.written(),
        conversion.report.rows.len()
    );
    Ok(())
}
