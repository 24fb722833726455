use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "battinfo")]
#[command(about = "Convert BattINFO metadata workbooks into JSON-LD", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a workbook into a JSON-LD document
    #[command(alias = "c")]
    Convert(commands::convert::ConvertArgs),

    /// Show how every schema row is handled, without writing a document
    Check(commands::check::CheckArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Plain output when NO_COLOR is set
    utils::color::init_color();

    // Default level depends on --debug; RUST_LOG overrides both
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Convert(args) => commands::convert::execute(args),
        Commands::Check(args) => commands::check::execute(args),
    }
}
