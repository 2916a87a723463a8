use std::fs::File;
use clap::{Parser, Subcommand};
use ecm_rs::{BoxError, cli};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};

/// Term matching and code position toolkit
#[derive(Parser, Debug)]
#[clap(name = "ecm-rs", version, infer_subcommands = true, subcommand_required = true)]
struct Args {
  /// Enable debug logging
  #[clap(short, long, global = true)]
  debug: bool,
  /// Write the log to FILE instead of stderr
  #[clap(long, value_name = "FILE", global = true)]
  log: Option<String>,
  /// Maximum number of reduction steps per conversion check
  #[clap(long, value_name = "N", global = true)]
  fuel: Option<usize>,
  #[clap(subcommand)]
  cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
  /// Match a term against a pattern and print the captures
  Search(cli::SearchArgs),
  /// Select the occurrences of a closed term inside another
  Select(cli::SelectArgs),
  /// Match a formula pattern with placeholders, or rewrite with an equation
  Fmatch(cli::FMatchArgs),
  /// Show or edit the instruction at a code position
  Zip(cli::ZipArgs),
}

fn main() -> Result<(), BoxError> {
  let args = Args::parse();
  let level = if args.debug { LevelFilter::Debug } else { LevelFilter::Warn };
  match &args.log {
    Some(path) => { let _ = WriteLogger::init(level, Config::default(), File::create(path)?); }
    None => { let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto); }
  }
  if let Some(n) = args.fuel { ecm_rs::set_delta_fuel(n) }
  match args.cmd {
    Cmd::Search(m) => m.main(),
    Cmd::Select(m) => m.main(),
    Cmd::Fmatch(m) => m.main(),
    Cmd::Zip(m) => m.main(),
  }
}
