use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::reconcile::{ArithmeticPolicy, JoinMode};

#[derive(Debug, Parser)]
#[command(version, about = "Reconcile pharmacy inventory spreadsheets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the count-list bundle (Contagem, Conferencia, Enderecos, Estoque)
    Contagem(ContagemArgs),
    /// Reconcile a filled-in conference sheet against the SIGAF stock export
    ApuracaoSigaf(ApuracaoSigafArgs),
    /// Roll the final stock export up into the SIMPAS quantity sheet
    ApuracaoSimpas(ApuracaoSimpasArgs),
    /// Merge EspelhoInventario mirror sheets into one unified table
    Unificar(UnificarArgs),
    /// Cross the latest Hosplog count per position against the Sesab registry
    Comparar(CompararArgs),
    /// Preview the first rows of a spreadsheet as a formatted table
    Preview(PreviewArgs),
}

/// Flags shared by every report command.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Label stamped into artifact file names
    #[arg(long = "lista", default_value = "")]
    pub list_name: String,
    /// Directory artifacts are written into
    #[arg(long = "out-dir", default_value = ".")]
    pub out_dir: PathBuf,
    /// Delimiter for inputs and outputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Write a JSON summary of the run (artifacts, totals, warnings) here
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ContagemArgs {
    /// Stock spreadsheet as exported, cover block included
    #[arg(short = 'e', long = "estoque")]
    pub stock: PathBuf,
    /// Address registry sheet(s); repeat for multi-sheet registries
    #[arg(short = 'a', long = "enderecos", required = true, action = clap::ArgAction::Append)]
    pub addresses: Vec<PathBuf>,
    /// Rows to skip above the stock header row
    #[arg(long = "header-offset", default_value_t = 7)]
    pub header_offset: usize,
    /// Spill-over header label to read addresses from when the main
    /// location column is blank (merged-cell exports)
    #[arg(long = "fallback-column")]
    pub fallback_column: Option<String>,
    /// Number of manual count slots on the conference sheet
    #[arg(long = "count-slots", default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub count_slots: u8,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct ApuracaoSigafArgs {
    /// Generated stock spreadsheet (no cover block)
    #[arg(short = 'e', long = "estoque")]
    pub stock: PathBuf,
    /// Filled-in conference spreadsheet
    #[arg(short = 'c', long = "conferencia")]
    pub conference: PathBuf,
    /// Rows to skip above the stock header row
    #[arg(long = "estoque-offset", default_value_t = 0)]
    pub stock_offset: usize,
    /// Rows to skip above the conference header row
    #[arg(long = "conferencia-offset", default_value_t = 0)]
    pub conference_offset: usize,
    /// Join mode: left keeps only conference rows, full-outer keeps both sides
    #[arg(long = "join", value_enum, default_value = "left")]
    pub join: JoinModeArg,
    /// Arithmetic for unknown operands in the derived columns
    #[arg(long = "policy", value_enum, default_value = "strict")]
    pub policy: PolicyArg,
    /// Drop the expiry date from the join key (tolerates date-format drift)
    #[arg(long = "ignore-validade")]
    pub ignore_validade: bool,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct ApuracaoSimpasArgs {
    /// Final stock spreadsheet, cover block included
    #[arg(short = 'e', long = "estoque")]
    pub stock: PathBuf,
    /// Rows to skip above the header row
    #[arg(long = "header-offset", default_value_t = 7)]
    pub header_offset: usize,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct UnificarArgs {
    /// EspelhoInventario sheets to merge
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Rows to skip above the header row of each sheet
    #[arg(long = "header-offset", default_value_t = 12)]
    pub header_offset: usize,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct CompararArgs {
    /// Hosplog inventory dump
    #[arg(long = "hosplog")]
    pub hosplog: PathBuf,
    /// Sesab registry sheet
    #[arg(long = "sesab")]
    pub sesab: PathBuf,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Spreadsheet to preview ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Rows to skip above the header row
    #[arg(long = "header-offset", default_value_t = 0)]
    pub header_offset: usize,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum JoinModeArg {
    Left,
    FullOuter,
}

impl From<JoinModeArg> for JoinMode {
    fn from(value: JoinModeArg) -> Self {
        match value {
            JoinModeArg::Left => JoinMode::Left,
            JoinModeArg::FullOuter => JoinMode::FullOuter,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum PolicyArg {
    Strict,
    ZeroFill,
}

impl From<PolicyArg> for ArithmeticPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Strict => ArithmeticPolicy::Strict,
            PolicyArg::ZeroFill => ArithmeticPolicy::ZeroFill,
        }
    }
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
