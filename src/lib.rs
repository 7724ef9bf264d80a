pub mod aggregate;
pub mod cli;
pub mod errors;
pub mod io_utils;
pub mod load;
pub mod normalize;
pub mod recipe;
pub mod reconcile;
pub mod render;
pub mod report;
pub mod sheets;
pub mod table;
pub mod value;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};

use crate::cli::{Cli, Commands, OutputArgs};
use crate::render::SystemClock;
use crate::report::{LoadSpec, Report};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("apuracao", log::LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Contagem(args) => handle_contagem(&args),
        Commands::ApuracaoSigaf(args) => handle_apuracao_sigaf(&args),
        Commands::ApuracaoSimpas(args) => handle_apuracao_simpas(&args),
        Commands::Unificar(args) => handle_unificar(&args),
        Commands::Comparar(args) => handle_comparar(&args),
        Commands::Preview(args) => handle_preview(&args),
    }
}

fn load_spec(output: &OutputArgs) -> Result<LoadSpec> {
    Ok(LoadSpec {
        delimiter: output.delimiter,
        encoding: io_utils::resolve_encoding(output.input_encoding.as_deref())?,
    })
}

fn handle_contagem(args: &cli::ContagemArgs) -> Result<()> {
    info!(
        "Generating count list from '{}' with {} address sheet(s)",
        args.stock.display(),
        args.addresses.len()
    );
    let report = report::count_list(&report::CountListOptions {
        stock: args.stock.clone(),
        addresses: args.addresses.clone(),
        stock_offset: args.header_offset,
        fallback_column: args.fallback_column.clone(),
        count_slots: args.count_slots as usize,
        load: load_spec(&args.output)?,
    })
    .context("Generating the count list")?;
    deliver(report, &args.output)
}

fn handle_apuracao_sigaf(args: &cli::ApuracaoSigafArgs) -> Result<()> {
    info!(
        "Reconciling '{}' against '{}'",
        args.conference.display(),
        args.stock.display()
    );
    let report = report::apuracao_sigaf(&report::SigafOptions {
        stock: args.stock.clone(),
        conference: args.conference.clone(),
        stock_offset: args.stock_offset,
        conference_offset: args.conference_offset,
        join_mode: args.join.into(),
        policy: args.policy.into(),
        match_expiry: !args.ignore_validade,
        load: load_spec(&args.output)?,
    })
    .context("Generating the SIGAF variance report")?;
    if let Some(summary) = &report.summary {
        info!(
            "Totals: Vlr Total {:.2}, Vlr Divergencia {:.2}{}",
            summary.total_value,
            summary.total_divergence,
            summary
                .divergence_ratio
                .map(|ratio| format!(", ratio {:.4}", ratio))
                .unwrap_or_default()
        );
    }
    deliver(report, &args.output)
}

fn handle_apuracao_simpas(args: &cli::ApuracaoSimpasArgs) -> Result<()> {
    info!("Rolling up '{}' into the SIMPAS sheet", args.stock.display());
    let report = report::apuracao_simpas(&report::SimpasOptions {
        stock: args.stock.clone(),
        stock_offset: args.header_offset,
        load: load_spec(&args.output)?,
    })
    .context("Generating the SIMPAS report")?;
    deliver(report, &args.output)
}

fn handle_unificar(args: &cli::UnificarArgs) -> Result<()> {
    info!("Unifying {} mirror sheet(s)", args.inputs.len());
    let report = report::unify_mirrors(&report::UnifyOptions {
        inputs: args.inputs.clone(),
        header_offset: args.header_offset,
        load: load_spec(&args.output)?,
    })
    .context("Unifying mirror sheets")?;
    deliver(report, &args.output)
}

fn handle_comparar(args: &cli::CompararArgs) -> Result<()> {
    info!(
        "Crossing '{}' against '{}'",
        args.hosplog.display(),
        args.sesab.display()
    );
    let report = report::compare_systems(&report::CompareOptions {
        hosplog: args.hosplog.clone(),
        sesab: args.sesab.clone(),
        load: load_spec(&args.output)?,
    })
    .context("Crossing Hosplog against Sesab")?;
    deliver(report, &args.output)
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let table = load::load_table(&args.input, args.header_offset, args.delimiter, encoding)?;
    print!("{}", render::render_preview(&table, args.rows));
    Ok(())
}

/// Writes artifacts and the optional JSON summary, then surfaces any
/// coercion warnings accumulated during the run.
fn deliver(report: Report, output: &OutputArgs) -> Result<()> {
    let delimiter = output.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
    let paths = render::write_artifacts(
        &report,
        &output.out_dir,
        &output.list_name,
        delimiter,
        &SystemClock,
    )?;
    if let Some(summary_path) = &output.summary {
        render::RunSummary::new(&report, &paths).save(summary_path)?;
        info!("Run summary written to {:?}", summary_path);
    }
    if !report.warnings.is_empty() {
        warn!(
            "{} cell(s) failed coercion and were treated as unknown",
            report.warnings.len()
        );
        for warning in report.warnings.iter() {
            debug!("coercion: {warning}");
        }
    }
    Ok(())
}
