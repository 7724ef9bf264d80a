//! Report Assembler: one linear pipeline per report recipe.
//!
//! Every recipe walks the same stages — Loading, Normalizing, Aggregating,
//! Reconciling, Deriving — and the first failing stage aborts the run, so
//! a partial bundle is never handed to the rendering layer. The assembler
//! owns orchestration only; all semantics live in the stage modules.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use encoding_rs::Encoding;
use log::{debug, warn};
use regex::Regex;

use crate::aggregate::{Aggregation, aggregate};
use crate::errors::Warnings;
use crate::load;
use crate::normalize;
use crate::recipe::{self, col};
use crate::reconcile::{
    ArithmeticPolicy, JoinMode, VarianceSpec, VarianceSummary, compute_variance, join,
    summarize_variance,
};
use crate::sheets;
use crate::table::{SortDirective, Table};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Normalizing,
    Aggregating,
    Reconciling,
    Deriving,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loading => "loading",
            Stage::Normalizing => "normalizing",
            Stage::Aggregating => "aggregating",
            Stage::Reconciling => "reconciling",
            Stage::Deriving => "deriving",
        };
        f.write_str(name)
    }
}

fn stage(recipe: &str, stage: Stage) {
    debug!("[{recipe}] stage: {stage}");
}

#[derive(Debug)]
pub struct Artifact {
    pub name: String,
    pub table: Table,
}

impl Artifact {
    fn new(name: &str, table: Table) -> Self {
        Self {
            name: name.to_string(),
            table,
        }
    }
}

/// A finished pipeline run: named output tables plus everything the
/// operator should see next to them.
#[derive(Debug)]
pub struct Report {
    pub artifacts: Vec<Artifact>,
    pub summary: Option<VarianceSummary>,
    pub warnings: Warnings,
}

/// How the raw bytes of every input in a run are read.
#[derive(Debug, Clone, Copy)]
pub struct LoadSpec {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

pub struct CountListOptions {
    pub stock: PathBuf,
    pub addresses: Vec<PathBuf>,
    pub stock_offset: usize,
    /// Spill-over header label holding addresses lost to merged cells.
    pub fallback_column: Option<String>,
    pub count_slots: usize,
    pub load: LoadSpec,
}

/// The count-list bundle: the merged count sheet plus its three derived
/// companions.
pub fn count_list(opts: &CountListOptions) -> Result<Report> {
    const RECIPE: &str = "contagem";
    let mut warnings = Warnings::new();

    stage(RECIPE, Stage::Loading);
    let stock_raw = load::load_table(
        &opts.stock,
        opts.stock_offset,
        opts.load.delimiter,
        opts.load.encoding,
    )?;
    let addresses_raw = load::load_concat(
        &opts.addresses,
        0,
        opts.load.delimiter,
        opts.load.encoding,
    )?;

    stage(RECIPE, Stage::Normalizing);
    let stock_raw = normalize::ensure_column(&stock_raw, col::CONTAGEM);
    let stock = normalize::apply(&stock_raw, &recipe::stock_count_plan(), &mut warnings)?;
    let addresses = normalize::apply(
        &addresses_raw,
        &recipe::address_plan(opts.fallback_column.as_deref()),
        &mut warnings,
    )?;

    stage(RECIPE, Stage::Aggregating);
    let unique_addresses = aggregate(&addresses, recipe::KEY_LOTE, &Aggregation::KeepFirst)?;

    stage(RECIPE, Stage::Reconciling);
    let merged = join(&stock, &unique_addresses, recipe::KEY_LOTE, JoinMode::Left)?
        .project(&recipe::CONTAGEM_COLUMNS)?
        .sorted_by(&[SortDirective::asc(col::MEDICAMENTO)])?
        .relabeled("Contagem");

    stage(RECIPE, Stage::Deriving);
    let conference = sheets::count_sheet(&merged, opts.count_slots)?;
    let locations = sheets::location_sheet(&addresses)?;
    let stock_only = sheets::stock_sheet(&stock)?;

    Ok(Report {
        artifacts: vec![
            Artifact::new("Contagem", merged),
            Artifact::new("Conferencia", conference),
            Artifact::new("Enderecos", locations),
            Artifact::new("Estoque", stock_only),
        ],
        summary: None,
        warnings,
    })
}

pub struct SigafOptions {
    pub stock: PathBuf,
    pub conference: PathBuf,
    pub stock_offset: usize,
    pub conference_offset: usize,
    pub join_mode: JoinMode,
    pub policy: ArithmeticPolicy,
    /// When false, the expiry date is dropped from the join key — the
    /// variant that tolerates date-format drift between the two uploads.
    pub match_expiry: bool,
    pub load: LoadSpec,
}

/// The SIGAF variance report: physical conference counts against the
/// system-of-record stock export.
pub fn apuracao_sigaf(opts: &SigafOptions) -> Result<Report> {
    const RECIPE: &str = "apuracao-sigaf";
    let mut warnings = Warnings::new();

    stage(RECIPE, Stage::Loading);
    let conference_raw = load::load_table(
        &opts.conference,
        opts.conference_offset,
        opts.load.delimiter,
        opts.load.encoding,
    )?;
    let stock_raw = load::load_table(
        &opts.stock,
        opts.stock_offset,
        opts.load.delimiter,
        opts.load.encoding,
    )?;

    stage(RECIPE, Stage::Normalizing);
    let conference = normalize::apply(&conference_raw, &recipe::conference_plan(), &mut warnings)?;
    let stock = normalize::apply(&stock_raw, &recipe::sigaf_stock_plan(), &mut warnings)?;

    stage(RECIPE, Stage::Aggregating);
    let conference_key = recipe::sigaf_join_key(opts.match_expiry);
    let conference = aggregate(
        &conference,
        &conference_key,
        &Aggregation::Sum(col::VALOR_ADOTADO.to_string()),
    )?;
    let stock = aggregate(
        &stock,
        &[
            col::CODIGO_SIMPAS,
            col::MEDICAMENTO,
            col::LOTE,
            col::DATA_VENCIMENTO,
            col::VALOR_UNITARIO,
            col::PROGRAMA_SAUDE,
        ],
        &Aggregation::Sum(col::QUANTIDADE_ENCONTRADA.to_string()),
    )?;

    stage(RECIPE, Stage::Reconciling);
    let joined = join(&conference, &stock, &conference_key, opts.join_mode)?.renamed(&[
        (col::DATA_VENCIMENTO, col::VALIDADE),
        (col::QUANTIDADE_ENCONTRADA, col::SIGAF),
        (col::VALOR_ADOTADO, col::CONTAGEM),
    ]);
    let reconciled = compute_variance(
        &joined,
        &VarianceSpec {
            counted: col::CONTAGEM.to_string(),
            system: col::SIGAF.to_string(),
            unit_value: col::VALOR_UNITARIO.to_string(),
            policy: opts.policy,
        },
    )?
    .project(&recipe::APURACAO_COLUMNS)?
    .sorted_by(&[SortDirective::asc(col::MEDICAMENTO)])?
    .relabeled("Apuracao");

    stage(RECIPE, Stage::Deriving);
    let summary = summarize_variance(&reconciled)?;

    Ok(Report {
        artifacts: vec![Artifact::new("Apuracao_SIGAF", reconciled)],
        summary: Some(summary),
        warnings,
    })
}

pub struct SimpasOptions {
    pub stock: PathBuf,
    pub stock_offset: usize,
    pub load: LoadSpec,
}

/// The SIMPAS quantity roll-up, grouped and sorted by the SIMPAS code.
pub fn apuracao_simpas(opts: &SimpasOptions) -> Result<Report> {
    const RECIPE: &str = "apuracao-simpas";
    let mut warnings = Warnings::new();

    stage(RECIPE, Stage::Loading);
    let stock_raw = load::load_table(
        &opts.stock,
        opts.stock_offset,
        opts.load.delimiter,
        opts.load.encoding,
    )?;

    stage(RECIPE, Stage::Normalizing);
    let stock = normalize::apply(&stock_raw, &recipe::simpas_plan(), &mut warnings)?;

    stage(RECIPE, Stage::Aggregating);
    let grouped = aggregate(
        &stock,
        &[col::CODIGO_SIMPAS, col::MEDICAMENTO, col::PROGRAMA_SAUDE],
        &Aggregation::Sum(col::QUANTIDADE_ENCONTRADA.to_string()),
    )?;

    stage(RECIPE, Stage::Deriving);
    let table = grouped
        .renamed(&[(col::QUANTIDADE_ENCONTRADA, col::QUANTIDADE)])
        .project(&recipe::SIMPAS_COLUMNS)?
        .sorted_by(&[SortDirective::asc(col::CODIGO_SIMPAS)])?
        .relabeled("Apuracao SIMPAS");

    Ok(Report {
        artifacts: vec![Artifact::new("Apuracao_SIMPAS", table)],
        summary: None,
        warnings,
    })
}

pub struct UnifyOptions {
    pub inputs: Vec<PathBuf>,
    pub header_offset: usize,
    pub load: LoadSpec,
}

/// Merges EspelhoInventario mirror sheets into one table, extracting the
/// drug name from the auxiliary-code column and tagging each row with the
/// sheet it came from. A broken sheet is reported and skipped; only an
/// empty result fails the run.
pub fn unify_mirrors(opts: &UnifyOptions) -> Result<Report> {
    const RECIPE: &str = "unificar";
    let mut warnings = Warnings::new();
    let pattern = Regex::new(recipe::DRUG_NAME_PATTERN).expect("drug name pattern");

    let mut sheets = Vec::new();
    for path in &opts.inputs {
        match unify_one(path, opts, &pattern, &mut warnings) {
            Ok(table) => sheets.push(table),
            Err(err) => warn!("skipping '{}': {err:#}", path.display()),
        }
    }
    if sheets.is_empty() {
        return Err(anyhow!("no mirror sheet could be processed"));
    }
    stage(RECIPE, Stage::Deriving);
    let combined = load::concat_tables(sheets)?.relabeled("Planilha Unificada");

    Ok(Report {
        artifacts: vec![Artifact::new("Planilha_Unificada", combined)],
        summary: None,
        warnings,
    })
}

fn unify_one(
    path: &Path,
    opts: &UnifyOptions,
    pattern: &Regex,
    warnings: &mut Warnings,
) -> Result<Table> {
    const RECIPE: &str = "unificar";
    stage(RECIPE, Stage::Loading);
    let raw = load::load_table(
        path,
        opts.header_offset,
        opts.load.delimiter,
        opts.load.encoding,
    )?;
    stage(RECIPE, Stage::Normalizing);
    let table = normalize::apply(&raw, &recipe::espelho_plan(), warnings)?;
    let table = normalize::extract_pattern(
        &table,
        col::COD_AUXILIAR,
        pattern,
        col::NOME_MEDICAMENTO,
        warnings,
    )?;
    let table = normalize::drop_unknown_rows(&table.project(&recipe::ESPELHO_COLUMNS)?);
    let source = raw.label().to_string();
    Ok(table.with_column(
        col::PLANILHA,
        vec![Some(Value::text(source)); table.row_count()],
    ))
}

pub struct CompareOptions {
    pub hosplog: PathBuf,
    pub sesab: PathBuf,
    pub load: LoadSpec,
}

/// Crosses the latest Hosplog count per warehouse position against the
/// Sesab registry: a full outer join, so positions known to only one
/// system still appear.
pub fn compare_systems(opts: &CompareOptions) -> Result<Report> {
    const RECIPE: &str = "comparar";
    let mut warnings = Warnings::new();

    stage(RECIPE, Stage::Loading);
    let hosplog_raw = load::load_table(&opts.hosplog, 0, opts.load.delimiter, opts.load.encoding)?;
    let sesab_raw = load::load_table(&opts.sesab, 0, opts.load.delimiter, opts.load.encoding)?;

    stage(RECIPE, Stage::Normalizing);
    let hosplog = normalize::apply(&hosplog_raw, &recipe::hosplog_plan(), &mut warnings)?;
    // The Sesab sheet keeps its own schema; only the key columns need the
    // shared normalization.
    let sesab = normalize::coerce_columns(
        &sesab_raw,
        &[
            (col::POSICAO, normalize::Coercion::Text),
            (col::LOTE, normalize::Coercion::LotCode),
        ],
        &mut warnings,
    )?;

    stage(RECIPE, Stage::Aggregating);
    // Inventory lists accumulate; only the newest list per position counts.
    let newest_first = hosplog.sorted_by(&[SortDirective::desc(col::ID_LISTA_INVENTARIO)])?;
    let latest = aggregate(&newest_first, &[col::POSICAO], &Aggregation::KeepFirst)?
        .project(&recipe::COMPARACAO_HOSPLOG_COLUMNS)?;

    stage(RECIPE, Stage::Reconciling);
    let crossed = join(&sesab, &latest, recipe::KEY_POSICAO_LOTE, JoinMode::FullOuter)?
        .relabeled("Comparacao");

    Ok(Report {
        artifacts: vec![Artifact::new("Comparacao_Hosplog_Sesab", crossed)],
        summary: None,
        warnings,
    })
}
