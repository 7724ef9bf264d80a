//! Per-report recipes: the canonical column vocabulary, normalize plans,
//! join keys, and output projections that parametrize the shared pipeline.
//!
//! The upstream process grew one copy-pasted code path per report; here
//! each report is only the data that distinguishes it.

use crate::normalize::{Coercion, ColumnSpec, FillFallback, NormalizePlan};

/// Canonical column names. Source files use whatever labels their exporter
/// produces; everything after the normalizer speaks these.
pub mod col {
    pub const MEDICAMENTO: &str = "Medicamento";
    pub const LOTE: &str = "Lote";
    pub const DATA_VENCIMENTO: &str = "Data Vencimento";
    pub const VALIDADE: &str = "Validade";
    pub const ENDERECO: &str = "Endereço";
    pub const PROGRAMA: &str = "Programa";
    pub const CONTAGEM: &str = "Contagem";
    pub const VALOR_ADOTADO: &str = "Valor Adotado";
    pub const QUANTIDADE_ENCONTRADA: &str = "Quantidade Encontrada";
    pub const QUANTIDADE: &str = "Quantidade";
    pub const CODIGO_SIMPAS: &str = "Código Simpas";
    pub const VALOR_UNITARIO: &str = "Valor Unitário";
    pub const PROGRAMA_SAUDE: &str = "Programa Saúde";
    pub const SIGAF: &str = "SIGAF";
    pub const DIFERENCA: &str = "Diferença";
    pub const VLR_TOTAL: &str = "Vlr Total";
    pub const VLR_DIVERGENCIA: &str = "Vlr Divergencia";
    pub const POSICAO: &str = "Posição";
    pub const NOME_MEDICAMENTO: &str = "Nome Medicamento";
    pub const PLANILHA: &str = "Planilha";
    pub const CONT_1: &str = "Cont. 1";
    pub const ID_LISTA_INVENTARIO: &str = "IDListaInventario";
    pub const CONTAGEM_HOSPLOG: &str = "Contagem Hosplog";
    pub const COD_AUXILIAR: &str = "CodAuxiliar - Produto / Fabricante / Marca / Embalagem";
}

/// Regex that pulls the drug name out of the auxiliary-code column
/// (`...- NAME [package]`).
pub const DRUG_NAME_PATTERN: &str = r"-\s*(.*?)\s*\[";

/// Stock sheet as uploaded for the count list.
pub fn stock_count_plan() -> NormalizePlan {
    NormalizePlan {
        columns: vec![
            ColumnSpec::new(col::MEDICAMENTO, Coercion::Text),
            ColumnSpec::new(col::LOTE, Coercion::LotCode),
            ColumnSpec::new(col::DATA_VENCIMENTO, Coercion::Date),
            ColumnSpec::new(col::CONTAGEM, Coercion::Number),
        ],
        ..NormalizePlan::default()
    }
}

/// Address registry: exporter shouts its headers; part of the location
/// column hides under a merged-header spill-over label when one is given.
pub fn address_plan(fallback_column: Option<&str>) -> NormalizePlan {
    NormalizePlan {
        columns: vec![
            ColumnSpec::renamed("LOCALIZAÇÃO", col::ENDERECO, Coercion::Text),
            ColumnSpec::renamed("PROGRAMA", col::PROGRAMA, Coercion::Text),
            ColumnSpec::renamed("LOTE", col::LOTE, Coercion::LotCode),
        ],
        fill_fallback: fallback_column.map(|fallback| FillFallback {
            primary: "LOCALIZAÇÃO".to_string(),
            fallback: fallback.to_string(),
        }),
        drop_unknown_rows: false,
    }
}

/// Filled-in conference sheet coming back from the counters.
pub fn conference_plan() -> NormalizePlan {
    NormalizePlan {
        columns: vec![
            ColumnSpec::new(col::MEDICAMENTO, Coercion::Text),
            ColumnSpec::new(col::LOTE, Coercion::LotCode),
            ColumnSpec::new(col::DATA_VENCIMENTO, Coercion::Date),
            ColumnSpec::new(col::VALOR_ADOTADO, Coercion::Number),
        ],
        ..NormalizePlan::default()
    }
}

/// Generated stock sheet reconciled against SIGAF.
pub fn sigaf_stock_plan() -> NormalizePlan {
    NormalizePlan {
        columns: vec![
            ColumnSpec::new(col::CODIGO_SIMPAS, Coercion::Text),
            ColumnSpec::new(col::MEDICAMENTO, Coercion::Text),
            ColumnSpec::new(col::LOTE, Coercion::LotCode),
            ColumnSpec::new(col::DATA_VENCIMENTO, Coercion::Date),
            ColumnSpec::new(col::VALOR_UNITARIO, Coercion::Number),
            ColumnSpec::new(col::PROGRAMA_SAUDE, Coercion::Text),
            ColumnSpec::new(col::QUANTIDADE_ENCONTRADA, Coercion::Number),
        ],
        ..NormalizePlan::default()
    }
}

/// Final stock export aggregated into the SIMPAS sheet.
pub fn simpas_plan() -> NormalizePlan {
    NormalizePlan {
        columns: vec![
            ColumnSpec::new(col::CODIGO_SIMPAS, Coercion::Text),
            ColumnSpec::new(col::MEDICAMENTO, Coercion::Text),
            ColumnSpec::new(col::QUANTIDADE_ENCONTRADA, Coercion::Number),
            ColumnSpec::new(col::PROGRAMA_SAUDE, Coercion::Text),
        ],
        ..NormalizePlan::default()
    }
}

/// One EspelhoInventario mirror sheet.
pub fn espelho_plan() -> NormalizePlan {
    NormalizePlan {
        columns: vec![
            ColumnSpec::new(col::COD_AUXILIAR, Coercion::Text),
            ColumnSpec::new(col::LOTE, Coercion::LotCode),
            ColumnSpec::new(col::VALIDADE, Coercion::Date),
            ColumnSpec::new(col::ENDERECO, Coercion::Text),
            ColumnSpec::new(col::POSICAO, Coercion::Text),
            ColumnSpec::new(col::CONT_1, Coercion::Number),
        ],
        ..NormalizePlan::default()
    }
}

/// Hosplog inventory dump, renamed to the canonical vocabulary.
pub fn hosplog_plan() -> NormalizePlan {
    NormalizePlan {
        columns: vec![
            ColumnSpec::new(col::ID_LISTA_INVENTARIO, Coercion::Number),
            ColumnSpec::renamed("CDPosicao", col::POSICAO, Coercion::Text),
            ColumnSpec::renamed("NMEndereco", col::ENDERECO, Coercion::Text),
            ColumnSpec::renamed("CDLote", col::LOTE, Coercion::LotCode),
            ColumnSpec::renamed("QTFinal", col::CONTAGEM_HOSPLOG, Coercion::Number),
        ],
        ..NormalizePlan::default()
    }
}

pub const KEY_LOTE: &[&str] = &[col::LOTE];
pub const KEY_POSICAO_LOTE: &[&str] = &[col::POSICAO, col::LOTE];

/// The SIGAF reconciliation key, with or without the expiration date.
/// Dropping the date is a deliberate variant that tolerates date-format
/// mismatches between the conference sheet and the stock export.
pub fn sigaf_join_key(include_expiry: bool) -> Vec<&'static str> {
    if include_expiry {
        vec![col::MEDICAMENTO, col::LOTE, col::DATA_VENCIMENTO]
    } else {
        vec![col::MEDICAMENTO, col::LOTE]
    }
}

pub const CONTAGEM_COLUMNS: [&str; 6] = [
    col::ENDERECO,
    col::MEDICAMENTO,
    col::LOTE,
    col::DATA_VENCIMENTO,
    col::PROGRAMA,
    col::CONTAGEM,
];

pub const APURACAO_COLUMNS: [&str; 11] = [
    col::CODIGO_SIMPAS,
    col::MEDICAMENTO,
    col::LOTE,
    col::VALIDADE,
    col::CONTAGEM,
    col::SIGAF,
    col::DIFERENCA,
    col::VALOR_UNITARIO,
    col::VLR_TOTAL,
    col::VLR_DIVERGENCIA,
    col::PROGRAMA_SAUDE,
];

pub const SIMPAS_COLUMNS: [&str; 4] = [
    col::CODIGO_SIMPAS,
    col::MEDICAMENTO,
    col::QUANTIDADE,
    col::PROGRAMA_SAUDE,
];

pub const ESPELHO_COLUMNS: [&str; 6] = [
    col::ENDERECO,
    col::POSICAO,
    col::NOME_MEDICAMENTO,
    col::LOTE,
    col::VALIDADE,
    col::CONT_1,
];

pub const COMPARACAO_HOSPLOG_COLUMNS: [&str; 4] = [
    col::POSICAO,
    col::ENDERECO,
    col::LOTE,
    col::CONTAGEM_HOSPLOG,
];
