mod common;

use regex::Regex;

use apuracao::errors::{PipelineError, Warnings};
use apuracao::normalize::{
    Coercion, ColumnSpec, FillFallback, NormalizePlan, apply, coerce_columns, drop_unknown_rows,
    ensure_column, extract_pattern,
};

use common::{num, table, text, unknown};

#[test]
fn missing_required_column_names_the_source_file() {
    let uploaded = table("estoque_final.csv", &["Medicamento"], vec![vec![text("X")]]);
    let plan = NormalizePlan {
        columns: vec![
            ColumnSpec::new("Medicamento", Coercion::Text),
            ColumnSpec::new("Lote", Coercion::LotCode),
        ],
        ..NormalizePlan::default()
    };

    let err = apply(&uploaded, &plan, &mut Warnings::new()).unwrap_err();
    match err {
        PipelineError::MissingColumn { column, source } => {
            assert_eq!(column, "Lote");
            assert_eq!(source, "estoque_final.csv");
        }
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn failed_numeric_parse_becomes_unknown_and_a_warning() {
    let uploaded = table(
        "estoque.csv",
        &["Quantidade Encontrada"],
        vec![vec![text("sete")], vec![text("7")]],
    );
    let plan = NormalizePlan {
        columns: vec![ColumnSpec::new("Quantidade Encontrada", Coercion::Number)],
        ..NormalizePlan::default()
    };

    let mut warnings = Warnings::new();
    let normalized = apply(&uploaded, &plan, &mut warnings).unwrap();

    assert!(common::cell_is_unknown(&normalized, 0, "Quantidade Encontrada"));
    assert_eq!(common::cell_text(&normalized, 1, "Quantidade Encontrada"), "7");
    assert_eq!(warnings.len(), 1);
    let warning = warnings.iter().next().unwrap();
    assert_eq!(warning.raw, "sete");
    assert_eq!(warning.row, 1);
}

#[test]
fn rename_and_lot_normalization_follow_the_plan() {
    let uploaded = table(
        "enderecos.csv",
        &["LOCALIZAÇÃO", "PROGRAMA", "LOTE"],
        vec![vec![text("K-01-PP01-A"), text("Básico"), text("  ab1 ")]],
    );
    let plan = NormalizePlan {
        columns: vec![
            ColumnSpec::renamed("LOCALIZAÇÃO", "Endereço", Coercion::Text),
            ColumnSpec::renamed("PROGRAMA", "Programa", Coercion::Text),
            ColumnSpec::renamed("LOTE", "Lote", Coercion::LotCode),
        ],
        ..NormalizePlan::default()
    };

    let normalized = apply(&uploaded, &plan, &mut Warnings::new()).unwrap();

    assert_eq!(normalized.columns(), ["Endereço", "Programa", "Lote"]);
    assert_eq!(common::cell_text(&normalized, 0, "Lote"), "AB1");
}

#[test]
fn fallback_column_fills_only_unknown_primary_cells() {
    let uploaded = table(
        "enderecos.csv",
        &["LOCALIZAÇÃO", "05/26", "LOTE"],
        vec![
            vec![unknown(), text("K-09"), text("L1")],
            vec![text("K-01"), text("ignored"), text("L2")],
        ],
    );
    let plan = NormalizePlan {
        columns: vec![
            ColumnSpec::renamed("LOCALIZAÇÃO", "Endereço", Coercion::Text),
            ColumnSpec::renamed("LOTE", "Lote", Coercion::LotCode),
        ],
        fill_fallback: Some(FillFallback {
            primary: "LOCALIZAÇÃO".to_string(),
            fallback: "05/26".to_string(),
        }),
        drop_unknown_rows: false,
    };

    let normalized = apply(&uploaded, &plan, &mut Warnings::new()).unwrap();

    assert_eq!(common::cell_text(&normalized, 0, "Endereço"), "K-09");
    assert_eq!(common::cell_text(&normalized, 1, "Endereço"), "K-01");
}

#[test]
fn ensure_column_adds_an_all_unknown_count_column() {
    let uploaded = table("estoque.csv", &["Medicamento"], vec![vec![text("X")]]);

    let ensured = ensure_column(&uploaded, "Contagem");
    assert!(common::cell_is_unknown(&ensured, 0, "Contagem"));

    // Already present: untouched.
    let again = ensure_column(&ensured, "Contagem");
    assert_eq!(again.columns(), ensured.columns());
}

#[test]
fn drop_unknown_rows_removes_incomplete_rows_only() {
    let t = table(
        "espelho.csv",
        &["Lote", "Cont. 1"],
        vec![
            vec![text("L1"), num(1.0)],
            vec![text("L2"), unknown()],
        ],
    );
    let complete = drop_unknown_rows(&t);
    assert_eq!(complete.row_count(), 1);
    assert_eq!(common::cell_text(&complete, 0, "Lote"), "L1");
}

#[test]
fn extract_pattern_pulls_the_drug_name_out_of_the_auxiliary_code() {
    let t = table(
        "espelho.csv",
        &["CodAuxiliar - Produto / Fabricante / Marca / Embalagem"],
        vec![
            vec![text("12345 - DIPIRONA 500MG [CX 100]")],
            vec![text("no brackets here")],
        ],
    );
    let pattern = Regex::new(r"-\s*(.*?)\s*\[").unwrap();
    let mut warnings = Warnings::new();

    let extracted = extract_pattern(
        &t,
        "CodAuxiliar - Produto / Fabricante / Marca / Embalagem",
        &pattern,
        "Nome Medicamento",
        &mut warnings,
    )
    .unwrap();

    assert_eq!(
        common::cell_text(&extracted, 0, "Nome Medicamento"),
        "DIPIRONA 500MG"
    );
    assert!(common::cell_is_unknown(&extracted, 1, "Nome Medicamento"));
    assert_eq!(warnings.len(), 1);
}

#[test]
fn coerce_columns_touches_only_the_named_columns() {
    let t = table(
        "sesab.csv",
        &["Posição", "Lote", "Observação"],
        vec![vec![text("P1"), text(" l1 "), text("  keep me  ")]],
    );

    let coerced = coerce_columns(
        &t,
        &[("Posição", Coercion::Text), ("Lote", Coercion::LotCode)],
        &mut Warnings::new(),
    )
    .unwrap();

    assert_eq!(common::cell_text(&coerced, 0, "Lote"), "L1");
    assert_eq!(common::cell_text(&coerced, 0, "Observação"), "  keep me  ");
}
