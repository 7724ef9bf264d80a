mod common;

use apuracao::errors::PipelineError;
use apuracao::reconcile::{
    ArithmeticPolicy, JoinMode, VarianceSpec, compute_variance, join, summarize_variance,
};

use common::{num, table, text, unknown};

fn conference() -> apuracao::table::Table {
    table(
        "conferencia.csv",
        &["Medicamento", "Lote", "Valor Adotado"],
        vec![
            vec![text("Dipirona"), text("L1"), num(10.0)],
            vec![text("Amoxicilina"), text("L2"), num(4.0)],
        ],
    )
}

fn stock() -> apuracao::table::Table {
    table(
        "estoque.csv",
        &["Medicamento", "Lote", "Valor Unitário", "Quantidade Encontrada"],
        vec![
            vec![text("Dipirona"), text("L1"), num(2.5), num(7.0)],
            vec![text("Cefalexina"), text("L9"), num(1.0), num(3.0)],
        ],
    )
}

#[test]
fn left_join_preserves_every_left_row_exactly_once() {
    let joined = join(&conference(), &stock(), &["Medicamento", "Lote"], JoinMode::Left).unwrap();

    assert_eq!(joined.row_count(), 2);
    assert_eq!(
        joined.columns(),
        ["Medicamento", "Lote", "Valor Adotado", "Valor Unitário", "Quantidade Encontrada"]
    );
    assert_eq!(common::cell_text(&joined, 0, "Quantidade Encontrada"), "7");
    // Unmatched left row keeps its own cells; right columns stay unknown.
    assert!(common::cell_is_unknown(&joined, 1, "Quantidade Encontrada"));
    assert_eq!(common::cell_text(&joined, 1, "Valor Adotado"), "4");
}

#[test]
fn full_outer_join_keeps_unmatched_rows_from_both_sides() {
    let joined = join(
        &conference(),
        &stock(),
        &["Medicamento", "Lote"],
        JoinMode::FullOuter,
    )
    .unwrap();

    assert_eq!(joined.row_count(), 3);
    // The right-only row carries its key into the shared key columns.
    assert_eq!(common::cell_text(&joined, 2, "Medicamento"), "Cefalexina");
    assert_eq!(common::cell_text(&joined, 2, "Lote"), "L9");
    assert!(common::cell_is_unknown(&joined, 2, "Valor Adotado"));
    assert_eq!(common::cell_text(&joined, 2, "Quantidade Encontrada"), "3");
}

#[test]
fn duplicate_right_keys_are_rejected_as_ambiguous() {
    let duplicated = table(
        "enderecos.csv",
        &["Lote", "Endereço"],
        vec![
            vec![text("L1"), text("K-01")],
            vec![text("L1"), text("K-02")],
        ],
    );
    let left = table("estoque.csv", &["Lote"], vec![vec![text("L1")]]);

    let err = join(&left, &duplicated, &["Lote"], JoinMode::Left).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::AmbiguousJoinKey { side: "right", .. }
    ));
}

#[test]
fn full_outer_rejects_duplicate_left_keys_too() {
    let left = table(
        "conferencia.csv",
        &["Lote"],
        vec![vec![text("L1")], vec![text("L1")]],
    );
    let right = table("estoque.csv", &["Lote"], vec![vec![text("L1")]]);

    let err = join(&left, &right, &["Lote"], JoinMode::FullOuter).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::AmbiguousJoinKey { side: "left", .. }
    ));
}

fn variance_spec(policy: ArithmeticPolicy) -> VarianceSpec {
    VarianceSpec {
        counted: "Contagem".to_string(),
        system: "SIGAF".to_string(),
        unit_value: "Valor Unitário".to_string(),
        policy,
    }
}

#[test]
fn strict_arithmetic_computes_all_three_derived_columns() {
    let reconciled = table(
        "apuracao",
        &["Contagem", "SIGAF", "Valor Unitário"],
        vec![vec![num(10.0), num(7.0), num(2.5)]],
    );

    let derived = compute_variance(&reconciled, &variance_spec(ArithmeticPolicy::Strict)).unwrap();

    assert_eq!(common::cell_text(&derived, 0, "Diferença"), "3");
    assert_eq!(common::cell_text(&derived, 0, "Vlr Total"), "25");
    assert_eq!(common::cell_text(&derived, 0, "Vlr Divergencia"), "7.5");
}

#[test]
fn strict_arithmetic_propagates_unknown_into_every_dependent_column() {
    let reconciled = table(
        "apuracao",
        &["Contagem", "SIGAF", "Valor Unitário"],
        vec![vec![num(10.0), unknown(), num(2.5)]],
    );

    let derived = compute_variance(&reconciled, &variance_spec(ArithmeticPolicy::Strict)).unwrap();

    assert!(common::cell_is_unknown(&derived, 0, "Diferença"));
    assert!(common::cell_is_unknown(&derived, 0, "Vlr Divergencia"));
    // Vlr Total depends only on Contagem and the unit value.
    assert_eq!(common::cell_text(&derived, 0, "Vlr Total"), "25");
}

#[test]
fn zero_fill_matches_an_explicit_zero_operand() {
    let with_unknown = table(
        "apuracao",
        &["Contagem", "SIGAF", "Valor Unitário"],
        vec![vec![num(10.0), unknown(), num(2.5)]],
    );
    let with_zero = table(
        "apuracao",
        &["Contagem", "SIGAF", "Valor Unitário"],
        vec![vec![num(10.0), num(0.0), num(2.5)]],
    );

    let spec = variance_spec(ArithmeticPolicy::ZeroFill);
    let a = compute_variance(&with_unknown, &spec).unwrap();
    let b = compute_variance(&with_zero, &spec).unwrap();

    for column in ["Diferença", "Vlr Total", "Vlr Divergencia"] {
        assert_eq!(
            common::cell_text(&a, 0, column),
            common::cell_text(&b, 0, column),
            "column {column}"
        );
    }
}

#[test]
fn summary_totals_skip_unknown_cells_and_compute_the_ratio() {
    let reconciled = table(
        "apuracao",
        &["Contagem", "SIGAF", "Valor Unitário"],
        vec![
            vec![num(10.0), num(7.0), num(2.5)],
            vec![num(4.0), unknown(), num(1.0)],
        ],
    );
    let derived = compute_variance(&reconciled, &variance_spec(ArithmeticPolicy::Strict)).unwrap();

    let summary = summarize_variance(&derived).unwrap();
    assert_eq!(summary.total_value, 29.0);
    assert_eq!(summary.total_divergence, 7.5);
    assert_eq!(summary.divergence_ratio, Some(7.5 / 29.0));
}
