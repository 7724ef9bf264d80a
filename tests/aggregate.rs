mod common;

use apuracao::aggregate::{Aggregation, aggregate};

use common::{num, table, text, unknown};

#[test]
fn sum_collapses_duplicate_keys_into_one_row() {
    let stock = table(
        "estoque.csv",
        &["Código Simpas", "Medicamento", "Programa Saúde", "Quantidade Encontrada"],
        vec![
            vec![text("001"), text("Dipirona"), text("Básico"), num(3.0)],
            vec![text("001"), text("Dipirona"), text("Básico"), num(4.0)],
            vec![text("002"), text("Amoxicilina"), text("Básico"), num(5.0)],
        ],
    );

    let grouped = aggregate(
        &stock,
        &["Código Simpas", "Medicamento", "Programa Saúde"],
        &Aggregation::Sum("Quantidade Encontrada".to_string()),
    )
    .unwrap();

    assert_eq!(grouped.row_count(), 2);
    assert_eq!(
        grouped.columns(),
        ["Código Simpas", "Medicamento", "Programa Saúde", "Quantidade Encontrada"]
    );
    assert_eq!(common::cell_text(&grouped, 0, "Quantidade Encontrada"), "7");
    assert_eq!(common::cell_text(&grouped, 1, "Quantidade Encontrada"), "5");
}

#[test]
fn sum_treats_unknown_quantities_as_zero() {
    let stock = table(
        "estoque.csv",
        &["Lote", "Quantidade Encontrada"],
        vec![
            vec![text("AB1"), unknown()],
            vec![text("AB1"), num(2.0)],
            vec![text("CD2"), unknown()],
        ],
    );

    let grouped = aggregate(
        &stock,
        &["Lote"],
        &Aggregation::Sum("Quantidade Encontrada".to_string()),
    )
    .unwrap();

    assert_eq!(grouped.row_count(), 2);
    assert_eq!(common::cell_text(&grouped, 0, "Quantidade Encontrada"), "2");
    // An all-unknown group is indistinguishable from a true zero.
    assert_eq!(common::cell_text(&grouped, 1, "Quantidade Encontrada"), "0");
}

#[test]
fn sum_emits_one_row_per_distinct_key_in_first_appearance_order() {
    let rows = vec![
        vec![text("B"), num(1.0)],
        vec![text("A"), num(1.0)],
        vec![text("B"), num(1.0)],
    ];
    let grouped = aggregate(
        &table("t", &["Lote", "Quantidade Encontrada"], rows),
        &["Lote"],
        &Aggregation::Sum("Quantidade Encontrada".to_string()),
    )
    .unwrap();

    assert_eq!(grouped.row_count(), 2);
    assert_eq!(common::cell_text(&grouped, 0, "Lote"), "B");
    assert_eq!(common::cell_text(&grouped, 0, "Quantidade Encontrada"), "2");
    assert_eq!(common::cell_text(&grouped, 1, "Lote"), "A");
}

#[test]
fn keep_first_retains_the_first_full_row_per_key() {
    let inventory = table(
        "hosplog.csv",
        &["Posição", "Endereço", "Contagem Hosplog"],
        vec![
            vec![text("P1"), text("K-01"), num(10.0)],
            vec![text("P1"), text("K-02"), num(99.0)],
            vec![text("P2"), text("K-03"), num(5.0)],
        ],
    );

    let reduced = aggregate(&inventory, &["Posição"], &Aggregation::KeepFirst).unwrap();

    assert_eq!(reduced.row_count(), 2);
    assert_eq!(reduced.columns(), inventory.columns());
    assert_eq!(common::cell_text(&reduced, 0, "Endereço"), "K-01");
    assert_eq!(common::cell_text(&reduced, 0, "Contagem Hosplog"), "10");
}

#[test]
fn aggregate_fails_when_a_key_column_is_absent() {
    let t = table("t", &["Lote"], vec![vec![text("A")]]);
    let err = aggregate(&t, &["Medicamento"], &Aggregation::KeepFirst).unwrap_err();
    assert!(err.to_string().contains("Medicamento"));
}
