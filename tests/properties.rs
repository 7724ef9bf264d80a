mod common;

use std::collections::HashSet;

use proptest::prelude::*;

use apuracao::aggregate::{Aggregation, aggregate};
use apuracao::reconcile::{JoinMode, join};
use apuracao::table::Table;
use apuracao::value::{Value, cell_number, normalize_lot, parse_number};

use common::{num, table, text};

fn lot_name(id: u8) -> String {
    format!("L{id}")
}

fn quantity_table(rows: &[(u8, u16)]) -> Table {
    table(
        "estoque.csv",
        &["Lote", "Quantidade Encontrada"],
        rows.iter()
            .map(|(lot, quantity)| vec![text(&lot_name(*lot)), num(*quantity as f64)])
            .collect(),
    )
}

proptest! {
    #[test]
    fn sum_aggregation_preserves_the_grand_total(rows in proptest::collection::vec((0u8..5, 0u16..1000), 1..50)) {
        let grouped = aggregate(
            &quantity_table(&rows),
            &["Lote"],
            &Aggregation::Sum("Quantidade Encontrada".to_string()),
        )
        .unwrap();

        let distinct: HashSet<u8> = rows.iter().map(|(lot, _)| *lot).collect();
        prop_assert_eq!(grouped.row_count(), distinct.len());

        let quantity_idx = grouped.column_index("Quantidade Encontrada").unwrap();
        let grouped_total: f64 = grouped
            .rows()
            .iter()
            .map(|row| cell_number(&row[quantity_idx]).unwrap_or(0.0))
            .sum();
        let expected: f64 = rows.iter().map(|(_, quantity)| *quantity as f64).sum();
        prop_assert!((grouped_total - expected).abs() < 1e-6);
    }

    #[test]
    fn left_join_never_changes_the_left_row_count(
        left_lots in proptest::collection::vec(0u8..5, 0..30),
        right_lots in proptest::collection::hash_set(0u8..5, 0..5),
    ) {
        let left = table(
            "conferencia.csv",
            &["Lote"],
            left_lots.iter().map(|lot| vec![text(&lot_name(*lot))]).collect(),
        );
        let right = table(
            "enderecos.csv",
            &["Lote", "Endereço"],
            right_lots
                .iter()
                .map(|lot| vec![text(&lot_name(*lot)), text("K-01")])
                .collect(),
        );

        let joined = join(&left, &right, &["Lote"], JoinMode::Left).unwrap();
        prop_assert_eq!(joined.row_count(), left.row_count());
    }

    #[test]
    fn lot_normalization_is_idempotent(raw in "[ a-zA-Z0-9/-]{0,16}") {
        let once = normalize_lot(&raw);
        prop_assert_eq!(&normalize_lot(&once), &once);
        prop_assert_eq!(once.trim(), once.as_str());
    }

    #[test]
    fn display_text_of_a_number_parses_back_to_itself(number in -1_000_000i32..1_000_000, cents in 0u8..100) {
        let value = f64::from(number) + f64::from(cents) / 100.0;
        let displayed = Value::Number(value).as_display();
        let reparsed = parse_number(&displayed).unwrap();
        prop_assert!((reparsed - value).abs() < 1e-9);
    }
}
