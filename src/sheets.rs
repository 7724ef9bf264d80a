//! Derived-Sheet Generator: pure projections of one reconciled table.
//!
//! Nothing here joins or aggregates; each function is a deterministic
//! column manipulation, so calling it twice on the same table yields
//! column-identical output.

use crate::errors::PipelineError;
use crate::recipe::col;
use crate::table::Table;

/// The physical tally form: the count column replicated into numbered
/// blank slots the counters fill in by hand, plus the adopted value.
pub fn count_sheet(table: &Table, slots: usize) -> Result<Table, PipelineError> {
    let contagem_idx = table.require_column(col::CONTAGEM)?;

    let mut columns: Vec<String> = [col::ENDERECO, col::MEDICAMENTO, col::LOTE, col::DATA_VENCIMENTO]
        .iter()
        .map(|name| name.to_string())
        .collect();
    for slot in 1..=slots {
        columns.push(format!("{} {slot}", col::CONTAGEM));
    }
    columns.push(col::VALOR_ADOTADO.to_string());

    let lead = table.column_indices(&[col::ENDERECO, col::MEDICAMENTO, col::LOTE, col::DATA_VENCIMENTO])?;
    let mut out = Table::new("Conferencia", columns);
    for row in table.rows() {
        let mut cells: Vec<_> = lead.iter().map(|idx| row[*idx].clone()).collect();
        for _ in 0..slots {
            cells.push(row[contagem_idx].clone());
        }
        cells.push(row[contagem_idx].clone());
        out.push_row(cells);
    }
    Ok(out)
}

/// Location registry projection: where each lot lives.
pub fn location_sheet(table: &Table) -> Result<Table, PipelineError> {
    Ok(table
        .project(&[col::ENDERECO, col::PROGRAMA, col::LOTE])?
        .relabeled("Enderecos"))
}

/// The unmodified source-of-truth stock listing. The mutable count column
/// never appears here.
pub fn stock_sheet(table: &Table) -> Result<Table, PipelineError> {
    Ok(table
        .project(&[col::MEDICAMENTO, col::LOTE, col::DATA_VENCIMENTO])?
        .relabeled("Estoque"))
}
