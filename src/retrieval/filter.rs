//! Row filtering by plan predicates.

use serde_json::Value;

use crate::datasets::{DatasetPayload, Table, cell_text};
use crate::plan::QueryPlan;

/// Narrows `table` to the rows matching `plan`.
///
/// State membership, crop membership and the year range are applied in turn.
/// A predicate is skipped when the plan leaves it empty or the table lacks
/// the column. A time period with neither bound set counts as empty. The result keeps all columns and the original row order.
pub fn filter_table(table: Table, plan: &QueryPlan) -> Table {
    let mut table = table;

    if !plan.states.is_empty() {
        table = retain_membership(table, "state", &plan.states);
    }

    if !plan.crops.is_empty() {
        table = retain_membership(table, "crop", &plan.crops);
    }

    if let Some(period) = plan.time_period.filter(|p| !p.is_unbounded())
        && let Some(idx) = table.column_index("year")
    {
        let (start, end) = period.bounds();
        table = table.retain_rows(|row| {
            row.get(idx)
                .and_then(year_of)
                .is_some_and(|year| start <= year && year <= end)
        });
    }

    table
}

/// Applies `filter_table` to tabular payloads; other shapes pass through.
pub fn filter_payload(payload: DatasetPayload, plan: &QueryPlan) -> DatasetPayload {
    match payload {
        DatasetPayload::Tabular(table) => DatasetPayload::Tabular(filter_table(table, plan)),
        other => other,
    }
}

fn retain_membership(table: Table, column: &str, allowed: &[String]) -> Table {
    let Some(idx) = table.column_index(column) else {
        return table;
    };
    table.retain_rows(|row| {
        row.get(idx).is_some_and(|cell| {
            let text = cell_text(cell);
            allowed.iter().any(|a| *a == text)
        })
    })
}

/// Reads a year from an integer, an integral float, or a numeric string.
fn year_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
