use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use trace_codec::{CellError, StageReport, StageSummary};
use trace_model::Schema;

use trace_cli::types::{ColumnStatus, RoundtripResult};

pub fn print_schema(schema: &Schema) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Role"),
        header_cell("Type"),
        header_cell("Encoding"),
        header_cell("Encoded columns"),
    ]);
    apply_table_style(&mut table);
    for field in schema.fields() {
        table.add_row(vec![
            Cell::new(&field.name).add_attribute(Attribute::Bold),
            Cell::new(field.role),
            Cell::new(field.primitive),
            Cell::new(field.encoding),
            Cell::new(field.output_columns().join(", ")),
        ]);
    }
    println!("{table}");

    if schema.dropped().is_empty() {
        return;
    }
    let mut dropped = Table::new();
    dropped.set_header(vec![
        header_cell("Dropped field"),
        header_cell("Role"),
        header_cell("Declared"),
        header_cell("Observed"),
    ]);
    apply_table_style(&mut dropped);
    for field in schema.dropped() {
        dropped.add_row(vec![
            Cell::new(&field.name).fg(Color::Yellow),
            Cell::new(field.role),
            Cell::new(field.declared),
            Cell::new(field.observed),
        ]);
    }
    println!();
    println!("{dropped}");
}

pub fn print_stage_reports(reports: &[StageReport]) {
    if reports.is_empty() {
        println!("No stages enabled.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("Details"),
        header_cell("Output"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for report in reports {
        table.add_row(vec![
            Cell::new(&report.stage)
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            Cell::new(report.rows),
            Cell::new(report.columns),
            Cell::new(stage_details(&report.summary)),
            Cell::new(report.output.display()),
        ]);
    }
    println!("{table}");

    for report in reports {
        if let StageSummary::Decoded { cell_errors, .. } = &report.summary {
            print_cell_errors(cell_errors);
        }
    }
}

pub fn print_roundtrip(result: &RoundtripResult) {
    print_stage_reports(&result.reports);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Status"),
        header_cell("Differing"),
        header_cell("Example (input → decoded)"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    for check in &result.columns {
        let (status, count, example) = match &check.status {
            ColumnStatus::Matched => (
                Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold),
                dim_cell("-"),
                dim_cell("-"),
            ),
            ColumnStatus::Differs { count, example } => (
                Cell::new("differs").fg(Color::Yellow),
                Cell::new(count).fg(Color::Yellow),
                example.as_ref().map_or_else(
                    || dim_cell("-"),
                    |(expected, actual)| Cell::new(format!("{expected:?} → {actual:?}")),
                ),
            ),
            ColumnStatus::Missing => (
                Cell::new("missing").fg(Color::Red),
                dim_cell("-"),
                dim_cell("-"),
            ),
        };
        table.add_row(vec![Cell::new(&check.column), status, count, example]);
    }
    println!();
    println!("{table}");
}

fn print_cell_errors(errors: &[CellError]) {
    if errors.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Row"),
        header_cell("Value"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for error in errors {
        table.add_row(vec![
            Cell::new(&error.column),
            Cell::new(error.row),
            Cell::new(&error.value),
            Cell::new(&error.reason).fg(Color::Red),
        ]);
    }
    println!();
    println!("Nulled cells:");
    println!("{table}");
}

fn stage_details(summary: &StageSummary) -> String {
    match summary {
        StageSummary::Encoded { fields, dropped } => {
            let substituted: usize = fields.iter().map(|f| f.substituted).sum();
            format!(
                "{} fields, {} dropped, {} cells substituted",
                fields.len(),
                dropped.len(),
                substituted
            )
        }
        StageSummary::Decoded {
            flows,
            cell_errors,
            ignored,
        } => format!(
            "{flows} flows, {} cell errors, {} ignored columns",
            cell_errors.len(),
            ignored.len()
        ),
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}
