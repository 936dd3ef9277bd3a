use crate::flexlogger::TagRow;
use crate::tag::TagValue;
use crate::utils::Timezone;

use super::format::{MISSING, create_plain_table, format_value, header_cell};

#[derive(Debug, Clone, Copy)]
pub(crate) struct TagTableOptions {
    pub(crate) use_color: bool,
    pub(crate) timezone: Timezone,
}

/// Render rows as aligned Name / Timestamp / Type / Value columns
pub(crate) fn render_tag_table(rows: &[TagRow], opts: TagTableOptions) -> String {
    let mut table = create_plain_table();
    if opts.use_color {
        table.enforce_styling();
    }
    table.set_header(vec![
        header_cell("Name", opts.use_color),
        header_cell("Timestamp", opts.use_color),
        header_cell("Type", opts.use_color),
        header_cell("Value", opts.use_color),
    ]);
    for row in rows {
        table.add_row(vec![
            row.name.clone(),
            row.timestamp
                .map_or_else(|| MISSING.to_string(), |ts| opts.timezone.format(ts)),
            row.data_type
                .map_or_else(|| MISSING.to_string(), |t| t.name().to_string()),
            format_value(row.value.as_ref()),
        ]);
    }
    table.to_string()
}

pub(crate) fn print_tag_table(rows: &[TagRow], opts: TagTableOptions) {
    println!("{}", render_tag_table(rows, opts));
}

pub(crate) fn output_tags_json(rows: &[TagRow], timezone: Timezone) -> String {
    let output: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "name": row.name,
                "type": row.data_type.map(|t| t.name()),
                "value": row.value.as_ref().map(TagValue::to_json),
                "timestamp": row.timestamp.map(|ts| timezone.format(ts)),
            })
        })
        .collect();
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "[]".to_string())
}
