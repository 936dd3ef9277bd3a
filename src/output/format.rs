use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::NOTHING};

use crate::tag::{ReadResult, TagValue};

/// Shown where a tag has no value yet
pub(crate) const MISSING: &str = "None";

pub(crate) fn format_value(value: Option<&TagValue>) -> String {
    value.map_or_else(|| MISSING.to_string(), ToString::to_string)
}

pub(crate) fn format_read(read: Option<&ReadResult>) -> String {
    format_value(read.map(|r| &r.value))
}

pub(super) fn header_cell(text: &str, use_color: bool) -> Cell {
    let mut cell = Cell::new(text).add_attribute(Attribute::Bold);
    if use_color {
        cell = cell.fg(Color::Cyan);
    }
    cell
}

/// Borderless table whose columns are only separated by whitespace
pub(super) fn create_plain_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled);
    table
}
