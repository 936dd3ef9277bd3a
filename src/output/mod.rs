mod format;
mod tags;

pub(crate) use format::format_read;
pub(crate) use tags::{TagTableOptions, output_tags_json, print_tag_table};
