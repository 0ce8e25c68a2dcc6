//! Rendering of the engine's column header line into output column names.

use std::sync::LazyLock;

use regex::Regex;

use crate::annotation::splice_header;
use crate::template::SAMPLE_SENTINEL;

static RE_COLUMN_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[0-9]+\]").expect("valid column marker regex"));

const FORMAT_PREFIX: &str = "F_";

fn header_columns(line: &str) -> Vec<String> {
    RE_COLUMN_MARKER
        .replace_all(line, "")
        .trim_matches(|c: char| matches!(c, '#' | ' ' | '\n' | '\r'))
        .split('\t')
        .map(str::to_string)
        .collect()
}

/// Wide header: `SAMPLE:FIELD` qualifiers become `SAMPLE_FIELD`.
pub fn render_wide_header(line: &str, ann_location: Option<usize>) -> String {
    let mut columns: Vec<String> = header_columns(line)
        .into_iter()
        .map(|column| column.replace(':', "_"))
        .collect();
    if let Some(location) = ann_location {
        splice_header(&mut columns, location);
    }
    columns.join("\t")
}

/// Long header: sample qualifiers are dropped and the trailing per-sample
/// columns are prefixed with `F_`.
pub fn render_long_header(line: &str, ann_location: Option<usize>, format_count: usize) -> String {
    let mut columns: Vec<String> = header_columns(line)
        .into_iter()
        .map(|column| {
            let name = match column.split_once(':') {
                Some((_, name)) => name,
                None => column.as_str(),
            };
            name.replace(SAMPLE_SENTINEL, "")
        })
        .collect();

    if let Some(location) = ann_location {
        splice_header(&mut columns, location);
    }

    if format_count > 0 && format_count <= columns.len() {
        let start = columns.len() - format_count;
        for column in &mut columns[start..] {
            column.insert_str(0, FORMAT_PREFIX);
        }
    }

    columns.join("\t")
}
