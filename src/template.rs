//! Synthesis of the `bcftools query` format string for a given schema.

use clap::ValueEnum;

use crate::schema::HeaderSchema;

/// Columns every row starts with, in order.
pub const FIXED_COLUMNS: [&str; 7] = ["CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER"];

/// Marks the start of a per-sample block in long output.
pub const SAMPLE_SENTINEL: &str = "-->";

pub const ANN_FIELD: &str = "ANN";

const TAB: &str = "\\t";
const NEWLINE: &str = "\\n";

/// Table shapes the converter can produce.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// One row per variant, sample columns repeated horizontally.
    #[default]
    Wide,
    /// One row per variant and sample.
    Long,
}

/// Positional query handed to the extraction engine.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExtractionTemplate {
    pub format: OutputFormat,
    pub query: String,
    /// Column of the ANN token in a flattened raw row, when expansion is active.
    pub ann_location: Option<usize>,
}

impl ExtractionTemplate {
    pub fn build(schema: &HeaderSchema, format: OutputFormat, expand_ann: bool) -> Self {
        let query = match format {
            OutputFormat::Wide => wide_query(schema),
            OutputFormat::Long => long_query(schema),
        };

        let ann_location = if expand_ann {
            let location = schema
                .info_position(ANN_FIELD)
                .map(|index| index + FIXED_COLUMNS.len());
            if location.is_none() {
                tracing::warn!(
                    "ANN expansion requested but no ANN INFO field is declared; expansion disabled"
                );
            }
            location
        } else {
            None
        };

        Self {
            format,
            query,
            ann_location,
        }
    }

    /// Number of leading variant-level columns in a raw row.
    pub fn prefix_width(schema: &HeaderSchema) -> usize {
        FIXED_COLUMNS.len() + schema.info_fields.len()
    }
}

fn variant_tokens<'a>(
    schema: &'a HeaderSchema,
    info_prefix: &'a str,
) -> impl Iterator<Item = String> + 'a {
    FIXED_COLUMNS.iter().map(|column| format!("%{column}")).chain(
        schema
            .info_fields
            .iter()
            .map(move |field| format!("%{info_prefix}{field}")),
    )
}

fn sample_tokens(schema: &HeaderSchema) -> Vec<String> {
    std::iter::once(String::from("%SAMPLE"))
        .chain(schema.format_fields.iter().map(|field| format!("%{field}")))
        .collect()
}

fn wide_query(schema: &HeaderSchema) -> String {
    let mut query = variant_tokens(schema, "INFO/").collect::<Vec<_>>().join(TAB);
    query.push('[');
    for token in sample_tokens(schema) {
        query.push_str(TAB);
        query.push_str(&token);
    }
    query.push(']');
    query.push_str(NEWLINE);
    query
}

fn long_query(schema: &HeaderSchema) -> String {
    let mut query = variant_tokens(schema, "").collect::<Vec<_>>().join(TAB);
    if schema.samples.is_empty() {
        // A sample block would print nothing, not even its newline.
        query.push_str(NEWLINE);
        return query;
    }
    query.push_str(TAB);
    query.push('[');
    query.push_str(SAMPLE_SENTINEL);
    query.push_str(&sample_tokens(schema).join(TAB));
    query.push_str(NEWLINE);
    query.push(']');
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(info: &[&str], format: &[&str], samples: &[&str]) -> HeaderSchema {
        HeaderSchema {
            info_fields: info.iter().map(|s| s.to_string()).collect(),
            format_fields: format.iter().map(|s| s.to_string()).collect(),
            samples: samples.iter().map(|s| s.to_string()).collect(),
            skipped_declarations: 0,
        }
    }

    #[test]
    fn wide_template_qualifies_info_fields() {
        let s = schema(&["DP", "ANN"], &["GT", "AD"], &["S1"]);
        let template = ExtractionTemplate::build(&s, OutputFormat::Wide, false);
        assert_eq!(
            template.query,
            "%CHROM\\t%POS\\t%ID\\t%REF\\t%ALT\\t%QUAL\\t%FILTER\\t%INFO/DP\\t%INFO/ANN[\\t%SAMPLE\\t%GT\\t%AD]\\n"
        );
        assert_eq!(template.ann_location, None);
    }

    #[test]
    fn long_template_emits_one_line_per_sample() {
        let s = schema(&["DP"], &["GT"], &["S1", "S2"]);
        let template = ExtractionTemplate::build(&s, OutputFormat::Long, false);
        assert_eq!(
            template.query,
            "%CHROM\\t%POS\\t%ID\\t%REF\\t%ALT\\t%QUAL\\t%FILTER\\t%DP\\t[-->%SAMPLE\\t%GT\\n]"
        );
    }

    #[test]
    fn long_template_without_samples_still_terminates_rows() {
        let template = ExtractionTemplate::build(&schema(&[], &[], &[]), OutputFormat::Long, false);
        assert_eq!(
            template.query,
            "%CHROM\\t%POS\\t%ID\\t%REF\\t%ALT\\t%QUAL\\t%FILTER\\n"
        );
    }

    #[test]
    fn ann_location_counts_fixed_columns() {
        let s = schema(&["DP", "AF", "ANN", "ANN"], &["GT"], &["S1"]);
        let template = ExtractionTemplate::build(&s, OutputFormat::Wide, true);
        assert_eq!(template.ann_location, Some(9));
        assert_eq!(ExtractionTemplate::prefix_width(&s), 11);
    }

    #[test]
    fn missing_ann_disables_expansion() {
        let s = schema(&["DP"], &["GT"], &["S1"]);
        let template = ExtractionTemplate::build(&s, OutputFormat::Long, true);
        assert_eq!(template.ann_location, None);
    }
}
