use crate::error::ConversionError;

/// Column names of one snpEff ANN sub-record, in order.
pub const ANN_COLUMNS: [&str; 15] = [
    "allele",
    "effect",
    "impact",
    "gene_name",
    "gene_id",
    "feature_type",
    "feature_id",
    "transcript_biotype",
    "exon_intron_rank",
    "nt_change",
    "aa_change",
    "cDNA_position/cDNA_len",
    "protein_position",
    "distance_to_feature",
    "error",
];

const RECORD_SEPARATOR: char = ',';
const FIELD_SEPARATOR: char = '|';

/// One pipe-delimited ANN sub-record, always exactly `ANN_COLUMNS.len()` wide.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AnnotationRecord<'a> {
    fields: Vec<&'a str>,
}

impl<'a> AnnotationRecord<'a> {
    /// Short records are padded with empty fields; surplus fields are folded
    /// back into the trailing `error` column.
    pub fn parse(raw: &'a str) -> Self {
        let width = ANN_COLUMNS.len();
        let mut fields: Vec<&'a str> = raw.splitn(width, FIELD_SEPARATOR).collect();
        fields.resize(width, "");
        Self { fields }
    }

    pub fn fields(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.fields.iter().copied()
    }
}

/// Split an ANN value into its sub-records. An empty value yields one empty record.
pub fn parse_annotations(value: &str) -> impl Iterator<Item = AnnotationRecord<'_>> {
    value.split(RECORD_SEPARATOR).map(AnnotationRecord::parse)
}

/// Fan one row out into one row per ANN sub-record, replacing the ANN column
/// in place by the sub-record's fields.
pub fn expand_row(
    row: &[&str],
    ann_location: usize,
    line: usize,
) -> Result<Vec<String>, ConversionError> {
    let value = row
        .get(ann_location)
        .ok_or(ConversionError::StreamContract {
            line,
            index: ann_location,
            width: row.len(),
        })?;

    let (before, after) = (&row[..ann_location], &row[ann_location + 1..]);
    let rows = parse_annotations(value)
        .map(|record| {
            before
                .iter()
                .copied()
                .chain(record.fields())
                .chain(after.iter().copied())
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect();
    Ok(rows)
}

/// Header counterpart of [`expand_row`].
pub fn splice_header(columns: &mut Vec<String>, ann_location: usize) {
    if ann_location < columns.len() {
        columns.splice(
            ann_location..=ann_location,
            ANN_COLUMNS.iter().map(|name| name.to_string()),
        );
    }
}
