//! Recovery of the per-variant (INFO) and per-sample (FORMAT) field lists from a
//! VCF meta-information header.
//!
//! Each `##INFO`/`##FORMAT` line is matched against its own declaration grammar.
//! Lines that do not match are skipped, never repaired, and identifiers are kept
//! in header order without deduplication.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static RE_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^##INFO=<ID=(?P<id>[^,]+),Number=(?P<number>-?\d+|\.|[AG]),Type=(?P<type>Integer|Float|Flag|Character|String),Description="(?P<desc>[^"]*)".*>"#,
    )
    .expect("valid INFO declaration regex")
});

static RE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^##FORMAT=<ID=(?P<id>.+),Number=(?P<number>-?\d+|\.|[AGR]),Type=(?P<type>.+),Description="(?P<desc>.*)".*>"#,
    )
    .expect("valid FORMAT declaration regex")
});

const INFO_PREFIX: &str = "##INFO=";
const FORMAT_PREFIX: &str = "##FORMAT=";
const COLUMN_HEADER_PREFIX: &str = "#CHROM";
/// CHROM POS ID REF ALT QUAL FILTER INFO FORMAT
const FIXED_HEADER_COLUMNS: usize = 9;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FieldKind {
    Info,
    Format,
}

/// A single well-formed `##INFO` or `##FORMAT` declaration.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FieldDeclaration {
    pub kind: FieldKind,
    pub id: String,
    pub number: String,
    pub ty: String,
    pub description: String,
}

impl FieldDeclaration {
    fn from_captures(kind: FieldKind, caps: &Captures<'_>) -> Self {
        let group = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };
        Self {
            kind,
            id: group("id"),
            number: group("number"),
            ty: group("type"),
            description: group("desc"),
        }
    }
}

/// Match one header line against the INFO grammar.
pub fn parse_info_declaration(line: &str) -> Option<FieldDeclaration> {
    RE_INFO
        .captures(line)
        .map(|caps| FieldDeclaration::from_captures(FieldKind::Info, &caps))
}

/// Match one header line against the FORMAT grammar.
pub fn parse_format_declaration(line: &str) -> Option<FieldDeclaration> {
    RE_FORMAT
        .captures(line)
        .map(|caps| FieldDeclaration::from_captures(FieldKind::Format, &caps))
}

/// Field lists and sample names derived once from a file's header.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct HeaderSchema {
    pub info_fields: Vec<String>,
    pub format_fields: Vec<String>,
    pub samples: Vec<String>,
    /// `##INFO`/`##FORMAT` lines that failed their grammar.
    pub skipped_declarations: usize,
}

impl HeaderSchema {
    pub fn from_header_text(text: &str) -> Self {
        let mut schema = Self::default();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.starts_with(INFO_PREFIX) {
                match parse_info_declaration(line) {
                    Some(decl) => schema.info_fields.push(decl.id),
                    None => schema.skip(line),
                }
            } else if line.starts_with(FORMAT_PREFIX) {
                match parse_format_declaration(line) {
                    Some(decl) => schema.format_fields.push(decl.id),
                    None => schema.skip(line),
                }
            } else if line.starts_with(COLUMN_HEADER_PREFIX) {
                schema.samples = parse_sample_names(line);
            }
        }

        schema
    }

    fn skip(&mut self, line: &str) {
        tracing::debug!(line, "skipping malformed header declaration");
        self.skipped_declarations += 1;
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Index of the first INFO field named `id`.
    pub fn info_position(&self, id: &str) -> Option<usize> {
        self.info_fields.iter().position(|field| field == id)
    }
}

/// Sample names from the `#CHROM` column header line.
pub fn parse_sample_names(line: &str) -> Vec<String> {
    line.trim_end_matches(['\r', '\n'])
        .split('\t')
        .skip(FIXED_HEADER_COLUMNS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "##fileformat=VCFv4.2\n\
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total Depth\">\n\
##INFO=<ID=ANN,Number=.,Type=String,Description=\"Functional annotations: 'Allele | Annotation'\">\n\
##INFO=<ID=BAD,Number=R,Type=Integer,Description=\"Per-allele depth\">\n\
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\",Source=\"x\",Version=\"1\">\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
##FORMAT=<ID=AD,Number=R,Type=Integer,Description=\"Allelic depths\">\n\
##FORMAT=<ID=XX,Type=String,Description=\"missing number\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\tNA002\n";

    #[test]
    fn extracts_fields_in_declaration_order() {
        let schema = HeaderSchema::from_header_text(HEADER);
        assert_eq!(schema.info_fields, vec!["DP", "ANN", "AF"]);
        assert_eq!(schema.format_fields, vec!["GT", "AD"]);
        assert_eq!(schema.samples, vec!["NA001", "NA002"]);
        assert_eq!(schema.skipped_declarations, 2);
        assert_eq!(schema.info_position("ANN"), Some(1));
    }

    #[test]
    fn info_grammar_rejects_per_allele_number_and_unknown_types() {
        assert!(
            parse_info_declaration(
                "##INFO=<ID=AD,Number=R,Type=Integer,Description=\"depths\">"
            )
            .is_none()
        );
        assert!(
            parse_info_declaration("##INFO=<ID=X,Number=1,Type=Blob,Description=\"x\">").is_none()
        );
        let decl = parse_info_declaration(
            "##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">",
        )
        .unwrap();
        assert_eq!(decl.kind, FieldKind::Info);
        assert_eq!(decl.id, "DB");
        assert_eq!(decl.number, "0");
        assert_eq!(decl.ty, "Flag");
        assert_eq!(decl.description, "dbSNP membership");
    }

    #[test]
    fn format_grammar_is_lenient_about_type() {
        let decl =
            parse_format_declaration("##FORMAT=<ID=PL,Number=G,Type=Custom,Description=\"x\">")
                .unwrap();
        assert_eq!(decl.id, "PL");
        assert_eq!(decl.ty, "Custom");
        assert!(parse_format_declaration("##FORMAT=<ID=GT,Number=1,Type=String>").is_none());
    }

    #[test]
    fn duplicate_identifiers_are_preserved() {
        let header = "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"a\">\n\
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"b\">\n";
        let schema = HeaderSchema::from_header_text(header);
        assert_eq!(schema.info_fields, vec!["DP", "DP"]);
    }

    #[test]
    fn header_without_declarations_yields_empty_lists() {
        let schema = HeaderSchema::from_header_text(
            "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
        );
        assert!(schema.info_fields.is_empty());
        assert!(schema.format_fields.is_empty());
        assert_eq!(schema.sample_count(), 0);
    }

    #[test]
    fn crlf_headers_are_accepted() {
        let header = "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"d\">\r\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\r\n";
        let schema = HeaderSchema::from_header_text(header);
        assert_eq!(schema.info_fields, vec!["DP"]);
        assert_eq!(schema.samples, vec!["S1"]);
    }
}
