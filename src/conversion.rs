use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};

use crate::{
    engine::{Bcftools, DEFAULT_PROGRAM},
    error::ConversionError,
    input::{InputFormat, read_header_text, resolve_input},
    schema::HeaderSchema,
    template::{ExtractionTemplate, OutputFormat},
    transform::RowTransformer,
};

/// Configuration required to drive a conversion.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Source path, or `-` for standard input.
    pub input: PathBuf,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    pub print_header: bool,
    pub expand_ann: bool,
    /// Extraction engine binary.
    pub bcftools: PathBuf,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(crate::input::STDIN_SENTINEL),
            input_format: InputFormat::Auto,
            output_format: OutputFormat::Wide,
            print_header: false,
            expand_ann: false,
            bcftools: PathBuf::from(DEFAULT_PROGRAM),
        }
    }
}

/// Everything derived from the header, computed once per run.
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    pub schema: HeaderSchema,
    pub template: ExtractionTemplate,
    pub print_header: bool,
}

impl ConversionPlan {
    pub fn new(
        schema: HeaderSchema,
        format: OutputFormat,
        print_header: bool,
        expand_ann: bool,
    ) -> Self {
        let template = ExtractionTemplate::build(&schema, format, expand_ann);
        Self {
            schema,
            template,
            print_header,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.template.format
    }

    pub fn prefix_width(&self) -> usize {
        ExtractionTemplate::prefix_width(&self.schema)
    }
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ConversionSummary {
    pub raw_lines: usize,
    pub skipped_lines: usize,
    pub header_rows: usize,
    pub data_rows: usize,
    /// The downstream reader went away before all rows were written.
    pub output_closed: bool,
}

impl ConversionSummary {
    pub fn record_emission(&mut self, is_header: bool) {
        if is_header {
            self.header_rows += 1;
        } else {
            self.data_rows += 1;
        }
    }
}

/// Convert one VCF/BCF source into TSV rows written to `output`.
pub fn convert_vcf_file<W: Write>(config: &ConversionConfig, output: W) -> Result<ConversionSummary> {
    tracing::info!(
        input = %config.input.display(),
        input_format = ?config.input_format,
        output_format = ?config.output_format,
        header = config.print_header,
        ann = config.expand_ann,
        "starting conversion",
    );

    let input = resolve_input(&config.input)?;
    let header = read_header_text(input.path(), config.input_format)?;
    let schema = HeaderSchema::from_header_text(&header);
    if schema.skipped_declarations > 0 {
        tracing::warn!(
            skipped = schema.skipped_declarations,
            "ignored malformed INFO/FORMAT declarations"
        );
    }
    tracing::debug!(
        info = ?schema.info_fields,
        format = ?schema.format_fields,
        samples = schema.sample_count(),
        "derived header schema",
    );

    let plan = ConversionPlan::new(
        schema,
        config.output_format,
        config.print_header,
        config.expand_ann,
    );

    let engine = Bcftools::new(&config.bcftools);
    let mut process = engine.spawn_query(&plan.template, input.path(), plan.print_header)?;
    let stdout = process.take_stdout()?;

    let summary = match transform_stream(stdout, output, &plan) {
        Ok(summary) if summary.output_closed => {
            process.abort();
            summary
        }
        Ok(summary) => {
            process.finish()?;
            summary
        }
        Err(err) => {
            process.abort();
            return Err(err).with_context(|| format!("failed to convert {}", input.origin()));
        }
    };

    tracing::info!(
        raw_lines = summary.raw_lines,
        skipped_lines = summary.skipped_lines,
        rows = summary.data_rows,
        output_closed = summary.output_closed,
        "conversion finished",
    );
    Ok(summary)
}

/// Drive the transformer over a raw engine stream.
///
/// A closed output (broken pipe) ends the run early and is reported through
/// [`ConversionSummary::output_closed`] rather than as an error.
pub fn transform_stream<R, W>(
    mut reader: R,
    mut output: W,
    plan: &ConversionPlan,
) -> Result<ConversionSummary, ConversionError>
where
    R: BufRead,
    W: Write,
{
    let mut transformer = RowTransformer::new(plan);
    let mut summary = ConversionSummary::default();
    let mut line = String::new();

    'lines: loop {
        line.clear();
        if reader.read_line(&mut line).map_err(ConversionError::Read)? == 0 {
            break;
        }

        let is_header = transformer.lines_seen() == 0 && plan.print_header;
        for row in transformer.push_line(&line)? {
            if let Err(e) = writeln!(output, "{row}") {
                if e.kind() == io::ErrorKind::BrokenPipe {
                    summary.output_closed = true;
                    break 'lines;
                }
                return Err(ConversionError::Write(e));
            }
            summary.record_emission(is_header);
        }
    }

    if !summary.output_closed
        && let Err(e) = output.flush()
    {
        if e.kind() != io::ErrorKind::BrokenPipe {
            return Err(ConversionError::Write(e));
        }
        summary.output_closed = true;
    }

    summary.raw_lines = transformer.lines_seen();
    summary.skipped_lines = transformer.lines_skipped();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn plan(format: OutputFormat, header: bool) -> ConversionPlan {
        let schema = HeaderSchema {
            info_fields: vec![String::from("DP")],
            format_fields: vec![String::from("GT")],
            samples: vec![String::from("S1"), String::from("S2")],
            skipped_declarations: 0,
        };
        ConversionPlan::new(schema, format, header, false)
    }

    /// Accepts a fixed number of lines, then behaves like a closed pipe.
    struct ClosingWriter {
        accepted: Vec<u8>,
        lines_left: usize,
    }

    impl Write for ClosingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.lines_left == 0 {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            self.accepted.extend_from_slice(buf);
            if buf.contains(&b'\n') {
                self.lines_left -= 1;
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn summary_counts_rows_and_skipped_lines() {
        let raw = "# [1]CHROM\t[2]POS\t[3]ID\t[4]REF\t[5]ALT\t[6]QUAL\t[7]FILTER\t[8]DP\t-->[9]SAMPLE\t[10]S1:GT\n\
-->[11]SAMPLE\t[12]S2:GT\n\
chr1\t5\t.\tA\tG\t.\tPASS\t3\t-->S1\t0/1\n\
-->S2\t1/1\n";
        let mut out = Vec::new();
        let summary =
            transform_stream(Cursor::new(raw), &mut out, &plan(OutputFormat::Long, true)).unwrap();
        assert_eq!(
            summary,
            ConversionSummary {
                raw_lines: 4,
                skipped_lines: 1,
                header_rows: 1,
                data_rows: 2,
                output_closed: false,
            }
        );
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tDP\tSAMPLE\tF_GT\n\
chr1\t5\t.\tA\tG\t.\tPASS\t3\tS1\t0/1\n\
chr1\t5\t.\tA\tG\t.\tPASS\t3\tS2\t1/1\n"
        );
    }

    #[test]
    fn closed_output_stops_cleanly() {
        let raw = "chr1\t1\t.\tA\tG\t.\tPASS\t3\tS1\t0/1\tS2\t0/0\n\
chr1\t2\t.\tA\tG\t.\tPASS\t3\tS1\t0/1\tS2\t0/0\n\
chr1\t3\t.\tA\tG\t.\tPASS\t3\tS1\t0/1\tS2\t0/0\n";
        let mut writer = ClosingWriter {
            accepted: Vec::new(),
            lines_left: 1,
        };
        let summary =
            transform_stream(Cursor::new(raw), &mut writer, &plan(OutputFormat::Wide, false))
                .unwrap();
        assert!(summary.output_closed);
        assert_eq!(summary.data_rows, 1);
        assert_eq!(
            String::from_utf8(writer.accepted).unwrap(),
            "chr1\t1\t.\tA\tG\t.\tPASS\t3\tS1\t0/1\tS2\t0/0\n"
        );
    }

    #[test]
    fn other_write_failures_are_errors() {
        struct FullDisk;
        impl Write for FullDisk {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("no space left"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let err = transform_stream(
            Cursor::new("chr1\t1\t.\tA\tG\t.\tPASS\t3\n"),
            FullDisk,
            &plan(OutputFormat::Wide, false),
        )
        .unwrap_err();
        assert!(matches!(err, ConversionError::Write(_)));
    }

    #[test]
    fn missing_input_fails_before_engine_runs() {
        let config = ConversionConfig {
            input: PathBuf::from("/no/such/input.vcf"),
            bcftools: PathBuf::from("/no/such/bcftools"),
            ..ConversionConfig::default()
        };
        let mut out = Vec::new();
        let err = convert_vcf_file(&config, &mut out).unwrap_err();
        assert!(err.downcast_ref::<crate::error::InputError>().is_some());
        assert!(out.is_empty());
    }
}
