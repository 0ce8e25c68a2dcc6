//! Reshaping of the engine's raw line stream into output rows.
//!
//! The transformer is fed one raw line at a time and returns the output rows
//! for it. Long output relies on a small carry-over buffer: the engine prints
//! the variant-level columns only on the first sample line of each variant, so
//! later sample lines (which start with the `-->` sentinel) are rebuilt from the
//! prefix of the most recent full line.

use crate::{
    annotation::expand_row,
    conversion::ConversionPlan,
    error::ConversionError,
    header::{render_long_header, render_wide_header},
    template::{OutputFormat, SAMPLE_SENTINEL},
};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TransformState {
    AwaitingHeaderLine,
    /// Header continuation lines the engine emits once per extra sample in long mode.
    SkippingSampleLines { remaining: usize },
    EmittingDataLines,
}

/// Variant-level prefix of the last full long-format line.
#[derive(Debug, Clone, Default)]
pub struct FillBuffer {
    prefix: Vec<String>,
    width: usize,
}

impl FillBuffer {
    pub fn new(width: usize) -> Self {
        Self {
            prefix: Vec::with_capacity(width),
            width,
        }
    }

    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// Return the complete row for `parts`, remembering the prefix of fresh
    /// variant lines and prepending it to continuation lines.
    pub fn reconstruct<'a>(
        &'a mut self,
        parts: Vec<&'a str>,
        line: usize,
    ) -> Result<Vec<&'a str>, ConversionError> {
        let is_continuation = parts
            .first()
            .is_some_and(|first| first.starts_with(SAMPLE_SENTINEL));

        if is_continuation {
            if self.prefix.is_empty() {
                return Err(ConversionError::OrphanContinuation { line });
            }
            return Ok(self
                .prefix
                .iter()
                .map(String::as_str)
                .chain(parts)
                .collect());
        }

        if parts.len() < self.width {
            return Err(ConversionError::StreamContract {
                line,
                index: self.width - 1,
                width: parts.len(),
            });
        }
        self.prefix.clear();
        self.prefix
            .extend(parts[..self.width].iter().map(|part| part.to_string()));
        Ok(parts)
    }
}

/// Line-driven state machine turning raw engine lines into TSV rows.
pub struct RowTransformer<'p> {
    plan: &'p ConversionPlan,
    state: TransformState,
    fill: FillBuffer,
    lines_seen: usize,
    lines_skipped: usize,
}

impl<'p> RowTransformer<'p> {
    pub fn new(plan: &'p ConversionPlan) -> Self {
        let state = if plan.print_header {
            TransformState::AwaitingHeaderLine
        } else {
            TransformState::EmittingDataLines
        };
        Self {
            plan,
            state,
            fill: FillBuffer::new(plan.prefix_width()),
            lines_seen: 0,
            lines_skipped: 0,
        }
    }

    pub fn state(&self) -> TransformState {
        self.state
    }

    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }

    pub fn lines_skipped(&self) -> usize {
        self.lines_skipped
    }

    pub fn fill(&self) -> &FillBuffer {
        &self.fill
    }

    /// Consume one raw line and return the output rows it produces.
    pub fn push_line(&mut self, raw: &str) -> Result<Vec<String>, ConversionError> {
        let line = raw.trim_end_matches(['\n', '\r']);
        self.lines_seen += 1;

        match self.state {
            TransformState::AwaitingHeaderLine => {
                let ann_location = self.plan.template.ann_location;
                let rendered = match self.plan.format() {
                    OutputFormat::Wide => render_wide_header(line, ann_location),
                    OutputFormat::Long => {
                        // Sites-only files have no per-sample block in the long template.
                        let format_count = if self.plan.schema.sample_count() == 0 {
                            0
                        } else {
                            self.plan.schema.format_fields.len()
                        };
                        render_long_header(line, ann_location, format_count)
                    }
                };
                let extra_lines = self.plan.schema.sample_count().saturating_sub(1);
                self.state = match self.plan.format() {
                    OutputFormat::Long if extra_lines > 0 => TransformState::SkippingSampleLines {
                        remaining: extra_lines,
                    },
                    _ => TransformState::EmittingDataLines,
                };
                Ok(vec![rendered])
            }
            TransformState::SkippingSampleLines { remaining } => {
                self.lines_skipped += 1;
                self.state = if remaining > 1 {
                    TransformState::SkippingSampleLines {
                        remaining: remaining - 1,
                    }
                } else {
                    TransformState::EmittingDataLines
                };
                Ok(Vec::new())
            }
            TransformState::EmittingDataLines => self.transform_data(line),
        }
    }

    fn transform_data(&mut self, line: &str) -> Result<Vec<String>, ConversionError> {
        if line.is_empty() {
            return Ok(Vec::new());
        }
        let line_number = self.lines_seen;
        let ann_location = self.plan.template.ann_location;

        match self.plan.format() {
            OutputFormat::Wide => match ann_location {
                Some(location) => {
                    let parts: Vec<&str> = line.split('\t').collect();
                    expand_row(&parts, location, line_number)
                }
                None => Ok(vec![line.to_string()]),
            },
            OutputFormat::Long => {
                let sample_column = self.fill.width;
                let parts: Vec<&str> = line.split('\t').collect();
                let mut row = self.fill.reconstruct(parts, line_number)?;
                if let Some(&sample) = row.get(sample_column) {
                    row[sample_column] = sample.strip_prefix(SAMPLE_SENTINEL).unwrap_or(sample);
                }
                match ann_location {
                    Some(location) => expand_row(&row, location, line_number),
                    None => Ok(vec![row.join("\t")]),
                }
            }
        }
    }
}
