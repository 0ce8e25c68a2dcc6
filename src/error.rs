use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures while locating or reading the source file and its header.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{} does not exist", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read VCF header from {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to spool standard input: {0}")]
    Stdin(#[source] io::Error),
}

/// Failures of the external extraction engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {}: {}", describe_code(*code), stderr.trim())]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("failed to collect output of {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    /// Exit code the process should terminate with when this error aborts the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed { code: Some(code), .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => String::from("a signal"),
    }
}

/// Errors raised while reshaping the engine's line stream.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(
        "raw line {line} has {width} columns but column {index} was required; the extraction template and engine output disagree"
    )]
    StreamContract {
        line: usize,
        index: usize,
        width: usize,
    },
    #[error("raw line {line} continues a sample block before any variant row was seen")]
    OrphanContinuation { line: usize },
    #[error("failed to read extraction output: {0}")]
    Read(#[source] io::Error),
    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
}
