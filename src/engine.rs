//! The extraction engine: `bcftools query` run as a child process.
//!
//! The child's stdout is handed to the transformer as a line stream. Its
//! stderr goes to an anonymous temporary file that is read back after exit.

use std::{
    ffi::OsString,
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, Stdio},
};

use crate::{error::EngineError, template::ExtractionTemplate};

pub const DEFAULT_PROGRAM: &str = "bcftools";

#[derive(Debug, Clone)]
pub struct Bcftools {
    program: PathBuf,
}

impl Default for Bcftools {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Bcftools {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for `bcftools query` in the order the tool expects them.
    pub fn query_args(
        template: &ExtractionTemplate,
        input: &Path,
        print_header: bool,
    ) -> Vec<OsString> {
        let mut args = vec![OsString::from("query")];
        if print_header {
            args.push(OsString::from("--print-header"));
        }
        args.push(OsString::from("-f"));
        args.push(OsString::from(&template.query));
        args.push(input.as_os_str().to_os_string());
        args
    }

    pub fn spawn_query(
        &self,
        template: &ExtractionTemplate,
        input: &Path,
        print_header: bool,
    ) -> Result<QueryProcess, EngineError> {
        let program = self.program.display().to_string();
        let io_error = |source| EngineError::Io {
            program: program.clone(),
            source,
        };

        let stderr_log = tempfile::tempfile().map_err(io_error)?;
        let child_stderr = stderr_log.try_clone().map_err(io_error)?;

        tracing::debug!(program = %program, query = %template.query, "spawning extraction engine");
        let mut child = Command::new(&self.program)
            .args(Self::query_args(template, input, print_header))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::from(child_stderr))
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().map(BufReader::new);
        Ok(QueryProcess {
            program,
            child,
            stdout,
            stderr_log,
        })
    }
}

/// A running engine invocation.
pub struct QueryProcess {
    program: String,
    child: Child,
    stdout: Option<BufReader<ChildStdout>>,
    stderr_log: File,
}

impl QueryProcess {
    /// The engine's output stream. Can be taken once.
    pub fn take_stdout(&mut self) -> Result<BufReader<ChildStdout>, EngineError> {
        self.stdout.take().ok_or_else(|| EngineError::Io {
            program: self.program.clone(),
            source: std::io::Error::other("engine stdout already taken"),
        })
    }

    /// Wait for the engine to exit and fail if it did not succeed.
    pub fn finish(mut self) -> Result<(), EngineError> {
        drop(self.stdout.take());
        let status = self.child.wait().map_err(|source| EngineError::Io {
            program: self.program.clone(),
            source,
        })?;
        let stderr = self.collect_stderr();

        if status.success() {
            if !stderr.trim().is_empty() {
                tracing::warn!(program = %self.program, "{}", stderr.trim());
            }
            Ok(())
        } else {
            Err(EngineError::Failed {
                program: self.program,
                code: status.code(),
                stderr,
            })
        }
    }

    /// Stop the engine without inspecting how it exited.
    pub fn abort(mut self) {
        drop(self.stdout.take());
        if let Err(e) = self.child.kill() {
            tracing::debug!(error = %e, "engine already exited");
        }
        let _ = self.child.wait();
    }

    fn collect_stderr(&mut self) -> String {
        let mut bytes = Vec::new();
        if let Err(e) = self
            .stderr_log
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.stderr_log.read_to_end(&mut bytes))
        {
            tracing::debug!(error = %e, "failed to read engine stderr");
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::OutputFormat;

    fn template(query: &str) -> ExtractionTemplate {
        ExtractionTemplate {
            format: OutputFormat::Wide,
            query: query.to_string(),
            ann_location: None,
        }
    }

    #[test]
    fn query_args_include_header_flag_only_when_requested() {
        let t = template("%CHROM\\n");
        let with_header = Bcftools::query_args(&t, Path::new("in.vcf"), true);
        assert_eq!(
            with_header,
            vec!["query", "--print-header", "-f", "%CHROM\\n", "in.vcf"]
        );
        let without = Bcftools::query_args(&t, Path::new("in.vcf"), false);
        assert_eq!(without, vec!["query", "-f", "%CHROM\\n", "in.vcf"]);
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let engine = Bcftools::new("/nonexistent/bcftools-binary");
        let err = match engine.spawn_query(&template("%CHROM\\n"), Path::new("in.vcf"), false) {
            Ok(_) => panic!("spawn should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, EngineError::Spawn { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}
