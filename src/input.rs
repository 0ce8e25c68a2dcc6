use std::{
    ffi::OsStr,
    io::{self, BufRead, Read},
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use noodles::{bcf, vcf};
use tempfile::NamedTempFile;

use crate::{error::InputError, smart_reader};

/// Path argument meaning "read the variant stream from standard input".
pub const STDIN_SENTINEL: &str = "-";

const BCF_MAGIC: &[u8] = b"BCF";
const COLUMN_HEADER_PREFIX: &str = "#CHROM";

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum InputFormat {
    /// Detect format automatically
    #[default]
    Auto,
    /// Variant Call Format, optionally gzip/BGZF compressed
    Vcf,
    /// Binary Call Format
    Bcf,
}

impl InputFormat {
    pub fn detect(path: &Path) -> Result<Self, InputError> {
        if let Some(filename) = path.file_name().map(|n| n.to_string_lossy().to_lowercase()) {
            if filename.ends_with(".bcf") || filename.ends_with(".bcf.gz") {
                return Ok(Self::Bcf);
            } else if filename.ends_with(".vcf") || filename.ends_with(".vcf.gz") {
                return Ok(Self::Vcf);
            }
        }

        // BCF is BGZF compressed, so the magic only shows after decompression.
        let magic = smart_reader::sniff(path, BCF_MAGIC.len()).map_err(|source| {
            InputError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        if magic == BCF_MAGIC {
            Ok(Self::Bcf)
        } else {
            Ok(Self::Vcf)
        }
    }

    /// Resolve `Auto` against the file contents.
    pub fn resolve(self, path: &Path) -> Result<Self, InputError> {
        match self {
            Self::Auto => Self::detect(path),
            explicit => Ok(explicit),
        }
    }
}

/// A readable source path. Standard input is spooled to a temporary file that
/// lives as long as this value, so both the header scan and the engine can read it.
#[derive(Debug)]
pub struct ResolvedInput {
    path: PathBuf,
    origin: String,
    spool: Option<NamedTempFile>,
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn is_spooled(&self) -> bool {
        self.spool.is_some()
    }
}

pub fn resolve_input(raw: &Path) -> Result<ResolvedInput, InputError> {
    if raw.as_os_str() == OsStr::new(STDIN_SENTINEL) {
        let stdin = io::stdin();
        let spool = spool(stdin.lock())?;
        return Ok(ResolvedInput {
            path: spool.path().to_path_buf(),
            origin: String::from("<stdin>"),
            spool: Some(spool),
        });
    }

    if !raw.is_file() {
        return Err(InputError::NotFound {
            path: raw.to_path_buf(),
        });
    }

    Ok(ResolvedInput {
        path: raw.to_path_buf(),
        origin: raw.display().to_string(),
        spool: None,
    })
}

/// Copy a stream into a named temporary file.
pub fn spool<R: Read>(mut reader: R) -> Result<NamedTempFile, InputError> {
    let mut file = NamedTempFile::new().map_err(InputError::Stdin)?;
    let bytes = io::copy(&mut reader, file.as_file_mut()).map_err(InputError::Stdin)?;
    tracing::debug!(bytes, path = %file.path().display(), "spooled standard input");
    Ok(file)
}

/// Meta-information and column header lines of a VCF or BCF file as VCF text.
pub fn read_header_text(path: &Path, format: InputFormat) -> Result<String, InputError> {
    let unreadable = |source: io::Error| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    match format.resolve(path)? {
        InputFormat::Bcf => read_bcf_header(path).map_err(unreadable),
        _ => {
            let reader = smart_reader::open_input(path).map_err(unreadable)?;
            read_vcf_header(reader).map_err(unreadable)
        }
    }
}

/// Collect `#` lines up to and including the `#CHROM` line.
pub fn read_vcf_header<R: BufRead>(mut reader: R) -> io::Result<String> {
    let mut text = String::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 || !line.starts_with('#') {
            break;
        }
        text.push_str(&line);
        if line.starts_with(COLUMN_HEADER_PREFIX) {
            break;
        }
    }
    Ok(text)
}

fn read_bcf_header(path: &Path) -> io::Result<String> {
    let mut reader = bcf::io::reader::Builder::default().build_from_path(path)?;
    let header = reader.read_header()?;
    tracing::debug!(samples = header.sample_names().len(), "read BCF header");

    let mut writer = vcf::io::Writer::new(Vec::new());
    writer.write_header(&header)?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
