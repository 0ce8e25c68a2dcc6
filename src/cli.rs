use std::{
    io::{self, BufWriter},
    path::PathBuf,
};

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    ConversionConfig, OutputFormat, convert_vcf_file,
    engine::DEFAULT_PROGRAM,
    error::EngineError,
    input::InputFormat,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Convert VCF files to TSV format. Requires bcftools.",
    long_about = None,
    disable_help_flag = true
)]
struct Cli {
    /// Path to VCF/BCF file, or '-' for standard input
    #[arg(value_name = "VCF")]
    vcf: PathBuf,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Wide)]
    format: OutputFormat,

    /// Print header line
    #[arg(short = 'h', long)]
    header: bool,

    /// Expand snpEff ANN annotations
    #[arg(short = 'a', long)]
    ann: bool,

    /// Input file format (auto-detected if not specified)
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    input_format: InputFormat,

    /// bcftools executable used to extract records
    #[arg(long, value_name = "PATH", env = "VCF2TSV_BCFTOOLS", default_value = DEFAULT_PROGRAM)]
    bcftools: PathBuf,

    /// Logging verbosity (e.g. error, warn, info, debug)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

impl Cli {
    fn into_config(self) -> ConversionConfig {
        ConversionConfig {
            input: self.vcf,
            input_format: self.input_format,
            output_format: self.format,
            print_header: self.header,
            expand_ann: self.ann,
            bcftools: self.bcftools,
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = cli.into_config();
    let stdout = io::stdout();
    let writer = BufWriter::new(stdout.lock());
    convert_vcf_file(&config, writer)?;
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

/// Process exit code for an error that aborted the run.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<EngineError>()
        .and_then(|engine| u8::try_from(engine.exit_code()).ok())
        .unwrap_or(1)
}
