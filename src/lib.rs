#![doc = include_str!("../README.md")]

pub mod annotation;
pub mod cli;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod header;
pub mod input;
pub mod schema;
pub mod smart_reader;
pub mod template;
pub mod transform;

pub use conversion::{
    ConversionConfig, ConversionPlan, ConversionSummary, convert_vcf_file, transform_stream,
};
pub use template::OutputFormat;
