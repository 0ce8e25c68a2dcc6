use std::process::ExitCode;

fn main() -> ExitCode {
    match vcf2tsv::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(vcf2tsv::cli::exit_code(&err))
        }
    }
}
