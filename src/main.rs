mod cli;

use clap::Parser;
use genotensor::Result;
use miette::IntoDiagnostic;

/// Load genotypes, check that they are biallelic and phased, and summarize them.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Input VCF (optionally bgzipped) or .npy allele matrix.
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    input: String,

    /// Region to load, e.g. "chr1:1234-34566" or "chr7".
    #[arg(short, long)]
    region: Option<String>,

    /// Comma-separated sample IDs to keep, in the order they should appear.
    #[arg(short, long, value_delimiter = ',', conflicts_with = "samples_file")]
    samples: Option<Vec<String>>,

    /// File with one sample ID per line to keep, in the order they should appear.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    samples_file: Option<String>,

    /// Drop multiallelic variants instead of failing on them.
    #[arg(long)]
    discard_multiallelic: bool,

    /// Recode genotypes to count the minor allele rather than the ALT allele.
    #[arg(long)]
    minor_allele: bool,

    /// Stream variants one at a time instead of loading them all into memory.
    #[arg(long, conflicts_with_all = ["discard_multiallelic", "minor_allele"])]
    stream: bool,

    /// Increase logging verbosity (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let input_spec = cli::build_input_spec(&args)?;
    input_spec.print_paths();
    cli::run(&input_spec)
}

fn main() -> miette::Result<()> {
    try_main().into_diagnostic()
}
