use crate::Args;
use genotensor::error::{CustomError, Result};
use genotensor::{GenotypeMatrix, GenotypeRecords, Region, VariantRecord};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct InputSpec {
    input: PathBuf,
    region: Option<Region>,
    samples: Option<Vec<String>>,
    discard_multiallelic: bool,
    minor_allele: bool,
    stream: bool,
}

impl InputSpec {
    pub fn print_paths(&self) {
        println!("INPUT : {}", self.input.display());
        if let Some(region) = &self.region {
            println!("REGION: {region}");
        }
        println!();
    }
}

pub fn build_input_spec(args: &Args) -> Result<InputSpec> {
    let region = args
        .region
        .as_deref()
        .map(str::parse::<Region>)
        .transpose()?;
    let samples = match (&args.samples, &args.samples_file) {
        (Some(samples), _) => Some(samples.clone()),
        (None, Some(path)) => Some(load_samples_file(path)?),
        (None, None) => None,
    };
    Ok(InputSpec {
        input: PathBuf::from(&args.input),
        region,
        samples,
        discard_multiallelic: args.discard_multiallelic,
        minor_allele: args.minor_allele,
        stream: args.stream,
    })
}

fn load_samples_file(path: &str) -> Result<Vec<String>> {
    let samples_path = PathBuf::from(path);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b'\t')
        .from_path(&samples_path)
        .map_err(|source| CustomError::CsvRead {
            source,
            path: samples_path.clone(),
        })?;

    let mut samples = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| CustomError::CsvRead {
            source,
            path: samples_path.clone(),
        })?;
        match record.get(0).map(str::trim) {
            Some(sample) if !sample.is_empty() => samples.push(sample.to_string()),
            _ => continue,
        }
    }
    Ok(samples)
}

fn print_variants(variants: impl IntoIterator<Item = VariantRecord>, freq_label: &str) {
    println!("#ID\tCHROM\tPOS\t{freq_label}");
    for variant in variants {
        println!(
            "{}\t{}\t{}\t{:.3}",
            variant.id, variant.chrom, variant.pos, variant.freq
        );
    }
}

pub fn run(spec: &InputSpec) -> Result<()> {
    if spec.stream {
        return run_streaming(spec);
    }

    let mut genotypes = GenotypeMatrix::new(&spec.input);
    match genotypes.read(spec.region.as_ref(), spec.samples.as_deref()) {
        Ok(()) => {
            let _ = genotypes.check_biallelic(spec.discard_multiallelic)?;
            let _ = genotypes.check_phase()?;
            if spec.minor_allele {
                let _ = genotypes.recode_to_minor_allele()?;
            }
        }
        // Already logged; report the empty result below
        Err(e) if e.is_warning() => {}
        Err(e) => return Err(e),
    }

    println!("samples\t{}", genotypes.n_samples());
    println!("variants\t{}", genotypes.n_variants());
    let freq_label = if genotypes.is_minor_allele_frequency() {
        "MAF"
    } else {
        "AAF"
    };
    print_variants(genotypes.variants().iter().cloned(), freq_label);
    Ok(())
}

fn run_streaming(spec: &InputSpec) -> Result<()> {
    let records = GenotypeRecords::open(&spec.input, spec.region.as_ref(), spec.samples.as_deref())?;
    println!("samples\t{}", records.samples().len());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {spinner} {pos} variants").unwrap(),
    );
    let mut variants = Vec::new();
    for record in records {
        variants.push(record?.variant);
        pb.inc(1);
    }
    pb.abandon();
    info!("streamed {} variant(s)", variants.len());

    print_variants(variants, "AAF");
    Ok(())
}
