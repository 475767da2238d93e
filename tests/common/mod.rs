#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::Array2;

pub const SAMPLES: [&str; 5] = ["HG00096", "HG00097", "HG00099", "HG00100", "HG00101"];
pub const CHROM: &str = "1";
pub const POSITIONS: [u64; 4] = [10114, 10116, 10117, 10122];
const ALLELES: [(&str, &str); 4] = [("T", "C"), ("A", "G"), ("C", "T"), ("T", "C")];

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub struct Dataset {
    pub dir: PathBuf,
    pub vcf: PathBuf,
    pub npy: PathBuf,
}

pub fn variant_id(variant: usize) -> String {
    let (reference, alternate) = ALLELES[variant];
    format!("{CHROM}:{}:{reference}:{alternate}", POSITIONS[variant])
}

/// Strand pairs for each (sample, variant). Variant 1 is the only one with
/// ALT alleles: heterozygous in the first two samples, homozygous ALT in the
/// next two, homozygous REF in the last.
pub fn calls() -> [[(u8, u8); 4]; 5] {
    let mut calls = [[(0, 0); 4]; 5];
    calls[0][1] = (0, 1);
    calls[1][1] = (0, 1);
    calls[2][1] = (1, 1);
    calls[3][1] = (1, 1);
    calls
}

pub fn create_dataset(label: &str, with_index: bool) -> io::Result<Dataset> {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join("genotensor-tests").join(format!(
        "{}-{}-{}",
        std::process::id(),
        id,
        label
    ));
    fs::create_dir_all(&dir)?;

    let vcf = dir.join("simple.vcf");
    write_vcf(&vcf, &calls(), '|')?;

    let npy = dir.join("simple.npy");
    write_allele_matrix(&npy, &allele_matrix(&calls()))?;
    write_psam(npy.with_extension("psam"))?;
    if with_index {
        write_pvar(npy.with_extension("pvar"), POSITIONS.len())?;
    }

    Ok(Dataset { dir, vcf, npy })
}

/// Write a VCF with the standard sites, using `separator` between strands.
pub fn write_vcf(path: &PathBuf, calls: &[[(u8, u8); 4]; 5], separator: char) -> io::Result<()> {
    let genotypes: Vec<Vec<String>> = (0..POSITIONS.len())
        .map(|variant| {
            calls
                .iter()
                .map(|row| {
                    let (a, b) = row[variant];
                    format!("{a}{separator}{b}")
                })
                .collect()
        })
        .collect();
    write_vcf_genotypes(path, &genotypes)
}

/// Write a VCF with the standard sites and raw GT strings, indexed
/// `[variant][sample]`.
pub fn write_vcf_genotypes(path: &PathBuf, genotypes: &[Vec<String>]) -> io::Result<()> {
    let mut f = File::create(path)?;
    writeln!(f, "##fileformat=VCFv4.3")?;
    writeln!(f, "##contig=<ID={CHROM},length=248956422>")?;
    writeln!(
        f,
        "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">"
    )?;
    writeln!(
        f,
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}",
        SAMPLES.join("\t")
    )?;
    for (variant, pos) in POSITIONS.iter().enumerate() {
        let (reference, alternate) = ALLELES[variant];
        writeln!(
            f,
            "{CHROM}\t{pos}\t{}\t{reference}\t{alternate}\t.\tPASS\t.\tGT\t{}",
            variant_id(variant),
            genotypes[variant].join("\t")
        )?;
    }
    Ok(())
}

/// Phased GT strings for the standard calls, indexed `[variant][sample]`.
pub fn phased_genotypes() -> Vec<Vec<String>> {
    let calls = calls();
    (0..POSITIONS.len())
        .map(|variant| {
            calls
                .iter()
                .map(|row| format!("{}|{}", row[variant].0, row[variant].1))
                .collect()
        })
        .collect()
}

/// Variant-major allele codes with interleaved strands.
pub fn allele_matrix(calls: &[[(u8, u8); 4]; 5]) -> Array2<i8> {
    let mut matrix = Array2::<i8>::zeros((POSITIONS.len(), 2 * SAMPLES.len()));
    for (sample, row) in calls.iter().enumerate() {
        for (variant, &(a, b)) in row.iter().enumerate() {
            matrix[[variant, 2 * sample]] = a as i8;
            matrix[[variant, 2 * sample + 1]] = b as i8;
        }
    }
    matrix
}

pub fn write_allele_matrix(path: &PathBuf, matrix: &Array2<i8>) -> io::Result<()> {
    ndarray_npy::write_npy(path, matrix).map_err(io::Error::other)
}

fn write_psam(path: PathBuf) -> io::Result<()> {
    let mut f = File::create(path)?;
    writeln!(f, "#IID\tSEX")?;
    for sample in SAMPLES {
        writeln!(f, "{sample}\tNA")?;
    }
    Ok(())
}

/// Write a variant index listing the first `n_variants` standard sites.
pub fn write_pvar(path: PathBuf, n_variants: usize) -> io::Result<()> {
    let mut f = File::create(path)?;
    writeln!(f, "##fileformat=PVARv1.0")?;
    writeln!(f, "#CHROM\tPOS\tID\tREF\tALT")?;
    for (variant, pos) in POSITIONS.iter().enumerate().take(n_variants) {
        let (reference, alternate) = ALLELES[variant];
        writeln!(
            f,
            "{CHROM}\t{pos}\t{}\t{reference}\t{alternate}",
            variant_id(variant)
        )?;
    }
    Ok(())
}

pub fn write_samples_file(dir: &PathBuf, samples: &[&str]) -> io::Result<PathBuf> {
    let path = dir.join("samples.txt");
    let mut f = File::create(&path)?;
    for sample in samples {
        writeln!(f, "{sample}")?;
    }
    Ok(path)
}
