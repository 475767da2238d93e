use std::sync::Arc;

use ndarray::Array2;

/// Allele-channel layout of a loaded genotype call.
pub const STRAND_1: usize = 0;
pub const STRAND_2: usize = 1;
pub const PHASE: usize = 2;
pub const CHANNELS_WITH_PHASE: usize = 3;
pub const CHANNELS_WITHOUT_PHASE: usize = 2;
/// Strand code for a missing allele. Being above 1, it fails the biallelic
/// check like a second ALT allele would.
pub const MISSING_ALLELE: u8 = u8::MAX;

/// Variant-level meta information.
///
/// `freq` holds the alternate allele frequency until the owning matrix is
/// recoded to minor alleles, after which it holds the minor allele frequency.
/// The owner tracks which one it is.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub id: String,
    pub chrom: String,
    pub pos: u64,
    pub freq: f64,
}

impl VariantRecord {
    pub fn new(id: impl Into<String>, chrom: impl Into<String>, pos: u64, freq: f64) -> Self {
        Self {
            id: id.into(),
            chrom: chrom.into(),
            pos,
            freq,
        }
    }
}

/// One record as produced by a source adapter.
/// `calls` has shape (samples, 3): strand one, strand two, phased flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub variant: VariantRecord,
    pub calls: Array2<u8>,
}

/// A single variant yielded by the streaming iterator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeRecord {
    pub data: Array2<u8>,
    pub samples: Arc<[String]>,
    pub variant: VariantRecord,
}
