use thiserror::Error;

use crate::genotypes::Stage;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("could not read {path}")]
    ReadWithPath {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("could not read sample list {path}")]
    CsvRead {
        #[source]
        source: csv::Error,
        path: std::path::PathBuf,
    },

    #[error("could not parse VCF record {record_num} in {path}")]
    VcfRecord {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
        record_num: usize,
    },

    #[error("VCF record {record_num} has no position")]
    VcfPosition { record_num: usize },

    #[error("could not view {path} as a 2-D int8 NPY matrix")]
    NpyView {
        #[source]
        source: ndarray_npy::ViewNpyError,
        path: std::path::PathBuf,
    },

    #[error("allele matrix has {n_columns} columns, expected 2 per sample ({n_samples} samples)")]
    AlleleMatrixColumns { n_columns: usize, n_samples: usize },

    #[error("allele matrix has {n_rows} rows but the variant index lists {n_variants} variants")]
    AlleleMatrixRows { n_rows: usize, n_variants: usize },

    #[error("variant range {start}..{end} is out of bounds for {n_variants} variants")]
    AlleleMatrixRange {
        start: usize,
        end: usize,
        n_variants: usize,
    },

    #[error("output buffer has shape {found:?}, expected {expected:?}")]
    AlleleMatrixBuffer {
        found: (usize, usize),
        expected: (usize, usize),
    },

    #[error("expected at least {expected} fields (got {n_fields}) in line {line_num} of .psam file")]
    PsamFields {
        line_num: usize,
        n_fields: usize,
        expected: usize,
    },

    #[error("expected at least {expected} fields (got {n_fields}) in line {line_num} of .pvar file")]
    PvarFields {
        line_num: usize,
        n_fields: usize,
        expected: usize,
    },

    #[error("could not parse position {value:?} in line {line_num} of .pvar file")]
    PvarPosition {
        #[source]
        source: std::num::ParseIntError,
        value: String,
        line_num: usize,
    },

    #[error("variant {id} has calls for {n_calls} sample(s), expected {n_samples}")]
    SiteSamples {
        id: String,
        n_calls: usize,
        n_samples: usize,
    },

    #[error("genotype arrays have mismatched shapes")]
    Shape(#[from] ndarray::ShapeError),

    #[error("could not parse region {region:?}; expected chrom, chrom:start or chrom:start-end")]
    RegionParse { region: String },

    #[error("requested sample {sample} is not present in the input")]
    SampleUnknown { sample: String },

    #[error("sample {sample} was requested more than once")]
    SampleDuplicate { sample: String },

    #[error("variant with ID {id} at POS {chrom}:{pos} has a missing allele for sample {sample}")]
    MissingAllele {
        id: String,
        chrom: String,
        pos: u64,
        sample: String,
    },

    #[error("variant with ID {id} at POS {chrom}:{pos} has ploidy {ploidy} for sample {sample}; only diploid calls are supported")]
    Ploidy {
        id: String,
        chrom: String,
        pos: u64,
        sample: String,
        ploidy: usize,
    },

    #[error(
        "no genotypes were loaded from {path}; if a region was given, check that the contig name matches (e.g. the 'chr' prefix)"
    )]
    EmptyResult { path: std::path::PathBuf },

    #[error("variant with ID {id} at POS {chrom}:{pos} is multiallelic for sample {sample}")]
    MultiallelicSite {
        id: String,
        chrom: String,
        pos: u64,
        sample: String,
    },

    #[error("variant with ID {id} at POS {chrom}:{pos} is unphased for sample {sample}")]
    UnphasedGenotype {
        id: String,
        chrom: String,
        pos: u64,
        sample: String,
    },

    #[error("cannot resolve region {region} in {path}: no variant index ({index} is missing)")]
    UnsupportedSourceLayout {
        region: String,
        path: std::path::PathBuf,
        index: std::path::PathBuf,
    },

    #[error("{stage:?} step requires the {requires:?} step to run first")]
    StageOrder { stage: Stage, requires: Stage },
}

impl CustomError {
    /// Whether the error should be reported as a warning rather than aborting.
    pub fn is_warning(&self) -> bool {
        matches!(self, CustomError::EmptyResult { .. })
    }
}

pub type Result<T> = std::result::Result<T, CustomError>;
