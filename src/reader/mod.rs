pub mod allele_matrix;
pub mod common;
pub mod memory;
pub mod vcf;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{CustomError, Result};
use crate::model::Site;
use crate::region::Region;

pub use allele_matrix::{AlleleMatrixReader, AlleleMatrixRecords};
pub use memory::MemorySource;
pub use vcf::VcfReader;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// A source of variant records, read one at a time in source order.
/// The underlying file is released when the source is dropped.
pub trait RecordSource: Iterator<Item = Result<Site>> {
    /// The selected samples, in the order their calls appear in each [`Site`].
    fn samples(&self) -> &[String];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Vcf,
    AlleleMatrix,
}

impl SourceFormat {
    /// Sniff the leading bytes of `path` to decide which adapter reads it.
    pub fn detect(path: &impl AsRef<Path>) -> Result<Self> {
        let f = File::open(path).map_err(|e| CustomError::ReadWithPath {
            source: e,
            path: path.as_ref().to_path_buf(),
        })?;
        let mut reader = BufReader::new(f);
        let buffer = reader.fill_buf().map_err(|e| CustomError::ReadWithPath {
            source: e,
            path: path.as_ref().to_path_buf(),
        })?;
        if buffer.starts_with(NPY_MAGIC) {
            Ok(SourceFormat::AlleleMatrix)
        } else {
            Ok(SourceFormat::Vcf)
        }
    }
}

/// Open the appropriate record-at-a-time reader for `path`.
pub fn open_records(
    path: &impl AsRef<Path>,
    region: Option<&Region>,
    samples: Option<&[String]>,
) -> Result<Box<dyn RecordSource>> {
    match SourceFormat::detect(path)? {
        SourceFormat::Vcf => Ok(Box::new(VcfReader::open(path, region, samples)?)),
        SourceFormat::AlleleMatrix => {
            let reader = AlleleMatrixReader::open(path)?;
            Ok(Box::new(AlleleMatrixRecords::new(reader, region, samples)?))
        }
    }
}
