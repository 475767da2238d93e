use std::fs::File;
use std::iter::Flatten;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::vec::IntoIter;

use itertools::Itertools;
use log::debug;
use memmap2::Mmap;
use ndarray::{Array2, Array3, ArrayView2, ArrayViewMut2, Axis, s};
use ndarray_npy::ViewNpyExt;

use crate::error::{CustomError, Result};
use crate::model::{
    CHANNELS_WITH_PHASE, MISSING_ALLELE, PHASE, STRAND_1, STRAND_2, Site, VariantRecord,
};
use crate::reader::RecordSource;
use crate::reader::common::{alt_allele_frequency, read_psam, read_pvar, select_samples};
use crate::region::Region;

const STRANDS_PER_SAMPLE: usize = 2;
const PLACEHOLDER_CHROM: &str = ".";

/// Reads a columnar allele matrix: a variant-major `.npy` file of `i8` allele
/// codes with two adjacent columns (one per strand) for every sample.
/// A negative code marks a missing allele and is read as [`MISSING_ALLELE`].
///
/// Companion files share the matrix's file stem:
/// `.psam` lists the samples and is required; `.pvar` is the variant index
/// and is only required to resolve a region. Without it, variants are named
/// by their 1-based row number.
///
/// The format stores no phase, so every call is reported as phased.
pub struct AlleleMatrixReader {
    path: PathBuf,
    index_path: PathBuf,
    mmap: Mmap,
    samples: Vec<String>,
    index: Option<Vec<VariantRecord>>,
    n_variants: usize,
}

impl AlleleMatrixReader {
    pub fn open(path: &impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let index_path = path.with_extension("pvar");
        let samples = read_psam(&path.with_extension("psam"))?;

        let f = File::open(&path).map_err(|e| CustomError::ReadWithPath {
            source: e,
            path: path.clone(),
        })?;
        // SAFETY: the mapping is read-only and lives as long as the reader
        let mmap = unsafe { Mmap::map(&f) }.map_err(|e| CustomError::ReadWithPath {
            source: e,
            path: path.clone(),
        })?;

        let (n_variants, n_columns) = ArrayView2::<i8>::view_npy(&mmap)
            .map_err(|e| CustomError::NpyView {
                source: e,
                path: path.clone(),
            })?
            .dim();
        if n_columns != STRANDS_PER_SAMPLE * samples.len() {
            return Err(CustomError::AlleleMatrixColumns {
                n_columns,
                n_samples: samples.len(),
            });
        }

        let index = if index_path.exists() {
            let variants = read_pvar(&index_path)?;
            if variants.len() != n_variants {
                return Err(CustomError::AlleleMatrixRows {
                    n_rows: n_variants,
                    n_variants: variants.len(),
                });
            }
            Some(variants)
        } else {
            debug!("no variant index at {}", index_path.display());
            None
        };

        Ok(Self {
            path,
            index_path,
            mmap,
            samples,
            index,
            n_variants,
        })
    }

    fn view(&self) -> Result<ArrayView2<'_, i8>> {
        ArrayView2::<i8>::view_npy(&self.mmap).map_err(|e| CustomError::NpyView {
            source: e,
            path: self.path.clone(),
        })
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn variant_count(&self) -> usize {
        self.n_variants
    }

    /// Copy rows `start..end` of the raw matrix into `out`, which must have
    /// shape `(end - start, 2 * sample_count())`.
    pub fn read_alleles_range(
        &self,
        start: usize,
        end: usize,
        mut out: ArrayViewMut2<i8>,
    ) -> Result<()> {
        if start > end || end > self.n_variants {
            return Err(CustomError::AlleleMatrixRange {
                start,
                end,
                n_variants: self.n_variants,
            });
        }
        let expected = (end - start, STRANDS_PER_SAMPLE * self.sample_count());
        if out.dim() != expected {
            return Err(CustomError::AlleleMatrixBuffer {
                found: out.dim(),
                expected,
            });
        }
        out.assign(&self.view()?.slice(s![start..end, ..]));
        Ok(())
    }

    /// Resolve a region to contiguous runs of matrix rows.
    fn resolve_rows(&self, region: Option<&Region>) -> Result<Vec<Range<usize>>> {
        let Some(region) = region else {
            return Ok(if self.n_variants == 0 {
                Vec::new()
            } else {
                vec![0..self.n_variants]
            });
        };
        let Some(index) = &self.index else {
            return Err(CustomError::UnsupportedSourceLayout {
                region: region.to_string(),
                path: self.path.clone(),
                index: self.index_path.clone(),
            });
        };

        let ranges = index
            .iter()
            .enumerate()
            .filter(|(_, variant)| region.contains(&variant.chrom, variant.pos))
            .map(|(row, _)| row..row + 1)
            .coalesce(|a, b| {
                if a.end == b.start {
                    Ok(a.start..b.end)
                } else {
                    Err((a, b))
                }
            })
            .collect();
        Ok(ranges)
    }

    fn variant_meta(&self, row: usize) -> VariantRecord {
        match &self.index {
            Some(index) => index[row].clone(),
            None => VariantRecord::new((row + 1).to_string(), PLACEHOLDER_CHROM, 0, f64::NAN),
        }
    }

    /// Read every selected variant at once into a sample-major tensor.
    pub fn load(
        &self,
        region: Option<&Region>,
        samples_to_keep: Option<&[String]>,
    ) -> Result<(Vec<String>, Vec<VariantRecord>, Array3<u8>)> {
        let (samples, sample_indices) = select_samples(self.samples.clone(), samples_to_keep)?;
        let ranges = self.resolve_rows(region)?;
        let n_rows: usize = ranges.iter().map(|range| range.len()).sum();

        let mut buffer = Array2::<i8>::zeros((n_rows, STRANDS_PER_SAMPLE * self.sample_count()));
        let mut offset = 0;
        for range in &ranges {
            let rows = buffer.slice_mut(s![offset..offset + range.len(), ..]);
            self.read_alleles_range(range.start, range.end, rows)?;
            offset += range.len();
        }

        let mut variants: Vec<VariantRecord> = ranges
            .into_iter()
            .flatten()
            .map(|row| self.variant_meta(row))
            .collect();
        let tensor = strands_to_tensor(buffer.view(), &sample_indices);
        for (variant, calls) in variants.iter_mut().zip(tensor.axis_iter(Axis(1))) {
            variant.freq = alt_allele_frequency(calls);
        }
        Ok((samples, variants, tensor))
    }
}

/// De-interleave the per-sample strand columns of `rows` and lay them out
/// sample-major, appending a phase channel that marks every call as phased.
/// Negative codes become [`MISSING_ALLELE`].
fn strands_to_tensor(rows: ArrayView2<i8>, sample_indices: &[usize]) -> Array3<u8> {
    let strand_1 = rows.slice(s![.., 0..;2]);
    let strand_2 = rows.slice(s![.., 1..;2]);
    let code = |allele: i8| u8::try_from(allele).unwrap_or(MISSING_ALLELE);

    let mut tensor = Array3::<u8>::zeros((sample_indices.len(), rows.nrows(), CHANNELS_WITH_PHASE));
    for (sample_row, &source_idx) in sample_indices.iter().enumerate() {
        let pairs = strand_1.column(source_idx).into_iter().zip(strand_2.column(source_idx));
        for (variant_idx, (&a, &b)) in pairs.enumerate() {
            tensor[[sample_row, variant_idx, STRAND_1]] = code(a);
            tensor[[sample_row, variant_idx, STRAND_2]] = code(b);
            tensor[[sample_row, variant_idx, PHASE]] = 1;
        }
    }
    tensor
}

/// Record-at-a-time view over an [`AlleleMatrixReader`].
pub struct AlleleMatrixRecords {
    reader: AlleleMatrixReader,
    samples: Vec<String>,
    sample_indices: Vec<usize>,
    rows: Flatten<IntoIter<Range<usize>>>,
    buffer: Array2<i8>,
}

impl AlleleMatrixRecords {
    pub fn new(
        reader: AlleleMatrixReader,
        region: Option<&Region>,
        samples_to_keep: Option<&[String]>,
    ) -> Result<Self> {
        let (samples, sample_indices) =
            select_samples(reader.samples().to_vec(), samples_to_keep)?;
        let rows = reader.resolve_rows(region)?.into_iter().flatten();
        let buffer = Array2::<i8>::zeros((1, STRANDS_PER_SAMPLE * reader.sample_count()));
        Ok(Self {
            reader,
            samples,
            sample_indices,
            rows,
            buffer,
        })
    }

    fn read_site(&mut self, row: usize) -> Result<Site> {
        self.reader
            .read_alleles_range(row, row + 1, self.buffer.view_mut())?;
        let mut variant = self.reader.variant_meta(row);
        let tensor = strands_to_tensor(self.buffer.view(), &self.sample_indices);
        let calls = tensor.index_axis_move(Axis(1), 0);
        variant.freq = alt_allele_frequency(calls.view());
        Ok(Site { variant, calls })
    }
}

impl RecordSource for AlleleMatrixRecords {
    fn samples(&self) -> &[String] {
        &self.samples
    }
}

impl Iterator for AlleleMatrixRecords {
    type Item = Result<Site>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        let site = self.read_site(row);
        if site.is_err() {
            // Poison iterator to prevent further reads
            self.rows = Vec::new().into_iter().flatten();
        }
        Some(site)
    }
}
