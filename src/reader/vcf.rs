use std::io::BufRead;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::debug;
use ndarray::Array2;
use noodles_vcf::{self as vcf, variant::RecordBuf};
use noodles_vcf::variant::record::samples::keys::key;
use noodles_vcf::variant::record::samples::series::value::genotype::Phasing;
use noodles_vcf::variant::record_buf::samples::sample::Value;

use crate::error::{CustomError, Result};
use crate::model::{
    CHANNELS_WITH_PHASE, MISSING_ALLELE, PHASE, STRAND_1, STRAND_2, Site, VariantRecord,
};
use crate::reader::RecordSource;
use crate::reader::common::{alt_allele_frequency, select_samples};
use crate::region::Region;

const DIPLOID: usize = 2;
const MISSING_ID: &str = ".";
const MAX_ALLELE_CODE: u8 = MISSING_ALLELE - 1;

/// Reads genotypes from a VCF, plain or BGZF-compressed.
///
/// A region is honoured by scanning every record and keeping those that fall
/// inside it, so indexed and unindexed files behave the same way.
///
/// Missing alleles are encoded as [`MISSING_ALLELE`] and left for the
/// biallelic check to reject or discard.
pub struct VcfReader {
    path: PathBuf,
    reader: vcf::io::Reader<Box<dyn BufRead>>,
    header: vcf::Header,
    samples: Vec<String>,
    sample_indices: Vec<usize>,
    region: Option<Region>,
    record: RecordBuf,
    record_num: usize,
    exhausted: bool,
}

impl VcfReader {
    pub fn open(
        path: &impl AsRef<Path>,
        region: Option<&Region>,
        samples_to_keep: Option<&[String]>,
    ) -> Result<Self> {
        let mut reader = vcf::io::reader::Builder::default()
            .build_from_path(path)
            .map_err(|e| CustomError::ReadWithPath {
                source: e,
                path: path.as_ref().to_path_buf(),
            })?;
        let header = reader.read_header().map_err(|e| CustomError::ReadWithPath {
            source: e,
            path: path.as_ref().to_path_buf(),
        })?;

        let source_samples: Vec<String> = header.sample_names().iter().cloned().collect();
        let (samples, sample_indices) = select_samples(source_samples, samples_to_keep)?;
        debug!(
            "opened {} with {} selected sample(s)",
            path.as_ref().display(),
            samples.len()
        );

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            reader,
            header,
            samples,
            sample_indices,
            region: region.cloned(),
            record: RecordBuf::default(),
            record_num: 0,
            exhausted: false,
        })
    }

    /// Decode the current record, or `None` if it lies outside the region.
    fn decode_record(&self) -> Result<Option<Site>> {
        let chrom = self.record.reference_sequence_name();
        let pos = self
            .record
            .variant_start()
            .ok_or(CustomError::VcfPosition {
                record_num: self.record_num,
            })?
            .get() as u64;
        if let Some(region) = &self.region
            && !region.contains(chrom, pos)
        {
            return Ok(None);
        }

        let ids = self.record.ids().as_ref();
        let id = if ids.is_empty() {
            MISSING_ID.to_string()
        } else {
            ids.iter().join(";")
        };

        let mut calls = Array2::<u8>::zeros((self.sample_indices.len(), CHANNELS_WITH_PHASE));
        let all_samples = self.record.samples();
        for (row, &sample_idx) in self.sample_indices.iter().enumerate() {
            let genotype = all_samples
                .get_index(sample_idx)
                .and_then(|sample| match sample.get(key::GENOTYPE) {
                    Some(Some(Value::Genotype(genotype))) => Some(genotype.clone()),
                    _ => None,
                });
            // A call without a usable GT ("." or no field) counts as "./."
            let Some(genotype) = genotype else {
                calls[[row, STRAND_1]] = MISSING_ALLELE;
                calls[[row, STRAND_2]] = MISSING_ALLELE;
                continue;
            };
            let alleles = genotype.as_ref();
            if alleles.len() != DIPLOID {
                return Err(CustomError::Ploidy {
                    id: id.clone(),
                    chrom: chrom.to_string(),
                    pos,
                    sample: self.samples[row].clone(),
                    ploidy: alleles.len(),
                });
            }

            for (strand, allele) in [STRAND_1, STRAND_2].into_iter().zip(alleles) {
                calls[[row, strand]] = match allele.position() {
                    // Indices that do not fit are still multiallelic, which is all that matters
                    Some(code) => u8::try_from(code).map_or(MAX_ALLELE_CODE, |code| {
                        code.min(MAX_ALLELE_CODE)
                    }),
                    None => MISSING_ALLELE,
                };
            }
            // The first allele carries no separator of its own
            let phased = alleles[1..]
                .iter()
                .all(|allele| allele.phasing() == Phasing::Phased);
            calls[[row, PHASE]] = u8::from(phased);
        }

        let freq = alt_allele_frequency(calls.view());
        Ok(Some(Site {
            variant: VariantRecord::new(id, chrom, pos, freq),
            calls,
        }))
    }
}

impl RecordSource for VcfReader {
    fn samples(&self) -> &[String] {
        &self.samples
    }
}

impl Iterator for VcfReader {
    type Item = Result<Site>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            match self.reader.read_record_buf(&self.header, &mut self.record) {
                Ok(0) => {
                    self.exhausted = true;
                    return None;
                }
                Ok(_) => self.record_num += 1,
                Err(e) => {
                    // Poison iterator to prevent further reads
                    self.exhausted = true;
                    return Some(Err(CustomError::VcfRecord {
                        source: e,
                        path: self.path.clone(),
                        record_num: self.record_num + 1,
                    }));
                }
            }

            match self.decode_record() {
                Ok(Some(site)) => return Some(Ok(site)),
                Ok(None) => continue,
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
