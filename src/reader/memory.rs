use std::vec::IntoIter;

use ndarray::Axis;

use crate::error::{CustomError, Result};
use crate::model::Site;
use crate::reader::RecordSource;
use crate::reader::common::select_samples;
use crate::region::Region;

/// An in-process [`RecordSource`] over sites that are already in memory.
///
/// Region and sample filters behave as they do for file-backed readers.
/// Frequencies are passed through as given rather than recomputed for the
/// selected samples.
pub struct MemorySource {
    n_source_samples: usize,
    samples: Vec<String>,
    sample_indices: Vec<usize>,
    sites: IntoIter<Site>,
    region: Option<Region>,
}

impl MemorySource {
    pub fn new(
        samples: Vec<String>,
        sites: Vec<Site>,
        region: Option<&Region>,
        samples_to_keep: Option<&[String]>,
    ) -> Result<Self> {
        let n_source_samples = samples.len();
        let (samples, sample_indices) = select_samples(samples, samples_to_keep)?;
        Ok(Self {
            n_source_samples,
            samples,
            sample_indices,
            sites: sites.into_iter(),
            region: region.cloned(),
        })
    }
}

impl RecordSource for MemorySource {
    fn samples(&self) -> &[String] {
        &self.samples
    }
}

impl Iterator for MemorySource {
    type Item = Result<Site>;

    fn next(&mut self) -> Option<Self::Item> {
        let region = self.region.as_ref();
        let site = self.sites.find(|site| {
            region.is_none_or(|region| region.contains(&site.variant.chrom, site.variant.pos))
        })?;
        if site.calls.nrows() != self.n_source_samples {
            return Some(Err(CustomError::SiteSamples {
                id: site.variant.id,
                n_calls: site.calls.nrows(),
                n_samples: self.n_source_samples,
            }));
        }
        let calls = site.calls.select(Axis(0), &self.sample_indices);
        Some(Ok(Site {
            variant: site.variant,
            calls,
        }))
    }
}
