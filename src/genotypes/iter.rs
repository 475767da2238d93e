use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::model::GenotypeRecord;
use crate::reader::{RecordSource, open_records};
use crate::region::Region;

/// Single-pass stream of [`GenotypeRecord`]s in source order.
///
/// Nothing is retained between records. To start over, open a new stream.
pub struct GenotypeRecords {
    source: Box<dyn RecordSource>,
    samples: Arc<[String]>,
}

impl GenotypeRecords {
    pub fn open(
        path: &impl AsRef<Path>,
        region: Option<&Region>,
        samples: Option<&[String]>,
    ) -> Result<Self> {
        Ok(Self::from_source(open_records(path, region, samples)?))
    }

    pub fn from_source(source: Box<dyn RecordSource>) -> Self {
        let samples = Arc::from(source.samples());
        Self { source, samples }
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }
}

impl Iterator for GenotypeRecords {
    type Item = Result<GenotypeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let site = match self.source.next()? {
            Ok(site) => site,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(GenotypeRecord {
            data: site.calls,
            samples: Arc::clone(&self.samples),
            variant: site.variant,
        }))
    }
}
