mod checks;
mod iter;
mod stage;
mod tensor;

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use ndarray::{Array3, ArrayView2, ArrayViewMut3, Axis};

use crate::error::{CustomError, Result};
use crate::model::{CHANNELS_WITH_PHASE, VariantRecord};
use crate::reader::{AlleleMatrixReader, RecordSource, SourceFormat, open_records};
use crate::region::Region;

pub use iter::GenotypeRecords;
pub use stage::{Stage, StageOutcome, Stages};
pub use tensor::Tensor;

/// Genotypes loaded from a variant file, together with their sample and
/// variant meta information.
///
/// The tensor is laid out as (samples, variants, allele channels). Channels
/// are strand one, strand two and, until [`GenotypeMatrix::check_phase`] has
/// run, a phased flag. `samples` and `variants` always match the first two
/// axes of the tensor.
#[derive(Debug)]
pub struct GenotypeMatrix {
    path: PathBuf,
    tensor: Tensor,
    samples: Vec<String>,
    variants: Vec<VariantRecord>,
    minor_allele_frequency: bool,
    completed: Stages,
    loaded: bool,
}

impl GenotypeMatrix {
    /// An empty matrix bound to the file at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tensor: Tensor::default(),
            samples: Vec::new(),
            variants: Vec::new(),
            minor_allele_frequency: false,
            completed: Stages::default(),
            loaded: false,
        }
    }

    /// Read the file, then check that every genotype is biallelic and phased.
    /// An empty result is logged and returned as an empty matrix.
    pub fn load(
        path: impl Into<PathBuf>,
        region: Option<&Region>,
        samples: Option<&[String]>,
    ) -> Result<Self> {
        let mut genotypes = Self::new(path);
        match genotypes.read(region, samples) {
            Ok(()) => {}
            Err(e) if e.is_warning() => return Ok(genotypes),
            Err(e) => return Err(e),
        }
        let _ = genotypes.check_biallelic(false)?;
        let _ = genotypes.check_phase()?;
        Ok(genotypes)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }

    /// Mutable access to the integer codes, before the biallelic check.
    /// The shape cannot be changed through the view. Meant for building
    /// fixtures; a checked matrix is otherwise read-only.
    #[doc(hidden)]
    pub fn counts_mut(&mut self) -> Option<ArrayViewMut3<'_, u8>> {
        match &mut self.tensor {
            Tensor::Counts(data) => Some(data.view_mut()),
            Tensor::Alleles(_) => None,
        }
    }

    /// Mutable access to allele presence, after the biallelic check.
    #[doc(hidden)]
    pub fn alleles_mut(&mut self) -> Option<ArrayViewMut3<'_, bool>> {
        match &mut self.tensor {
            Tensor::Counts(_) => None,
            Tensor::Alleles(data) => Some(data.view_mut()),
        }
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn variants(&self) -> &[VariantRecord] {
        &self.variants
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn n_variants(&self) -> usize {
        self.variants.len()
    }

    /// Whether `variants[].freq` holds minor rather than alternate allele frequencies.
    pub fn is_minor_allele_frequency(&self) -> bool {
        self.minor_allele_frequency
    }

    pub fn completed(&self) -> Stages {
        self.completed
    }

    /// Read genotypes from the bound file into memory.
    ///
    /// `region` restricts the variants, `samples` restricts the samples and
    /// fixes their order. Reading again replaces everything loaded before.
    pub fn read(&mut self, region: Option<&Region>, samples: Option<&[String]>) -> Result<()> {
        match SourceFormat::detect(&self.path)? {
            SourceFormat::AlleleMatrix => {
                self.warn_if_loaded();
                let reader = AlleleMatrixReader::open(&self.path)?;
                let (samples, variants, tensor) = reader.load(region, samples)?;
                self.replace(samples, variants, tensor)
            }
            SourceFormat::Vcf => {
                let mut source = open_records(&self.path, region, samples)?;
                self.read_source(source.as_mut())
            }
        }
    }

    /// Read every record from `source` into memory.
    pub fn read_source(&mut self, source: &mut dyn RecordSource) -> Result<()> {
        self.warn_if_loaded();
        let samples = source.samples().to_vec();

        let mut variants = Vec::new();
        let mut columns = Vec::new();
        for site in source {
            let site = site?;
            if site.calls.nrows() != samples.len() {
                return Err(CustomError::SiteSamples {
                    id: site.variant.id,
                    n_calls: site.calls.nrows(),
                    n_samples: samples.len(),
                });
            }
            variants.push(site.variant);
            columns.push(site.calls);
        }
        debug!("read {} variant(s) from {}", variants.len(), self.path.display());

        let tensor = if columns.is_empty() {
            Array3::zeros((samples.len(), 0, CHANNELS_WITH_PHASE))
        } else {
            let views: Vec<ArrayView2<u8>> = columns.iter().map(|calls| calls.view()).collect();
            // Each site is (samples, channels); stacking them on a new middle axis
            // puts samples first and variants second.
            ndarray::stack(Axis(1), &views)?
        };
        self.replace(samples, variants, tensor)
    }

    fn warn_if_loaded(&self) {
        if self.loaded {
            warn!(
                "genotypes were already read from {}; reading again replaces them",
                self.path.display()
            );
        }
    }

    fn replace(
        &mut self,
        samples: Vec<String>,
        variants: Vec<VariantRecord>,
        tensor: Array3<u8>,
    ) -> Result<()> {
        self.samples = samples;
        self.variants = variants;
        self.tensor = Tensor::Counts(tensor);
        self.minor_allele_frequency = false;
        self.completed = Stages::default();
        self.loaded = true;

        if self.tensor.is_empty() {
            let err = CustomError::EmptyResult {
                path: self.path.clone(),
            };
            warn!("{err}");
            return Err(err);
        }
        info!(
            "loaded {} sample(s) x {} variant(s) from {}",
            self.n_samples(),
            self.n_variants(),
            self.path.display()
        );
        Ok(())
    }

    /// Stream genotypes from the bound file one variant at a time without
    /// storing them. Each record keeps the phase channel and is not validated.
    pub fn iterate(
        &self,
        region: Option<&Region>,
        samples: Option<&[String]>,
    ) -> Result<GenotypeRecords> {
        GenotypeRecords::open(&self.path, region, samples)
    }

    /// Run `apply` unless `stage` already completed, in which case log a
    /// warning and leave the matrix untouched.
    fn run_stage<F>(&mut self, stage: Stage, apply: F) -> Result<StageOutcome>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if self.completed.contains(stage) {
            warn!("{}", stage.already_applied_message());
            return Ok(StageOutcome::AlreadyApplied);
        }
        apply(self)?;
        self.completed.insert(stage);
        Ok(StageOutcome::Applied)
    }
}
