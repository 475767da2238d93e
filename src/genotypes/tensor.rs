use ndarray::{Array3, Axis, s};

use crate::model::{CHANNELS_WITH_PHASE, CHANNELS_WITHOUT_PHASE};

/// Genotypes as a (samples, variants, allele channels) array.
///
/// Starts as integer allele codes so that multiallelic calls can be detected,
/// and becomes boolean allele presence once they have been ruled out.
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    Counts(Array3<u8>),
    Alleles(Array3<bool>),
}

impl Default for Tensor {
    fn default() -> Self {
        Tensor::Counts(Array3::zeros((0, 0, CHANNELS_WITH_PHASE)))
    }
}

impl Tensor {
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            Tensor::Counts(data) => data.dim(),
            Tensor::Alleles(data) => data.dim(),
        }
    }

    pub fn n_samples(&self) -> usize {
        self.dim().0
    }

    pub fn n_variants(&self) -> usize {
        self.dim().1
    }

    pub fn n_channels(&self) -> usize {
        self.dim().2
    }

    pub fn has_phase(&self) -> bool {
        self.n_channels() == CHANNELS_WITH_PHASE
    }

    pub fn is_empty(&self) -> bool {
        self.n_samples() == 0 || self.n_variants() == 0
    }

    pub fn counts(&self) -> Option<&Array3<u8>> {
        match self {
            Tensor::Counts(data) => Some(data),
            Tensor::Alleles(_) => None,
        }
    }

    pub fn alleles(&self) -> Option<&Array3<bool>> {
        match self {
            Tensor::Counts(_) => None,
            Tensor::Alleles(data) => Some(data),
        }
    }

    /// The genotypes as integers regardless of the current representation.
    pub fn to_counts(&self) -> Array3<u8> {
        match self {
            Tensor::Counts(data) => data.clone(),
            Tensor::Alleles(data) => data.mapv(u8::from),
        }
    }

    pub(super) fn select_variants(&mut self, keep: &[usize]) {
        match self {
            Tensor::Counts(data) => *data = data.select(Axis(1), keep),
            Tensor::Alleles(data) => *data = data.select(Axis(1), keep),
        }
    }

    pub(super) fn drop_phase(&mut self) {
        match self {
            Tensor::Counts(data) => *data = without_phase(data),
            Tensor::Alleles(data) => *data = without_phase(data),
        }
    }

    /// Narrow integer codes to allele presence. Callers must have ruled out
    /// codes above one.
    pub(super) fn narrow(&mut self) {
        if let Tensor::Counts(data) = self {
            *self = Tensor::Alleles(data.mapv(|code| code != 0));
        }
    }
}

fn without_phase<T: Clone>(data: &Array3<T>) -> Array3<T> {
    data.slice(s![.., .., ..CHANNELS_WITHOUT_PHASE]).to_owned()
}

/// A single allele-channel value, integer or boolean.
pub(super) trait Call: Copy + PartialEq {
    fn is_set(self) -> bool;
}

impl Call for u8 {
    fn is_set(self) -> bool {
        self != 0
    }
}

impl Call for bool {
    fn is_set(self) -> bool {
        self
    }
}
