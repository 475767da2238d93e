use log::info;
use ndarray::{Array2, Array3, Axis, s};

use super::tensor::Call;
use super::{GenotypeMatrix, Stage, StageOutcome, Tensor};
use crate::error::{CustomError, Result};
use crate::model::{MISSING_ALLELE, PHASE, STRAND_1, STRAND_2};

/// Above this ALT frequency, the ALT allele is the major allele.
const MAJOR_ALLELE_FREQUENCY: f64 = 0.5;

impl GenotypeMatrix {
    /// Check that every genotype is composed of only two alleles, then narrow
    /// the tensor to boolean allele presence.
    ///
    /// A missing allele fails the check too. With `discard_also`, variants
    /// with a third or missing allele in any sample are dropped for all
    /// samples instead of failing.
    pub fn check_biallelic(&mut self, discard_also: bool) -> Result<StageOutcome> {
        self.run_stage(Stage::Biallelic, |genotypes| {
            genotypes.enforce_biallelic(discard_also)
        })
    }

    /// Check that every heterozygous genotype is phased, then remove the
    /// phase channel from the tensor.
    pub fn check_phase(&mut self) -> Result<StageOutcome> {
        self.run_stage(Stage::Phase, GenotypeMatrix::enforce_phase)
    }

    /// Convert ALT allele presence into minor allele presence.
    ///
    /// Variants whose ALT frequency is above 0.5 have both strands flipped
    /// and their frequency replaced by `1 - freq`. Afterwards every `freq`
    /// is a minor allele frequency.
    pub fn recode_to_minor_allele(&mut self) -> Result<StageOutcome> {
        self.run_stage(Stage::MinorAllele, GenotypeMatrix::flip_major_alleles)
    }

    fn enforce_biallelic(&mut self, discard_also: bool) -> Result<()> {
        let Tensor::Counts(data) = &self.tensor else {
            return Ok(());
        };
        // A code above 1 on either strand means a second ALT allele or a missing one
        let multiallelic: Array2<bool> =
            data.map_axis(Axis(2), |call| call[STRAND_1] > 1 || call[STRAND_2] > 1);

        if let Some((sample_idx, variant_idx)) = first_flagged(&multiallelic) {
            if !discard_also {
                let variant = &self.variants[variant_idx];
                let (id, chrom, pos) = (variant.id.clone(), variant.chrom.clone(), variant.pos);
                let sample = self.samples[sample_idx].clone();
                let call = data.slice(s![sample_idx, variant_idx, STRAND_1..=STRAND_2]);
                return Err(if call.iter().any(|&code| code == MISSING_ALLELE) {
                    CustomError::MissingAllele { id, chrom, pos, sample }
                } else {
                    CustomError::MultiallelicSite { id, chrom, pos, sample }
                });
            }

            let keep: Vec<usize> = multiallelic
                .axis_iter(Axis(1))
                .enumerate()
                .filter(|(_, flags)| !flags.iter().any(|&flag| flag))
                .map(|(variant_idx, _)| variant_idx)
                .collect();
            info!(
                "discarding {} multiallelic variant(s)",
                self.variants.len() - keep.len()
            );
            self.tensor.select_variants(&keep);
            self.variants = keep.iter().map(|&idx| self.variants[idx].clone()).collect();
        }

        self.tensor.narrow();
        Ok(())
    }

    fn enforce_phase(&mut self) -> Result<()> {
        let unphased = match &self.tensor {
            Tensor::Counts(data) => unphased_heterozygotes(data),
            Tensor::Alleles(data) => unphased_heterozygotes(data),
        };
        if let Some((sample_idx, variant_idx)) = first_flagged(&unphased) {
            let variant = &self.variants[variant_idx];
            return Err(CustomError::UnphasedGenotype {
                id: variant.id.clone(),
                chrom: variant.chrom.clone(),
                pos: variant.pos,
                sample: self.samples[sample_idx].clone(),
            });
        }
        self.tensor.drop_phase();
        Ok(())
    }

    fn flip_major_alleles(&mut self) -> Result<()> {
        let Tensor::Alleles(data) = &mut self.tensor else {
            return Err(CustomError::StageOrder {
                stage: Stage::MinorAllele,
                requires: Stage::Biallelic,
            });
        };
        for (variant_idx, variant) in self.variants.iter_mut().enumerate() {
            if variant.freq > MAJOR_ALLELE_FREQUENCY {
                data.slice_mut(s![.., variant_idx, STRAND_1..=STRAND_2])
                    .mapv_inplace(|present| !present);
                variant.freq = 1.0 - variant.freq;
            }
        }
        self.minor_allele_frequency = true;
        Ok(())
    }
}

/// (sample, variant) grid of heterozygous calls whose phased flag is unset.
/// Works on integer codes too, where heterozygous means the strands differ.
fn unphased_heterozygotes<T: Call>(data: &Array3<T>) -> Array2<bool> {
    if data.len_of(Axis(2)) <= PHASE {
        return Array2::from_elem((data.len_of(Axis(0)), data.len_of(Axis(1))), false);
    }
    data.map_axis(Axis(2), |call| {
        call[STRAND_1] != call[STRAND_2] && !call[PHASE].is_set()
    })
}

/// First flagged (sample, variant) pair in sample-major scan order.
fn first_flagged(flags: &Array2<bool>) -> Option<(usize, usize)> {
    flags
        .indexed_iter()
        .find(|&(_, &flag)| flag)
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Site, VariantRecord};
    use crate::reader::MemorySource;
    use ndarray::{Array2, array};

    const SAMPLES: [&str; 5] = ["HG00096", "HG00097", "HG00099", "HG00100", "HG00101"];

    // samples x variants x (strands + phase)
    fn expected_counts() -> Array3<u8> {
        let mut expected = Array3::<u8>::zeros((5, 4, 3));
        expected.slice_mut(s![..4, 1, 1]).fill(1);
        expected.slice_mut(s![2..4, 1, 0]).fill(1);
        expected.slice_mut(s![.., .., 2]).fill(1);
        expected
    }

    fn simple_matrix() -> GenotypeMatrix {
        let counts = expected_counts();
        let positions = [10114u64, 10116, 10117, 10122];
        let freqs = [0.0, 0.6, 0.0, 0.0];
        let sites = (0..4)
            .map(|v| Site {
                variant: VariantRecord::new(
                    format!("1:{}", positions[v]),
                    "1",
                    positions[v],
                    freqs[v],
                ),
                calls: counts.index_axis(Axis(1), v).to_owned(),
            })
            .collect();
        let samples = SAMPLES.iter().map(|s| s.to_string()).collect();
        let mut source = MemorySource::new(samples, sites, None, None).unwrap();
        let mut genotypes = GenotypeMatrix::new("memory");
        genotypes.read_source(&mut source).unwrap();
        genotypes
    }

    fn set_count(genotypes: &mut GenotypeMatrix, idx: [usize; 3], value: u8) {
        genotypes.counts_mut().expect("integer tensor")[idx] = value;
    }

    #[test]
    fn narrows_biallelic_counts_to_booleans() {
        let mut genotypes = simple_matrix();
        assert_eq!(genotypes.check_biallelic(false).unwrap(), StageOutcome::Applied);
        let alleles = genotypes.tensor().alleles().expect("boolean tensor");
        assert_eq!(alleles, &expected_counts().mapv(|c| c != 0));
    }

    #[test]
    fn reports_first_multiallelic_call_without_changes() {
        let mut genotypes = simple_matrix();
        set_count(&mut genotypes, [1, 1, 1], 2);
        set_count(&mut genotypes, [3, 2, 0], 2);
        let before = genotypes.tensor().clone();

        let err = genotypes.check_biallelic(false).unwrap_err();
        match err {
            CustomError::MultiallelicSite { id, chrom, pos, sample } => {
                assert_eq!(id, "1:10116");
                assert_eq!(chrom, "1");
                assert_eq!(pos, 10116);
                assert_eq!(sample, "HG00097");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(genotypes.tensor(), &before);
        assert!(!genotypes.completed().contains(Stage::Biallelic));
    }

    #[test]
    fn discards_multiallelic_variants_for_all_samples() {
        let mut genotypes = simple_matrix();
        set_count(&mut genotypes, [1, 1, 1], 2);

        assert_eq!(genotypes.check_biallelic(true).unwrap(), StageOutcome::Applied);
        assert_eq!(genotypes.tensor().dim(), (5, 3, 3));
        assert_eq!(genotypes.n_variants(), 3);
        assert!(genotypes.variants().iter().all(|v| v.pos != 10116));

        let expected = expected_counts()
            .select(Axis(1), &[0, 2, 3])
            .mapv(|c| c != 0);
        assert_eq!(genotypes.tensor().alleles().unwrap(), &expected);
    }

    #[test]
    fn missing_allele_fails_or_is_discarded() {
        let mut genotypes = simple_matrix();
        set_count(&mut genotypes, [0, 3, 0], MISSING_ALLELE);
        set_count(&mut genotypes, [0, 3, 1], MISSING_ALLELE);

        match genotypes.check_biallelic(false).unwrap_err() {
            CustomError::MissingAllele { id, sample, .. } => {
                assert_eq!(id, "1:10122");
                assert_eq!(sample, "HG00096");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(genotypes.check_biallelic(true).unwrap(), StageOutcome::Applied);
        assert_eq!(genotypes.n_variants(), 3);
        assert!(genotypes.variants().iter().all(|v| v.pos != 10122));
    }

    #[test]
    fn repeated_biallelic_check_is_a_no_op() {
        let mut genotypes = simple_matrix();
        let _ = genotypes.check_biallelic(false).unwrap();
        let before = genotypes.tensor().clone();
        assert_eq!(
            genotypes.check_biallelic(false).unwrap(),
            StageOutcome::AlreadyApplied
        );
        assert_eq!(genotypes.tensor(), &before);
    }

    #[test]
    fn reports_first_unphased_heterozygote() {
        let mut genotypes = simple_matrix();
        let _ = genotypes.check_biallelic(false).unwrap();
        genotypes.alleles_mut().unwrap()[[1, 1, 2]] = false;
        let before = genotypes.tensor().clone();

        let err = genotypes.check_phase().unwrap_err();
        match err {
            CustomError::UnphasedGenotype { id, sample, .. } => {
                assert_eq!(id, "1:10116");
                assert_eq!(sample, "HG00097");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(genotypes.tensor(), &before);
    }

    #[test]
    fn unphased_homozygotes_are_accepted() {
        let mut genotypes = simple_matrix();
        // HG00099 is 1|1 at the second variant
        set_count(&mut genotypes, [2, 1, 2], 0);
        assert_eq!(genotypes.check_phase().unwrap(), StageOutcome::Applied);
        assert_eq!(genotypes.tensor().n_channels(), 2);
    }

    #[test]
    fn phase_check_works_before_narrowing() {
        let mut genotypes = simple_matrix();
        // heterozygous 1|2 with the phase flag cleared
        set_count(&mut genotypes, [4, 3, 0], 1);
        set_count(&mut genotypes, [4, 3, 1], 2);
        set_count(&mut genotypes, [4, 3, 2], 0);

        let err = genotypes.check_phase().unwrap_err();
        match err {
            CustomError::UnphasedGenotype { id, sample, .. } => {
                assert_eq!(id, "1:10122");
                assert_eq!(sample, "HG00101");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(genotypes.tensor().counts().is_some());
    }

    #[test]
    fn removes_phase_channel_once() {
        let mut genotypes = simple_matrix();
        let _ = genotypes.check_biallelic(false).unwrap();
        assert_eq!(genotypes.check_phase().unwrap(), StageOutcome::Applied);
        let expected = expected_counts()
            .slice(s![.., .., ..2])
            .mapv(|c| c != 0);
        assert_eq!(genotypes.tensor().alleles().unwrap(), &expected);

        assert_eq!(genotypes.check_phase().unwrap(), StageOutcome::AlreadyApplied);
        assert_eq!(genotypes.tensor().alleles().unwrap(), &expected);
    }

    #[test]
    fn recodes_major_alt_alleles() {
        let mut genotypes = simple_matrix();
        let _ = genotypes.check_biallelic(false).unwrap();
        let _ = genotypes.check_phase().unwrap();
        assert!(!genotypes.is_minor_allele_frequency());

        assert_eq!(
            genotypes.recode_to_minor_allele().unwrap(),
            StageOutcome::Applied
        );
        let mut expected = expected_counts().slice(s![.., .., ..2]).mapv(|c| c != 0);
        expected
            .slice_mut(s![.., 1, ..])
            .mapv_inplace(|present| !present);
        assert_eq!(genotypes.tensor().alleles().unwrap(), &expected);
        assert!((genotypes.variants()[1].freq - 0.4).abs() < 1e-12);
        assert_eq!(genotypes.variants()[0].freq, 0.0);
        assert!(genotypes.is_minor_allele_frequency());

        assert_eq!(
            genotypes.recode_to_minor_allele().unwrap(),
            StageOutcome::AlreadyApplied
        );
        assert_eq!(genotypes.tensor().alleles().unwrap(), &expected);
        assert!((genotypes.variants()[1].freq - 0.4).abs() < 1e-12);
    }

    #[test]
    fn recoding_requires_boolean_tensor() {
        let mut genotypes = simple_matrix();
        let err = genotypes.recode_to_minor_allele().unwrap_err();
        match err {
            CustomError::StageOrder { stage, requires } => {
                assert_eq!(stage, Stage::MinorAllele);
                assert_eq!(requires, Stage::Biallelic);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!genotypes.is_minor_allele_frequency());
    }

    #[test]
    fn first_flagged_scans_samples_first() {
        let flags: Array2<bool> = array![[false, false, true], [true, false, false]];
        assert_eq!(first_flagged(&flags), Some((0, 2)));
        assert_eq!(first_flagged(&Array2::from_elem((2, 2), false)), None);
    }
}
