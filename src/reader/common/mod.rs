pub mod plink2;
pub mod samples;

use ndarray::{ArrayView2, s};

use crate::model::{MISSING_ALLELE, STRAND_1, STRAND_2};

pub(crate) use plink2::{read_psam, read_pvar};
pub use samples::select_samples;

/// Fraction of called strands carrying a non-reference allele.
/// Calls with a second alternate allele count towards the total like any other ALT;
/// missing strands are left out.
pub fn alt_allele_frequency(calls: ArrayView2<u8>) -> f64 {
    let strands = calls.slice(s![.., STRAND_1..=STRAND_2]);
    let (n_called, n_alt) = strands
        .iter()
        .filter(|&&code| code != MISSING_ALLELE)
        .fold((0usize, 0usize), |(called, alt), &code| {
            (called + 1, alt + usize::from(code > 0))
        });
    if n_called == 0 {
        return f64::NAN;
    }
    n_alt as f64 / n_called as f64
}
