use std::collections::{HashMap, HashSet};

use crate::error::{CustomError, Result};

/// Returns the subset of samples to keep, along with their indices in the source.
/// Kept samples follow the order of `filter`, not the order of the source, so
/// the indices are what later reads use to pull the relevant genotypes.
pub fn select_samples(
    samples: Vec<String>,
    filter: Option<&[String]>,
) -> Result<(Vec<String>, Vec<usize>)> {
    let Some(keep) = filter else {
        let indices = (0..samples.len()).collect();
        return Ok((samples, indices));
    };

    let lookup: HashMap<&str, usize> = samples
        .iter()
        .enumerate()
        .map(|(idx, sample_id)| (sample_id.as_str(), idx))
        .collect();

    let mut seen = HashSet::with_capacity(keep.len());
    let mut indices = Vec::with_capacity(keep.len());
    for sample_id in keep {
        if !seen.insert(sample_id.as_str()) {
            return Err(CustomError::SampleDuplicate {
                sample: sample_id.clone(),
            });
        }
        let idx = lookup
            .get(sample_id.as_str())
            .copied()
            .ok_or_else(|| CustomError::SampleUnknown {
                sample: sample_id.clone(),
            })?;
        indices.push(idx);
    }
    Ok((keep.to_vec(), indices))
}
