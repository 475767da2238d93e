//! Load genotypes from variant files into a (samples, variants, alleles)
//! tensor and check that they are biallelic and phased before downstream
//! linkage-disequilibrium and haplotype analyses use them.
//!
//! Two on-disk formats are supported: VCF (plain or BGZF-compressed) and a
//! columnar allele matrix stored as a `.npy` file with `.psam`/`.pvar`
//! companions. Both feed the same [`GenotypeMatrix`].

pub mod error;
pub mod genotypes;
pub mod model;
pub mod reader;
pub mod region;

pub use error::{CustomError, Result};
pub use genotypes::{GenotypeMatrix, GenotypeRecords, Stage, StageOutcome, Tensor};
pub use model::{GenotypeRecord, Site, VariantRecord};
pub use region::Region;
