/// The one-shot processing steps that mutate a loaded genotype matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Biallelic,
    Phase,
    MinorAllele,
}

impl Stage {
    fn bit(self) -> u8 {
        match self {
            Stage::Biallelic => 0b001,
            Stage::Phase => 0b010,
            Stage::MinorAllele => 0b100,
        }
    }

    pub(super) fn already_applied_message(self) -> &'static str {
        match self {
            Stage::Biallelic => "all genotypes are already biallelic",
            Stage::Phase => "phase information has already been removed from the genotypes",
            Stage::MinorAllele => {
                "the genotypes already count the minor allele rather than the alternate allele"
            }
        }
    }
}

/// Set of stages that have completed since the last read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stages(u8);

impl Stages {
    pub fn contains(self, stage: Stage) -> bool {
        self.0 & stage.bit() != 0
    }

    pub(super) fn insert(&mut self, stage: Stage) {
        self.0 |= stage.bit();
    }
}

/// What a stage invocation did.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Applied,
    /// The stage had already run; a warning was logged and nothing changed.
    AlreadyApplied,
}
