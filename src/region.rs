use std::fmt;
use std::str::FromStr;

use noodles_core::Position;
use noodles_core::region::Interval;

use crate::error::{CustomError, Result};

/// A genomic interval such as `chr1`, `chr1:1234` or `chr1:1234-34566`.
/// Positions are 1-based and inclusive at both ends; `chr1:1234` and
/// `chr1:1234-` both run to the end of the contig, and thousands separators
/// (`1:10,000-20,000`) are accepted.
///
/// Text after the last `:` is always read as the interval, so a contig whose
/// name contains `:` must be wrapped in braces: `{HLA-A*01:01}` or
/// `{HLA-A*01:01}:100-200`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region(noodles_core::Region);

impl Region {
    pub fn new(chrom: impl Into<String>, interval: impl Into<Interval>) -> Self {
        Self(noodles_core::Region::new(chrom.into(), interval))
    }

    pub fn chrom(&self) -> &[u8] {
        self.0.name().as_ref()
    }

    pub fn interval(&self) -> Interval {
        self.0.interval()
    }

    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        if self.chrom() != chrom.as_bytes() {
            return false;
        }
        usize::try_from(pos)
            .ok()
            .and_then(Position::new)
            .is_some_and(|position| self.interval().contains(position))
    }
}

impl FromStr for Region {
    type Err = CustomError;

    fn from_str(s: &str) -> Result<Self> {
        let err = || CustomError::RegionParse {
            region: s.to_string(),
        };
        let cleaned = s.trim().replace(',', "");
        // An open end ("chr1:500-") means the same as a bare start
        let cleaned = cleaned.strip_suffix('-').unwrap_or(&cleaned);

        let region = match cleaned
            .strip_prefix('{')
            .and_then(|rest| rest.split_once('}'))
        {
            Some((name, "")) => noodles_core::Region::new(name, ..),
            Some((name, suffix)) => {
                let interval: Interval = suffix
                    .strip_prefix(':')
                    .ok_or_else(err)?
                    .parse()
                    .map_err(|_| err())?;
                noodles_core::Region::new(name, interval)
            }
            None => cleaned.parse().map_err(|_| err())?,
        };

        if region.name().is_empty() {
            return Err(err());
        }
        let interval = region.interval();
        if let (Some(start), Some(end)) = (interval.start(), interval.end())
            && end < start
        {
            return Err(err());
        }
        Ok(Self(region))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.0.name();
        if name.contains(&b':') {
            write!(f, "{{{name}}}")?;
        } else {
            write!(f, "{name}")?;
        }
        let interval = self.interval();
        if interval.start().is_some() || interval.end().is_some() {
            write!(f, ":{interval}")?;
        }
        Ok(())
    }
}
