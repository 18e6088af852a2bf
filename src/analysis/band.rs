use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::matrix::RealMatrix;
use crate::error::{Error, Result};

/// Half-open range of frequency-bin indices `[low, high)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BandRange {
    pub low: usize,
    pub high: usize,
}

impl BandRange {
    pub fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }

    pub fn height(&self) -> usize {
        self.high.saturating_sub(self.low)
    }

    /// Check against a spectrum with `bins` rows.
    pub fn validate(&self, bins: usize) -> Result<()> {
        if self.low >= self.high || self.high > bins {
            return Err(Error::InvalidRange {
                low: self.low,
                high: self.high,
                bins,
            });
        }
        Ok(())
    }
}

impl fmt::Display for BandRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}

/// Parses `LOW:HIGH`.
impl FromStr for BandRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (low, high) = s
            .split_once(':')
            .ok_or_else(|| format!("expected LOW:HIGH, got {:?}", s))?;
        let low = low.trim().parse().map_err(|e| format!("bad low bin {:?}: {}", low, e))?;
        let high = high.trim().parse().map_err(|e| format!("bad high bin {:?}: {}", high, e))?;
        Ok(BandRange { low, high })
    }
}

/// Rows `[low, high)` of `matrix` as a new matrix.
pub fn slice(matrix: &RealMatrix, band: BandRange) -> Result<RealMatrix> {
    band.validate(matrix.rows())?;
    Ok(matrix.row_range(band.low, band.high))
}
