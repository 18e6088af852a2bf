use serde::{Deserialize, Serialize};

use super::matrix::{Matrix, RealMatrix};
use crate::error::{Error, Result};

pub const DEFAULT_FLOOR_DB: f32 = -80.0;

/// What a magnitude is measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceMode {
    /// Largest magnitude anywhere in the matrix.
    #[default]
    GlobalMax,
    /// Largest magnitude in the same frame (column).
    FrameMax,
    /// A caller-supplied amplitude.
    Fixed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecibelConverter {
    reference: ReferenceMode,
    reference_value: f32,
    floor: f32,
}

impl DecibelConverter {
    /// Converter for the max-based modes. `floor` must be finite and negative.
    ///
    /// With [`ReferenceMode::Fixed`] the reference amplitude is 1.0; use
    /// [`fixed`](Self::fixed) to choose another.
    pub fn new(reference: ReferenceMode, floor: f32) -> Result<Self> {
        check_floor(floor)?;
        Ok(Self {
            reference,
            reference_value: 1.0,
            floor,
        })
    }

    pub fn fixed(reference_value: f32, floor: f32) -> Result<Self> {
        check_floor(floor)?;
        if !(reference_value.is_finite() && reference_value > 0.0) {
            return Err(Error::NumericDomain(format!(
                "fixed reference must be a positive amplitude (got {})",
                reference_value
            )));
        }
        Ok(Self {
            reference: ReferenceMode::Fixed,
            reference_value,
            floor,
        })
    }

    pub fn reference(&self) -> ReferenceMode {
        self.reference
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Upper end of the dB range this converter can produce for `db`.
    pub fn ceiling(&self, db: &RealMatrix) -> f32 {
        match self.reference {
            ReferenceMode::GlobalMax | ReferenceMode::FrameMax => 0.0,
            ReferenceMode::Fixed => db.max().max(self.floor),
        }
    }

    /// `20 * log10(m / ref)`, clamped to `[floor, 0]` for the max-based
    /// modes and to `[floor, inf)` for a fixed reference.
    pub fn to_db(&self, magnitudes: &RealMatrix) -> Result<RealMatrix> {
        if let Some(bad) = magnitudes.as_slice().iter().find(|m| !m.is_finite() || **m < 0.0) {
            return Err(Error::NumericDomain(format!("magnitude {} is not a finite amplitude", bad)));
        }

        let floor = self.floor;
        let db = match self.reference {
            ReferenceMode::GlobalMax => {
                let reference = magnitudes.max();
                if !(reference > 0.0) {
                    log::debug!("All-zero spectrum; every cell maps to the {} dB floor", floor);
                }
                magnitudes.map(|&m| amplitude_to_db(m, reference, floor).min(0.0))
            }
            ReferenceMode::FrameMax => {
                let (rows, cols) = magnitudes.shape();
                let mut column_max = vec![0.0f32; cols];
                for row in 0..rows {
                    for (max, &m) in column_max.iter_mut().zip(magnitudes.row(row)) {
                        *max = max.max(m);
                    }
                }
                let data = magnitudes
                    .as_slice()
                    .iter()
                    .enumerate()
                    .map(|(i, &m)| amplitude_to_db(m, column_max[i % cols], floor).min(0.0))
                    .collect();
                Matrix::from_vec(rows, cols, data)?
            }
            ReferenceMode::Fixed => {
                let reference = self.reference_value;
                magnitudes.map(|&m| amplitude_to_db(m, reference, floor))
            }
        };
        Ok(db)
    }
}

fn check_floor(floor: f32) -> Result<()> {
    if !(floor.is_finite() && floor < 0.0) {
        return Err(Error::NumericDomain(format!(
            "dB floor must be finite and negative (got {})",
            floor
        )));
    }
    Ok(())
}

/// Zero magnitudes and zero references go straight to the floor.
fn amplitude_to_db(magnitude: f32, reference: f32, floor: f32) -> f32 {
    if magnitude <= 0.0 || reference <= 0.0 {
        return floor;
    }
    let db = (20.0 * (magnitude as f64 / reference as f64).log10()) as f32;
    db.max(floor)
}
