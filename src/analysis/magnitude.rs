use super::matrix::{ComplexMatrix, RealMatrix};

/// Element-wise `|z|`; phase is discarded.
pub fn magnitude(spectrum: &ComplexMatrix) -> RealMatrix {
    spectrum.map(|c| c.norm())
}
