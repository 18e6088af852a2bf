use rustfft::num_complex::Complex;

use crate::error::{Error, Result};

/// Dense row-major matrix. Rows are frequency bins, columns are frames.
///
/// There is no public way to mutate a matrix once built; every stage of the
/// pipeline produces a fresh one.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

pub type ComplexMatrix = Matrix<Complex<f32>>;
pub type RealMatrix = Matrix<f32>;

impl<T> Matrix<T> {
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if rows * cols != data.len() {
            return Err(Error::InvalidParameter(format!(
                "{}x{} matrix needs {} cells, got {}",
                rows,
                cols,
                rows * cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`, i.e. `(bins, frames)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Cells of one bin across all frames.
    ///
    /// # Panics
    ///
    /// If `row >= self.rows()`.
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Copy of rows `[low, high)`. Bounds are checked by the caller.
    pub(crate) fn row_range(&self, low: usize, high: usize) -> Matrix<T>
    where
        T: Clone,
    {
        Matrix {
            rows: high - low,
            cols: self.cols,
            data: self.data[low * self.cols..high * self.cols].to_vec(),
        }
    }
}

impl<T: Clone> Matrix<T> {
    /// Copy of one frame's bins.
    ///
    /// # Panics
    ///
    /// If `col >= self.cols()`.
    pub fn column(&self, col: usize) -> Vec<T> {
        (0..self.rows)
            .map(|row| self.data[row * self.cols + col].clone())
            .collect()
    }
}

impl<T: Clone + Default> Matrix<T> {
    pub(crate) fn filled(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    /// Write one frame's bins into column `col`.
    pub(crate) fn set_column(&mut self, col: usize, values: &[T]) {
        for (row, value) in values.iter().enumerate().take(self.rows) {
            self.data[row * self.cols + col] = value.clone();
        }
    }
}

impl RealMatrix {
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn min(&self) -> f32 {
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// 64-bit FNV-1a over the shape (as little-endian `u64`s) followed by
    /// the little-endian bits of every cell.
    ///
    /// Stable across builds and platforms, so fingerprints from different
    /// machines can be compared directly.
    pub fn fingerprint(&self) -> u64 {
        let mut hash = Fnv1a::new();
        hash.write(&(self.rows as u64).to_le_bytes());
        hash.write(&(self.cols as u64).to_le_bytes());
        for v in &self.data {
            hash.write(&v.to_bits().to_le_bytes());
        }
        hash.finish()
    }

    /// Row index of the largest value in column `col`.
    pub fn argmax_in_column(&self, col: usize) -> Option<usize> {
        if col >= self.cols {
            return None;
        }
        (0..self.rows)
            .map(|row| (row, self.data[row * self.cols + col]))
            .fold(None, |best: Option<(usize, f32)>, (row, v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((row, v)),
            })
            .map(|(row, _)| row)
    }
}

struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Self(Self::OFFSET)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}
