use super::colormap::ColorMap;
use crate::analysis::RealMatrix;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Gray8,
    Rgb8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// Row-major pixels, one cell per (frame, bin). Row 0 is the top of the
/// image, i.e. the highest frequency in the band.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    scale: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl ImageBuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Output size once every cell is drawn as a `scale x scale` block.
    pub fn pixel_dimensions(&self) -> (u32, u32) {
        (self.width * self.scale, self.height * self.scale)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let ch = self.format.channels();
        let start = (y as usize * self.width as usize + x as usize) * ch;
        Some(&self.data[start..start + ch])
    }

    /// Nearest-neighbour expansion to scale 1.
    pub fn upscaled(&self) -> ImageBuffer {
        if self.scale == 1 {
            return self.clone();
        }
        let ch = self.format.channels();
        let s = self.scale as usize;
        let (w, h) = (self.width as usize, self.height as usize);
        let mut data = Vec::with_capacity(w * s * h * s * ch);

        for row in self.data.chunks_exact(w * ch) {
            let mut wide = Vec::with_capacity(w * s * ch);
            for px in row.chunks_exact(ch) {
                for _ in 0..s {
                    wide.extend_from_slice(px);
                }
            }
            for _ in 0..s {
                data.extend_from_slice(&wide);
            }
        }

        ImageBuffer {
            width: self.width * self.scale,
            height: self.height * self.scale,
            scale: 1,
            format: self.format,
            data,
        }
    }
}

/// Stateless matrix-to-pixels mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rasterizer {
    color_map: ColorMap,
    scale: u32,
}

impl Rasterizer {
    pub fn new(color_map: ColorMap, scale: u32) -> Result<Self> {
        if scale == 0 {
            return Err(Error::InvalidParameter("pixel scale must be at least 1".into()));
        }
        Ok(Self { color_map, scale })
    }

    /// Map `db` linearly from `[floor, ceiling]` onto the colour map.
    pub fn rasterize(&self, db: &RealMatrix, floor: f32, ceiling: f32) -> Result<ImageBuffer> {
        let (rows, cols) = db.shape();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidParameter(format!("cannot rasterize an empty {}x{} matrix", rows, cols)));
        }
        let width = u32::try_from(cols)
            .map_err(|_| Error::InvalidParameter(format!("{} frames do not fit an image", cols)))?;
        let height = u32::try_from(rows)
            .map_err(|_| Error::InvalidParameter(format!("{} bins do not fit an image", rows)))?;
        width
            .checked_mul(self.scale)
            .and(height.checked_mul(self.scale))
            .ok_or_else(|| Error::InvalidParameter("scaled image is too large".into()))?;

        let span = ceiling - floor;
        let ch = self.color_map.channels();
        let mut data = vec![0u8; rows * cols * ch];

        for (y, out_row) in data.chunks_exact_mut(cols * ch).enumerate() {
            let src = db.row(rows - 1 - y);
            for (px, &v) in out_row.chunks_exact_mut(ch).zip(src) {
                let t = if span > 0.0 { (v - floor) / span } else { 0.0 };
                self.color_map.paint(t, px);
            }
        }

        let format = if ch == 1 { PixelFormat::Gray8 } else { PixelFormat::Rgb8 };
        log::debug!("Rasterized {}x{} {:?} image (scale {})", width, height, format, self.scale);

        Ok(ImageBuffer {
            width,
            height,
            scale: self.scale,
            format,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Matrix;

    fn db(rows: usize, cols: usize, data: &[f32]) -> RealMatrix {
        Matrix::from_vec(rows, cols, data.to_vec()).unwrap()
    }

    #[test]
    fn dimensions_follow_the_matrix() {
        let m = db(3, 5, &[-40.0; 15]);
        let img = Rasterizer::new(ColorMap::Gray, 1).unwrap().rasterize(&m, -80.0, 0.0).unwrap();
        assert_eq!((img.width(), img.height()), (5, 3));
        assert_eq!(img.format(), PixelFormat::Gray8);
        assert_eq!(img.data().len(), 15);
    }

    #[test]
    fn low_bins_are_drawn_at_the_bottom() {
        // row 0 (lowest bin) loud, row 1 silent
        let m = db(2, 1, &[0.0, -80.0]);
        let img = Rasterizer::new(ColorMap::Gray, 1).unwrap().rasterize(&m, -80.0, 0.0).unwrap();
        assert_eq!(img.pixel(0, 0), Some(&[0u8][..]));
        assert_eq!(img.pixel(0, 1), Some(&[255u8][..]));
    }

    #[test]
    fn intensity_is_linear_in_db() {
        let m = db(1, 3, &[-80.0, -40.0, 0.0]);
        let img = Rasterizer::new(ColorMap::Gray, 1).unwrap().rasterize(&m, -80.0, 0.0).unwrap();
        assert_eq!(img.data(), &[0, 128, 255]);
    }

    #[test]
    fn color_map_produces_rgb() {
        let m = db(2, 2, &[-80.0, 0.0, -20.0, -60.0]);
        let img = Rasterizer::new(ColorMap::Magma, 1).unwrap().rasterize(&m, -80.0, 0.0).unwrap();
        assert_eq!(img.format(), PixelFormat::Rgb8);
        assert_eq!(img.data().len(), 12);
    }

    #[test]
    fn degenerate_range_is_dark() {
        let m = db(1, 2, &[-80.0, -80.0]);
        let img = Rasterizer::new(ColorMap::Gray, 1).unwrap().rasterize(&m, -80.0, -80.0).unwrap();
        assert_eq!(img.data(), &[0, 0]);
    }

    #[test]
    fn scale_expands_cells_into_blocks() {
        let m = db(1, 2, &[-80.0, 0.0]);
        let img = Rasterizer::new(ColorMap::Gray, 3).unwrap().rasterize(&m, -80.0, 0.0).unwrap();
        assert_eq!((img.width(), img.height(), img.scale()), (2, 1, 3));
        assert_eq!(img.pixel_dimensions(), (6, 3));

        let big = img.upscaled();
        assert_eq!((big.width(), big.height(), big.scale()), (6, 3, 1));
        for y in 0..3 {
            assert_eq!(big.pixel(2, y), Some(&[0u8][..]));
            assert_eq!(big.pixel(3, y), Some(&[255u8][..]));
        }
    }

    #[test]
    fn zero_scale_is_rejected() {
        assert!(Rasterizer::new(ColorMap::Gray, 0).is_err());
    }
}
