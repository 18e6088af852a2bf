use image::{ExtendedColorType, ImageEncoder};
use std::io::Cursor;
use std::path::Path;

use crate::error::{Error, Result};
use crate::render::{ImageBuffer, PixelFormat};

fn color_type(format: PixelFormat) -> ExtendedColorType {
    match format {
        PixelFormat::Gray8 => ExtendedColorType::L8,
        PixelFormat::Rgb8 => ExtendedColorType::Rgb8,
    }
}

/// PNG bytes for `image`, expanded to its pixel scale. No metadata chunks.
pub fn encode_png(image: &ImageBuffer) -> Result<Vec<u8>> {
    let pixels = image.upscaled();
    let mut out = Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(pixels.data(), pixels.width(), pixels.height(), color_type(pixels.format()))
        .map_err(|e| Error::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

pub fn write_png(path: &Path, image: &ImageBuffer) -> Result<()> {
    let bytes = encode_png(image)?;
    std::fs::write(path, &bytes).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;

    let (w, h) = image.pixel_dimensions();
    log::info!("Wrote {}x{} PNG to {}", w, h, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Matrix;
    use crate::render::{ColorMap, Rasterizer};

    fn render(map: ColorMap, scale: u32) -> ImageBuffer {
        let db = Matrix::from_vec(2, 3, vec![-80.0, -40.0, 0.0, 0.0, -40.0, -80.0]).unwrap();
        Rasterizer::new(map, scale).unwrap().rasterize(&db, -80.0, 0.0).unwrap()
    }

    #[test]
    fn round_trips_gray_pixels() {
        let img = render(ColorMap::Gray, 1);
        let decoded = image::load_from_memory(&encode_png(&img).unwrap()).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.as_raw().as_slice(), img.data());
    }

    #[test]
    fn scaled_rgb_has_scaled_dimensions() {
        let img = render(ColorMap::Magma, 4);
        let decoded = image::load_from_memory(&encode_png(&img).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn unwritable_path_reports_it() {
        let path = Path::new("/definitely/not/here/out.png");
        match write_png(path, &render(ColorMap::Gray, 1)) {
            Err(Error::Io { path, .. }) => assert!(path.ends_with("out.png")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
