use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader, RgbImage, imageops::FilterType};
use std::io::Cursor;
use std::path::Path;

use crate::classes::INPUT_SIZE;

// nsfw-image-detector uses mean=0.5, std=0.5 for all channels
const MEAN: f32 = 0.5;
const STD: f32 = 0.5;

/// Number of `f32` values one image contributes to the input tensor.
pub const IMAGE_LEN: usize = 3 * INPUT_SIZE * INPUT_SIZE;

/// Decode an image from raw bytes, guessing the format from its content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
        .context("cannot identify image file")?;
    Ok(img)
}

pub fn open(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("cannot open image {}", path.display()))
}

/// Scale to the model input size as 8-bit RGB. Aspect ratio is not kept.
pub fn scale(img: &DynamicImage) -> RgbImage {
    image::imageops::resize(
        &img.to_rgb8(),
        INPUT_SIZE as u32,
        INPUT_SIZE as u32,
        FilterType::Triangle,
    )
}

/// Append one scaled image to `out` as normalized CHW planes.
fn push_chw(rgb: &RgbImage, out: &mut Vec<f32>) {
    let plane = INPUT_SIZE * INPUT_SIZE;
    let offset = out.len();
    out.resize(offset + IMAGE_LEN, 0.0);

    for (i, pixel) in rgb.pixels().enumerate() {
        for c in 0..3 {
            let v = pixel[c] as f32 / 255.0;
            out[offset + c * plane + i] = (v - MEAN) / STD;
        }
    }
}

/// Build the `N x 3 x 224 x 224` input buffer for a batch of images.
pub fn batch_input(images: &[DynamicImage]) -> Vec<f32> {
    let mut data = Vec::with_capacity(images.len() * IMAGE_LEN);
    for img in images {
        push_chw(&scale(img), &mut data);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbaImage};

    #[test]
    fn scale_produces_model_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 100));
        let scaled = scale(&img);
        assert_eq!(scaled.dimensions(), (INPUT_SIZE as u32, INPUT_SIZE as u32));
    }

    #[test]
    fn normalizes_into_planar_channels() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 0, 255])));
        let data = batch_input(&[img]);
        let plane = INPUT_SIZE * INPUT_SIZE;

        assert_eq!(data.len(), IMAGE_LEN);
        assert!(data[..plane].iter().all(|v| (*v - 1.0).abs() < 1e-6));
        assert!(data[plane..2 * plane].iter().all(|v| (*v + 1.0).abs() < 1e-6));
        assert!(data[2 * plane..].iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn alpha_is_dropped() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 0])));
        let data = batch_input(&[img.clone(), img]);
        assert_eq!(data.len(), 2 * IMAGE_LEN);
        assert!(data.iter().all(|v| (*v + 1.0).abs() < 1e-6));
    }

    #[test]
    fn decodes_png_bytes() {
        let mut buf = Vec::new();
        RgbImage::new(3, 2)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        let img = decode(&buf).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(decode(b"definitely not an image").is_err());
    }
}
