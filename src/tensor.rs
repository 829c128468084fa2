use image::{Rgb, RgbImage};

use crate::error::{LetzError, Result};

/// Color channels per pixel.
pub const CHANNELS: usize = 3;

/// A batch of RGB images in the host's `[batch, height, width, channel]`
/// layout, with channel values scaled to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    batch: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl ImageBatch {
    /// Wrap raw values. `data` must hold exactly `batch * height * width * 3` floats.
    pub fn new(batch: usize, height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        let expected = batch
            .checked_mul(height)
            .and_then(|n| n.checked_mul(width))
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| {
                LetzError::InvalidInput(format!(
                    "tensor shape [{}, {}, {}, {}] is too large",
                    batch, height, width, CHANNELS
                ))
            })?;
        if data.len() != expected {
            return Err(LetzError::InvalidInput(format!(
                "tensor data has {} values, shape [{}, {}, {}, {}] needs {}",
                data.len(),
                batch,
                height,
                width,
                CHANNELS,
                expected
            )));
        }
        Ok(Self {
            batch,
            height,
            width,
            data,
        })
    }

    /// Single-image batch from an 8-bit RGB buffer.
    pub fn from_rgb(img: &RgbImage) -> Self {
        let data = img
            .as_raw()
            .iter()
            .map(|&v| f32::from(v) / 255.0)
            .collect();
        Self {
            batch: 1,
            height: img.height() as usize,
            width: img.width() as usize,
            data,
        }
    }

    /// Decode any format the `image` crate understands into a single-image
    /// batch, converting to RGB first.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| LetzError::DownloadFailed(format!("decode error: {}", e)))?;
        Ok(Self::from_rgb(&img.to_rgb8()))
    }

    /// Concatenate equally sized batches along the batch axis.
    pub fn stack(batches: Vec<ImageBatch>) -> Result<Self> {
        let mut iter = batches.into_iter();
        let mut out = match iter.next() {
            Some(first) => first,
            None => return Err(LetzError::InvalidInput("no images to stack".into())),
        };
        for next in iter {
            if next.height != out.height || next.width != out.width {
                return Err(LetzError::InvalidInput(format!(
                    "cannot stack {}x{} image onto {}x{} batch",
                    next.width, next.height, out.width, out.height
                )));
            }
            out.batch += next.batch;
            out.data.extend(next.data);
        }
        Ok(out)
    }

    /// `[batch, height, width, channels]`.
    pub fn shape(&self) -> [usize; 4] {
        [self.batch, self.height, self.width, CHANNELS]
    }

    pub fn len(&self) -> usize {
        self.batch
    }

    pub fn is_empty(&self) -> bool {
        self.batch == 0
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Flat channel values of image `index`.
    pub fn image(&self, index: usize) -> Option<&[f32]> {
        if index >= self.batch {
            return None;
        }
        let stride = self.height * self.width * CHANNELS;
        Some(&self.data[index * stride..(index + 1) * stride])
    }

    /// Copy image `index` out as its own single-image batch.
    pub fn select(&self, index: usize) -> Option<ImageBatch> {
        self.image(index).map(|data| ImageBatch {
            batch: 1,
            height: self.height,
            width: self.width,
            data: data.to_vec(),
        })
    }

    /// Convert image `index` back to 8-bit RGB.
    pub fn to_rgb_image(&self, index: usize) -> Option<RgbImage> {
        let data = self.image(index)?;
        let mut img = RgbImage::new(self.width as u32, self.height as u32);
        for (pixel, chunk) in img.pixels_mut().zip(data.chunks_exact(CHANNELS)) {
            let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            *pixel = Rgb([to_u8(chunk[0]), to_u8(chunk[1]), to_u8(chunk[2])]);
        }
        Some(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, LumaA};
    use std::io::Cursor;

    #[test]
    fn test_from_rgb_scales_to_unit_range() {
        let img = RgbImage::from_pixel(2, 3, Rgb([255, 0, 51]));
        let batch = ImageBatch::from_rgb(&img);
        assert_eq!(batch.shape(), [1, 3, 2, 3]);
        assert_eq!(&batch.data()[..3], &[1.0, 0.0, 0.2]);
    }

    #[test]
    fn test_decode_converts_grayscale_alpha_to_rgb() {
        let gray = image::ImageBuffer::from_pixel(4, 4, LumaA([128u8, 200]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLumaA8(gray)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let batch = ImageBatch::decode(&bytes).unwrap();
        assert_eq!(batch.shape(), [1, 4, 4, 3]);
        let v = 128.0 / 255.0;
        assert!(batch.data().iter().all(|&c| (c - v).abs() < 1e-6));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = ImageBatch::decode(b"definitely not a png").unwrap_err();
        assert!(matches!(err, LetzError::DownloadFailed(_)));
    }

    #[test]
    fn test_stack_and_select() {
        let a = ImageBatch::from_rgb(&RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])));
        let b = ImageBatch::from_rgb(&RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])));
        let batch = ImageBatch::stack(vec![a, b]).unwrap();
        assert_eq!(batch.shape(), [2, 2, 2, 3]);

        let second = batch.select(1).unwrap();
        assert_eq!(second.shape(), [1, 2, 2, 3]);
        assert!(second.data().iter().all(|&c| c == 1.0));
        assert!(batch.select(2).is_none());
    }

    #[test]
    fn test_stack_rejects_mismatched_sizes() {
        let a = ImageBatch::from_rgb(&RgbImage::new(2, 2));
        let b = ImageBatch::from_rgb(&RgbImage::new(3, 2));
        assert!(ImageBatch::stack(vec![a, b]).is_err());
        assert!(ImageBatch::stack(Vec::new()).is_err());
    }

    #[test]
    fn test_new_checks_length() {
        assert!(ImageBatch::new(1, 2, 2, vec![0.0; 12]).is_ok());
        assert!(ImageBatch::new(1, 2, 2, vec![0.0; 11]).is_err());
    }

    #[test]
    fn test_new_rejects_overflowing_shape() {
        let result = ImageBatch::new(usize::MAX / 2, 3, 1, Vec::new());
        assert!(matches!(result, Err(LetzError::InvalidInput(_))));
    }

    #[test]
    fn test_to_rgb_image_round_trip_pixel() {
        let img = RgbImage::from_pixel(1, 1, Rgb([10, 20, 30]));
        let back = ImageBatch::from_rgb(&img).to_rgb_image(0).unwrap();
        assert_eq!(back.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }
}
