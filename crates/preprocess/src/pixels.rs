use crate::crop::NormalizedBox;
use crate::errors::PreprocessError;
use common::span_debug;

/// Decoded RGB8 image, interleaved (HWC). Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    /// Wrap an interleaved RGB buffer of exactly `width * height * 3` bytes.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PreprocessError> {
        if width == 0 || height == 0 {
            return Err(PreprocessError::EmptyImage { width, height });
        }

        let expected = rgb_len(width, height);
        if pixels.len() != expected {
            return Err(PreprocessError::SizeMismatch {
                width,
                height,
                expected,
                got: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-color image. Zero dimensions are bumped to 1.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take(rgb_len(width, height))
            .collect();

        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert an NV21 camera frame (full Y plane followed by interleaved V/U
    /// at half resolution) to RGB using BT.601 full-range coefficients.
    pub fn from_nv21(width: u32, height: u32, data: &[u8]) -> Result<Self, PreprocessError> {
        let _s = span_debug!("nv21_to_rgb", width, height);

        if width == 0 || height == 0 {
            return Err(PreprocessError::EmptyImage { width, height });
        }

        let (w, h) = (width as usize, height as usize);
        let chroma_w = w.div_ceil(2);
        let chroma_h = h.div_ceil(2);
        let expected = w * h + 2 * chroma_w * chroma_h;
        if data.len() != expected {
            return Err(PreprocessError::SizeMismatch {
                width,
                height,
                expected,
                got: data.len(),
            });
        }

        let (luma, chroma) = data.split_at(w * h);
        let mut pixels = Vec::with_capacity(rgb_len(width, height));

        for y in 0..h {
            let chroma_row = (y / 2) * chroma_w * 2;
            for x in 0..w {
                let vu = chroma_row + (x / 2) * 2;
                let c = luma[y * w + x] as i32;
                let e = chroma[vu] as i32 - 128;
                let d = chroma[vu + 1] as i32 - 128;

                pixels.push(clamp_u8(c + ((359 * e) >> 8)));
                pixels.push(clamp_u8(c - ((88 * d + 183 * e) >> 8)));
                pixels.push(clamp_u8(c + ((454 * d) >> 8)));
            }
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Interleaved RGB bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 3) as usize;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    /// Copy out the pixels covered by `region`.
    ///
    /// Edges are snapped outward to whole pixels (floor for left/top, ceil for
    /// right/bottom), so only a region with zero extent on some axis fails with
    /// [`PreprocessError::DegenerateGeometry`].
    pub fn crop(&self, region: &NormalizedBox) -> Result<Image, PreprocessError> {
        let _s = span_debug!("crop");

        let (x0, x1) = pixel_span(region.left, region.right, self.width);
        let (y0, y1) = pixel_span(region.top, region.bottom, self.height);

        if x1 <= x0 || y1 <= y0 {
            return Err(PreprocessError::DegenerateGeometry);
        }

        let (crop_w, crop_h) = (x1 - x0, y1 - y0);
        let stride = (self.width * 3) as usize;
        let row_len = (crop_w * 3) as usize;
        let mut pixels = Vec::with_capacity(rgb_len(crop_w, crop_h));

        for y in y0..y1 {
            let start = y as usize * stride + (x0 * 3) as usize;
            pixels.extend_from_slice(&self.pixels[start..start + row_len]);
        }

        tracing::trace!(x0, y0, crop_w, crop_h, "Cropped region");

        Ok(Image {
            width: crop_w,
            height: crop_h,
            pixels,
        })
    }
}

impl TryFrom<image::RgbImage> for Image {
    type Error = PreprocessError;

    fn try_from(img: image::RgbImage) -> Result<Self, Self::Error> {
        let (width, height) = img.dimensions();
        Image::from_rgb(width, height, img.into_raw())
    }
}

fn rgb_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

fn pixel_span(start: f32, end: f32, extent: u32) -> (u32, u32) {
    let extent_f = extent as f32;
    let lo = (start * extent_f).floor().clamp(0.0, extent_f) as u32;
    let hi = (end * extent_f).ceil().clamp(0.0, extent_f) as u32;
    (lo, hi.max(lo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_rejects_wrong_length() {
        let result = Image::from_rgb(10, 10, vec![0u8; 200]);
        assert!(
            matches!(
                result,
                Err(PreprocessError::SizeMismatch {
                    expected: 300,
                    got: 200,
                    ..
                })
            ),
            "Short buffer should be rejected, got {:?}",
            result
        );
    }

    #[test]
    fn test_from_rgb_rejects_zero_area() {
        assert_eq!(
            Image::from_rgb(0, 4, vec![]),
            Err(PreprocessError::EmptyImage {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn test_nv21_neutral_chroma_is_gray() {
        // 2x2 frame: 4 luma bytes + one V/U pair
        let data = [128, 128, 128, 128, 128, 128];
        let img = Image::from_nv21(2, 2, &data).unwrap();
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(img.pixel(x, y), Some([128, 128, 128]));
            }
        }
    }

    #[test]
    fn test_nv21_strong_red_chroma() {
        // V well above neutral pushes red up and green down
        let data = [100, 100, 100, 100, 220, 128];
        let img = Image::from_nv21(2, 2, &data).unwrap();
        let [r, g, b] = img.pixel(0, 0).unwrap();
        assert!(r > 200, "Red should dominate (r={})", r);
        assert!(g < 100, "Green should drop (g={})", g);
        assert_eq!(b, 100, "Blue depends only on U");
    }

    #[test]
    fn test_nv21_odd_dimensions() {
        // 3x3 frame: 9 luma bytes + 2x2 chroma pairs
        let data = vec![128u8; 9 + 8];
        let img = Image::from_nv21(3, 3, &data).unwrap();
        assert_eq!(img.dimensions(), (3, 3));
        assert_eq!(img.pixels().len(), 27);
    }

    #[test]
    fn test_nv21_size_mismatch() {
        let result = Image::from_nv21(4, 4, &[0u8; 10]);
        assert!(matches!(result, Err(PreprocessError::SizeMismatch { .. })));
    }

    #[test]
    fn test_crop_center_quarter() {
        // 4x4 image where each pixel encodes its coordinates
        let mut pixels = Vec::new();
        for y in 0..4u8 {
            for x in 0..4u8 {
                pixels.extend_from_slice(&[x, y, 0]);
            }
        }
        let img = Image::from_rgb(4, 4, pixels).unwrap();

        let crop = img
            .crop(&NormalizedBox::new(0.25, 0.25, 0.75, 0.75))
            .unwrap();

        assert_eq!(crop.dimensions(), (2, 2));
        assert_eq!(crop.pixel(0, 0), Some([1, 1, 0]));
        assert_eq!(crop.pixel(1, 1), Some([2, 2, 0]));
    }

    #[test]
    fn test_crop_zero_width_is_degenerate() {
        let img = Image::filled(8, 8, [10, 20, 30]);
        let result = img.crop(&NormalizedBox::new(0.5, 0.1, 0.5, 0.9));
        assert_eq!(result, Err(PreprocessError::DegenerateGeometry));
    }

    #[test]
    fn test_crop_tiny_region_keeps_one_pixel() {
        let img = Image::filled(8, 8, [10, 20, 30]);
        let crop = img
            .crop(&NormalizedBox::new(0.51, 0.51, 0.52, 0.52))
            .unwrap();
        assert_eq!(crop.dimensions(), (1, 1));
    }

    #[test]
    fn test_crop_does_not_touch_source() {
        let img = Image::filled(6, 6, [1, 2, 3]);
        let before = img.clone();
        let _ = img.crop(&NormalizedBox::new(0.0, 0.0, 0.5, 0.5));
        assert_eq!(img, before);
    }

    #[test]
    fn test_from_rgb_image() {
        let rgb = image::RgbImage::from_pixel(3, 2, image::Rgb([9, 8, 7]));
        let img = Image::try_from(rgb).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.pixel(2, 1), Some([9, 8, 7]));
    }

    #[test]
    fn test_empty_rgb_image_rejected() {
        let rgb = image::RgbImage::new(0, 5);
        assert_eq!(
            Image::try_from(rgb),
            Err(PreprocessError::EmptyImage {
                width: 0,
                height: 5
            }),
            "A zero-area decode must not become a placeholder image"
        );
    }
}
