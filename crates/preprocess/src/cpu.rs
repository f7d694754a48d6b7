use crate::Tensor;
use crate::normalization::Normalization;
use crate::pixels::Image;
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image as ResizeBuffer, ImageRef},
};
use ndarray::{Array, IxDyn};
use std::borrow::Cow;

/// Builds `[1, 3, size, size]` planar tensors for one model's input geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuPreProcessor {
    pub target_size: u32,
    pub normalization: Normalization,
}

impl CpuPreProcessor {
    pub fn new(target_size: u32, normalization: Normalization) -> Self {
        Self {
            target_size,
            normalization,
        }
    }

    pub fn to_tensor(&self, image: &Image) -> anyhow::Result<Tensor> {
        let _s = span!("preprocess", target_size = self.target_size);

        if self.target_size == 0 {
            anyhow::bail!("Target size must be non-zero");
        }

        tracing::trace!(
            width = image.width(),
            height = image.height(),
            target_size = self.target_size,
            "Preprocessing image"
        );

        let resized = self.resize(image)?;
        self.normalize(&resized)
    }

    /// Square resize into a scratch buffer; borrows the source when it already fits.
    fn resize<'a>(&self, image: &'a Image) -> anyhow::Result<Cow<'a, [u8]>> {
        let size = self.target_size;
        if image.dimensions() == (size, size) {
            return Ok(Cow::Borrowed(image.pixels()));
        }

        let _s = span!("resize");

        let src = ImageRef::new(
            image.width(),
            image.height(),
            image.pixels(),
            PixelType::U8x3,
        )?;
        let mut dst = ResizeBuffer::new(size, size, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut dst,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        Ok(Cow::Owned(dst.into_vec()))
    }

    fn normalize(&self, rgb: &[u8]) -> anyhow::Result<Tensor> {
        let _s = span!("normalize");

        let side = self.target_size as usize;
        let spatial = side * side;
        if rgb.len() != spatial * 3 {
            anyhow::bail!(
                "Buffer size mismatch: expected {}, got {} bytes",
                spatial * 3,
                rgb.len()
            );
        }

        let tables = self.normalization.lookup_tables();
        let mut output = vec![0.0f32; 3 * spatial];

        for (i, px) in rgb.chunks_exact(3).enumerate() {
            output[i] = tables[0][px[0] as usize];
            output[i + spatial] = tables[1][px[1] as usize];
            output[i + 2 * spatial] = tables[2][px[2] as usize];
        }

        Ok(Array::from_shape_vec(IxDyn(&[1, 3, side, side]), output)?)
    }
}
