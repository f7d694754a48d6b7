pub mod cpu;
pub mod crop;
pub mod errors;
pub mod normalization;
pub mod pixels;

use ndarray::{Array, IxDyn};

pub use cpu::CpuPreProcessor;
pub use crop::NormalizedBox;
pub use errors::PreprocessError;
pub use normalization::{IMAGENET_MEAN, IMAGENET_STD, Normalization};
pub use pixels::Image;

/// Model input: `[1, 3, height, width]`, channel-planar (all R, then G, then B).
pub type Tensor = Array<f32, IxDyn>;

/// Resize `image` to `target_size`² (skipped when it already matches) and
/// normalize it into a planar tensor. The source image is left untouched.
pub fn to_tensor(
    image: &Image,
    target_size: u32,
    normalization: &Normalization,
) -> anyhow::Result<Tensor> {
    CpuPreProcessor::new(target_size, *normalization).to_tensor(image)
}
