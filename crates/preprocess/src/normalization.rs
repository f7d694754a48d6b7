pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// How raw 0..255 channel values become model inputs. Each model declares its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    /// `(v / 255 - mean[c]) / std[c]`
    MeanStd { mean: [f32; 3], std: [f32; 3] },
    /// `(v - 127.5) / 127.5`, i.e. inputs in [-1, 1]
    Symmetric,
    /// `v / 255`
    UnitScale,
}

impl Normalization {
    pub const fn imagenet() -> Self {
        Normalization::MeanStd {
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    pub fn apply(&self, channel: usize, value: u8) -> f32 {
        match self {
            Normalization::MeanStd { mean, std } => {
                (value as f32 / 255.0 - mean[channel]) / std[channel]
            }
            Normalization::Symmetric => (value as f32 - 127.5) / 127.5,
            Normalization::UnitScale => value as f32 / 255.0,
        }
    }

    /// Per-channel lookup tables for every possible byte value.
    pub(crate) fn lookup_tables(&self) -> [[f32; 256]; 3] {
        let mut tables = [[0.0f32; 256]; 3];
        for (c, table) in tables.iter_mut().enumerate() {
            for (v, slot) in table.iter_mut().enumerate() {
                *slot = self.apply(c, v as u8);
            }
        }
        tables
    }
}
