use image::RgbImage;

use crate::error::{BlockreelError, BlockreelResult};

/// Per-channel bit-depth reduction.
///
/// With `levels = 2^bits_per_channel` and `divider = 256 / levels`, every
/// sample maps to `(v / divider) * divider`: the floor of its quantization
/// bucket. The transform is pure and per-sample, so callers may apply it to
/// frames in any order or in parallel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quantizer {
    divider: u8,
}

impl Quantizer {
    pub fn new(bits_per_channel: u8) -> BlockreelResult<Self> {
        if !(1..=8).contains(&bits_per_channel) {
            return Err(BlockreelError::config(format!(
                "bits per channel must be in 1..=8, got {bits_per_channel}"
            )));
        }
        let levels = 1u16 << bits_per_channel;
        Ok(Self {
            divider: (256 / levels) as u8,
        })
    }

    pub fn levels(self) -> u16 {
        256 / u16::from(self.divider)
    }

    pub fn divider(self) -> u8 {
        self.divider
    }

    pub fn quantize_sample(self, v: u8) -> u8 {
        (v / self.divider) * self.divider
    }

    pub fn quantize_in_place(self, img: &mut RgbImage) {
        for px in img.pixels_mut() {
            for sample in px.0.iter_mut() {
                *sample = self.quantize_sample(*sample);
            }
        }
    }
}
