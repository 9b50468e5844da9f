use crate::error::{BlockreelError, BlockreelResult};

/// Frame rate as an exact rational, as reported by the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> BlockreelResult<Self> {
        if den == 0 {
            return Err(BlockreelError::config("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(BlockreelError::config("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }
}

/// Pixel dimensions of a frame or a target canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            f64::from(self.width) / f64::from(self.height)
        }
    }

    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero_parts() {
        assert!(Fps::new(30, 0).is_err());
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30000, 1001).is_ok());
    }

    #[test]
    fn fps_as_f64_is_exact_for_integer_rates() {
        assert_eq!(Fps::new(30, 1).unwrap().as_f64(), 30.0);
        let ntsc = Fps::new(30000, 1001).unwrap();
        assert!((ntsc.as_f64() - 29.97).abs() < 0.01);
    }

    #[test]
    fn dimensions_aspect_handles_degenerate_height() {
        assert_eq!(Dimensions::new(64, 0).aspect(), 0.0);
        assert_eq!(Dimensions::new(64, 48).aspect(), 64.0 / 48.0);
        assert_eq!(Dimensions::new(64, 48).pixel_count(), 3072);
    }
}
