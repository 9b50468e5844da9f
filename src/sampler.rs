use crate::error::{BlockreelError, BlockreelResult};

/// Decides which decoded frames are retained under a target frame rate.
///
/// Retention is purely index-based: with `interval = max(1, floor(F / T))`,
/// decode index `i` is retained iff `i % interval == 0`. Retained frames keep
/// their decode order and are renumbered contiguously by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemporalSampler {
    interval: u64,
}

impl TemporalSampler {
    pub fn new(native_fps: f64, target_fps: Option<u32>) -> BlockreelResult<Self> {
        if !native_fps.is_finite() || native_fps <= 0.0 {
            return Err(BlockreelError::config(
                "native frame rate must be positive",
            ));
        }
        let Some(target) = target_fps else {
            return Ok(Self { interval: 1 });
        };
        if target == 0 {
            return Err(BlockreelError::config("target fps must be > 0"));
        }
        if f64::from(target) >= native_fps {
            return Ok(Self { interval: 1 });
        }
        let interval = (native_fps / f64::from(target)).floor() as u64;
        Ok(Self {
            interval: interval.max(1),
        })
    }

    pub fn interval(self) -> u64 {
        self.interval
    }

    pub fn retains(self, decode_index: u64) -> bool {
        decode_index.is_multiple_of(self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_target_retains_everything() {
        let s = TemporalSampler::new(30.0, None).unwrap();
        assert_eq!(s.interval(), 1);
        assert!((0..10).all(|i| s.retains(i)));
    }

    #[test]
    fn target_at_or_above_native_retains_everything() {
        assert_eq!(TemporalSampler::new(30.0, Some(30)).unwrap().interval(), 1);
        assert_eq!(TemporalSampler::new(24.0, Some(60)).unwrap().interval(), 1);
    }

    #[test]
    fn thirty_to_ten_keeps_every_third_frame() {
        let s = TemporalSampler::new(30.0, Some(10)).unwrap();
        assert_eq!(s.interval(), 3);
        let retained: Vec<u64> = (0..10).filter(|&i| s.retains(i)).collect();
        assert_eq!(retained, vec![0, 3, 6, 9]);
    }

    #[test]
    fn frame_zero_is_always_retained() {
        for (native, target) in [(30.0, Some(1)), (29.97, Some(10)), (60.0, None)] {
            assert!(TemporalSampler::new(native, target).unwrap().retains(0));
        }
    }

    #[test]
    fn fractional_native_rate_floors_the_interval() {
        // 29.97 / 10 = 2.997, floored to 2.
        assert_eq!(TemporalSampler::new(29.97, Some(10)).unwrap().interval(), 2);
    }

    #[test]
    fn zero_target_fps_is_rejected() {
        assert!(TemporalSampler::new(30.0, Some(0)).is_err());
    }

    #[test]
    fn non_positive_native_rate_is_rejected() {
        assert!(TemporalSampler::new(0.0, Some(10)).is_err());
        assert!(TemporalSampler::new(-30.0, None).is_err());
    }
}
