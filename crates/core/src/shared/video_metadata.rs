use std::path::PathBuf;

/// Stream properties read from a source and handed to the sink.
///
/// `total_frames` is 0 when the container does not report a count
/// (e.g. streaming sources).
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Exact frame rate as `(numerator, denominator)` when the container
    /// reports one, e.g. `(30000, 1001)` for NTSC. `fps` is its decimal form.
    pub frame_rate: Option<(i32, i32)>,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Same geometry and frame rate, encoded with `codec`.
    pub fn with_codec(&self, codec: &str) -> Self {
        Self {
            codec: codec.to_string(),
            ..self.clone()
        }
    }

    /// The frame rate as a reduced positive ratio: the exact container rate
    /// when known, otherwise `fps` to millihertz precision. `None` when
    /// neither is usable.
    pub fn frame_rate_ratio(&self) -> Option<(i32, i32)> {
        let (num, den) = match self.frame_rate {
            Some((num, den)) if num > 0 && den > 0 => (num, den),
            _ if self.fps.is_finite() && self.fps >= 0.001 => {
                ((self.fps * 1000.0).round().min(i32::MAX as f64) as i32, 1000)
            }
            _ => return None,
        };
        let divisor = gcd(num, den);
        Some((num / divisor, den / divisor))
    }
}

fn gcd(mut a: i32, mut b: i32) -> i32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            width: 1920,
            height: 1080,
            fps: 29.97,
            frame_rate: Some((30000, 1001)),
            total_frames: 900,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/test.mp4")),
        }
    }

    #[test]
    fn test_with_codec_keeps_geometry() {
        let meta = metadata();
        let out = meta.with_codec("mpeg4");
        assert_eq!(out.codec, "mpeg4");
        assert_eq!(out.width, 1920);
        assert_eq!(out.height, 1080);
        assert_eq!(out.fps, 29.97);
        assert_eq!(out.source_path, meta.source_path);
    }

    #[test]
    fn test_exact_rate_wins_over_rounded_fps() {
        assert_eq!(metadata().frame_rate_ratio(), Some((30000, 1001)));
    }

    #[rstest]
    #[case(25.0, Some((25, 1)))]
    #[case(29.97, Some((2997, 100)))]
    #[case(12.5, Some((25, 2)))]
    #[case(0.0, None)]
    #[case(f64::NAN, None)]
    fn test_ratio_falls_back_to_fps(#[case] fps: f64, #[case] expected: Option<(i32, i32)>) {
        let meta = VideoMetadata {
            fps,
            frame_rate: None,
            ..metadata()
        };
        assert_eq!(meta.frame_rate_ratio(), expected);
    }

    #[test]
    fn test_invalid_container_rate_is_ignored() {
        let meta = VideoMetadata {
            fps: 24.0,
            frame_rate: Some((0, 0)),
            ..metadata()
        };
        assert_eq!(meta.frame_rate_ratio(), Some((24, 1)));
    }

    #[test]
    fn test_unknown_frame_count_is_zero() {
        let meta = VideoMetadata {
            total_frames: 0,
            ..metadata()
        };
        assert_eq!(meta.total_frames, 0);
    }
}
