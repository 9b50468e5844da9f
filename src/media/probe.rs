use std::path::{Path, PathBuf};

use crate::{
    core::{Dimensions, Fps},
    error::{BlockreelError, BlockreelResult},
};

/// Probed metadata for a video source.
///
/// `nb_frames` is the container's own frame count when it reports one;
/// [`VideoSourceInfo::frame_count_estimate`] falls back to `duration * fps`
/// for containers that do not.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub duration_sec: f64,
    pub nb_frames: Option<u64>,
}

impl VideoSourceInfo {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn frame_count_estimate(&self) -> u64 {
        self.nb_frames
            .unwrap_or_else(|| (self.duration_sec * self.fps.as_f64()).round().max(0.0) as u64)
    }
}

/// Probe a video with the system `ffprobe` binary.
pub fn probe_video(source_path: &Path) -> BlockreelResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        nb_frames: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| BlockreelError::decode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(BlockreelError::decode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| BlockreelError::decode(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| BlockreelError::decode("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| BlockreelError::decode("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| BlockreelError::decode("missing video height from ffprobe"))?;
    if width == 0 || height == 0 {
        return Err(BlockreelError::decode("source reports zero-sized frames"));
    }

    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| BlockreelError::decode("invalid video r_frame_rate"))?;
    let fps = Fps::new(fps_num, fps_den)
        .map_err(|_| BlockreelError::decode("source reports a zero frame rate"))?;

    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    let nb_frames = video_stream
        .nb_frames
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok());

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps,
        duration_sec,
        nb_frames,
    })
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_parsing_accepts_ffprobe_forms() {
        assert_eq!(parse_ff_ratio("30/1"), Some((30, 1)));
        assert_eq!(parse_ff_ratio("30000/1001"), Some((30000, 1001)));
        assert_eq!(parse_ff_ratio("30/0"), None);
        assert_eq!(parse_ff_ratio("thirty"), None);
    }

    #[test]
    fn frame_count_estimate_prefers_container_count() {
        let mut info = VideoSourceInfo {
            source_path: PathBuf::from("a.mp4"),
            width: 64,
            height: 48,
            fps: Fps::new(30, 1).unwrap(),
            duration_sec: 2.0,
            nb_frames: Some(59),
        };
        assert_eq!(info.frame_count_estimate(), 59);

        info.nb_frames = None;
        assert_eq!(info.frame_count_estimate(), 60);
    }
}
