use std::{
    io::{BufReader, Read},
    path::Path,
    process::{Child, ChildStdout, Command, Stdio},
};

use crate::{
    error::{BlockreelError, BlockreelResult},
    media::{
        is_ffmpeg_on_path,
        probe::{VideoSourceInfo, probe_video},
    },
};

/// One decoded source frame: tightly packed row-major RGB24.
///
/// `decode_index` counts every successfully decoded frame, including frames a
/// sampler later drops; it is distinct from the retained-frame index used for
/// output file names.
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub decode_index: u64,
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RawFrame {
    pub fn into_image(self) -> BlockreelResult<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.rgb)
            .ok_or_else(|| BlockreelError::decode("frame buffer does not match its dimensions"))
    }
}

/// Forward-only frame stream over one long-lived ffmpeg child process.
///
/// Decoding requires sequential stream access, so this type is single-threaded
/// by construction: call [`FrameSource::next_frame`] until it returns `None`,
/// then [`FrameSource::finish`] to reap the child and surface any decode error
/// it reported.
pub struct FrameSource {
    info: VideoSourceInfo,
    child: Child,
    stdout: BufReader<ChildStdout>,
    frame_len: usize,
    next_index: u64,
    eof: bool,
}

impl FrameSource {
    pub fn open(source_path: &Path) -> BlockreelResult<Self> {
        if !is_ffmpeg_on_path() {
            return Err(BlockreelError::decode(
                "ffmpeg is required for video decoding, but was not found on PATH",
            ));
        }

        let info = probe_video(source_path)?;
        let frame_len = info.width as usize * info.height as usize * 3;

        // System ffmpeg binary over a pipe, like the rest of the media layer:
        // no native FFmpeg dev header/lib requirements.
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error", "-i"])
            .arg(source_path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            BlockreelError::decode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BlockreelError::decode("failed to open ffmpeg stdout (unexpected)"))?;

        Ok(Self {
            info,
            child,
            stdout: BufReader::new(stdout),
            frame_len,
            next_index: 0,
            eof: false,
        })
    }

    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    /// Decode the next frame, or `None` at a clean end of stream.
    ///
    /// A byte count that is not a whole number of frames means the stream was
    /// truncated mid-frame and is reported as a decode failure.
    pub fn next_frame(&mut self) -> BlockreelResult<Option<RawFrame>> {
        if self.eof {
            return Ok(None);
        }

        let mut rgb = vec![0u8; self.frame_len];
        let got = read_full(&mut self.stdout, &mut rgb).map_err(|e| {
            BlockreelError::decode(format!("failed reading decoded frame from ffmpeg: {e}"))
        })?;

        if got == 0 {
            self.eof = true;
            return Ok(None);
        }
        if got < self.frame_len {
            self.eof = true;
            return Err(BlockreelError::decode(format!(
                "truncated frame from ffmpeg: got {got} of {} bytes",
                self.frame_len
            )));
        }

        let frame = RawFrame {
            decode_index: self.next_index,
            width: self.info.width,
            height: self.info.height,
            rgb,
        };
        self.next_index += 1;
        Ok(Some(frame))
    }

    /// Reap the ffmpeg child and surface its stderr on failure.
    pub fn finish(self) -> BlockreelResult<()> {
        let Self { child, stdout, .. } = self;
        drop(stdout);

        let output = child.wait_with_output().map_err(|e| {
            BlockreelError::decode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BlockreelError::decode(format!(
                "ffmpeg video decode exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Read until `buf` is full or the stream ends; returns bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
