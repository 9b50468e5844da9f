pub mod probe;
pub mod source;

fn tool_on_path(tool: &str) -> bool {
    std::process::Command::new(tool)
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn is_ffmpeg_on_path() -> bool {
    tool_on_path("ffmpeg")
}

pub fn is_ffprobe_on_path() -> bool {
    tool_on_path("ffprobe")
}
