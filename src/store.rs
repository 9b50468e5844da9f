use std::{
    fs,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use image::{ImageFormat, RgbImage};

use crate::error::{BlockreelError, BlockreelResult};

/// Write capability for the three artifact directories.
///
/// Created by an explicit setup step before any pass runs; nothing else in the
/// pipeline creates directories as a side effect.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    root: PathBuf,
    frames_dir: PathBuf,
    quantized_dir: PathBuf,
    schematics_dir: PathBuf,
}

impl OutputLayout {
    pub fn create(root: impl Into<PathBuf>) -> BlockreelResult<Self> {
        let root = root.into();
        let layout = Self {
            frames_dir: root.join("frames"),
            quantized_dir: root.join("quantized"),
            schematics_dir: root.join("schematics"),
            root,
        };
        for dir in [
            &layout.root,
            &layout.frames_dir,
            &layout.quantized_dir,
            &layout.schematics_dir,
        ] {
            fs::create_dir_all(dir).map_err(|e| {
                BlockreelError::io(format!(
                    "failed to create output directory '{}': {e}",
                    dir.display()
                ))
            })?;
        }
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    pub fn quantized_dir(&self) -> &Path {
        &self.quantized_dir
    }

    pub fn schematics_dir(&self) -> &Path {
        &self.schematics_dir
    }
}

pub fn frame_file_name(index: u64) -> String {
    format!("frame_{index:04}.png")
}

pub fn quantized_file_name(index: u64) -> String {
    format!("quantized_frame_{index:04}.png")
}

/// Region name for a retained frame; the schematic file adds its own extension.
pub fn schematic_name(index: u64) -> String {
    format!("frame_{index:04}")
}

/// Recover the retained-frame index embedded after the last `_` of a file name.
pub fn parse_frame_index(file_name: &str) -> Option<u64> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    stem.rsplit('_').next()?.parse().ok()
}

/// One frame artifact as recorded by the pass that produced it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRecord {
    pub index: u64,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

/// Ordered manifest written next to each pass's artifacts.
///
/// Ordering is carried by the records themselves, so downstream passes do not
/// have to re-derive it from filename sorting.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct FrameManifest {
    pub frames: Vec<FrameRecord>,
}

impl FrameManifest {
    pub const FILE_NAME: &'static str = "manifest.json";

    pub fn push(&mut self, record: FrameRecord) {
        self.frames.push(record);
    }

    pub fn save(&self, dir: &Path) -> BlockreelResult<()> {
        write_json_atomic(&dir.join(Self::FILE_NAME), self)
    }

    /// `None` when the directory carries no manifest (externally supplied
    /// frame directories are legal input).
    pub fn load(dir: &Path) -> BlockreelResult<Option<Self>> {
        let path = dir.join(Self::FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| {
            BlockreelError::io(format!(
                "failed to read manifest '{}': {e}",
                path.display()
            ))
        })?;
        let manifest = serde_json::from_slice(&bytes).map_err(|e| {
            BlockreelError::decode(format!(
                "failed to parse manifest '{}': {e}",
                path.display()
            ))
        })?;
        Ok(Some(manifest))
    }
}

/// List `(index, path)` pairs for a frame directory in ascending index order,
/// preferring the manifest its producer wrote and falling back to a filename
/// scan for bare directories.
pub fn list_frames(dir: &Path) -> BlockreelResult<Vec<(u64, PathBuf)>> {
    if let Some(manifest) = FrameManifest::load(dir)? {
        let mut entries: Vec<(u64, PathBuf)> = manifest
            .frames
            .iter()
            .map(|r| (r.index, dir.join(&r.file_name)))
            .collect();
        entries.sort_by_key(|(index, _)| *index);
        return Ok(entries);
    }
    scan_indexed_images(dir)
}

/// Filename-scan fallback: image files carrying a zero-padded index after the
/// last `_`. Files without a parseable index are not frames and are ignored.
pub fn scan_indexed_images(dir: &Path) -> BlockreelResult<Vec<(u64, PathBuf)>> {
    let read_dir = fs::read_dir(dir).map_err(|e| {
        BlockreelError::io(format!(
            "failed to read frame directory '{}': {e}",
            dir.display()
        ))
    })?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| {
            BlockreelError::io(format!(
                "failed to read frame directory '{}': {e}",
                dir.display()
            ))
        })?;
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"));
        if !is_image {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(index) = parse_frame_index(name) {
            entries.push((index, path));
        }
    }
    entries.sort_by_key(|(index, _)| *index);
    Ok(entries)
}

/// Persist a frame as PNG via temp-file-then-rename, so a later pass never
/// observes a partial artifact.
pub fn write_png_atomic(path: &Path, img: &RgbImage) -> BlockreelResult<()> {
    let tmp = tmp_sibling(path);
    let written = (|| -> BlockreelResult<()> {
        let file = fs::File::create(&tmp).map_err(|e| {
            BlockreelError::io(format!("failed to create '{}': {e}", tmp.display()))
        })?;
        let mut writer = BufWriter::new(file);
        img.write_to(&mut writer, ImageFormat::Png).map_err(|e| {
            BlockreelError::io(format!("failed to encode '{}': {e}", path.display()))
        })?;
        writer.flush().map_err(|e| {
            BlockreelError::io(format!("failed to flush '{}': {e}", tmp.display()))
        })?;
        Ok(())
    })();

    finish_atomic(written, &tmp, path)
}

pub(crate) fn write_json_atomic<T: serde::Serialize>(
    path: &Path,
    value: &T,
) -> BlockreelResult<()> {
    let tmp = tmp_sibling(path);
    let written = (|| -> BlockreelResult<()> {
        let file = fs::File::create(&tmp).map_err(|e| {
            BlockreelError::io(format!("failed to create '{}': {e}", tmp.display()))
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value).map_err(|e| {
            BlockreelError::io(format!("failed to serialize '{}': {e}", path.display()))
        })?;
        writer.flush().map_err(|e| {
            BlockreelError::io(format!("failed to flush '{}': {e}", tmp.display()))
        })?;
        Ok(())
    })();

    finish_atomic(written, &tmp, path)
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn finish_atomic(written: BlockreelResult<()>, tmp: &Path, path: &Path) -> BlockreelResult<()> {
    match written {
        Ok(()) => fs::rename(tmp, path).map_err(|e| {
            BlockreelError::io(format!(
                "failed to move '{}' into place: {e}",
                path.display()
            ))
        }),
        Err(e) => {
            let _ = fs::remove_file(tmp);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_zero_padded() {
        assert_eq!(frame_file_name(0), "frame_0000.png");
        assert_eq!(frame_file_name(123), "frame_0123.png");
        assert_eq!(frame_file_name(12345), "frame_12345.png");
        assert_eq!(quantized_file_name(7), "quantized_frame_0007.png");
        assert_eq!(schematic_name(42), "frame_0042");
    }

    #[test]
    fn index_parsing_survives_prefixes_and_extensions() {
        assert_eq!(parse_frame_index("frame_0012.png"), Some(12));
        assert_eq!(parse_frame_index("quantized_frame_0012.png"), Some(12));
        assert_eq!(parse_frame_index("frame_0012.jpeg"), Some(12));
        assert_eq!(parse_frame_index("cover.png"), None);
        assert_eq!(parse_frame_index("frame_twelve.png"), None);
    }

    #[test]
    fn names_sort_lexicographically_in_index_order() {
        let mut names: Vec<String> = [3u64, 0, 12, 7].iter().map(|&i| frame_file_name(i)).collect();
        names.sort();
        let indices: Vec<u64> = names.iter().filter_map(|n| parse_frame_index(n)).collect();
        assert_eq!(indices, vec![0, 3, 7, 12]);
    }

    #[test]
    fn tmp_sibling_stays_in_the_same_directory() {
        let tmp = tmp_sibling(Path::new("out/frames/frame_0001.png"));
        assert_eq!(tmp, Path::new("out/frames/frame_0001.png.tmp"));
    }
}
