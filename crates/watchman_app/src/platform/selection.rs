use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use watchman_core::VideoFile;

const OCTET_STREAM: &str = "application/octet-stream";

const VIDEO_EXTENSIONS: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("mpg", "video/mpeg"),
    ("mpeg", "video/mpeg"),
    ("wmv", "video/x-ms-wmv"),
    ("flv", "video/x-flv"),
    ("3gp", "video/3gpp"),
    ("ts", "video/mp2t"),
    ("ogv", "video/ogg"),
];

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("cannot read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("{0:?} is not a video file")]
    NotVideo(PathBuf),
    #[error("{0:?} is empty")]
    Empty(PathBuf),
}

/// MIME type guessed from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return OCTET_STREAM;
    };
    VIDEO_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}

/// Reads a file picked by the user, keeping only non-empty videos.
pub fn load_video(path: &Path) -> Result<VideoFile, SelectionError> {
    let mime_type = mime_for_path(path);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let probe = VideoFile {
        name,
        mime_type: mime_type.to_string(),
        bytes: Vec::new(),
    };
    if !probe.is_video() {
        return Err(SelectionError::NotVideo(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|source| SelectionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = VideoFile { bytes, ..probe };
    if file.is_empty() {
        return Err(SelectionError::Empty(path.to_path_buf()));
    }
    Ok(file)
}
