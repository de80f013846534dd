use std::io::{Cursor, Write as _};

use crate::foundation::error::{ScanError, ScanResult};

/// File name used when several artifacts are bundled together.
pub const BUNDLE_NAME: &str = "scanfield-export.zip";

/// A finished export file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Base file name, including extension.
    pub filename: String,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Media type derived from the extension.
    pub media_type: &'static str,
}

impl ExportArtifact {
    /// Wrap bytes, inferring the media type from `filename`.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let media_type = infer_media_type(&filename);
        Self {
            filename,
            bytes,
            media_type,
        }
    }
}

/// Media type for a file name, by case-insensitive extension.
pub fn infer_media_type(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match ext {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "txt" => "text/plain;charset=utf-8",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Pack artifacts into one deflated zip named [`BUNDLE_NAME`].
pub fn bundle_zip(files: &[ExportArtifact]) -> ScanResult<ExportArtifact> {
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(6));
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for f in files {
        writer
            .start_file(f.filename.as_str(), options)
            .map_err(|e| ScanError::encode(format!("zip entry '{}': {e}", f.filename)))?;
        writer
            .write_all(&f.bytes)
            .map_err(|e| ScanError::encode(format!("zip write '{}': {e}", f.filename)))?;
    }
    let bytes = writer
        .finish()
        .map_err(|e| ScanError::encode(format!("zip finish: {e}")))?
        .into_inner();
    Ok(ExportArtifact::new(BUNDLE_NAME, bytes))
}

#[cfg(test)]
#[path = "../../tests/unit/deliver/artifact.rs"]
mod tests;
