//! Reading and writing `.json.xz` result artifacts.
//!
//! Artifacts are plain JSON inside a standard xz container, so any consumer
//! can read them with `xz -dc file | jq`. Writes go to a sibling temp file
//! first and are renamed into place; a crashed write never leaves a
//! truncated artifact under the artifact extension.

use crate::errors::{ResultsError, ResultsResult};
use crate::types::NamespacedDocument;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

/// What was written, with a checksum of the uncompressed JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReceipt {
    pub path: PathBuf,
    pub uncompressed_bytes: u64,
    pub compressed_bytes: u64,
    /// blake3 of the uncompressed JSON, hex encoded
    pub checksum: String,
}

/// Serialize, compress and write `document` to `path`.
pub fn write_artifact(
    path: &Path,
    document: &serde_json::Value,
    level: u32,
) -> ResultsResult<ArtifactReceipt> {
    let json = serde_json::to_vec(document)?;
    let checksum = checksum_hex(&json);
    let tmp = temp_path(path);

    if let Err(e) = write_compressed(&tmp, &json, level) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ResultsError::io(path, e)
    })?;

    let compressed_bytes = fs::metadata(path)
        .map_err(|e| ResultsError::io(path, e))?
        .len();

    log::debug!(
        "Wrote artifact {} ({} bytes, {} compressed)",
        path.display(),
        json.len(),
        compressed_bytes
    );

    Ok(ArtifactReceipt {
        path: path.to_path_buf(),
        uncompressed_bytes: json.len() as u64,
        compressed_bytes,
        checksum,
    })
}

/// Decompress and parse an artifact.
pub fn read_artifact(path: &Path) -> ResultsResult<serde_json::Value> {
    let bytes = read_decompressed(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a single-item artifact as a namespaced document.
///
/// Fails with `ResultsError::Json` when a key appears in both namespaces.
pub fn read_document(path: &Path) -> ResultsResult<NamespacedDocument> {
    let bytes = read_decompressed(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Check an artifact against the checksum from its receipt.
pub fn verify_artifact(path: &Path, checksum: &str) -> ResultsResult<bool> {
    let bytes = read_decompressed(path)?;
    Ok(checksum_hex(&bytes).eq_ignore_ascii_case(checksum))
}

fn write_compressed(path: &Path, bytes: &[u8], level: u32) -> ResultsResult<()> {
    let file = File::create(path).map_err(|e| ResultsError::io(path, e))?;
    let mut encoder = XzEncoder::new(BufWriter::new(file), level.min(9));
    encoder
        .write_all(bytes)
        .map_err(|e| ResultsError::io(path, e))?;
    let mut writer = encoder.finish().map_err(|e| ResultsError::io(path, e))?;
    writer.flush().map_err(|e| ResultsError::io(path, e))?;
    Ok(())
}

fn read_decompressed(path: &Path) -> ResultsResult<Vec<u8>> {
    let file = File::open(path).map_err(|e| ResultsError::io(path, e))?;
    let mut decoder = XzDecoder::new(BufReader::new(file));
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(|e| ResultsError::io(path, e))?;
    Ok(bytes)
}

fn checksum_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_and_read_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary_2026-10-16_09-30-00.json.xz");
        let doc = json!({"raw": {"name": "widgets"}, "calculated": {"stars_per_day": 1.5}});

        let receipt = write_artifact(&path, &doc, 6).unwrap();
        assert_eq!(receipt.path, path);
        assert_eq!(receipt.checksum.len(), 64);
        assert!(receipt.compressed_bytes > 0);
        assert!(!temp_path(&path).exists());

        assert_eq!(read_artifact(&path).unwrap(), doc);
        assert!(verify_artifact(&path, &receipt.checksum).unwrap());
        assert!(!verify_artifact(&path, "00").unwrap());
    }

    #[test]
    fn test_artifact_is_xz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json.xz");
        write_artifact(&path, &json!({"raw": {}, "calculated": {}}), 0).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..6], &[0xFD, b'7', b'z', b'X', b'Z', 0x00]);
    }

    #[test]
    fn test_read_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo_2026-10-16_09-30-00.json.xz");
        let doc = NamespacedDocument::new()
            .with_raw("name", "widgets")
            .with_calculated("age_days", 3);
        write_artifact(&path, &doc.to_value(), 6).unwrap();
        assert_eq!(read_document(&path).unwrap(), doc);

        let shared = dir.path().join("shared_2026-10-16_09-30-00.json.xz");
        write_artifact(&shared, &json!({"raw": {"a": 1}, "calculated": {"a": 2}}), 0).unwrap();
        assert!(matches!(read_document(&shared), Err(ResultsError::Json(_))));
    }

    #[test]
    fn test_read_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_artifact(&dir.path().join("missing.json.xz")).unwrap_err();
        assert!(matches!(err, ResultsError::Io { .. }));
    }

    #[test]
    fn test_read_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json.xz");
        fs::write(&path, b"not xz").unwrap();
        assert!(read_artifact(&path).is_err());
    }
}
