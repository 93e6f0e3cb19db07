//! Binary artifact persistence
//!
//! Objects are bincode-encoded and wrapped in a small envelope carrying a
//! magic tag, a format version and a SHA-256 digest of the payload, so a
//! truncated or foreign file is reported as corrupt instead of decoding into
//! garbage.

use crate::error::{Result, ResultExt, SelectorError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

const MAGIC: [u8; 4] = *b"MSEL";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope {
    magic: [u8; 4],
    format_version: u32,
    payload: Vec<u8>,
    checksum: [u8; 32],
}

fn digest(payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.finalize().into()
}

/// Serialize `obj` to `path`, creating parent directories and replacing any existing file
pub fn save_object<T: Serialize>(path: impl AsRef<Path>, obj: &T) -> Result<()> {
    let path = path.as_ref();
    write_envelope(path, obj).located(&format!("persistence: saving {}", path.display()))?;
    info!(path = %path.display(), "Object saved");
    Ok(())
}

fn write_envelope<T: Serialize>(path: &Path, obj: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let payload = bincode::serialize(obj)?;
    let envelope = Envelope {
        magic: MAGIC,
        format_version: FORMAT_VERSION,
        checksum: digest(&payload),
        payload,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, &envelope)?;
    writer.flush()?;
    debug!(path = %path.display(), bytes = envelope.payload.len(), "Artifact written");
    Ok(())
}

/// Read an object previously written by [`save_object`]
pub fn load_object<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    read_envelope(path).located(&format!("persistence: loading {}", path.display()))
}

fn read_envelope<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    let envelope: Envelope = bincode::deserialize(&bytes)
        .map_err(|e| SelectorError::CorruptArtifact(format!("unreadable envelope: {}", e)))?;

    if envelope.magic != MAGIC {
        return Err(SelectorError::CorruptArtifact(
            "not a model-selector artifact".to_string(),
        ));
    }
    if envelope.format_version != FORMAT_VERSION {
        return Err(SelectorError::CorruptArtifact(format!(
            "unsupported format version {} (expected {})",
            envelope.format_version, FORMAT_VERSION
        )));
    }
    if digest(&envelope.payload) != envelope.checksum {
        return Err(SelectorError::CorruptArtifact("checksum mismatch".to_string()));
    }

    bincode::deserialize(&envelope.payload)
        .map_err(|e| SelectorError::CorruptArtifact(format!("undecodable payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("obj.bin");
        let mut obj = BTreeMap::new();
        obj.insert("alpha".to_string(), vec![1.0, 2.5]);

        save_object(&path, &obj).unwrap();
        let restored: BTreeMap<String, Vec<f64>> = load_object(&path).unwrap();
        assert_eq!(restored, obj);
    }

    #[test]
    fn test_digest_reference_value() {
        let hex: String = digest(b"abc").iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(
            hex,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_flipped_payload_byte_is_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("obj.bin");
        save_object(&path, &vec![7u64; 16]).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 33;
        bytes[last] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        let err = load_object::<Vec<u64>>(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(matches!(err.root(), SelectorError::CorruptArtifact(_)));
    }

    #[test]
    fn test_wrong_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("obj.bin");
        let payload = bincode::serialize(&1u8).unwrap();
        let envelope = Envelope {
            magic: *b"NOPE",
            format_version: FORMAT_VERSION,
            checksum: digest(&payload),
            payload,
        };
        fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        let err = load_object::<u8>(&path).unwrap_err();
        assert!(err.root().to_string().contains("not a model-selector artifact"));
    }
}
