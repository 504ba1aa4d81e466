//! Content signatures used to decide whether a target file is up to date

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{MirrorError, Result};

/// Default read buffer for streaming digests
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Digest algorithms available for content signatures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    /// SHA-256 hash
    #[default]
    Sha256,
    /// Blake3 hash (faster)
    Blake3,
}

impl std::str::FromStr for SignatureAlgorithm {
    type Err = MirrorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(MirrorError::Config(format!("unknown signature algorithm '{}'", other))),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureAlgorithm::Sha256 => write!(f, "sha256"),
            SignatureAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Opaque fingerprint of a file's content. Only equality is meaningful.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{:02x}", byte)).collect()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Incremental hasher over either supported algorithm
enum Hasher {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn new(algorithm: SignatureAlgorithm) -> Self {
        match algorithm {
            SignatureAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            SignatureAlgorithm::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Hasher::Sha256(hasher) => hasher.update(bytes),
            Hasher::Blake3(hasher) => {
                hasher.update(bytes);
            }
        }
    }

    fn finalize(self) -> Signature {
        match self {
            Hasher::Sha256(hasher) => Signature(hasher.finalize().to_vec()),
            Hasher::Blake3(hasher) => Signature(hasher.finalize().as_bytes().to_vec()),
        }
    }
}

/// Compute a signature by streaming `reader` in chunks of `buffer_size` bytes
pub fn compute_signature<R: Read>(
    mut reader: R,
    algorithm: SignatureAlgorithm,
    buffer_size: usize,
) -> std::io::Result<Signature> {
    let mut hasher = Hasher::new(algorithm);
    let mut buffer = vec![0u8; buffer_size.max(1)];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Signature of the full content of the file at `path`
pub fn file_signature(
    path: impl AsRef<Path>,
    algorithm: SignatureAlgorithm,
    buffer_size: usize,
) -> Result<Signature> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| MirrorError::io("signature", path.to_string_lossy(), e))?;

    compute_signature(file, algorithm, buffer_size)
        .map_err(|e| MirrorError::io("signature", path.to_string_lossy(), e))
}

/// Signature of an in-memory buffer
pub fn bytes_signature(bytes: &[u8], algorithm: SignatureAlgorithm) -> Signature {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(bytes);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test_case(SignatureAlgorithm::Sha256 ; "sha256")]
    #[test_case(SignatureAlgorithm::Blake3 ; "blake3")]
    fn test_equal_content_equal_signature(algorithm: SignatureAlgorithm) {
        let a = compute_signature(Cursor::new(b"hello world"), algorithm, 4).unwrap();
        let b = compute_signature(Cursor::new(b"hello world"), algorithm, 4096).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_bytes().len(), 32);
    }

    #[test_case(SignatureAlgorithm::Sha256 ; "sha256")]
    #[test_case(SignatureAlgorithm::Blake3 ; "blake3")]
    fn test_different_content_different_signature(algorithm: SignatureAlgorithm) {
        let a = compute_signature(Cursor::new(b"v1"), algorithm, DEFAULT_BUFFER_SIZE).unwrap();
        let b = compute_signature(Cursor::new(b"v2"), algorithm, DEFAULT_BUFFER_SIZE).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_known_sha256_of_empty_input() {
        let signature = compute_signature(Cursor::new(b""), SignatureAlgorithm::Sha256, 16).unwrap();
        assert_eq!(
            signature.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_streaming_matches_in_memory() {
        // Content larger than several buffers, with a length that is not a multiple of the buffer
        let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let streamed = compute_signature(Cursor::new(&content), SignatureAlgorithm::Sha256, 1024).unwrap();
        assert_eq!(streamed, bytes_signature(&content, SignatureAlgorithm::Sha256));
    }

    #[test]
    fn test_file_signature_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = file_signature(temp_dir.path().join("missing"), SignatureAlgorithm::Sha256, 16).unwrap_err();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("SHA256".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::Sha256);
        assert_eq!("blake3".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::Blake3);
        assert!("md5".parse::<SignatureAlgorithm>().is_err());
    }
}
