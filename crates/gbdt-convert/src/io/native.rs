//! Native binary container for persisted models.
//!
//! A fixed 24-byte header (see [`FormatHeader`]) followed by a Postcard
//! payload. The header's model-type byte records whether the payload is a
//! full estimator (booster plus training configuration) or a raw booster;
//! loaders use it to tell the two historical shapes apart.

use std::io::{Read, Write};

use thiserror::Error;

use crate::repr::gbdt::ForestValidationError;

// ============================================================================
// Constants
// ============================================================================

/// Magic bytes identifying a model file.
pub const MAGIC: &[u8; 4] = b"GBDT";

/// Readers accept any file whose major version is not newer than this.
pub const CURRENT_VERSION_MAJOR: u8 = 1;

pub const CURRENT_VERSION_MINOR: u8 = 0;

pub const HEADER_SIZE: usize = 24;

// ============================================================================
// Model Type
// ============================================================================

/// Shape of the persisted object, stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ModelType {
    /// Estimator: booster plus training configuration.
    Estimator = 0,
    /// Raw booster without configuration.
    Booster = 1,
}

impl ModelType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Estimator),
            1 => Some(Self::Booster),
            _ => None,
        }
    }
}

// ============================================================================
// Format Header
// ============================================================================

/// 24-byte header for the native storage format.
///
/// # Layout
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     Magic ("GBDT")
/// 4       1     Version major
/// 5       1     Version minor
/// 6       1     Model type
/// 7       1     Reserved
/// 8       4     Payload size (bytes)
/// 12      4     CRC32 checksum of payload
/// 16      4     Number of features
/// 20      4     Number of trees
/// ```
///
/// All multi-byte fields are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub model_type: ModelType,
    pub payload_size: u32,
    /// CRC32 of the payload bytes.
    pub checksum: u32,
    pub num_features: u32,
    pub num_trees: u32,
}

impl FormatHeader {
    /// Header for the current version; size and checksum are filled in on write.
    pub fn new(model_type: ModelType, num_features: u32, num_trees: u32) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            model_type,
            payload_size: 0,
            checksum: 0,
            num_features,
            num_trees,
        }
    }

    /// Serialize header to 24 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[6] = self.model_type as u8;
        // buf[7] reserved
        buf[8..12].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        buf[16..20].copy_from_slice(&self.num_features.to_le_bytes());
        buf[20..24].copy_from_slice(&self.num_trees.to_le_bytes());
        buf
    }

    /// Parse header from 24 bytes.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, DeserializeError> {
        if &buf[0..4] != MAGIC {
            return Err(DeserializeError::NotAModel);
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major > CURRENT_VERSION_MAJOR {
            return Err(DeserializeError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        let model_type = ModelType::from_u8(buf[6]).ok_or(DeserializeError::UnrecognizedModel(buf[6]))?;

        let read_u32 = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);

        Ok(Self {
            version_major,
            version_minor,
            model_type,
            payload_size: read_u32(8),
            checksum: read_u32(12),
            num_features: read_u32(16),
            num_trees: read_u32(20),
        })
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Failure while writing a model.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    /// Payload larger than the header's 32-bit size field.
    #[error("payload of {0} bytes does not fit the format")]
    PayloadTooLarge(usize),
}

/// Failure while reading a model.
#[derive(Debug, Error)]
pub enum DeserializeError {
    /// Wrong magic bytes.
    #[error("not a model file")]
    NotAModel,

    /// Written by a newer format version.
    #[error("model requires format version {major}.{minor} or later")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// The model-type byte names neither an estimator nor a booster.
    #[error("unrecognized model type {0}: expected an estimator or a booster")]
    UnrecognizedModel(u8),

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("file truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Payload decoded but is inconsistent with itself or the header.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// Decoded trees are structurally invalid.
    #[error("invalid forest: {0}")]
    InvalidForest(#[from] ForestValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decoding error: {0}")]
    Decoding(#[from] postcard::Error),

    #[error("model type mismatch: expected {expected:?}, got {actual:?}")]
    TypeMismatch { expected: ModelType, actual: ModelType },
}

// ============================================================================
// CRC32 Helper
// ============================================================================

pub fn compute_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// ============================================================================
// Native Codec
// ============================================================================

/// Reads and writes header + payload pairs.
#[derive(Debug, Clone, Default)]
pub struct NativeCodec;

impl NativeCodec {
    pub fn new() -> Self {
        Self
    }

    /// Write header and payload to a writer, filling in size and checksum.
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        header: &mut FormatHeader,
        payload: &[u8],
    ) -> Result<(), SerializeError> {
        header.payload_size =
            u32::try_from(payload.len()).map_err(|_| SerializeError::PayloadTooLarge(payload.len()))?;
        header.checksum = compute_checksum(payload);

        writer.write_all(&header.to_bytes())?;
        writer.write_all(payload)?;
        Ok(())
    }

    /// Read header and payload from a reader, verifying the checksum.
    pub fn read_from<R: Read>(&self, reader: &mut R) -> Result<(FormatHeader, Vec<u8>), DeserializeError> {
        let mut header_buf = [0u8; HEADER_SIZE];
        let got = read_up_to(reader, &mut header_buf)?;
        if got < HEADER_SIZE {
            return Err(DeserializeError::Truncated {
                expected: HEADER_SIZE,
                actual: got,
            });
        }

        let header = FormatHeader::from_bytes(&header_buf)?;

        let expected = header.payload_size as usize;
        let mut payload = Vec::with_capacity(expected);
        reader.by_ref().take(expected as u64).read_to_end(&mut payload)?;
        if payload.len() < expected {
            return Err(DeserializeError::Truncated {
                expected,
                actual: payload.len(),
            });
        }

        let actual_checksum = compute_checksum(&payload);
        if actual_checksum != header.checksum {
            return Err(DeserializeError::ChecksumMismatch {
                expected: header.checksum,
                actual: actual_checksum,
            });
        }

        Ok((header, payload))
    }

    /// Serialize a payload to bytes with header.
    pub fn serialize<T: serde::Serialize>(
        &self,
        model_type: ModelType,
        num_features: u32,
        num_trees: u32,
        payload: &T,
    ) -> Result<Vec<u8>, SerializeError> {
        let payload_bytes = postcard::to_allocvec(payload)?;

        let mut header = FormatHeader::new(model_type, num_features, num_trees);
        let mut output = Vec::with_capacity(HEADER_SIZE + payload_bytes.len());
        self.write_to(&mut output, &mut header, &payload_bytes)?;
        Ok(output)
    }

    /// Deserialize a payload from bytes.
    pub fn deserialize<T: for<'de> serde::Deserialize<'de>>(
        &self,
        bytes: &[u8],
    ) -> Result<(FormatHeader, T), DeserializeError> {
        let mut cursor = std::io::Cursor::new(bytes);
        let (header, payload_bytes) = self.read_from(&mut cursor)?;
        let payload = postcard::from_bytes(&payload_bytes)?;
        Ok((header, payload))
    }
}

/// Fill `buf` as far as the reader allows; returns the number of bytes read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
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

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let header = FormatHeader {
            version_major: 1,
            version_minor: 2,
            model_type: ModelType::Booster,
            payload_size: 12345,
            checksum: 0xDEADBEEF,
            num_features: 4,
            num_trees: 100,
        };

        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"GBDT");
        assert_eq!(bytes[6], 1);
        assert_eq!(&bytes[8..12], &12345u32.to_le_bytes());

        let parsed = FormatHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn header_wrong_magic() {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(b"XXXX");

        let result = FormatHeader::from_bytes(&buf);
        assert!(matches!(result, Err(DeserializeError::NotAModel)));
    }

    #[test]
    fn header_unsupported_version() {
        let mut header = FormatHeader::new(ModelType::Estimator, 10, 1);
        header.version_major = 99;
        let bytes = header.to_bytes();

        let result = FormatHeader::from_bytes(&bytes);
        assert!(matches!(
            result,
            Err(DeserializeError::UnsupportedVersion { major: 99, .. })
        ));
    }

    #[test]
    fn header_unrecognized_model_type() {
        let mut bytes = FormatHeader::new(ModelType::Estimator, 10, 1).to_bytes();
        bytes[6] = 7;
        let result = FormatHeader::from_bytes(&bytes);
        assert!(matches!(result, Err(DeserializeError::UnrecognizedModel(7))));
    }

    #[test]
    fn checksum_verification() {
        let checksum = compute_checksum(b"hello world");
        assert_ne!(checksum, 0);
        assert_eq!(checksum, compute_checksum(b"hello world"));
        assert_ne!(checksum, compute_checksum(b"hello worle"));
    }

    #[test]
    fn codec_write_read_roundtrip() {
        let codec = NativeCodec::new();
        let payload = vec![1.5f32, -2.0, 3.25];
        let bytes = codec.serialize(ModelType::Booster, 3, 0, &payload).unwrap();

        let (header, decoded): (FormatHeader, Vec<f32>) = codec.deserialize(&bytes).unwrap();
        assert_eq!(header.model_type, ModelType::Booster);
        assert_eq!(header.num_features, 3);
        assert_eq!(header.payload_size as usize, bytes.len() - HEADER_SIZE);
        assert_eq!(decoded, payload);
    }

    #[test]
    fn codec_detects_corruption() {
        let codec = NativeCodec::new();
        let payload: Vec<u32> = (0..32).collect();
        let mut bytes = codec.serialize(ModelType::Estimator, 1, 1, &payload).unwrap();
        bytes[HEADER_SIZE + 5] ^= 0xFF;

        let result: Result<(FormatHeader, Vec<u32>), _> = codec.deserialize(&bytes);
        assert!(matches!(result, Err(DeserializeError::ChecksumMismatch { .. })));
    }

    #[test]
    fn codec_detects_truncation() {
        let codec = NativeCodec::new();
        let bytes = codec.serialize(ModelType::Booster, 1, 1, &vec![7u8; 64]).unwrap();

        let short_payload: Result<(FormatHeader, Vec<u8>), _> = codec.deserialize(&bytes[..bytes.len() - 10]);
        assert!(matches!(short_payload, Err(DeserializeError::Truncated { actual, .. }) if actual == bytes.len() - 10 - HEADER_SIZE));

        let short_header: Result<(FormatHeader, Vec<u8>), _> = codec.deserialize(&bytes[..10]);
        assert!(matches!(
            short_header,
            Err(DeserializeError::Truncated {
                expected: HEADER_SIZE,
                actual: 10
            })
        ));
    }
}
