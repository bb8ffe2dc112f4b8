//! Gzip JSON codec for stored result records.
//!
//! Records are serialized to JSON and gzip-compressed before any backend
//! sees them; they stay compressed at rest and over presigned URLs, and
//! clients are expected to transparently decode (or consume the artifact
//! as served).

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::StoreError;
use crate::types::ResultRecord;

/// A record compressed for storage, with the pre-compression size kept for
/// observability logging at the put site.
#[derive(Debug)]
pub struct EncodedRecord {
    /// Gzip-compressed JSON bytes.
    pub bytes: Vec<u8>,
    /// Serialized JSON size before compression.
    pub json_len: usize,
}

/// Serializes and gzip-compresses a record.
pub fn encode_record(record: &ResultRecord) -> Result<EncodedRecord, StoreError> {
    let json = serde_json::to_vec(record).map_err(|e| StoreError::Codec(e.to_string()))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .and_then(|()| encoder.finish())
        .map(|bytes| EncodedRecord {
            bytes,
            json_len: json.len(),
        })
        .map_err(|e| StoreError::Codec(e.to_string()))
}

/// Decompresses and deserializes a stored record.
pub fn decode_record(bytes: &[u8]) -> Result<ResultRecord, StoreError> {
    let mut json = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut json)
        .map_err(|e| StoreError::Codec(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| StoreError::Codec(e.to_string()))
}
