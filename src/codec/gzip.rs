//! Gzip wrapping of packed profile payloads.
//!
//! Payloads are fully inflated before decoding starts; there is no
//! streaming decode.

use crate::utils::error::CodecError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use std::io::{Read, Write};

/// Inflate a gzip stream into a flat buffer
pub fn decompress(compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = GzDecoder::new(compressed);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CodecError::InvalidFormat(format!("not a gzip stream: {}", e)))?;
    debug!("Inflated {} bytes into {} bytes", compressed.len(), out.len());
    Ok(out)
}

/// Deflate a flat buffer into a gzip stream
pub fn compress(raw: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}
