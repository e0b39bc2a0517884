//! Binary plumbing for the packed profile format.
//!
//! This module handles:
//! - Big-endian primitive reads and writes over in-memory buffers
//! - Gzip wrapping of whole payloads

pub mod cursor;
pub mod gzip;

// Re-export main types
pub use cursor::{ByteReader, ByteWriter};
pub use gzip::{compress, decompress};
